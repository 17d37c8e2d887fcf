//! Dashboard web server
//!
//! Wires the query pipeline, session store and renderer into an axum router
//! and serves it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::pipeline::QueryPipeline;

use super::render::Renderer;
use super::routes::create_router;
use super::session::SessionStore;

// ============================================================================
// Server Config
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Enable request logging
    pub enable_request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5000)),
            enable_request_logging: true,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_address: Option<SocketAddr>,
    enable_request_logging: Option<bool>,
}

impl ServerConfigBuilder {
    /// Set bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    /// Set bind address from host and port
    pub fn host_port(mut self, host: &str, port: u16) -> Result<Self, ServerError> {
        let addr = format!("{host}:{port}");
        self.bind_address = Some(
            addr.parse()
                .map_err(|_| ServerError::ConfigError(format!("Invalid address: {addr}")))?,
        );
        Ok(self)
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Build the config
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            bind_address: self.bind_address.unwrap_or(defaults.bind_address),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
        }
    }
}

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Query pipeline
    pub pipeline: Arc<QueryPipeline>,

    /// Logged-in users
    pub sessions: SessionStore,

    /// Page templates
    pub renderer: Arc<Renderer>,

    /// Server start time
    pub start_time: Instant,

    /// Configuration
    pub config: ServerConfig,
}

// ============================================================================
// Web Server
// ============================================================================

/// Sentiment dashboard server
pub struct WebServer {
    config: ServerConfig,
    state: AppState,
}

impl WebServer {
    /// Create a new server around a query pipeline
    pub fn new(config: ServerConfig, pipeline: Arc<QueryPipeline>) -> Result<Self, ServerError> {
        let renderer =
            Renderer::new().map_err(|e| ServerError::InitError(e.to_string()))?;

        let state = AppState {
            pipeline,
            sessions: SessionStore::new(),
            renderer: Arc::new(renderer),
            start_time: Instant::now(),
            config: config.clone(),
        };

        Ok(Self { config, state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_request_logging {
            router = router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
        }

        router
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!(
            "Starting sentiscope dashboard on http://{} (with graceful shutdown)",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Dashboard shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.config.bind_address,
            primary_classifier: self.state.pipeline.primary().display_name(),
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub primary_classifier: &'static str,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Sentiscope Dashboard\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Chart Classifier: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.primary_classifier,
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Initialization error
    InitError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::InitError(msg) => write!(f, "Initialization error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::models::ClassifierKind;
    use crate::social::{PostSource, SearchQuery, SearchResults};
    use crate::utils::error::FetchError;

    struct EmptySource;

    #[async_trait::async_trait]
    impl PostSource for EmptySource {
        async fn search(&self, _query: &SearchQuery) -> Result<SearchResults, FetchError> {
            Ok(SearchResults::default())
        }
    }

    fn pipeline() -> Arc<QueryPipeline> {
        Arc::new(QueryPipeline::with_model_dir(
            Arc::new(EmptySource),
            "does-not-exist",
            SearchConfig::default(),
            ClassifierKind::Svm,
        ))
    }

    #[test]
    fn test_server_creation() {
        let server = WebServer::new(ServerConfig::default(), pipeline());
        assert!(server.is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::builder()
            .host_port("0.0.0.0", 8080)
            .unwrap()
            .enable_request_logging(false)
            .build();

        assert_eq!(config.bind_address.port(), 8080);
        assert!(!config.enable_request_logging);
    }

    #[test]
    fn test_config_builder_rejects_bad_host() {
        assert!(ServerConfig::builder().host_port("not a host", 80).is_err());
    }

    #[test]
    fn test_server_info() {
        let server = WebServer::new(ServerConfig::default(), pipeline()).unwrap();
        let info = server.info();

        assert_eq!(info.bind_address.port(), 5000);
        assert_eq!(info.primary_classifier, "Linear SVM");
        assert!(info.display().contains("Linear SVM"));
    }
}
