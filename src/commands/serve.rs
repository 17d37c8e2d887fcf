use anyhow::{Context, Result};
use std::sync::Arc;

use sentiscope::config::Config;
use sentiscope::metrics;
use sentiscope::ml::ModelBundle;
use sentiscope::pipeline::QueryPipeline;
use sentiscope::social::TwitterClient;
use sentiscope::web::{ServerConfig, WebServer};

/// Parameters for the dashboard server
#[derive(Debug, Clone)]
pub struct ServeParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub skip_auth_check: bool,
}

/// Start the sentiment dashboard
pub async fn serve(config: Config, params: ServeParams) -> Result<()> {
    println!("Starting Sentiscope Dashboard");
    println!("=============================");

    let credentials = config.api.credentials()?;
    let client = TwitterClient::with_options(credentials, config.api.client_options())
        .context("Failed to create API client")?;

    if params.skip_auth_check {
        tracing::warn!("Skipping credential verification");
    } else {
        let handle = client
            .verify_credentials()
            .await
            .context("API credentials were rejected")?;
        println!("  Authenticated as: @{handle}");
    }

    metrics::init_metrics();

    let source = Arc::new(client);
    let pipeline = match ModelBundle::load(&config.models.dir) {
        Ok(bundle) => {
            println!(
                "  Models: {} ({} features)",
                config.models.dir.display(),
                bundle.vectorizer.len()
            );
            QueryPipeline::new(
                source,
                Arc::new(bundle),
                config.search.clone(),
                config.models.primary,
            )
        }
        Err(e) => {
            tracing::warn!(
                dir = %config.models.dir.display(),
                error = %e,
                "Models not loaded yet, queries will retry on demand"
            );
            println!("  Models: not loaded ({e})");
            QueryPipeline::with_model_dir(
                source,
                config.models.dir.clone(),
                config.search.clone(),
                config.models.primary,
            )
        }
    };

    let host = params.host.unwrap_or_else(|| config.server.host.clone());
    let port = params.port.unwrap_or(config.server.port);
    let server_config = ServerConfig::builder()
        .host_port(&host, port)?
        .enable_request_logging(true)
        .build();

    let server = WebServer::new(server_config, Arc::new(pipeline))?;
    println!("{}", server.info().display());
    println!();
    println!("Endpoints:");
    println!("  GET  /         - Search page");
    println!("  GET  /login    - Login form");
    println!("  POST /output   - Run a query");
    println!("  GET  /health   - Health check");
    println!("  GET  /metrics  - Prometheus metrics");
    println!();

    server.start_with_shutdown(shutdown_signal()).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
