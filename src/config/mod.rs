//! Configuration management for sentiscope
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. API credentials are never part of the defaults;
//! they come from the file or from the `TWITTER_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ml::{TrainingOptions, VectorizerOptions};
use crate::models::ClassifierKind;
use crate::social::client::{ClientOptions, DEFAULT_API_BASE, DEFAULT_STREAM_BASE};
use crate::social::Credentials;
use crate::utils::retry::RetryConfig;

/// Environment variables holding the four credential strings
pub const CREDENTIAL_ENV_VARS: [&str; 4] = [
    "TWITTER_CONSUMER_KEY",
    "TWITTER_CONSUMER_SECRET",
    "TWITTER_ACCESS_TOKEN",
    "TWITTER_ACCESS_TOKEN_SECRET",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Social media API access
    pub api: ApiConfig,

    /// Search parameters applied to every query
    pub search: SearchConfig,

    /// Model artifacts
    pub models: ModelsConfig,

    /// Web server
    pub server: ServerSettings,

    /// Offline training
    pub training: TrainingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Social media API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,

    /// REST endpoint base URL
    pub api_base_url: String,

    /// Streaming endpoint base URL
    pub stream_base_url: String,

    /// Rate limit (requests per second)
    pub requests_per_second: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retry attempts for 5xx and transport failures
    pub max_retries: u32,

    /// Longest wait for a rate-limit window before giving up
    pub max_rate_limit_wait_secs: u64,
}

/// Search parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on posts fetched per query
    pub max_posts: usize,

    /// Post language
    pub language: String,

    /// Radius around a region's centre, in kilometres
    pub radius_km: u32,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding the three artifact files
    pub dir: PathBuf,

    /// Classifier that drives the pie chart
    pub primary: ClassifierKind,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// CSV with `Text` and `Sentiment` columns
    pub dataset: PathBuf,
    pub seed: u64,
    pub validation_fraction: f64,
    pub max_features: usize,
    pub svm_c: f64,
    pub svm_max_iter: usize,
    pub logistic_c: f64,
    pub logistic_max_iter: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

// ============================================================================
// Defaults
// ============================================================================

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_token_secret: String::new(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            stream_base_url: DEFAULT_STREAM_BASE.to_string(),
            requests_per_second: 1,
            request_timeout_secs: 30,
            max_retries: 3,
            max_rate_limit_wait_secs: 15 * 60,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("credentials", &self.credentials_unchecked())
            .field("api_base_url", &self.api_base_url)
            .field("stream_base_url", &self.stream_base_url)
            .field("requests_per_second", &self.requests_per_second)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_posts: 500,
            language: String::from("en"),
            radius_km: 3000,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            primary: ClassifierKind::LogisticRegression,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 5000,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let options = TrainingOptions::default();
        Self {
            dataset: PathBuf::from("data/training.csv"),
            seed: options.seed,
            validation_fraction: options.validation_fraction,
            max_features: options.vectorizer.max_features,
            svm_c: options.svm_c,
            svm_max_iter: options.svm_max_iter,
            logistic_c: options.logistic_c,
            logistic_max_iter: options.logistic_max_iter,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl ApiConfig {
    fn credentials_unchecked(&self) -> Credentials {
        Credentials::new(
            &self.consumer_key,
            &self.consumer_secret,
            &self.access_token,
            &self.access_token_secret,
        )
    }

    /// The four credentials, or a configuration error naming the blank ones
    pub fn credentials(&self) -> crate::error::Result<Credentials> {
        let credentials = self.credentials_unchecked();
        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            return Err(crate::error::Error::config(format!(
                "missing API credentials: {} (set them in the config file or via {})",
                missing.join(", "),
                CREDENTIAL_ENV_VARS.join(", ")
            )));
        }
        Ok(credentials)
    }

    /// HTTP client options
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_base_url: self.api_base_url.trim_end_matches('/').to_string(),
            stream_base_url: self.stream_base_url.trim_end_matches('/').to_string(),
            requests_per_second: self.requests_per_second,
            timeout: Duration::from_secs(self.request_timeout_secs),
            retry: RetryConfig::new(self.max_retries),
            max_rate_limit_wait: Duration::from_secs(self.max_rate_limit_wait_secs),
        }
    }
}

impl TrainingConfig {
    pub fn options(&self) -> TrainingOptions {
        let defaults = TrainingOptions::default();
        TrainingOptions {
            vectorizer: VectorizerOptions {
                max_features: self.max_features,
                ..defaults.vectorizer
            },
            svm_c: self.svm_c,
            svm_max_iter: self.svm_max_iter,
            logistic_c: self.logistic_c,
            logistic_max_iter: self.logistic_max_iter,
            validation_fraction: self.validation_fraction,
            seed: self.seed,
            ..defaults
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse("SENTISCOPE_MAX_POSTS") {
            config.search.max_posts = v;
        }
        if let Ok(v) = std::env::var("SENTISCOPE_LANGUAGE") {
            config.search.language = v;
        }
        if let Some(v) = env_parse("SENTISCOPE_RADIUS_KM") {
            config.search.radius_km = v;
        }
        if let Ok(v) = std::env::var("SENTISCOPE_MODEL_DIR") {
            config.models.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SENTISCOPE_PRIMARY_CLASSIFIER") {
            config.models.primary = v
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid SENTISCOPE_PRIMARY_CLASSIFIER")?;
        }
        if let Ok(v) = std::env::var("SENTISCOPE_HOST") {
            config.server.host = v;
        }
        if let Some(v) = env_parse("SENTISCOPE_PORT") {
            config.server.port = v;
        }
        if let Ok(v) = std::env::var("SENTISCOPE_API_BASE_URL") {
            config.api.api_base_url = v;
        }
        if let Ok(v) = std::env::var("SENTISCOPE_STREAM_BASE_URL") {
            config.api.stream_base_url = v;
        }
        if let Some(v) = env_parse("SENTISCOPE_RATE_LIMIT") {
            config.api.requests_per_second = v;
        }
        if let Some(v) = env_parse("SENTISCOPE_REQUEST_TIMEOUT") {
            config.api.request_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("SENTISCOPE_DATASET") {
            config.training.dataset = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SENTISCOPE_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("SENTISCOPE_LOG_FORMAT") {
            config.logging.format = v;
        }

        Ok(config.with_env_credentials())
    }

    /// Load configuration from a file
    ///
    /// Credentials left blank in the file are taken from the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config.with_env_credentials())
    }

    /// Load from `path` when given, otherwise from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fill blank credentials from the `TWITTER_*` environment variables
    #[must_use]
    pub fn with_env_credentials(mut self) -> Self {
        let fields = [
            &mut self.api.consumer_key,
            &mut self.api.consumer_secret,
            &mut self.api.access_token,
            &mut self.api.access_token_secret,
        ];

        for (field, var) in fields.into_iter().zip(CREDENTIAL_ENV_VARS) {
            if field.trim().is_empty() {
                if let Ok(value) = std::env::var(var) {
                    *field = value;
                }
            }
        }

        self
    }

    /// Validate configuration values
    ///
    /// Credentials are checked separately by [`ApiConfig::credentials`]
    /// since training does not need them.
    pub fn validate(&self) -> Result<()> {
        if self.search.max_posts == 0 {
            anyhow::bail!("search.max_posts must be greater than 0");
        }

        if self.search.language.trim().is_empty() {
            anyhow::bail!("search.language must not be empty");
        }

        if self.search.radius_km == 0 {
            anyhow::bail!("search.radius_km must be greater than 0");
        }

        for (name, value) in [
            ("api.api_base_url", &self.api.api_base_url),
            ("api.stream_base_url", &self.api.stream_base_url),
        ] {
            url::Url::parse(value)
                .with_context(|| format!("{name} is not a valid URL: {value}"))?;
        }

        if self.api.requests_per_second == 0 {
            anyhow::bail!("api.requests_per_second must be greater than 0");
        }

        if !(self.training.validation_fraction > 0.0 && self.training.validation_fraction < 1.0) {
            anyhow::bail!("training.validation_fraction must be between 0 and 1");
        }

        if self.training.svm_c <= 0.0 || self.training.logistic_c <= 0.0 {
            anyhow::bail!("training regularization constants must be positive");
        }

        if self.training.max_features == 0 {
            anyhow::bail!("training.max_features must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        Ok(())
    }
}
