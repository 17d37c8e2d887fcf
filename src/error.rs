//! Unified error handling for the sentiscope crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`SentiscopeErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

pub use crate::utils::error::{FetchError, ModelError, QueryError, TrainingError};

/// Common trait for all sentiscope error types
pub trait SentiscopeErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Short message suitable for showing to an end user
    fn user_message(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Model artifact and prediction errors
    Model,
    /// Invalid user input
    Input,
    /// Storage and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Human readable category name
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Model => "model error",
            Self::Input => "invalid input",
            Self::Storage => "storage error",
            Self::Config => "configuration error",
            Self::Other => "unexpected error",
        }
    }
}

/// Unified error type for the sentiscope crate
#[derive(Error, Debug)]
pub enum Error {
    /// Social media API errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Model loading and prediction errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Training pipeline errors
    #[error("Training error: {0}")]
    Training(#[from] TrainingError),

    /// Invalid query parameters
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Template rendering errors
    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SentiscopeErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Model(_) => false,
            Self::Training(_) => false,
            Self::Query(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Render(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Fetch(FetchError::Unauthorized(_)) => {
                "The social media service rejected our credentials".to_string()
            }
            Self::Fetch(_) => "Could not retrieve results from the social media service".to_string(),
            Self::Model(e) => format!("Sentiment models are unavailable: {e}"),
            Self::Query(e) => e.to_string(),
            Self::Config(msg) => format!("Configuration error: {msg}"),
            other => format!("{}: {other}", other.category().description()),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::Unauthorized(_)) => ErrorCategory::Config,
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Model(_) => ErrorCategory::Model,
            Self::Training(TrainingError::Csv(_)) => ErrorCategory::Storage,
            Self::Training(_) => ErrorCategory::Input,
            Self::Query(_) => ErrorCategory::Input,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) | Self::Render(_) => ErrorCategory::Other,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
