//! Error types for sentiscope
//!
//! This module defines the domain error enums used throughout the application.

use thiserror::Error;

/// Errors that can occur while talking to the social media API
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded and the wait budget was exhausted
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Credentials were rejected by the service
    #[error("Authentication rejected with status {0}")]
    Unauthorized(u16),

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Every attempt failed; `last` is the final attempt's error
    #[error("Gave up after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    /// Response body could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Stream connection closed by the remote side
    #[error("Stream disconnected")]
    Disconnected,
}

impl FetchError {
    /// Whether retrying the same request might succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::RateLimit
                | Self::ServerError(_)
                | Self::Timeout
                | Self::MaxRetriesExceeded { .. }
                | Self::Disconnected
        )
    }
}

/// Errors raised while loading, validating or running the persisted models
#[derive(Error, Debug)]
pub enum ModelError {
    /// An artifact file does not exist
    #[error("Model artifact not found: {path}")]
    MissingArtifact { path: String },

    /// An artifact exists but cannot be decoded
    #[error("Model artifact {path} is corrupt: {reason}")]
    CorruptArtifact { path: String, reason: String },

    /// Classifier and vectorizer disagree about the feature space
    #[error("Vocabulary mismatch for {model}: {reason}")]
    VocabularyMismatch { model: String, reason: String },

    /// Artifacts were produced by a different text normalizer
    #[error("Normalizer version mismatch: artifacts use v{found}, runtime is v{expected}")]
    NormalizerMismatch { expected: u32, found: u32 },

    /// Input matrix has the wrong number of columns
    #[error("Dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted
    #[error("Model has not been fitted yet")]
    NotFitted,
}

/// Errors raised by the offline training pipeline
#[derive(Error, Debug)]
pub enum TrainingError {
    /// Dataset could not be read
    #[error("Failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    /// A row carries a label outside {positive, negative, neutral}
    #[error("Row {row}: unknown sentiment label '{label}'")]
    UnknownLabel { row: usize, label: String },

    /// Not enough rows to build a train/validation split
    #[error("Dataset too small: {rows} rows, need at least {required}")]
    DatasetTooSmall { rows: usize, required: usize },

    /// Invalid hyperparameter
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// Errors raised while validating a query request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Search term is empty after trimming
    #[error("Search term must not be empty")]
    EmptySearchTerm,

    /// Date could not be parsed
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Region name not present in the lookup table
    #[error("Unknown location '{0}'")]
    UnknownLocation(String),
}
