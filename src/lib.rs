//! sentiscope - Social media sentiment explorer
//!
//! Fetches posts for a search term, cleans the text, classifies every post
//! with a linear SVM and a logistic regression model, and serves the
//! sentiment breakdown as a pie chart.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`text`] - Shared, versioned text normalization and polarity lexicon
//! - [`ml`] - N-gram features, linear classifiers, training and artifacts
//! - [`social`] - Signed API client, search pagination and live stream
//! - [`geo`] - Region lookup table
//! - [`pipeline`] - End-to-end query orchestration and aggregation
//! - [`web`] - Dashboard server, sessions and templates
//! - [`models`] - Core data structures and types
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sentiscope::config::Config;
//! use sentiscope::pipeline::QueryPipeline;
//! use sentiscope::social::TwitterClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = TwitterClient::with_options(config.api.credentials()?, config.api.client_options())?;
//!     let pipeline = QueryPipeline::with_model_dir(
//!         Arc::new(client),
//!         config.models.dir.clone(),
//!         config.search.clone(),
//!         config.models.primary,
//!     );
//!     let outcome = pipeline.run_query("coffee", "", "IE").await?;
//!     println!("{}", outcome.as_str());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod pipeline;
pub mod social;
pub mod text;
pub mod utils;
pub mod web;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, SentiscopeErrorTrait};
    pub use crate::geo::LocationSpec;
    pub use crate::ml::{Classifier, ModelBundle};
    pub use crate::models::{AnalyzedPost, ClassifierKind, Post, Sentiment};
    pub use crate::pipeline::{QueryOutcome, QueryPipeline, QueryReport};
    pub use crate::text::{normalize, NormalizedText};
}

// Direct re-exports for convenience
pub use models::{AnalyzedPost, ClassifierKind, Post, Sentiment};
