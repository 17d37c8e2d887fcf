//! Query pipeline
//!
//! `fetch → normalize → vectorize → classify → aggregate → chart`. One
//! request runs end to end; a mutex keeps at most one query in flight.

pub mod aggregate;
pub mod chart;

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::geo::LocationSpec;
use crate::metrics;
use crate::ml::ModelBundle;
use crate::models::{AnalyzedPost, ClassifierKind};
use crate::social::{PostSource, SearchQuery};
use crate::text::{normalize, NormalizedText};
use crate::utils::error::{ModelError, QueryError};

pub use aggregate::Aggregate;
pub use chart::{ChartData, ChartSlice};

/// Validated query input
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub search_term: String,
    pub date_since: Option<NaiveDate>,
    pub location: LocationSpec,
}

impl QueryRequest {
    /// Validate raw form values
    ///
    /// The date is `YYYY-MM-DD` or blank; the location is `world` or a region.
    pub fn parse(
        search_term: &str,
        date: &str,
        location: &str,
    ) -> std::result::Result<Self, QueryError> {
        let search_term = search_term.trim();
        if search_term.is_empty() {
            return Err(QueryError::EmptySearchTerm);
        }

        let date = date.trim();
        let date_since = if date.is_empty() {
            None
        } else {
            Some(
                NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|_| QueryError::InvalidDate(date.to_string()))?,
            )
        };

        Ok(Self {
            search_term: search_term.to_string(),
            date_since,
            location: LocationSpec::parse(location)?,
        })
    }
}

/// Results of a query that found posts
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub search_term: String,
    pub location: String,
    pub posts: Vec<AnalyzedPost>,
    pub skipped: usize,
    pub svm: Aggregate,
    pub logistic: Aggregate,
    pub primary: ClassifierKind,
    pub chart: ChartData,
    pub elapsed_ms: u64,
}

impl QueryReport {
    /// Aggregate of the classifier that drives the chart
    pub fn primary_aggregate(&self) -> &Aggregate {
        match self.primary {
            ClassifierKind::Svm => &self.svm,
            ClassifierKind::LogisticRegression => &self.logistic,
        }
    }
}

/// Outcome of [`QueryPipeline::run_query`]
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    NoResults,
    Results(Box<QueryReport>),
}

impl QueryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoResults => "no_results",
            Self::Results(_) => "results",
        }
    }
}

/// Where the classifiers come from
enum ModelSource {
    Loaded(Arc<ModelBundle>),
    /// Loaded on first use, so the server can start before training
    Lazy(PathBuf),
}

/// Orchestrates one sentiment query
pub struct QueryPipeline {
    source: Arc<dyn PostSource>,
    models: RwLock<ModelSource>,
    search: SearchConfig,
    primary: ClassifierKind,
    query_lock: Mutex<()>,
}

impl QueryPipeline {
    pub fn new(
        source: Arc<dyn PostSource>,
        models: Arc<ModelBundle>,
        search: SearchConfig,
        primary: ClassifierKind,
    ) -> Self {
        Self {
            source,
            models: RwLock::new(ModelSource::Loaded(models)),
            search,
            primary,
            query_lock: Mutex::new(()),
        }
    }

    /// Pipeline whose artifacts are read from `model_dir` on first query
    ///
    /// A failed load is reported to the caller and retried on the next query.
    pub fn with_model_dir(
        source: Arc<dyn PostSource>,
        model_dir: impl Into<PathBuf>,
        search: SearchConfig,
        primary: ClassifierKind,
    ) -> Self {
        Self {
            source,
            models: RwLock::new(ModelSource::Lazy(model_dir.into())),
            search,
            primary,
            query_lock: Mutex::new(()),
        }
    }

    pub fn primary(&self) -> ClassifierKind {
        self.primary
    }

    async fn models(&self) -> std::result::Result<Arc<ModelBundle>, ModelError> {
        if let ModelSource::Loaded(bundle) = &*self.models.read().await {
            return Ok(Arc::clone(bundle));
        }

        let mut guard = self.models.write().await;
        let bundle = match &*guard {
            ModelSource::Loaded(bundle) => return Ok(Arc::clone(bundle)),
            ModelSource::Lazy(dir) => Arc::new(ModelBundle::load(dir)?),
        };
        *guard = ModelSource::Loaded(Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Validate raw inputs and run the query
    pub async fn run_query(
        &self,
        search_term: &str,
        date_since: &str,
        location: &str,
    ) -> Result<QueryOutcome> {
        let request = QueryRequest::parse(search_term, date_since, location)?;
        self.run(&request).await
    }

    /// Run a validated query end to end
    pub async fn run(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        let _guard = self.query_lock.lock().await;
        let start = Instant::now();

        let outcome = self.execute(request, start).await;

        let label = match &outcome {
            Ok(outcome) => outcome.as_str(),
            Err(_) => "error",
        };
        metrics::record_query(label, start.elapsed().as_secs_f64());

        outcome
    }

    async fn execute(&self, request: &QueryRequest, start: Instant) -> Result<QueryOutcome> {
        let query = SearchQuery {
            term: request.search_term.clone(),
            since: request.date_since,
            geocode: request.location.geocode(self.search.radius_km),
            language: self.search.language.clone(),
            max_posts: self.search.max_posts,
        };

        tracing::info!(
            term = %query.term,
            location = %request.location,
            geocode = ?query.geocode,
            "Running query"
        );

        let fetched = self.source.search(&query).await?;
        metrics::record_posts(fetched.posts.len(), fetched.skipped);

        if fetched.posts.is_empty() {
            tracing::info!(term = %query.term, "Query returned no posts");
            return Ok(QueryOutcome::NoResults);
        }

        let models = self.models().await?;

        let normalized: Vec<NormalizedText> =
            fetched.posts.iter().map(|p| normalize(&p.text)).collect();
        let predictions = models.classify(&normalized)?;

        let svm = Aggregate::from_predictions(&predictions.svm)
            .ok_or_else(|| Error::other("svm produced no predictions"))?;
        let logistic = Aggregate::from_predictions(&predictions.logistic)
            .ok_or_else(|| Error::other("logistic regression produced no predictions"))?;

        let posts: Vec<AnalyzedPost> = fetched
            .posts
            .into_iter()
            .zip(normalized)
            .zip(predictions.svm.iter().zip(&predictions.logistic))
            .map(|((post, normalized), (&svm, &logistic))| AnalyzedPost {
                post,
                normalized,
                svm,
                logistic,
            })
            .collect();

        let chart = ChartData::from_aggregate(match self.primary {
            ClassifierKind::Svm => &svm,
            ClassifierKind::LogisticRegression => &logistic,
        });

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            posts = posts.len(),
            positive_pct = chart.slices[0].value,
            elapsed_ms,
            "Query completed"
        );

        Ok(QueryOutcome::Results(Box::new(QueryReport {
            search_term: request.search_term.clone(),
            location: request.location.label().to_string(),
            posts,
            skipped: fetched.skipped,
            svm,
            logistic,
            primary: self.primary,
            chart,
            elapsed_ms,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_request() {
        let request = QueryRequest::parse(" coffee ", "2024-05-01", "IE").unwrap();
        assert_eq!(request.search_term, "coffee");
        assert_eq!(request.date_since, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(request.location.label(), "Ireland");
    }

    #[test]
    fn test_parse_blank_date_and_world() {
        let request = QueryRequest::parse("coffee", "", "world").unwrap();
        assert_eq!(request.date_since, None);
        assert_eq!(request.location, LocationSpec::World);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            QueryRequest::parse("   ", "", "world"),
            Err(QueryError::EmptySearchTerm)
        );
        assert_eq!(
            QueryRequest::parse("coffee", "01/05/2024", "world"),
            Err(QueryError::InvalidDate("01/05/2024".to_string()))
        );
        assert!(matches!(
            QueryRequest::parse("coffee", "", "Narnia"),
            Err(QueryError::UnknownLocation(_))
        ));
    }
}
