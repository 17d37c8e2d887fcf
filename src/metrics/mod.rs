//! Prometheus metrics for the query pipeline and the web server
//!
//! This module provides metrics tracking for:
//! - Queries: outcome counts and end-to-end duration
//! - Fetching: posts retrieved and posts skipped as undecodable
//! - Web: requests by route and status
//! - Stream: verdicts by sentiment
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

struct SentiscopeMetrics {
    queries: CounterVec,
    query_duration: Histogram,
    posts_fetched: Counter,
    posts_skipped: Counter,
    http_requests: CounterVec,
    stream_verdicts: CounterVec,
}

/// `None` once registration has been attempted and failed
static METRICS: OnceLock<Option<SentiscopeMetrics>> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

fn register() -> Result<SentiscopeMetrics, prometheus::Error> {
    Ok(SentiscopeMetrics {
        queries: register_counter_vec!(
            "sentiscope_queries_total",
            "Total sentiment queries by outcome",
            &["outcome"]
        )?,
        query_duration: register_histogram!(
            "sentiscope_query_duration_seconds",
            "End-to-end query duration in seconds",
            vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
        )?,
        posts_fetched: register_counter!(
            "sentiscope_posts_fetched_total",
            "Total posts retrieved from the social media API"
        )?,
        posts_skipped: register_counter!(
            "sentiscope_posts_skipped_total",
            "Total statuses skipped because they could not be decoded"
        )?,
        http_requests: register_counter_vec!(
            "sentiscope_http_requests_total",
            "Total HTTP requests by route and status",
            &["route", "status"]
        )?,
        stream_verdicts: register_counter_vec!(
            "sentiscope_stream_verdicts_total",
            "Total streamed posts by sentiment",
            &["sentiment"]
        )?,
    })
}

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
/// On failure the error is logged and every recording function becomes a
/// no-op.
pub fn init_metrics() -> bool {
    METRICS
        .get_or_init(|| match register() {
            Ok(metrics) => {
                tracing::info!("Prometheus metrics initialized successfully");
                Some(metrics)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Metrics initialization failed, recording disabled");
                None
            }
        })
        .is_some()
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    matches!(METRICS.get(), Some(Some(_)))
}

fn metrics() -> Option<&'static SentiscopeMetrics> {
    METRICS.get().and_then(Option::as_ref)
}

// ============================================================================
// Exposition
// ============================================================================

/// Encode all registered metrics in the Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

// ============================================================================
// Recording
// ============================================================================

/// Record a finished query
pub fn record_query(outcome: &str, duration_secs: f64) {
    let Some(m) = metrics() else {
        return;
    };

    m.queries.with_label_values(&[outcome]).inc();
    m.query_duration.observe(duration_secs);
}

/// Record the result of a fetch
pub fn record_posts(fetched: usize, skipped: usize) {
    let Some(m) = metrics() else {
        return;
    };

    m.posts_fetched.inc_by(fetched as f64);
    m.posts_skipped.inc_by(skipped as f64);
}

/// Record an HTTP request served by the web server
pub fn record_http_request(route: &str, status: u16) {
    let Some(m) = metrics() else {
        return;
    };

    let status_str = status.to_string();
    m.http_requests.with_label_values(&[route, &status_str]).inc();
}

/// Record a stream verdict
pub fn record_stream_verdict(sentiment: &str) {
    let Some(m) = metrics() else {
        return;
    };

    m.stream_verdicts.with_label_values(&[sentiment]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_idempotent() {
        assert!(init_metrics());
        assert!(init_metrics());
        assert!(metrics_initialized());
    }

    #[test]
    fn test_encode_metrics() {
        init_metrics();
        record_query("results", 0.5);
        let text = encode_metrics().unwrap();
        assert!(text.contains("sentiscope_queries_total"));
    }

    #[test]
    fn test_recording_does_not_panic() {
        init_metrics();
        record_posts(10, 2);
        record_http_request("/output", 200);
        record_stream_verdict("positive");
    }
}
