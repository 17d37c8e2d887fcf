//! Live filtered stream listener
//!
//! Reads newline-delimited statuses from the filtered stream, scores each one
//! with the lexicon polarity scorer and hands the verdict to a callback.
//! Dropped connections are re-opened with exponential backoff.

use bytes::{Buf, BytesMut};
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;

use super::client::{decode_status, TwitterClient};
use crate::geo::BoundingBox;
use crate::models::Sentiment;
use crate::text::PolarityLexicon;
use crate::utils::collapse_whitespace;
use crate::utils::error::FetchError;
use crate::utils::retry::RetryConfig;

/// Verdict for one streamed post
#[derive(Debug, Clone, PartialEq)]
pub struct StreamVerdict {
    pub text: String,
    pub polarity: f64,
    pub sentiment: Sentiment,
}

impl fmt::Display for StreamVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", collapse_whitespace(&self.text), self.sentiment)
    }
}

/// Splits a chunked body into complete lines
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, blank lines dropped
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos);
            self.buffer.advance(1);

            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }

        lines
    }

    /// Bytes held back waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Listens to the filtered stream for one bounding box
pub struct StreamListener {
    client: Arc<TwitterClient>,
    bbox: BoundingBox,
    language: String,
    lexicon: PolarityLexicon,
    reconnect: RetryConfig,
}

impl StreamListener {
    pub fn new(client: Arc<TwitterClient>, bbox: BoundingBox, language: impl Into<String>) -> Self {
        Self {
            client,
            bbox,
            language: language.into(),
            lexicon: PolarityLexicon::new(),
            reconnect: RetryConfig::with_delays(10, 1000, 5 * 60 * 1000),
        }
    }

    /// Score one line of the stream, `None` for anything that is not a post
    pub fn score_line(&self, line: &str) -> Option<StreamVerdict> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed stream message");
                return None;
            }
        };

        // Control messages (limit, delete, warning) carry no user
        if value.get("user").is_none() {
            tracing::debug!("Ignoring stream control message");
            return None;
        }

        let post = match decode_status(value) {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable stream status");
                return None;
            }
        };

        let polarity = self.lexicon.score(&post.text);
        Some(StreamVerdict {
            text: post.text,
            polarity,
            sentiment: Sentiment::from_polarity(polarity),
        })
    }

    /// Consume one connection until the server closes it
    ///
    /// Returns the number of posts delivered to `on_post`.
    pub async fn consume_once<F>(&self, on_post: &mut F) -> Result<usize, FetchError>
    where
        F: FnMut(StreamVerdict),
    {
        let response = self
            .client
            .open_filter_stream(&self.bbox.locations_param(), &self.language)
            .await?;

        tracing::info!(locations = %self.bbox.locations_param(), "Stream connected");

        let mut body = response.bytes_stream();
        let mut decoder = LineDecoder::new();
        let mut delivered = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for line in decoder.push(&chunk) {
                if let Some(verdict) = self.score_line(&line) {
                    delivered += 1;
                    on_post(verdict);
                }
            }
        }

        Ok(delivered)
    }

    /// Listen until the reconnection budget is exhausted or credentials are rejected
    ///
    /// Each connection that delivered at least one post resets the backoff.
    pub async fn run<F>(&self, mut on_post: F) -> Result<(), FetchError>
    where
        F: FnMut(StreamVerdict),
    {
        let mut failures = 0;

        loop {
            let error = match self.consume_once(&mut on_post).await {
                Ok(delivered) => {
                    if delivered > 0 {
                        failures = 0;
                    }
                    FetchError::Disconnected
                }
                Err(e @ FetchError::Unauthorized(_)) => return Err(e),
                Err(e) => e,
            };

            failures += 1;
            if failures > self.reconnect.max_retries {
                tracing::error!(failures, error = %error, "Giving up on the stream");
                return Err(error);
            }

            let delay = self.reconnect.delay_for(failures);
            tracing::warn!(
                failures,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Stream dropped, reconnecting"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
