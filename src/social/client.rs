//! REST client for the social media API
//!
//! Features:
//! - OAuth 1.0a signed requests
//! - Rate limiting with governor
//! - Waits out HTTP 429 until `x-rate-limit-reset`
//! - Exponential backoff for 5xx and transport failures
//! - Per-status decoding: malformed statuses are skipped, not fatal

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::AUTHORIZATION, Client, Method, Response, StatusCode};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

use super::oauth::{authorization_header, Credentials};
use super::{PostSource, SearchQuery, SearchResults};
use crate::models::Post;
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Default REST endpoint
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";

/// Default streaming endpoint
pub const DEFAULT_STREAM_BASE: &str = "https://stream.twitter.com/1.1";

/// Largest page the search endpoint returns
const PAGE_SIZE: usize = 100;

/// Consecutive 429 responses tolerated before giving up
const MAX_RATE_LIMIT_WAITS: u32 = 10;

/// Client tuning knobs
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_base_url: String,
    pub stream_base_url: String,
    pub requests_per_second: u32,
    pub timeout: Duration,
    pub retry: RetryConfig,
    /// Longest single wait for a rate-limit window to reset
    pub max_rate_limit_wait: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            stream_base_url: DEFAULT_STREAM_BASE.to_string(),
            requests_per_second: 1,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            max_rate_limit_wait: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    screen_name: String,
    #[serde(default)]
    location: Option<String>,
}

/// A status as delivered by the search and stream endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct RawStatus {
    id: u64,
    #[serde(default)]
    full_text: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    extended_tweet: Option<ExtendedTweet>,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct ExtendedTweet {
    full_text: String,
}

impl RawStatus {
    pub(crate) fn into_post(self) -> Result<Post, FetchError> {
        let text = self
            .extended_tweet
            .map(|e| e.full_text)
            .or(self.full_text)
            .or(self.text)
            .ok_or_else(|| FetchError::Decode(format!("status {} has no text", self.id)))?;

        Ok(Post {
            id: self.id,
            text,
            author_handle: self.user.screen_name,
            author_location: self.user.location.filter(|l| !l.trim().is_empty()),
        })
    }
}

/// Decode one status, reporting why it was rejected
pub(crate) fn decode_status(value: serde_json::Value) -> Result<Post, FetchError> {
    serde_json::from_value::<RawStatus>(value)
        .map_err(|e| FetchError::Decode(e.to_string()))?
        .into_post()
}

/// Authenticated client for the search, account and stream endpoints
pub struct TwitterClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    credentials: Credentials,
    options: ClientOptions,
}

impl TwitterClient {
    /// Create a client with default options
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(credentials: Credentials) -> Result<Self, FetchError> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Create a client with custom options
    pub fn with_options(
        credentials: Credentials,
        options: ClientOptions,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(options.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            credentials,
            options,
        })
    }

    /// Create a client that sends every request to `base_url`, for testing
    pub fn with_base_url(credentials: Credentials, base_url: &str) -> Result<Self, FetchError> {
        let options = ClientOptions {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            stream_base_url: base_url.trim_end_matches('/').to_string(),
            requests_per_second: 1000,
            retry: RetryConfig::with_delays(2, 1, 10),
            ..Default::default()
        };
        Self::with_options(credentials, options)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Check the credentials, returning the account's handle
    pub async fn verify_credentials(&self) -> Result<String, FetchError> {
        #[derive(Deserialize)]
        struct Account {
            screen_name: String,
        }

        let url = format!("{}/account/verify_credentials.json", self.options.api_base_url);
        let response = self.send_with_retry(Method::GET, &url, &[]).await?;
        let account: Account = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        tracing::info!(account = %account.screen_name, "Credentials verified");
        Ok(account.screen_name)
    }

    /// Open the filtered stream; the caller reads the body line by line
    pub async fn open_filter_stream(
        &self,
        locations: &str,
        language: &str,
    ) -> Result<Response, FetchError> {
        let url = format!("{}/statuses/filter.json", self.options.stream_base_url);
        let params = vec![
            ("language".to_string(), language.to_string()),
            ("locations".to_string(), locations.to_string()),
        ];
        self.send_with_retry(Method::POST, &url, &params).await
    }

    /// Send a signed request, retrying transient failures
    ///
    /// Rate-limit waits happen inside a single attempt and do not use up the
    /// retry budget.
    async fn send_with_retry(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Response, FetchError> {
        let retry = &self.options.retry;

        with_retry_if(retry, || self.send_once(&method, url, params), Self::is_transient)
            .await
            .map_err(|error| {
                if Self::is_transient(&error) {
                    FetchError::MaxRetriesExceeded {
                        attempts: retry.max_retries + 1,
                        last: Box::new(error),
                    }
                } else {
                    error
                }
            })
    }

    /// One signed request, waiting out any 429 responses
    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Response, FetchError> {
        let mut rate_limit_waits = 0;

        loop {
            self.rate_limiter.until_ready().await;

            let header = authorization_header(&self.credentials, method.as_str(), url, params);
            let request = if *method == Method::GET {
                self.client.get(url).query(params)
            } else {
                self.client.request(method.clone(), url).form(params)
            };

            let response = match request.header(AUTHORIZATION, header).send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => return Err(FetchError::Timeout),
                Err(e) => return Err(FetchError::Http(e)),
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    return Err(FetchError::Unauthorized(status.as_u16()));
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    rate_limit_waits += 1;
                    if rate_limit_waits > MAX_RATE_LIMIT_WAITS {
                        return Err(FetchError::RateLimit);
                    }
                    let wait = self.rate_limit_wait(&response)?;
                    tracing::warn!(
                        wait_secs = wait.as_secs(),
                        url = %url,
                        "Rate limited, waiting for the window to reset"
                    );
                    tokio::time::sleep(wait).await;
                }
                _ => return Err(FetchError::ServerError(status.as_u16())),
            }
        }
    }

    /// Errors worth another attempt: 5xx, timeouts and transport failures
    fn is_transient(error: &FetchError) -> bool {
        match error {
            FetchError::ServerError(status) => Self::should_retry(*status),
            FetchError::Timeout | FetchError::Http(_) => true,
            _ => false,
        }
    }

    /// Time until the rate-limit window resets, from `x-rate-limit-reset`
    fn rate_limit_wait(&self, response: &Response) -> Result<Duration, FetchError> {
        let reset = response
            .headers()
            .get("x-rate-limit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok());

        let wait = match reset {
            Some(reset_at) => {
                let secs = (reset_at - chrono::Utc::now().timestamp()).max(0) as u64;
                Duration::from_secs(secs)
            }
            None => self.options.retry.delay_for(1),
        };

        if wait > self.options.max_rate_limit_wait {
            return Err(FetchError::RateLimit);
        }
        Ok(wait)
    }

    /// Determine if a status code should trigger a retry
    fn should_retry(status: u16) -> bool {
        matches!(status, 500 | 502 | 503 | 504)
    }

    /// Fetch one page of search results
    async fn search_page(
        &self,
        query: &SearchQuery,
        count: usize,
        max_id: Option<u64>,
    ) -> Result<Vec<serde_json::Value>, FetchError> {
        let url = format!("{}/search/tweets.json", self.options.api_base_url);

        let mut params = vec![
            ("q".to_string(), query.expression()),
            ("lang".to_string(), query.language.clone()),
            ("count".to_string(), count.to_string()),
            ("result_type".to_string(), "recent".to_string()),
            ("tweet_mode".to_string(), "extended".to_string()),
        ];
        if let Some(geocode) = &query.geocode {
            params.push(("geocode".to_string(), geocode.clone()));
        }
        if let Some(max_id) = max_id {
            params.push(("max_id".to_string(), max_id.to_string()));
        }

        let response = self.send_with_retry(Method::GET, &url, &params).await?;
        let page: SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(page.statuses)
    }
}

#[async_trait]
impl PostSource for TwitterClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, FetchError> {
        let mut results = SearchResults::default();
        let mut max_id: Option<u64> = None;

        while results.posts.len() < query.max_posts {
            let wanted = (query.max_posts - results.posts.len()).min(PAGE_SIZE);
            let page = self.search_page(query, wanted, max_id).await?;
            if page.is_empty() {
                break;
            }

            let mut lowest_id: Option<u64> = None;
            for value in page {
                // Keep paging from the raw id even when the status is unusable
                let raw_id = value.get("id").and_then(serde_json::Value::as_u64);
                if let Some(id) = raw_id {
                    lowest_id = Some(lowest_id.map_or(id, |low| low.min(id)));
                }

                match decode_status(value) {
                    Ok(post) if results.posts.len() < query.max_posts => results.posts.push(post),
                    Ok(_) => {}
                    Err(e) => {
                        results.skipped += 1;
                        tracing::warn!(id = ?raw_id, error = %e, "Skipping undecodable status");
                    }
                }
            }

            match lowest_id {
                Some(id) if id > 0 && Some(id - 1) != max_id => max_id = Some(id - 1),
                _ => break,
            }
        }

        tracing::info!(
            term = %query.term,
            fetched = results.posts.len(),
            skipped = results.skipped,
            "Search completed"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_should_retry() {
        assert!(TwitterClient::should_retry(500));
        assert!(TwitterClient::should_retry(503));
        assert!(!TwitterClient::should_retry(404));
        assert!(!TwitterClient::should_retry(400));
    }

    #[test]
    fn test_is_transient() {
        assert!(TwitterClient::is_transient(&FetchError::ServerError(503)));
        assert!(TwitterClient::is_transient(&FetchError::Timeout));
        assert!(!TwitterClient::is_transient(&FetchError::ServerError(404)));
        assert!(!TwitterClient::is_transient(&FetchError::Unauthorized(401)));
        assert!(!TwitterClient::is_transient(&FetchError::RateLimit));
    }

    #[test]
    fn test_decode_prefers_full_text() {
        let post = decode_status(json!({
            "id": 7,
            "full_text": "long version",
            "text": "short",
            "user": {"screen_name": "alice", "location": "Dublin"}
        }))
        .unwrap();
        assert_eq!(post.text, "long version");
        assert_eq!(post.author_handle, "alice");
        assert_eq!(post.author_location.as_deref(), Some("Dublin"));
    }

    #[test]
    fn test_decode_extended_tweet() {
        let post = decode_status(json!({
            "id": 8,
            "text": "truncated…",
            "extended_tweet": {"full_text": "the whole thing"},
            "user": {"screen_name": "bob", "location": ""}
        }))
        .unwrap();
        assert_eq!(post.text, "the whole thing");
        assert_eq!(post.author_location, None);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_status(json!({"id": 1, "user": {"screen_name": "x"}})).is_err());
        assert!(decode_status(json!({"id": "nope", "text": "hi"})).is_err());
        assert!(decode_status(json!({"delete": {}})).is_err());
    }
}
