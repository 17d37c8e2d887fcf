//! Social media API access
//!
//! - [`client`] - search and credential checks against the REST API
//! - [`oauth`] - OAuth 1.0a request signing
//! - [`stream`] - live filtered stream listener

pub mod client;
pub mod oauth;
pub mod stream;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::Post;
use crate::utils::error::FetchError;

pub use client::{ClientOptions, TwitterClient};
pub use oauth::Credentials;
pub use stream::{StreamListener, StreamVerdict};

/// Parameters of a post search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub term: String,
    pub since: Option<NaiveDate>,
    /// `lat,lon,{radius}km`, `None` searches everywhere
    pub geocode: Option<String>,
    pub language: String,
    pub max_posts: usize,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            since: None,
            geocode: None,
            language: "en".to_string(),
            max_posts: 500,
        }
    }

    /// Search expression sent as `q`: the term without retweets, bounded by date
    pub fn expression(&self) -> String {
        let mut q = format!("{} -filter:retweets", self.term.trim());
        if let Some(since) = self.since {
            q.push_str(&format!(" since:{}", since.format("%Y-%m-%d")));
        }
        q
    }
}

/// Posts returned by a search
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub posts: Vec<Post>,
    /// Statuses dropped because they could not be decoded
    pub skipped: usize,
}

/// Anything that can answer a post search
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_excludes_retweets() {
        let query = SearchQuery::new("  rust lang ");
        assert_eq!(query.expression(), "rust lang -filter:retweets");
    }

    #[test]
    fn test_expression_with_since() {
        let mut query = SearchQuery::new("coffee");
        query.since = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(query.expression(), "coffee -filter:retweets since:2024-03-01");
    }
}
