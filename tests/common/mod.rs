//! Common test utilities

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sentiscope::ml::{self, Dataset, LabeledText, ModelBundle, TrainingOptions};
use sentiscope::models::{Post, Sentiment};
use sentiscope::social::{PostSource, SearchQuery, SearchResults};
use sentiscope::utils::error::FetchError;

/// One token per label so any fitted model separates them
pub const POSITIVE_WORD: &str = "great";
pub const NEGATIVE_WORD: &str = "awful";
pub const NEUTRAL_WORD: &str = "schedule";

/// Small, perfectly separable dataset
pub fn separable_dataset() -> Dataset {
    let mut records = Vec::new();
    for _ in 0..10 {
        records.push(LabeledText::new(format!("{POSITIVE_WORD}!"), Sentiment::Positive));
        records.push(LabeledText::new(format!("{NEGATIVE_WORD}."), Sentiment::Negative));
        records.push(LabeledText::new(NEUTRAL_WORD.to_string(), Sentiment::Neutral));
    }
    Dataset::new(records)
}

/// Models trained on [`separable_dataset`]
pub fn trained_bundle() -> ModelBundle {
    ml::train(&separable_dataset(), &TrainingOptions::default())
        .expect("training on the separable dataset should succeed")
        .into_bundle()
}

/// Create a test post
pub fn post(id: u64, text: &str) -> Post {
    Post {
        id,
        text: text.to_string(),
        author_handle: format!("user{id}"),
        author_location: Some("Dublin".to_string()),
    }
}

/// Raw status JSON as returned by the search endpoint
#[allow(dead_code)]
pub fn status_json(id: u64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "full_text": text,
        "user": { "screen_name": format!("user{id}"), "location": "Cork" }
    })
}

/// Post source that returns a fixed result and records the queries it saw
#[allow(dead_code)]
pub struct MockSource {
    posts: Vec<Post>,
    failure: Option<fn() -> FetchError>,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<SearchQuery>>,
}

#[allow(dead_code)]
impl MockSource {
    pub fn with_posts(posts: Vec<Post>) -> Arc<Self> {
        Arc::new(Self {
            posts,
            failure: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(failure: fn() -> FetchError) -> Arc<Self> {
        Arc::new(Self {
            posts: Vec::new(),
            failure: Some(failure),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<SearchQuery> {
        self.queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PostSource for MockSource {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        if let Some(failure) = self.failure {
            return Err(failure());
        }

        Ok(SearchResults {
            posts: self.posts.iter().take(query.max_posts).cloned().collect(),
            skipped: 0,
        })
    }
}

/// Seven positive, two negative and one neutral post
#[allow(dead_code)]
pub fn seven_two_one() -> Vec<Post> {
    let mut posts = Vec::new();
    for i in 0..7 {
        posts.push(post(i, &format!("So {POSITIVE_WORD}!!")));
    }
    for i in 7..9 {
        posts.push(post(i, &format!("{NEGATIVE_WORD}...")));
    }
    posts.push(post(9, &format!("The {NEUTRAL_WORD}")));
    posts
}
