//! Fixed English stopword list

use std::collections::HashSet;
use std::sync::LazyLock;

/// Common function words excluded from analysis
pub const STOPWORDS: &[&str] = &[
    "a", "an", "all", "and", "are", "as", "at", //
    "be", "but", "can", "do", "did", "for", //
    "get", "give", "has", "had", "have", "how", //
    "i", "if", "in", "is", "it", //
    "me", "my", "no", //
    "of", "on", "or", //
    "that", "the", "there", "this", "to", "up", //
    "was", "we", "what", "when", "why", "where", "would", "with", "will", //
    "you",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Case-insensitive stopword check
pub fn is_stopword(word: &str) -> bool {
    if word.chars().any(char::is_uppercase) {
        STOPWORD_SET.contains(word.to_lowercase().as_str())
    } else {
        STOPWORD_SET.contains(word)
    }
}
