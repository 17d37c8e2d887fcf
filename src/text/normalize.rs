//! Post text normalization
//!
//! `normalize` lowercases, strips edge punctuation, removes stopwords and
//! lemmatizes. It is infallible and idempotent:
//! `normalize(normalize(x)) == normalize(x)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lemmatize::Lemmatizer;
use super::stopwords::is_stopword;

/// Version of the normalization rules; bump whenever output can change
pub const NORMALIZER_VERSION: u32 = 1;

/// Symbols stripped from both ends of every token
pub const STRIP_SYMBOLS: &str = "!\"#$%&'()*+,-./?:;<=>[\\]^_`{|}~";

/// Text that has been through [`normalize`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokens of the normalized text
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|t| !t.is_empty())
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a post's text with the shared lemmatizer
///
/// # Examples
///
/// ```
/// use sentiscope::text::normalize;
///
/// assert_eq!(normalize("I absolutely Love this!! :)").as_str(), "absolutely love");
/// assert!(normalize("the, and... is!").is_empty());
/// ```
pub fn normalize(text: &str) -> NormalizedText {
    normalize_with(text, Lemmatizer::shared())
}

/// Normalize with an explicit lemmatizer
pub fn normalize_with(text: &str, lemmatizer: &Lemmatizer) -> NormalizedText {
    normalize_tokens(text, lemmatizer, &|_| false)
}

/// Normalize, but keep stopwords for which `keep` returns true
///
/// Polarity scoring needs negations such as "no" that the shared normalizer
/// drops. The output is not what the classifiers were trained on.
///
/// ```
/// use sentiscope::text::{normalize, normalize_keeping};
///
/// assert_eq!(normalize("no good").as_str(), "good");
/// assert_eq!(normalize_keeping("no good", |w| w == "no").as_str(), "no good");
/// ```
pub fn normalize_keeping(text: &str, keep: impl Fn(&str) -> bool) -> NormalizedText {
    normalize_tokens(text, Lemmatizer::shared(), &keep)
}

fn normalize_tokens(
    text: &str,
    lemmatizer: &Lemmatizer,
    keep: &dyn Fn(&str) -> bool,
) -> NormalizedText {
    let mut kept: Vec<String> = Vec::new();

    for raw in text.split_whitespace() {
        let lowered = raw.to_lowercase();
        let stripped = strip_symbols(&lowered);

        if stripped.is_empty() || (is_stopword(stripped) && !keep(stripped)) {
            continue;
        }

        let lemma = lemmatizer.lemmatize(stripped);
        if is_stopword(lemma) && !keep(lemma) {
            continue;
        }

        kept.push(lemma.to_string());
    }

    NormalizedText(kept.join(" "))
}

fn strip_symbols(token: &str) -> &str {
    token.trim_matches(|c: char| STRIP_SYMBOLS.contains(c))
}
