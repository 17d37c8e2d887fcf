//! Dictionary-based lemmatizer
//!
//! Inflected nouns are reduced to a base form in three steps: words already
//! in the lexicon are returned as-is, irregular plurals come from an exception
//! table, and regular plurals are detached with suffix rules whose result must
//! be a lexicon entry. Anything else passes through unchanged.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Embedded base-form lexicon
const LEXICON_SOURCE: &str = include_str!("../../data/noun_lexicon.txt");

/// Irregular plural forms
const EXCEPTIONS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("calves", "calf"),
    ("children", "child"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("phenomena", "phenomenon"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("thieves", "thief"),
    ("wives", "wife"),
    ("wolves", "wolf"),
];

/// Suffix detachment rules, tried in order
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
    ("s", ""),
];

static DEFAULT_LEMMATIZER: LazyLock<Lemmatizer> = LazyLock::new(Lemmatizer::new);

/// Noun lemmatizer backed by an in-memory lexicon
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    lexicon: HashSet<String>,
    exceptions: HashMap<&'static str, &'static str>,
}

impl Lemmatizer {
    /// Create a lemmatizer with the embedded lexicon
    pub fn new() -> Self {
        Self::with_lexicon(
            LEXICON_SOURCE
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Create a lemmatizer over a custom set of base forms
    pub fn with_lexicon<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lexicon: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            exceptions: EXCEPTIONS.iter().copied().collect(),
        }
    }

    /// Shared instance with the embedded lexicon
    pub fn shared() -> &'static Lemmatizer {
        &DEFAULT_LEMMATIZER
    }

    /// Number of base forms in the lexicon
    pub fn lexicon_len(&self) -> usize {
        self.lexicon.len()
    }

    /// Reduce a lowercase word to its base form
    pub fn lemmatize<'a>(&'a self, word: &'a str) -> &'a str {
        if self.lexicon.contains(word) {
            return word;
        }

        if let Some(base) = self.exceptions.get(word) {
            return *base;
        }

        for (suffix, replacement) in SUFFIX_RULES {
            if let Some(stem) = word.strip_suffix(suffix) {
                if stem.is_empty() {
                    continue;
                }
                let candidate = format!("{stem}{replacement}");
                if let Some(found) = self.lexicon.get(&candidate) {
                    return found.as_str();
                }
            }
        }

        word
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}
