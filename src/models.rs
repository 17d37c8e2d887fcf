// Core data structures for sentiscope

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::text::NormalizedText;

/// A social media post as fetched from the API
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Post {
    pub id: u64,
    pub text: String,
    pub author_handle: String,
    pub author_location: Option<String>,
}

/// Sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// All labels in chart order
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    /// Stable class index used by the classifiers
    pub fn index(&self) -> usize {
        match self {
            Self::Positive => 0,
            Self::Negative => 1,
            Self::Neutral => 2,
        }
    }

    /// Inverse of [`Sentiment::index`]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Label for a lexicon polarity score
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > 0.0 {
            Self::Positive
        } else if polarity < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" => Ok(Self::Positive),
            "negative" | "neg" => Ok(Self::Negative),
            "neutral" | "neu" => Ok(Self::Neutral),
            other => Err(other.to_string()),
        }
    }
}

/// Which trained model a prediction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Svm,
    LogisticRegression,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svm => "svm",
            Self::LogisticRegression => "logistic_regression",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Svm => "Linear SVM",
            Self::LogisticRegression => "Logistic Regression",
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "svm" | "linear_svm" => Ok(Self::Svm),
            "logr" | "logistic" | "logistic_regression" => Ok(Self::LogisticRegression),
            other => Err(format!("unknown classifier '{other}'")),
        }
    }
}

/// A post after normalization and classification by both models
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedPost {
    pub post: Post,
    pub normalized: NormalizedText,
    pub svm: Sentiment,
    pub logistic: Sentiment,
}
