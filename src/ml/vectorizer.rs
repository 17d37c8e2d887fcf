//! Binary bag-of-n-grams vectorizer
//!
//! The vocabulary is built once from the training corpus and frozen. At
//! serving time n-grams outside the vocabulary are dropped, never added.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use crate::text::{NormalizedText, NORMALIZER_VERSION};
use crate::utils::error::{ModelError, TrainingError};

/// Vectorizer hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerOptions {
    /// Smallest n-gram length
    pub ngram_min: usize,
    /// Largest n-gram length
    pub ngram_max: usize,
    /// Vocabulary cap, ranked by document frequency
    pub max_features: usize,
    /// Emit presence (1.0) instead of counts
    pub binary: bool,
}

impl Default for VectorizerOptions {
    fn default() -> Self {
        Self {
            ngram_min: 1,
            ngram_max: 3,
            max_features: 500,
            binary: true,
        }
    }
}

impl VectorizerOptions {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.ngram_min == 0 || self.ngram_min > self.ngram_max {
            return Err(TrainingError::InvalidParameter {
                name: "ngram_range".to_string(),
                reason: format!("invalid range ({}, {})", self.ngram_min, self.ngram_max),
            });
        }
        if self.max_features == 0 {
            return Err(TrainingError::InvalidParameter {
                name: "max_features".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Persisted form of the vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVectorizer {
    options: VectorizerOptions,
    normalizer_version: u32,
    vocabulary: Vec<String>,
}

/// Bag-of-n-grams vectorizer over normalized text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredVectorizer", into = "StoredVectorizer")]
pub struct NgramVectorizer {
    options: VectorizerOptions,
    normalizer_version: u32,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
}

impl From<StoredVectorizer> for NgramVectorizer {
    fn from(stored: StoredVectorizer) -> Self {
        let index = build_index(&stored.vocabulary);
        Self {
            options: stored.options,
            normalizer_version: stored.normalizer_version,
            vocabulary: stored.vocabulary,
            index,
        }
    }
}

impl From<NgramVectorizer> for StoredVectorizer {
    fn from(vectorizer: NgramVectorizer) -> Self {
        Self {
            options: vectorizer.options,
            normalizer_version: vectorizer.normalizer_version,
            vocabulary: vectorizer.vocabulary,
        }
    }
}

fn build_index(vocabulary: &[String]) -> HashMap<String, usize> {
    vocabulary
        .iter()
        .enumerate()
        .map(|(i, term)| (term.clone(), i))
        .collect()
}

impl NgramVectorizer {
    /// Create an unfitted vectorizer
    pub fn new(options: VectorizerOptions) -> Self {
        Self {
            options,
            normalizer_version: NORMALIZER_VERSION,
            vocabulary: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn options(&self) -> &VectorizerOptions {
        &self.options
    }

    /// Normalizer version the vocabulary was built with
    pub fn normalizer_version(&self) -> u32 {
        self.normalizer_version
    }

    /// Vocabulary in feature-index order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Number of features produced by [`NgramVectorizer::transform`]
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Feature index of an n-gram
    pub fn feature_index(&self, ngram: &str) -> Option<usize> {
        self.index.get(ngram).copied()
    }

    /// SHA-256 of the vocabulary, used to pair classifiers with this vectorizer
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for term in &self.vocabulary {
            hasher.update(term.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    /// All n-grams of a normalized text, in order of appearance
    pub fn analyze(&self, text: &NormalizedText) -> Vec<String> {
        let tokens: Vec<&str> = text.tokens().collect();
        let mut ngrams = Vec::new();

        for n in self.options.ngram_min..=self.options.ngram_max {
            if n > tokens.len() {
                break;
            }
            ngrams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }

        ngrams
    }

    /// Build the vocabulary from a training corpus
    ///
    /// The `max_features` most frequent n-grams (by document frequency,
    /// ties broken alphabetically) are kept and indexed alphabetically.
    pub fn fit(&mut self, documents: &[NormalizedText]) -> Result<(), TrainingError> {
        self.options.validate()?;

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<String> = self.analyze(doc).into_iter().collect();
            for ngram in unique {
                *doc_freq.entry(ngram).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = doc_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.options.max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        tracing::debug!(
            documents = documents.len(),
            vocabulary = vocabulary.len(),
            "Vectorizer fitted"
        );

        self.index = build_index(&vocabulary);
        self.vocabulary = vocabulary;
        self.normalizer_version = NORMALIZER_VERSION;
        Ok(())
    }

    /// Vectorize a batch into a dense `(documents, features)` matrix
    pub fn transform(&self, documents: &[NormalizedText]) -> Result<Array2<f64>, ModelError> {
        if self.vocabulary.is_empty() {
            return Err(ModelError::NotFitted);
        }

        let mut matrix = Array2::<f64>::zeros((documents.len(), self.vocabulary.len()));

        for (row, doc) in documents.iter().enumerate() {
            for ngram in self.analyze(doc) {
                if let Some(&col) = self.index.get(&ngram) {
                    if self.options.binary {
                        matrix[[row, col]] = 1.0;
                    } else {
                        matrix[[row, col]] += 1.0;
                    }
                }
            }
        }

        Ok(matrix)
    }

    /// Fit on the corpus, then transform it
    pub fn fit_transform(
        &mut self,
        documents: &[NormalizedText],
    ) -> Result<Array2<f64>, TrainingError> {
        self.fit(documents)?;
        self.transform(documents).map_err(|e| TrainingError::InvalidParameter {
            name: "dataset".to_string(),
            reason: format!("corpus produced no features: {e}"),
        })
    }
}

impl Default for NgramVectorizer {
    fn default() -> Self {
        Self::new(VectorizerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;

    fn corpus() -> Vec<NormalizedText> {
        ["great flight crew", "great service", "awful flight delay"]
            .into_iter()
            .map(normalize)
            .collect()
    }

    #[test]
    fn test_analyze_ngrams() {
        let vectorizer = NgramVectorizer::default();
        let grams = vectorizer.analyze(&normalize("great flight crew"));
        assert_eq!(
            grams,
            vec![
                "great",
                "flight",
                "crew",
                "great flight",
                "flight crew",
                "great flight crew"
            ]
        );
        assert!(vectorizer.analyze(&normalize("")).is_empty());
    }

    #[test]
    fn test_vocabulary_alphabetical() {
        let mut vectorizer = NgramVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();
        let vocab = vectorizer.vocabulary();
        let mut sorted = vocab.to_vec();
        sorted.sort();
        assert_eq!(vocab, sorted.as_slice());
        assert!(vectorizer.feature_index("great").is_some());
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut vectorizer = NgramVectorizer::new(VectorizerOptions {
            max_features: 2,
            ..Default::default()
        });
        vectorizer.fit(&corpus()).unwrap();
        // "flight" and "great" both appear in two documents
        assert_eq!(vectorizer.vocabulary(), &["flight", "great"]);
    }

    #[test]
    fn test_transform_binary_and_oov() {
        let mut vectorizer = NgramVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();

        let matrix = vectorizer
            .transform(&[normalize("great great unknownword")])
            .unwrap();
        assert_eq!(matrix.shape(), &[1, vectorizer.len()]);

        let great = vectorizer.feature_index("great").unwrap();
        assert_eq!(matrix[[0, great]], 1.0);
        assert_eq!(matrix.sum(), 1.0);
    }

    #[test]
    fn test_transform_unfitted() {
        let vectorizer = NgramVectorizer::default();
        assert!(matches!(
            vectorizer.transform(&[normalize("hello")]),
            Err(ModelError::NotFitted)
        ));
    }

    #[test]
    fn test_serde_rebuilds_index() {
        let mut vectorizer = NgramVectorizer::default();
        vectorizer.fit(&corpus()).unwrap();

        let json = serde_json::to_string(&vectorizer).unwrap();
        assert!(!json.contains("\"index\""));
        let restored: NgramVectorizer = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.vocabulary(), vectorizer.vocabulary());
        assert_eq!(restored.digest(), vectorizer.digest());
        assert_eq!(restored.feature_index("great"), vectorizer.feature_index("great"));
    }

    #[test]
    fn test_invalid_options() {
        let mut vectorizer = NgramVectorizer::new(VectorizerOptions {
            ngram_min: 3,
            ngram_max: 1,
            ..Default::default()
        });
        assert!(vectorizer.fit(&corpus()).is_err());
    }
}
