//! Persisted model artifacts
//!
//! A model directory holds three JSON files: the fitted vectorizer and one
//! file per classifier. [`ModelBundle::load`] refuses any combination that
//! was not produced together by the same training run and normalizer.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::logistic::LogisticRegression;
use super::svm::LinearSvm;
use super::vectorizer::NgramVectorizer;
use super::Classifier;
use crate::models::Sentiment;
use crate::text::{NormalizedText, NORMALIZER_VERSION};
use crate::utils::error::ModelError;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const SVM_FILE: &str = "svm_classifier.json";
pub const LOGISTIC_FILE: &str = "logr_classifier.json";

/// Predictions of both classifiers for one batch, row-aligned with the input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPredictions {
    pub svm: Vec<Sentiment>,
    pub logistic: Vec<Sentiment>,
}

/// The vectorizer and both classifiers, validated against each other
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub vectorizer: NgramVectorizer,
    pub svm: LinearSvm,
    pub logistic: LogisticRegression,
}

impl ModelBundle {
    pub fn new(vectorizer: NgramVectorizer, svm: LinearSvm, logistic: LogisticRegression) -> Self {
        Self {
            vectorizer,
            svm,
            logistic,
        }
    }

    /// Check that the three artifacts belong together
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.vectorizer.normalizer_version() != NORMALIZER_VERSION {
            return Err(ModelError::NormalizerMismatch {
                expected: NORMALIZER_VERSION,
                found: self.vectorizer.normalizer_version(),
            });
        }

        let digest = self.vectorizer.digest();
        let classifiers: [&dyn Classifier; 2] = [&self.svm, &self.logistic];
        for classifier in classifiers {
            if classifier.n_features() == 0 {
                return Err(ModelError::NotFitted);
            }
            if classifier.n_features() != self.vectorizer.len() {
                return Err(ModelError::VocabularyMismatch {
                    model: classifier.name().to_string(),
                    reason: format!(
                        "{} features, vectorizer has {}",
                        classifier.n_features(),
                        self.vectorizer.len()
                    ),
                });
            }
            if classifier.vocabulary_digest() != digest {
                return Err(ModelError::VocabularyMismatch {
                    model: classifier.name().to_string(),
                    reason: "vocabulary digest differs from the vectorizer's".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Load and validate the artifacts in `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let dir = dir.as_ref();
        let bundle = Self {
            vectorizer: read_artifact(&dir.join(VECTORIZER_FILE))?,
            svm: read_artifact(&dir.join(SVM_FILE))?,
            logistic: read_artifact(&dir.join(LOGISTIC_FILE))?,
        };
        bundle.validate()?;

        tracing::info!(
            dir = %dir.display(),
            features = bundle.vectorizer.len(),
            "Model artifacts loaded"
        );
        Ok(bundle)
    }

    /// Write all three artifacts into `dir`, creating it if needed
    pub fn save(&self, dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let paths = vec![
            write_artifact(&dir.join(VECTORIZER_FILE), &self.vectorizer)?,
            write_artifact(&dir.join(SVM_FILE), &self.svm)?,
            write_artifact(&dir.join(LOGISTIC_FILE), &self.logistic)?,
        ];

        tracing::info!(dir = %dir.display(), "Model artifacts saved");
        Ok(paths)
    }

    /// Vectorize a batch once and classify it with both models
    pub fn classify(&self, texts: &[NormalizedText]) -> Result<BatchPredictions, ModelError> {
        if texts.is_empty() {
            return Ok(BatchPredictions::default());
        }

        let features = self.vectorizer.transform(texts)?;
        Ok(BatchPredictions {
            svm: self.svm.predict(&features)?,
            logistic: self.logistic.predict(&features)?,
        })
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ModelError::MissingArtifact {
            path: path.display().to_string(),
        },
        _ => ModelError::CorruptArtifact {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| ModelError::CorruptArtifact {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn write_artifact<T: Serialize>(path: &Path, value: &T) -> std::io::Result<PathBuf> {
    // Write to temp file first, then rename
    let temp_path = path.with_extension("json.tmp");
    let mut writer = BufWriter::new(File::create(&temp_path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    fs::rename(&temp_path, path)?;

    tracing::debug!(path = %path.display(), "Artifact written");
    Ok(path.to_path_buf())
}
