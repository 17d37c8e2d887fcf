//! Offline training pipeline
//!
//! Normalizes the corpus with the serving-time normalizer, fits the shared
//! vectorizer on the training split and fits both classifiers on the same
//! feature matrix. Validation accuracy is reproducible for a fixed seed.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::dataset::Dataset;
use super::logistic::LogisticRegression;
use super::svm::LinearSvm;
use super::vectorizer::{NgramVectorizer, VectorizerOptions};
use super::{accuracy, ModelBundle};
use crate::models::Sentiment;
use crate::text::{normalize, NormalizedText};
use crate::utils::error::TrainingError;

/// Hyperparameters for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingOptions {
    pub vectorizer: VectorizerOptions,
    pub svm_c: f64,
    pub svm_max_iter: usize,
    pub logistic_c: f64,
    pub logistic_max_iter: usize,
    pub tolerance: f64,
    pub validation_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerOptions::default(),
            svm_c: 0.05,
            svm_max_iter: 1000,
            logistic_c: 0.5,
            logistic_max_iter: 250,
            tolerance: 1e-4,
            validation_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Outcome of [`train`]
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub vectorizer: NgramVectorizer,
    pub svm: LinearSvm,
    pub logistic: LogisticRegression,
    pub accuracy_svm: f64,
    pub accuracy_logistic: f64,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub elapsed_ms: u64,
}

impl TrainingReport {
    /// Package the fitted models for persistence
    pub fn into_bundle(self) -> ModelBundle {
        ModelBundle::new(self.vectorizer, self.svm, self.logistic)
    }
}

fn normalize_all(dataset: &Dataset) -> (Vec<NormalizedText>, Vec<Sentiment>) {
    dataset
        .records()
        .iter()
        .map(|r| (normalize(&r.text), r.label))
        .unzip()
}

/// Fit the vectorizer and both classifiers, reporting validation accuracy
pub fn train(dataset: &Dataset, options: &TrainingOptions) -> Result<TrainingReport, TrainingError> {
    let start = Instant::now();
    let (train_set, validation_set) = dataset.split(options.validation_fraction, options.seed)?;

    tracing::info!(
        train_rows = train_set.len(),
        validation_rows = validation_set.len(),
        seed = options.seed,
        "Starting training"
    );

    let (train_texts, train_labels) = normalize_all(&train_set);
    let (validation_texts, validation_labels) = normalize_all(&validation_set);

    let mut vectorizer = NgramVectorizer::new(options.vectorizer);
    let x_train = vectorizer.fit_transform(&train_texts)?;
    let digest = vectorizer.digest();

    tracing::info!(features = vectorizer.len(), "Vocabulary built");

    let mut svm = LinearSvm::new(options.svm_c, options.svm_max_iter, options.tolerance);
    svm.fit(&x_train, &train_labels, &digest)?;

    let mut logistic =
        LogisticRegression::new(options.logistic_c, options.logistic_max_iter, options.tolerance);
    logistic.fit(&x_train, &train_labels, &digest)?;

    let bundle = ModelBundle::new(vectorizer, svm, logistic);
    let predictions = bundle
        .classify(&validation_texts)
        .map_err(|e| TrainingError::InvalidParameter {
            name: "validation".to_string(),
            reason: e.to_string(),
        })?;

    let accuracy_svm = accuracy(&predictions.svm, &validation_labels);
    let accuracy_logistic = accuracy(&predictions.logistic, &validation_labels);
    let elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        accuracy_svm,
        accuracy_logistic,
        elapsed_ms,
        "Training completed"
    );

    let ModelBundle {
        vectorizer,
        svm,
        logistic,
    } = bundle;

    Ok(TrainingReport {
        vectorizer,
        svm,
        logistic,
        accuracy_svm,
        accuracy_logistic,
        train_rows: train_set.len(),
        validation_rows: validation_set.len(),
        elapsed_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::dataset::LabeledText;
    use crate::ml::Classifier;

    fn small_dataset() -> Dataset {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(LabeledText::new(
                format!("great lovely flight {i}"),
                Sentiment::Positive,
            ));
            records.push(LabeledText::new(
                format!("awful rude delay {i}"),
                Sentiment::Negative,
            ));
            records.push(LabeledText::new(
                format!("boarding gate schedule {i}"),
                Sentiment::Neutral,
            ));
        }
        Dataset::new(records)
    }

    #[test]
    fn test_train_small_dataset() {
        let report = train(&small_dataset(), &TrainingOptions::default()).unwrap();
        assert_eq!(report.train_rows, 24);
        assert_eq!(report.validation_rows, 6);
        assert!(report.vectorizer.len() <= 500);
        assert_eq!(report.svm.n_features(), report.vectorizer.len());
        assert_eq!(report.logistic.vocabulary_digest(), report.vectorizer.digest());
        assert!(report.accuracy_svm > 0.8, "svm accuracy {}", report.accuracy_svm);
        assert!(
            report.accuracy_logistic > 0.8,
            "logistic accuracy {}",
            report.accuracy_logistic
        );
    }

    #[test]
    fn test_same_seed_same_accuracy() {
        let options = TrainingOptions::default();
        let a = train(&small_dataset(), &options).unwrap();
        let b = train(&small_dataset(), &options).unwrap();
        assert_eq!(a.accuracy_svm, b.accuracy_svm);
        assert_eq!(a.accuracy_logistic, b.accuracy_logistic);
        assert_eq!(a.vectorizer.vocabulary(), b.vectorizer.vocabulary());
        assert_eq!(a.svm.weights(), b.svm.weights());
    }

    #[test]
    fn test_too_small() {
        let dataset = Dataset::new(vec![LabeledText::new("great", Sentiment::Positive)]);
        assert!(matches!(
            train(&dataset, &TrainingOptions::default()),
            Err(TrainingError::DatasetTooSmall { .. })
        ));
    }
}
