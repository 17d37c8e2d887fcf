//! Sentiment models
//!
//! One frozen [`NgramVectorizer`] feeds two independently trained linear
//! classifiers. Both map a vectorized batch to one [`Sentiment`] per row.

pub mod artifacts;
pub mod dataset;
pub mod logistic;
pub mod svm;
pub mod training;
pub mod vectorizer;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::models::Sentiment;
use crate::utils::error::ModelError;

pub use artifacts::ModelBundle;
pub use dataset::{Dataset, LabeledText};
pub use logistic::LogisticRegression;
pub use svm::LinearSvm;
pub use training::{train, TrainingOptions, TrainingReport};
pub use vectorizer::{NgramVectorizer, VectorizerOptions};

/// Number of sentiment classes
pub const N_CLASSES: usize = 3;

/// A trained multi-class sentiment classifier
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and artifact names
    fn name(&self) -> &'static str;

    /// Number of input features the model was trained on
    fn n_features(&self) -> usize;

    /// Digest of the vocabulary the model was trained against
    fn vocabulary_digest(&self) -> &str;

    /// Raw per-class scores, shape `(rows, N_CLASSES)`
    fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError>;

    /// One label per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<Sentiment>, ModelError> {
        let scores = self.decision_function(x)?;
        Ok(scores
            .axis_iter(Axis(0))
            .map(|row| {
                Sentiment::from_index(argmax(row.iter().copied())).unwrap_or(Sentiment::Neutral)
            })
            .collect())
    }
}

/// Index of the largest value, first one on ties
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, value) in values.enumerate() {
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}

/// Weight matrix and intercepts shared by both linear models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearWeights {
    /// Shape `(N_CLASSES, n_features)`
    pub weights: Array2<f64>,
    pub intercepts: Array1<f64>,
    pub vocabulary_digest: String,
}

impl LinearWeights {
    pub fn zeros(n_features: usize, vocabulary_digest: impl Into<String>) -> Self {
        Self {
            weights: Array2::zeros((N_CLASSES, n_features)),
            intercepts: Array1::zeros(N_CLASSES),
            vocabulary_digest: vocabulary_digest.into(),
        }
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    /// `x · Wᵀ + b`
    pub fn scores(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        if x.ncols() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.weights.t()) + &self.intercepts)
    }
}

/// Gradient-descent step size bound for a batch
///
/// Returns the largest squared row norm of `x`, counting the intercept column.
pub(crate) fn max_row_norm_sq(x: &Array2<f64>) -> f64 {
    x.axis_iter(Axis(0))
        .map(|row| row.dot(&row) + 1.0)
        .fold(1.0, f64::max)
}

/// Fraction of predictions equal to the expected labels
pub fn accuracy(predicted: &[Sentiment], expected: &[Sentiment]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(expected)
        .filter(|(p, e)| p == e)
        .count();
    correct as f64 / expected.len() as f64
}
