//! Multinomial logistic regression
//!
//! Softmax over the three sentiment classes with an L2 penalty on the
//! weights (intercepts are not penalised), fitted by full-batch gradient
//! descent.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::svm::check_training_input;
use super::{max_row_norm_sq, Classifier, LinearWeights, N_CLASSES};
use crate::models::Sentiment;
use crate::utils::error::{ModelError, TrainingError};

/// Logistic regression classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    pub tolerance: f64,
    model: Option<LinearWeights>,
    /// Cost history during training
    #[serde(skip)]
    pub cost_history: Vec<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(0.5, 250, 1e-4)
    }
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize, tolerance: f64) -> Self {
        Self {
            c,
            max_iter,
            tolerance,
            model: None,
            cost_history: Vec::new(),
        }
    }

    pub fn weights(&self) -> Option<&LinearWeights> {
        self.model.as_ref()
    }

    /// Row-wise softmax, shifted by the row maximum for stability
    fn softmax(scores: &Array2<f64>) -> Array2<f64> {
        let mut probs = scores.clone();
        for mut row in probs.axis_iter_mut(Axis(0)) {
            let max = row.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let total = row.sum();
            row.mapv_inplace(|v| v / total);
        }
        probs
    }

    /// Class probabilities, shape `(rows, N_CLASSES)`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        Ok(Self::softmax(&self.decision_function(x)?))
    }

    /// Fit on a vectorized batch
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[Sentiment],
        vocabulary_digest: &str,
    ) -> Result<(), TrainingError> {
        check_training_input(x, y, self.c, self.max_iter)?;

        let n = x.nrows() as f64;
        let lambda = 1.0 / (self.c * n);
        let step = 1.0 / (lambda + 0.5 * max_row_norm_sq(x));

        let mut one_hot = Array2::<f64>::zeros((x.nrows(), N_CLASSES));
        for (row, label) in y.iter().enumerate() {
            one_hot[[row, label.index()]] = 1.0;
        }

        let mut model = LinearWeights::zeros(x.ncols(), vocabulary_digest);
        self.cost_history.clear();

        for iter in 0..self.max_iter {
            let probs = Self::softmax(&(x.dot(&model.weights.t()) + &model.intercepts));

            let cross_entropy = -(&one_hot * &probs.mapv(|p| p.max(1e-15).ln())).sum() / n;
            let cost = cross_entropy + 0.5 * lambda * model.weights.mapv(|w| w * w).sum();
            self.cost_history.push(cost);

            let errors = &probs - &one_hot;
            let grad_w = errors.t().dot(x) / n + &model.weights * lambda;
            let grad_b = errors.sum_axis(Axis(0)) / n;

            let largest = grad_w
                .iter()
                .chain(grad_b.iter())
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if largest < self.tolerance {
                tracing::debug!(iteration = iter, cost, "Logistic regression converged");
                break;
            }

            model.weights.scaled_add(-step, &grad_w);
            model.intercepts.scaled_add(-step, &grad_b);
        }

        self.model = Some(model);
        Ok(())
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "logr"
    }

    fn n_features(&self) -> usize {
        self.model.as_ref().map_or(0, LinearWeights::n_features)
    }

    fn vocabulary_digest(&self) -> &str {
        self.model.as_ref().map_or("", |m| m.vocabulary_digest.as_str())
    }

    fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.model.as_ref().ok_or(ModelError::NotFitted)?.scores(x)
    }
}
