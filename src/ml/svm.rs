//! One-vs-rest linear support vector machine
//!
//! Each class gets its own hyperplane trained with the L2-regularised squared
//! hinge loss. Training is deterministic full-batch gradient descent from a
//! zero start, so identical inputs always give identical weights.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{max_row_norm_sq, Classifier, LinearWeights, N_CLASSES};
use crate::models::Sentiment;
use crate::utils::error::{ModelError, TrainingError};

/// Linear SVM classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum gradient steps
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
    model: Option<LinearWeights>,
    /// Objective value per iteration of the last fit
    #[serde(skip)]
    pub loss_history: Vec<f64>,
}

impl Default for LinearSvm {
    fn default() -> Self {
        Self::new(0.05, 1000, 1e-4)
    }
}

impl LinearSvm {
    pub fn new(c: f64, max_iter: usize, tolerance: f64) -> Self {
        Self {
            c,
            max_iter,
            tolerance,
            model: None,
            loss_history: Vec::new(),
        }
    }

    pub fn weights(&self) -> Option<&LinearWeights> {
        self.model.as_ref()
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
        let step = 1.0 / (lambda + 2.0 * max_row_norm_sq(x));

        // +1 for the sample's class, -1 for every other class
        let mut targets = Array2::<f64>::from_elem((x.nrows(), N_CLASSES), -1.0);
        for (row, label) in y.iter().enumerate() {
            targets[[row, label.index()]] = 1.0;
        }

        let mut model = LinearWeights::zeros(x.ncols(), vocabulary_digest);
        self.loss_history.clear();

        for iter in 0..self.max_iter {
            let scores = x.dot(&model.weights.t()) + &model.intercepts;
            let margins = (&targets * &scores).mapv(|m| (1.0 - m).max(0.0));

            let loss = 0.5 * lambda * model.weights.mapv(|w| w * w).sum()
                + margins.mapv(|m| m * m).sum() / n;
            self.loss_history.push(loss);

            let signed = &targets * &margins;
            let grad_w = &model.weights * lambda - signed.t().dot(x) * (2.0 / n);
            let grad_b = signed.sum_axis(Axis(0)) * (-2.0 / n);

            let largest = grad_w
                .iter()
                .chain(grad_b.iter())
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if largest < self.tolerance {
                tracing::debug!(iteration = iter, loss, "SVM converged");
                break;
            }

            model.weights.scaled_add(-step, &grad_w);
            model.intercepts.scaled_add(-step, &grad_b);
        }

        self.model = Some(model);
        Ok(())
    }
}

impl Classifier for LinearSvm {
    fn name(&self) -> &'static str {
        "svm"
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

/// Shared argument checks for both linear models
pub(crate) fn check_training_input(
    x: &Array2<f64>,
    y: &[Sentiment],
    c: f64,
    max_iter: usize,
) -> Result<(), TrainingError> {
    if x.nrows() == 0 || x.nrows() != y.len() {
        return Err(TrainingError::InvalidParameter {
            name: "y".to_string(),
            reason: format!("{} labels for {} rows", y.len(), x.nrows()),
        });
    }
    if !(c.is_finite() && c > 0.0) {
        return Err(TrainingError::InvalidParameter {
            name: "C".to_string(),
            reason: format!("must be positive, got {c}"),
        });
    }
    if max_iter == 0 {
        return Err(TrainingError::InvalidParameter {
            name: "max_iter".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use Sentiment::*;

    fn toy() -> (Array2<f64>, Vec<Sentiment>) {
        let x = array![
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ];
        let y = vec![Positive, Positive, Negative, Negative, Neutral, Neutral];
        (x, y)
    }

    #[test]
    fn test_separable_toy_problem() {
        let (x, y) = toy();
        let mut svm = LinearSvm::new(10.0, 2000, 1e-6);
        svm.fit(&x, &y, "digest").unwrap();
        assert_eq!(svm.predict(&x).unwrap(), y);
        assert_eq!(svm.n_features(), 3);
        assert_eq!(svm.vocabulary_digest(), "digest");
    }

    #[test]
    fn test_loss_decreases() {
        let (x, y) = toy();
        let mut svm = LinearSvm::default();
        svm.fit(&x, &y, "d").unwrap();
        let first = svm.loss_history[0];
        let last = *svm.loss_history.last().unwrap();
        assert!(last < first);
    }

    #[test]
    fn test_deterministic() {
        let (x, y) = toy();
        let mut a = LinearSvm::default();
        let mut b = LinearSvm::default();
        a.fit(&x, &y, "d").unwrap();
        b.fit(&x, &y, "d").unwrap();
        assert_eq!(a.weights(), b.weights());
    }

    #[test]
    fn test_unfitted_predict() {
        let svm = LinearSvm::default();
        assert!(matches!(
            svm.predict(&Array2::zeros((1, 3))),
            Err(ModelError::NotFitted)
        ));
    }

    #[test]
    fn test_invalid_input() {
        let (x, _) = toy();
        let mut svm = LinearSvm::default();
        assert!(svm.fit(&x, &[Positive], "d").is_err());
        let mut svm = LinearSvm::new(0.0, 10, 1e-4);
        let (x, y) = toy();
        assert!(svm.fit(&x, &y, "d").is_err());
    }
}
