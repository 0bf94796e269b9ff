//! Regressor trait and evaluation metrics

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Metrics for regression evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared; zero when the targets are constant
    pub r2: f64,
    /// Number of evaluated samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self { mse: 0.0, rmse: 0.0, mae: 0.0, r2: 0.0, n_samples };
        }

        let n = n_samples as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples,
        }
    }
}

/// Single-output regression model
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred);

        assert!((metrics.mse - 0.006).abs() < 1e-9);
        assert!((metrics.rmse - 0.006f64.sqrt()).abs() < 1e-9);
        assert!(metrics.r2 > 0.99);
        assert_eq!(metrics.n_samples, 5);
    }

    #[test]
    fn test_constant_targets() {
        let y = array![2.0, 2.0, 2.0];
        let metrics = RegressionMetrics::compute(&y, &y);
        assert_eq!(metrics.mse, 0.0);
        assert_eq!(metrics.r2, 0.0);
    }
}
