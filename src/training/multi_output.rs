//! One independent regressor per target column

use crate::error::{PredictorError, Result};
use super::models::{RegressionMetrics, Regressor};
use super::random_forest::RandomForest;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Multi-output wrapper: clones a template regressor for each target and
/// fits every clone on the same feature matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiOutputRegressor<M = RandomForest> {
    template: M,
    estimators: Vec<M>,
    target_names: Vec<String>,
    n_features: usize,
}

impl<M: Regressor + Clone> MultiOutputRegressor<M> {
    pub fn new(template: M) -> Self {
        Self {
            template,
            estimators: Vec::new(),
            target_names: Vec::new(),
            n_features: 0,
        }
    }

    /// Fit one estimator per column of `y`; `target_names` labels the columns
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array2<f64>, target_names: &[String]) -> Result<&mut Self> {
        if x.nrows() != y.nrows() {
            return Err(PredictorError::ShapeError {
                expected: format!("{} target rows", x.nrows()),
                actual: format!("{} target rows", y.nrows()),
            });
        }
        if y.ncols() == 0 || y.ncols() != target_names.len() {
            return Err(PredictorError::ValidationError(format!(
                "{} target columns for {} target names",
                y.ncols(),
                target_names.len()
            )));
        }

        let mut estimators = Vec::with_capacity(y.ncols());
        for (column, name) in y.axis_iter(Axis(1)).zip(target_names) {
            let start = Instant::now();
            let mut estimator = self.template.clone();
            estimator
                .fit(x, &column.to_owned())
                .map_err(|e| PredictorError::TrainingError(format!("target '{}': {}", name, e)))?;
            debug!(target = %name, elapsed = ?start.elapsed(), "Fitted target estimator");
            estimators.push(estimator);
        }

        self.estimators = estimators;
        self.target_names = target_names.to_vec();
        self.n_features = x.ncols();

        info!(
            targets = self.target_names.len(),
            samples = x.nrows(),
            features = self.n_features,
            "Multi-output model fitted"
        );

        Ok(self)
    }

    /// Predict every target; columns follow the fitted target order
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.estimators.is_empty() {
            return Err(PredictorError::ModelNotFitted);
        }

        let mut out = Array2::zeros((x.nrows(), self.estimators.len()));
        for (j, estimator) in self.estimators.iter().enumerate() {
            out.column_mut(j).assign(&estimator.predict(x)?);
        }
        Ok(out)
    }

    /// Per-target metrics of the model's own predictions on `x`
    pub fn in_sample_metrics(&self, x: &Array2<f64>, y: &Array2<f64>) -> Result<Vec<RegressionMetrics>> {
        let predictions = self.predict(x)?;
        if predictions.dim() != y.dim() {
            return Err(PredictorError::ShapeError {
                expected: format!("{:?}", predictions.dim()),
                actual: format!("{:?}", y.dim()),
            });
        }

        Ok(y
            .axis_iter(Axis(1))
            .zip(predictions.axis_iter(Axis(1)))
            .map(|(truth, pred)| RegressionMetrics::compute(&truth.to_owned(), &pred.to_owned()))
            .collect())
    }

    /// Feature importances of the estimator for one target
    pub fn feature_importances(&self, target: &str) -> Option<Array1<f64>> {
        let idx = self.target_names.iter().position(|t| t == target)?;
        self.estimators[idx].feature_importances()
    }

    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    pub fn n_targets(&self) -> usize {
        self.estimators.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        !self.estimators.is_empty()
    }
}
