//! Fitted preprocessing and model, trained together and served together

use crate::dataset::Dataset;
use crate::error::{PredictorError, Result};
use crate::preprocessing::{DataPreprocessor, FittedPreprocessor, PreprocessingConfig};
use crate::record::TreatmentRequest;
use crate::schema::ResolvedSchema;
use crate::training::{ForestConfig, MultiOutputRegressor, RandomForest, RegressionMetrics};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::info;

/// Predicted values for one request, in target order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub targets: Vec<String>,
    pub values: Vec<f64>,
}

impl Prediction {
    /// Value for a target by name
    pub fn get(&self, target: &str) -> Option<f64> {
        self.targets
            .iter()
            .position(|t| t == target)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.targets.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (target, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:.2}", target, value)?;
        }
        Ok(())
    }
}

/// Everything a request needs: the resolved schema, the frozen
/// preprocessing and the per-target forests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    schema: ResolvedSchema,
    preprocessor: FittedPreprocessor,
    model: MultiOutputRegressor<RandomForest>,
    training_rows: usize,
    fit_time: f64,
}

impl FittedPipeline {
    /// Fit preprocessing and model on a loaded dataset
    pub fn fit(dataset: &Dataset, preprocessing: &PreprocessingConfig, forest: &ForestConfig) -> Result<Self> {
        let start = Instant::now();
        let schema = dataset.schema().clone();

        let features = dataset.features()?;
        let y = dataset.targets()?;

        let (preprocessor, x) = DataPreprocessor::with_config(preprocessing.clone()).fit_transform(&features, &schema)?;

        let mut model = MultiOutputRegressor::new(RandomForest::new(forest.clone()));
        model.fit(&x, &y, &schema.targets)?;

        let fit_time = start.elapsed().as_secs_f64();
        info!(
            rows = dataset.n_rows(),
            features = preprocessor.n_features_out(),
            targets = schema.n_targets(),
            trees = forest.n_estimators,
            fit_time,
            "Pipeline fitted"
        );

        Ok(Self {
            schema,
            preprocessor,
            model,
            training_rows: dataset.n_rows(),
            fit_time,
        })
    }

    /// Predict every available target for one request
    pub fn predict(&self, request: &TreatmentRequest) -> Result<Prediction> {
        let mut predictions = self.predict_batch(std::slice::from_ref(request))?;
        predictions.pop().ok_or_else(|| {
            PredictorError::DataError("empty prediction for a single request".to_string())
        })
    }

    /// Predict a batch of requests against the same fitted artifacts
    pub fn predict_batch(&self, requests: &[TreatmentRequest]) -> Result<Vec<Prediction>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let frame = TreatmentRequest::batch_to_frame(requests, &self.schema)?;
        let x = self.preprocessor.transform(&frame)?;
        let y = self.model.predict(&x)?;

        Ok(y
            .rows()
            .into_iter()
            .map(|row| Prediction {
                targets: self.schema.targets.clone(),
                values: row.to_vec(),
            })
            .collect())
    }

    /// Per-target fit quality on the data the pipeline was trained on
    pub fn in_sample_metrics(&self, dataset: &Dataset) -> Result<Vec<(String, RegressionMetrics)>> {
        let x = self.preprocessor.transform(&dataset.features()?)?;
        let metrics = self.model.in_sample_metrics(&x, &dataset.targets()?)?;
        Ok(self.schema.targets.iter().cloned().zip(metrics).collect())
    }

    /// Importances for one target keyed by preprocessed column name,
    /// highest first
    pub fn feature_importances(&self, target: &str) -> Option<Vec<(String, f64)>> {
        let importances = self.model.feature_importances(target)?;
        let mut ranked: Vec<(String, f64)> = self
            .preprocessor
            .output_feature_names()
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(ranked)
    }

    /// A request built from training means and modes
    pub fn typical_request(&self) -> TreatmentRequest {
        self.preprocessor.typical_request()
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    pub fn preprocessor(&self) -> &FittedPreprocessor {
        &self.preprocessor
    }

    pub fn model(&self) -> &MultiOutputRegressor<RandomForest> {
        &self.model
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    /// Seconds spent fitting
    pub fn fit_time(&self) -> f64 {
        self.fit_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetLoader;
    use crate::preprocessing::UnknownCategoryPolicy;
    use crate::schema::{DeclaredSchema, SchemaMode};
    use polars::prelude::*;

    fn dataset() -> Dataset {
        let df = df!(
            "dose" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            "mode" => &["A", "B", "A", "B", "A", "B", "A", "B"],
            "out" => &[10.0, 40.0, 30.0, 80.0, 50.0, 120.0, 70.0, 160.0],
            "twice" => &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0]
        )
        .unwrap();
        let declared = DeclaredSchema::new(["dose", "mode"], ["out", "twice"], ["mode"]);
        DatasetLoader::new(declared, SchemaMode::Strict).from_frame(&df).unwrap()
    }

    fn fit() -> FittedPipeline {
        FittedPipeline::fit(&dataset(), &PreprocessingConfig::default(), &ForestConfig::new().with_n_estimators(20)).unwrap()
    }

    #[test]
    fn test_prediction_lookup_and_display() {
        let prediction = Prediction {
            targets: vec!["a".into(), "b".into()],
            values: vec![1.0, 2.5],
        };
        assert_eq!(prediction.get("b"), Some(2.5));
        assert_eq!(prediction.get("c"), None);
        assert_eq!(prediction.to_string(), "a: 1.00, b: 2.50");
    }

    #[test]
    fn test_predict_orders_targets() {
        let pipeline = fit();
        let request = TreatmentRequest::new().with("dose", 4.0).with("mode", "B");
        let prediction = pipeline.predict(&request).unwrap();
        assert_eq!(prediction.targets, vec!["out", "twice"]);
        assert!(prediction.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_batch_matches_single() {
        let pipeline = fit();
        let a = TreatmentRequest::new().with("dose", 2.0).with("mode", "A");
        let b = TreatmentRequest::new().with("dose", 7.0).with("mode", "B");

        let batch = pipeline.predict_batch(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(batch, vec![pipeline.predict(&a).unwrap(), pipeline.predict(&b).unwrap()]);
        assert!(pipeline.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_feature_is_request_error() {
        let pipeline = fit();
        let err = pipeline.predict(&TreatmentRequest::new().with("dose", 2.0)).unwrap_err();
        assert!(matches!(err, PredictorError::SchemaMismatch(ref c) if c == "mode"));
        assert!(err.is_request_error());
    }

    #[test]
    fn test_metrics_and_importances() {
        let data = dataset();
        let pipeline = fit();
        let metrics = pipeline.in_sample_metrics(&data).unwrap();
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|(_, m)| m.r2 > 0.5));

        let ranked = pipeline.feature_importances("twice").unwrap();
        assert_eq!(ranked[0].0, "dose");
        assert_eq!(pipeline.training_rows(), 8);
    }

    #[test]
    fn test_numeric_request_matches_float_category() {
        let df = df!(
            "dose" => &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "level" => &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0],
            "out" => &[10.0, 40.0, 30.0, 80.0, 50.0, 120.0]
        )
        .unwrap();
        let declared = DeclaredSchema::new(["dose", "level"], ["out"], ["level"]);
        let data = DatasetLoader::new(declared, SchemaMode::Strict).from_frame(&df).unwrap();
        let config = PreprocessingConfig::default().with_unknown_categories(UnknownCategoryPolicy::Error);
        let pipeline = FittedPipeline::fit(&data, &config, &ForestConfig::new().with_n_estimators(10)).unwrap();

        let as_number = TreatmentRequest::new().with("dose", 3.0).with("level", 2.0);
        let as_text = TreatmentRequest::new().with("dose", 3.0).with("level", "2");
        assert_eq!(pipeline.predict(&as_number).unwrap(), pipeline.predict(&as_text).unwrap());
    }
}
