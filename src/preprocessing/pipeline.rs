//! Data preprocessing pipeline

use crate::error::{PredictorError, Result};
use crate::record::{RawValue, TreatmentRequest};
use crate::schema::ResolvedSchema;
use crate::utils::{as_f64_series, as_string_series, f64_values};
use super::{
    config::PreprocessingConfig,
    encoder::Encoder,
    imputer::{ImputeValue, Imputer},
    scaler::Scaler,
    ColumnType, FeatureStats,
};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Unfitted preprocessor: a configuration waiting for training data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
}

impl DataPreprocessor {
    /// Create a new preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    /// Create a new preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Fit imputers, scaler and encoder on the training features.
    ///
    /// Column routing comes from `schema`: its categorical features go to the
    /// categorical branch, every other feature to the numeric branch.
    pub fn fit(&self, df: &DataFrame, schema: &ResolvedSchema) -> Result<FittedPreprocessor> {
        let start = Instant::now();

        if df.height() == 0 {
            return Err(PredictorError::ValidationError(
                "cannot fit preprocessing on an empty frame".to_string(),
            ));
        }

        let numeric_columns = schema.numeric_features.clone();
        let categorical_columns = schema.categorical_features.clone();
        let input_columns = schema.features.clone();

        let df = coerce(df, &input_columns, &categorical_columns)?;

        let feature_stats = input_columns
            .iter()
            .map(|name| {
                if categorical_columns.contains(name) {
                    FeatureStats::categorical(&df, name)
                } else {
                    FeatureStats::numeric(&df, name)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut numeric_imputer = None;
        let mut scaler = None;
        let mut categorical_imputer = None;
        let mut encoder = None;
        let mut imputed = df;

        // Fit each stage on the output of the previous one
        if !numeric_columns.is_empty() {
            let cols: Vec<&str> = numeric_columns.iter().map(|s| s.as_str()).collect();

            let mut imputer = Imputer::new(self.config.numeric_impute_strategy.clone());
            imputed = imputer.fit_transform(&imputed, &cols)?;
            numeric_imputer = Some(imputer);

            let mut fitted_scaler = Scaler::new(self.config.scaler_type.clone());
            fitted_scaler.fit(&imputed, &cols)?;
            scaler = Some(fitted_scaler);
        }

        if !categorical_columns.is_empty() {
            let cols: Vec<&str> = categorical_columns.iter().map(|s| s.as_str()).collect();

            let mut imputer = Imputer::new(self.config.categorical_impute_strategy.clone());
            imputed = imputer.fit_transform(&imputed, &cols)?;
            categorical_imputer = Some(imputer);

            let mut fitted_encoder = Encoder::new(self.config.encoder_type.clone())
                .with_drop_first(self.config.drop_first)
                .with_unknown_policy(self.config.unknown_categories);
            fitted_encoder.fit(&imputed, &cols)?;
            encoder = Some(fitted_encoder);
        }

        let mut output_names = numeric_columns.clone();
        if let Some(ref encoder) = encoder {
            output_names.extend(encoder.output_names());
        }

        let fit_time = start.elapsed().as_secs_f64();
        debug!(
            numeric = numeric_columns.len(),
            categorical = categorical_columns.len(),
            outputs = output_names.len(),
            fit_time,
            "Preprocessor fitted"
        );

        Ok(FittedPreprocessor {
            config: self.config.clone(),
            input_columns,
            numeric_columns,
            categorical_columns,
            numeric_imputer,
            categorical_imputer,
            scaler,
            encoder,
            output_names,
            feature_stats,
            n_samples_seen: imputed.height(),
            fit_time,
        })
    }

    /// Fit and transform in one step
    pub fn fit_transform(&self, df: &DataFrame, schema: &ResolvedSchema) -> Result<(FittedPreprocessor, Array2<f64>)> {
        let fitted = self.fit(df, schema)?;
        let matrix = fitted.transform(df)?;
        Ok((fitted, matrix))
    }
}

/// Frozen preprocessing: routing and statistics learned from training data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    config: PreprocessingConfig,
    input_columns: Vec<String>,
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numeric_imputer: Option<Imputer>,
    categorical_imputer: Option<Imputer>,
    scaler: Option<Scaler>,
    encoder: Option<Encoder>,
    output_names: Vec<String>,
    feature_stats: Vec<FeatureStats>,
    n_samples_seen: usize,
    /// Seconds spent in fit
    fit_time: f64,
}

impl FittedPreprocessor {
    /// Transform raw feature rows into the model's numeric matrix.
    ///
    /// Fails with `SchemaMismatch` when a fitted column is absent. Extra
    /// columns are ignored.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let mut result = coerce(df, &self.input_columns, &self.categorical_columns)?;

        if let Some(ref imputer) = self.numeric_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref imputer) = self.categorical_imputer {
            result = imputer.transform(&result)?;
        }
        if let Some(ref scaler) = self.scaler {
            result = scaler.transform(&result)?;
        }
        if let Some(ref encoder) = self.encoder {
            result = encoder.transform(&result)?;
        }

        let mut matrix = Array2::zeros((result.height(), self.output_names.len()));
        for (j, name) in self.output_names.iter().enumerate() {
            for (i, value) in f64_values(&result, name)?.into_iter().enumerate() {
                matrix[[i, j]] = value.ok_or_else(|| {
                    PredictorError::DataError(format!("column '{}' still has nulls after imputation", name))
                })?;
            }
        }

        Ok(matrix)
    }

    /// Transform a single request
    pub fn transform_request(&self, request: &TreatmentRequest, schema: &ResolvedSchema) -> Result<Array2<f64>> {
        self.transform(&request.to_frame(schema)?)
    }

    /// A request with every numeric feature at its training mean and every
    /// categorical feature at its imputation value
    pub fn typical_request(&self) -> TreatmentRequest {
        self.feature_stats
            .iter()
            .map(|stats| {
                let value = match stats.dtype {
                    ColumnType::Numeric => RawValue::from(stats.mean),
                    ColumnType::Categorical => match self
                        .categorical_imputer
                        .as_ref()
                        .and_then(|imp| imp.fill_value(&stats.name))
                    {
                        Some(ImputeValue::String(s)) => RawValue::Text(s.clone()),
                        _ => RawValue::Missing,
                    },
                };
                (stats.name.as_str(), value)
            })
            .collect()
    }

    /// Feature columns the transform expects, in schema order
    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    /// Get numeric column names
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// Get categorical column names
    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// Names of the output matrix columns
    pub fn output_feature_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn n_features_out(&self) -> usize {
        self.output_names.len()
    }

    /// Get feature statistics
    pub fn feature_stats(&self) -> &[FeatureStats] {
        &self.feature_stats
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.scaler.as_ref()
    }

    pub fn encoder(&self) -> Option<&Encoder> {
        self.encoder.as_ref()
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    pub fn fit_time(&self) -> f64 {
        self.fit_time
    }
}

/// Select `columns` and cast them to `Float64` or `String` by routing
fn coerce(df: &DataFrame, columns: &[String], categorical: &[String]) -> Result<DataFrame> {
    let coerced = columns
        .iter()
        .map(|name| {
            let series = if categorical.contains(name) {
                as_string_series(df, name)?
            } else {
                as_f64_series(df, name)?
            };
            Ok(series.into())
        })
        .collect::<Result<Vec<Column>>>()?;

    Ok(DataFrame::new(coerced)?)
}
