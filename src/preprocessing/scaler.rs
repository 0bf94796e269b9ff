//! Feature scaling implementations

use crate::error::{PredictorError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std, population std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// No scaling
    None,
}

/// Parameters for a fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64, // mean or min
    pub scale: f64,  // std or range
}

/// Feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PredictorError::SchemaMismatch(col_name.to_string()))?;

            let params = self.compute_params(column.as_materialized_series())?;
            self.params.insert(col_name.to_string(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data.
    /// Builds all replacement columns first, then applies them in a single pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PredictorError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| PredictorError::SchemaMismatch(col_name.clone()))?;
                Self::scale_series(column.as_materialized_series(), params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted parameters for a column
    pub fn params(&self, column: &str) -> Option<ScalerParams> {
        self.params.get(column).copied()
    }

    fn compute_params(&self, series: &Series) -> Result<ScalerParams> {
        let ca = series
            .f64()
            .map_err(|e| PredictorError::DataError(e.to_string()))?;

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(0).unwrap_or(1.0);
                Ok(ScalerParams {
                    center: mean,
                    scale: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
                })
            }
            ScalerType::MinMax => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                Ok(ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                })
            }
            ScalerType::None => Ok(ScalerParams {
                center: 0.0,
                scale: 1.0,
            }),
        }
    }

    fn scale_series(series: &Series, params: &ScalerParams) -> Result<Series> {
        let ca = series
            .f64()
            .map_err(|e| PredictorError::DataError(e.to_string()))?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        let mean: f64 = col.mean().unwrap();
        assert!(mean.abs() < 1e-10); // Mean should be ~0

        // Population variance of 1..=5 is 2
        let params = scaler.params("a").unwrap();
        assert!((params.scale - 2.0f64.sqrt()).abs() < 1e-12);
        let var: f64 = col.into_iter().flatten().map(|v| v * v).sum::<f64>() / 5.0;
        assert!((var - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_keeps_unit_scale() {
        let df = df!("a" => &[7.0, 7.0, 7.0]).unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();
        assert_eq!(scaler.params("a").unwrap().scale, 1.0);
        assert_eq!(result.column("a").unwrap().f64().unwrap().get(0), Some(0.0));
    }

    #[test]
    fn test_minmax_scaler() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.min().unwrap() - 0.0).abs() < 1e-10);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_transform_requires_fitted_columns() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let mut scaler = Scaler::new(ScalerType::Standard);
        scaler.fit(&df, &["a"]).unwrap();

        let other = df!("b" => &[1.0]).unwrap();
        assert!(matches!(scaler.transform(&other), Err(PredictorError::SchemaMismatch(_))));
    }
}
