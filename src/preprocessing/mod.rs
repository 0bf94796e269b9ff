//! Data preprocessing module
//!
//! Column-routed preprocessing for the treatment features:
//! - Numeric columns: mean imputation, then standardization
//! - Categorical columns: most-frequent imputation, then one-hot encoding
//!   with the first category of each column dropped
//!
//! [`DataPreprocessor::fit`] produces an immutable [`FittedPreprocessor`]
//! whose statistics never change afterwards.

mod config;
mod imputer;
mod scaler;
mod encoder;
mod pipeline;

pub use config::PreprocessingConfig;
pub use imputer::{Imputer, ImputeStrategy, ImputeValue};
pub use scaler::{Scaler, ScalerParams, ScalerType};
pub use encoder::{Encoder, EncoderType, UnknownCategoryPolicy};
pub use pipeline::{DataPreprocessor, FittedPreprocessor};

use crate::error::Result;
use crate::utils::{f64_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Column data type for preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Feature statistics computed during fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub dtype: ColumnType,
    pub count: usize,
    pub null_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub categories: Option<Vec<String>>,
}

impl FeatureStats {
    /// Create new feature statistics
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
            count: 0,
            null_count: 0,
            mean: None,
            std: None,
            min: None,
            max: None,
            categories: None,
        }
    }

    /// Compute statistics for a numeric column
    pub fn numeric(df: &DataFrame, name: &str) -> Result<Self> {
        let mut stats = Self::new(name, ColumnType::Numeric);
        let values = f64_values(df, name)?;
        stats.count = values.len();
        stats.null_count = values.iter().filter(|v| v.is_none()).count();

        let present: Vec<f64> = values.into_iter().flatten().collect();
        if !present.is_empty() {
            let n = present.len() as f64;
            let mean = present.iter().sum::<f64>() / n;
            let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            stats.mean = Some(mean);
            stats.std = Some(var.sqrt());
            stats.min = present.iter().copied().reduce(f64::min);
            stats.max = present.iter().copied().reduce(f64::max);
        }

        Ok(stats)
    }

    /// Compute statistics for a categorical column
    pub fn categorical(df: &DataFrame, name: &str) -> Result<Self> {
        let mut stats = Self::new(name, ColumnType::Categorical);
        let values = string_values(df, name)?;
        stats.count = values.len();
        stats.null_count = values.iter().filter(|v| v.is_none()).count();

        let categories: BTreeSet<String> = values.into_iter().flatten().collect();
        stats.categories = Some(categories.into_iter().collect());

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_stats_new() {
        let stats = FeatureStats::new("Age", ColumnType::Numeric);
        assert_eq!(stats.name, "Age");
        assert_eq!(stats.dtype, ColumnType::Numeric);
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_numeric_stats() {
        let df = df!("Age" => &[Some(20.0), None, Some(40.0)]).unwrap();
        let stats = FeatureStats::numeric(&df, "Age").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.mean, Some(30.0));
        assert_eq!(stats.std, Some(10.0));
        assert_eq!(stats.min, Some(20.0));
        assert_eq!(stats.max, Some(40.0));
    }

    #[test]
    fn test_categorical_stats() {
        let df = df!("Laser Type" => &["PW", "CW", "PW"]).unwrap();
        let stats = FeatureStats::categorical(&df, "Laser Type").unwrap();
        assert_eq!(stats.categories, Some(vec!["CW".to_string(), "PW".to_string()]));
    }

    #[test]
    fn test_column_type_serialize() {
        let json = serde_json::to_string(&ColumnType::Numeric).unwrap();
        assert_eq!(json, "\"Numeric\"");
    }
}
