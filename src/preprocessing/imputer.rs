//! Missing value imputation strategies

use crate::error::{PredictorError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value; ties go to the smallest value
    MostFrequent,
    /// Replace with a constant value
    Constant(f64),
    /// Replace with a constant string (categorical)
    ConstantString(String),
}

/// Learned fill value for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: HashMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PredictorError::SchemaMismatch(col_name.to_string()))?;

            let fill_value = self.compute_fill_value(column.as_materialized_series())?;
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PredictorError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, fill_value) in &self.fill_values {
            let column = df
                .column(col_name)
                .map_err(|_| PredictorError::SchemaMismatch(col_name.clone()))?;
            let series = column.as_materialized_series();
            if series.null_count() == 0 {
                continue;
            }
            let filled = Self::fill_series(series, fill_value)?;
            result.with_column(filled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned fill value for a column
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values.get(column)
    }

    fn compute_fill_value(&self, series: &Series) -> Result<ImputeValue> {
        match &self.strategy {
            ImputeStrategy::Mean => {
                let mean = Self::numeric(series)?.mean().unwrap_or(0.0);
                Ok(ImputeValue::Numeric(mean))
            }
            ImputeStrategy::Median => {
                let median = Self::numeric(series)?.median().unwrap_or(0.0);
                Ok(ImputeValue::Numeric(median))
            }
            ImputeStrategy::MostFrequent => {
                if series.dtype() != &DataType::String {
                    let mut values: Vec<f64> = Self::numeric(series)?.into_iter().flatten().collect();
                    values.sort_by(|a, b| a.total_cmp(b));
                    Ok(ImputeValue::Numeric(most_frequent_sorted(&values).unwrap_or(0.0)))
                } else {
                    let ca = series
                        .str()
                        .map_err(|e| PredictorError::DataError(e.to_string()))?;
                    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                    for value in ca.into_iter().flatten() {
                        *counts.entry(value).or_insert(0) += 1;
                    }
                    // BTreeMap iterates in order, so a strict comparison keeps the smallest on ties
                    let mode = counts
                        .into_iter()
                        .fold(None::<(&str, usize)>, |best, (value, count)| match best {
                            Some((_, best_count)) if best_count >= count => best,
                            _ => Some((value, count)),
                        })
                        .map(|(value, _)| value.to_string())
                        .unwrap_or_default();
                    Ok(ImputeValue::String(mode))
                }
            }
            ImputeStrategy::Constant(val) => Ok(ImputeValue::Numeric(*val)),
            ImputeStrategy::ConstantString(val) => Ok(ImputeValue::String(val.clone())),
        }
    }

    fn numeric(series: &Series) -> Result<&Float64Chunked> {
        series.f64().map_err(|e| PredictorError::DataError(e.to_string()))
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(val) => {
                let filled: Float64Chunked = Self::numeric(series)?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*val)))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(val) => {
                let filled: StringChunked = series
                    .str()
                    .map_err(|e| PredictorError::DataError(e.to_string()))?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str())))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

/// Mode of an ascending slice; the first run wins ties
fn most_frequent_sorted(values: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < values.len() {
        let mut j = i + 1;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        let run = j - i;
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((values[i], run));
        }
        i = j;
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputer_creation() {
        let imputer = Imputer::new(ImputeStrategy::Mean);
        assert!(!imputer.is_fitted);
        assert!(imputer.transform(&DataFrame::empty()).is_err());
    }

    #[test]
    fn test_mean_imputation() {
        let df = df!("a" => &[Some(1.0), None, Some(3.0), Some(4.0)]).unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Mean);
        let result = imputer.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        // Mean of [1, 3, 4] = 8/3
        assert!((col.get(1).unwrap() - 2.666666666666667).abs() < 0.001);
        assert_eq!(col.null_count(), 0);
    }

    #[test]
    fn test_most_frequent_string_tie_breaks_lexicographically() {
        let df = df!("Laser Type" => &[Some("PW"), Some("CW"), None, Some("PW"), Some("CW")]).unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df, &["Laser Type"]).unwrap();

        assert_eq!(
            imputer.fill_value("Laser Type"),
            Some(&ImputeValue::String("CW".to_string()))
        );
        let col = result.column("Laser Type").unwrap().str().unwrap();
        assert_eq!(col.get(2), Some("CW"));
    }

    #[test]
    fn test_most_frequent_numeric() {
        assert_eq!(most_frequent_sorted(&[1.0, 2.0, 2.0, 3.0, 3.0]), Some(2.0));
        assert_eq!(most_frequent_sorted(&[]), None);
    }

    #[test]
    fn test_missing_column_on_transform() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&df, &["a"]).unwrap();

        let other = df!("b" => &[1.0]).unwrap();
        assert!(matches!(imputer.transform(&other), Err(PredictorError::SchemaMismatch(_))));
    }
}
