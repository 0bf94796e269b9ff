//! Training dataset loading
//!
//! Reads a tabular source, resolves the declared schema against its columns,
//! coerces column types and drops every row with a null in a selected column.

use crate::error::{PredictorError, Result};
use crate::schema::{DeclaredSchema, ResolvedSchema, SchemaMode};
use crate::utils::{as_f64_series, as_string_series, f64_values, DataLoader};
use ndarray::Array2;
use polars::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Complete training rows restricted to the resolved schema
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    schema: ResolvedSchema,
    dropped_rows: usize,
}

impl Dataset {
    /// Resolved schema the dataset was built with
    pub fn schema(&self) -> &ResolvedSchema {
        &self.schema
    }

    /// Selected columns only, features then targets
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    /// Rows removed because a selected column was null
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Feature columns as a frame
    pub fn features(&self) -> Result<DataFrame> {
        self.frame
            .select(self.schema.features.iter().map(|s| s.as_str()))
            .map_err(|e| PredictorError::DataError(e.to_string()))
    }

    /// Target columns as an `n_rows x n_targets` matrix in declared order
    pub fn targets(&self) -> Result<Array2<f64>> {
        let n_rows = self.n_rows();
        let mut y = Array2::zeros((n_rows, self.schema.n_targets()));
        for (j, name) in self.schema.targets.iter().enumerate() {
            for (i, value) in f64_values(&self.frame, name)?.into_iter().enumerate() {
                y[[i, j]] = value.ok_or_else(|| {
                    PredictorError::DataError(format!("null target in column '{}'", name))
                })?;
            }
        }
        Ok(y)
    }
}

/// Loads a [`Dataset`] for a declared schema
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    declared: DeclaredSchema,
    mode: SchemaMode,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(DeclaredSchema::default(), SchemaMode::default())
    }
}

impl DatasetLoader {
    pub fn new(declared: DeclaredSchema, mode: SchemaMode) -> Self {
        Self { declared, mode }
    }

    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    pub fn declared(&self) -> &DeclaredSchema {
        &self.declared
    }

    /// Read the file at `path` and build the dataset
    pub fn load(&self, path: &Path) -> Result<Dataset> {
        let df = DataLoader::new().load_auto(path)?;
        info!(path = %path.display(), rows = df.height(), columns = df.width(), "Loaded data source");
        self.from_frame(&df)
    }

    /// Build the dataset from an already loaded frame
    pub fn from_frame(&self, df: &DataFrame) -> Result<Dataset> {
        let available: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let schema = self.declared.resolve(&available, self.mode)?;

        if !schema.missing_features.is_empty() || !schema.missing_targets.is_empty() {
            warn!(
                missing_features = ?schema.missing_features,
                missing_targets = ?schema.missing_targets,
                "Declared columns absent from data source, continuing with the available subset"
            );
        }

        let columns = schema
            .selected_columns()
            .iter()
            .map(|name| {
                let series = if schema.is_categorical(name) {
                    as_string_series(df, name)?
                } else {
                    as_f64_series(df, name)?
                };
                Ok(series.into())
            })
            .collect::<Result<Vec<Column>>>()?;

        let selected = DataFrame::new(columns)?;
        let before = selected.height();
        let frame = selected.drop_nulls::<String>(None)?;
        let dropped_rows = before - frame.height();

        if frame.height() == 0 {
            return Err(PredictorError::DataError(
                "no complete rows remain after dropping rows with missing values".to_string(),
            ));
        }

        info!(
            rows = frame.height(),
            dropped_rows,
            features = schema.features.len(),
            targets = schema.targets.len(),
            "Dataset ready"
        );

        Ok(Dataset {
            frame,
            schema,
            dropped_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn raw_frame() -> DataFrame {
        df!(
            AGE => &[Some(60i64), Some(45), None, Some(30)],
            FREQUENCY => &[3i64, 2, 4, 5],
            PENETRATION_DEPTH => &[2.0, 1.5, 3.0, 2.5],
            LASER_RADIUS => &[0.8, 0.5, 1.0, 1.2],
            POWER_MW => &[400.0, 250.0, 800.0, 600.0],
            INTENSITY => &["Low-Level", "Low-Level", "High-Level", "High-Level"],
            LASER_TYPE => &[Some("CW"), Some("PW"), Some("CW"), None],
            EXPOSURE_TIME => &[30.0, 20.0, 60.0, 45.0],
            RELAXATION_TIME => &[100.0, 400.0, 120.0, 380.0],
            ENERGY => &[12.0, 5.0, 48.0, 27.0],
            "Notes" => &["a", "b", "c", "d"]
        )
        .unwrap()
    }

    #[test]
    fn test_drops_incomplete_rows() {
        let dataset = DatasetLoader::default().from_frame(&raw_frame()).unwrap();
        assert_eq!(dataset.n_rows(), 2);
        assert_eq!(dataset.dropped_rows(), 2);
        assert!(dataset.frame().column("Notes").is_err());
        assert_eq!(dataset.frame().column(AGE).unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_targets_matrix_order() {
        let dataset = DatasetLoader::default().from_frame(&raw_frame()).unwrap();
        let y = dataset.targets().unwrap();
        assert_eq!(y.shape(), &[2, 3]);
        assert_eq!(y[[0, 0]], 30.0);
        assert_eq!(y[[1, 1]], 400.0);
        assert_eq!(y[[1, 2]], 5.0);
    }

    #[test]
    fn test_features_frame() {
        let dataset = DatasetLoader::default().from_frame(&raw_frame()).unwrap();
        let x = dataset.features().unwrap();
        assert_eq!(x.width(), 7);
        assert!(x.column(ENERGY).is_err());
    }

    #[test]
    fn test_all_rows_incomplete_is_error() {
        let df = df!(
            AGE => &[None::<f64>, None],
            EXPOSURE_TIME => &[1.0, 2.0]
        )
        .unwrap();
        let err = DatasetLoader::default().from_frame(&df).unwrap_err();
        assert!(matches!(err, PredictorError::DataError(_)));
    }
}
