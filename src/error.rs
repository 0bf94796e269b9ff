//! Error types for the predictor

use thiserror::Error;

/// Errors raised while loading data, fitting the pipeline or serving a request
#[derive(Error, Debug)]
pub enum PredictorError {
    /// The declared schema has no overlap with the data source
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A declared column is absent from the data source (strict loading)
    #[error("Schema error: column '{0}' not found in data source")]
    Schema(String),

    /// An input handed to a fitted transform lacks a column seen during fit
    #[error("Schema mismatch: expected column '{0}' in input")]
    SchemaMismatch(String),

    #[error("Unseen category '{value}' for column '{column}'")]
    UnseenCategory { column: String, value: String },

    /// The cached artifacts have not been fit and lazy fitting is disabled
    #[error("Model is not ready: call initialize() first")]
    NotReady,

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PredictorError {
    /// True when the error only concerns a single inference request and the
    /// fitted artifacts stay usable.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            PredictorError::SchemaMismatch(_)
                | PredictorError::UnseenCategory { .. }
                | PredictorError::DataError(_)
                | PredictorError::ShapeError { .. }
                | PredictorError::ValidationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_local() {
        assert!(PredictorError::SchemaMismatch("Age".into()).is_request_error());
        assert!(PredictorError::UnseenCategory {
            column: "Laser Type".into(),
            value: "QCW".into(),
        }
        .is_request_error());
        assert!(!PredictorError::Configuration("empty".into()).is_request_error());
        assert!(!PredictorError::NotReady.is_request_error());
    }

    #[test]
    fn test_error_messages() {
        let err = PredictorError::Schema("Power (mW)".into());
        assert_eq!(
            err.to_string(),
            "Schema error: column 'Power (mW)' not found in data source"
        );
    }
}
