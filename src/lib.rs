//! Laser Predictor - laser therapy treatment parameter prediction
//!
//! Predicts exposure time, relaxation time and delivered energy from a
//! patient's age, session frequency, penetration depth, laser radius, power,
//! intensity and laser type.
//!
//! # Modules
//!
//! - [`schema`] - Declared columns and their resolution against a data source
//! - [`dataset`] - Training data loading with robust or strict column checks
//! - [`preprocessing`] - Imputation, scaling and one-hot encoding routed per column
//! - [`training`] - Regression trees, random forests, multi-output wrapper
//! - [`inference`] - Fit-once model cache and the prediction entry point
//! - [`record`] - Raw requests as a front end hands them over
//! - [`units`] - Power entry in watts with mode-dependent bounds
//! - [`config`] - JSON configuration
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use laser_predictor::prelude::*;
//!
//! # fn main() -> laser_predictor::Result<()> {
//! let config = PredictorConfig::default().with_data_path("data/sample_treatments.csv");
//! let engine = InferenceEngine::new(config.inference.clone(), std::sync::Arc::new(ModelCache::from_config(config)));
//!
//! let request = TreatmentRequest::new()
//!     .with("Age", 60.0)
//!     .with("Frequency (sessions/week)", 3.0)
//!     .with("Penetration Depth", 2.0)
//!     .with("Laser Radius (cm)", 0.8)
//!     .with("Power (mW)", 400.0)
//!     .with("Intensity", "Low-Level")
//!     .with("Laser Type", "CW");
//!
//! let prediction = engine.predict(&request)?;
//! println!("{}", prediction);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Data
pub mod schema;
pub mod record;
pub mod dataset;
pub mod units;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;

pub mod config;
pub mod utils;

// Services
pub mod cli;

pub use error::{PredictorError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PredictorError, Result};

    // Data
    pub use crate::schema::{DeclaredSchema, ResolvedSchema, SchemaMode};
    pub use crate::record::{RawValue, TreatmentRequest};
    pub use crate::dataset::{Dataset, DatasetLoader};
    pub use crate::units::{PowerMode, PowerSetting};

    // Preprocessing
    pub use crate::preprocessing::{DataPreprocessor, FittedPreprocessor, PreprocessingConfig, UnknownCategoryPolicy};

    // Training
    pub use crate::training::{ForestConfig, MaxFeatures, MultiOutputRegressor, RandomForest, RegressionMetrics};

    // Inference
    pub use crate::inference::{
        CacheState, FittedPipeline, InferenceConfig, InferenceEngine, InitPolicy, ModelCache, Prediction,
    };

    pub use crate::config::PredictorConfig;
}
