//! Predictor configuration

use crate::error::{PredictorError, Result};
use crate::inference::{InferenceConfig, InitPolicy};
use crate::preprocessing::PreprocessingConfig;
use crate::schema::{DeclaredSchema, SchemaMode};
use crate::training::ForestConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Training data shipped with the repository
pub const DEFAULT_DATA_PATH: &str = "data/sample_treatments.csv";

/// Everything needed to build and serve the predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Table of historical treatments to fit on
    pub data_path: Option<PathBuf>,

    /// Declared feature, target and categorical columns
    pub schema: DeclaredSchema,

    /// Robust intersection or strict presence check
    pub schema_mode: SchemaMode,

    pub inference: InferenceConfig,

    pub preprocessing: PreprocessingConfig,

    pub forest: ForestConfig,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            data_path: Some(PathBuf::from(DEFAULT_DATA_PATH)),
            schema: DeclaredSchema::default(),
            schema_mode: SchemaMode::Robust,
            inference: InferenceConfig::default(),
            preprocessing: PreprocessingConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

impl PredictorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the training data path
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn with_schema(mut self, schema: DeclaredSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_schema_mode(mut self, mode: SchemaMode) -> Self {
        self.schema_mode = mode;
        self
    }

    pub fn with_init_policy(mut self, policy: InitPolicy) -> Self {
        self.inference.init_policy = policy;
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    /// Check the configuration without touching the data source
    pub fn validate(&self) -> Result<()> {
        if self.schema.features.is_empty() {
            return Err(PredictorError::Configuration("no feature columns declared".to_string()));
        }
        if self.schema.targets.is_empty() {
            return Err(PredictorError::Configuration("no target columns declared".to_string()));
        }
        if let Some(undeclared) = self
            .schema
            .categorical
            .iter()
            .find(|c| !self.schema.features.contains(c))
        {
            return Err(PredictorError::Configuration(format!(
                "categorical column '{}' is not a declared feature",
                undeclared
            )));
        }
        self.forest.validate()
    }

    /// Load a configuration from a JSON file; absent fields take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
