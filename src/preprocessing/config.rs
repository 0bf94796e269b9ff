//! Preprocessing configuration

use serde::{Deserialize, Serialize};
use super::{EncoderType, ImputeStrategy, ScalerType, UnknownCategoryPolicy};

/// Configuration for the column-routed preprocessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Strategy for handling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for handling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Type of scaler to use for numeric features
    pub scaler_type: ScalerType,

    /// Type of encoder to use for categorical features
    pub encoder_type: EncoderType,

    /// Drop the first (reference) category of each encoded column
    pub drop_first: bool,

    /// What to do with a category that was not seen during fit
    pub unknown_categories: UnknownCategoryPolicy,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numeric_impute_strategy: ImputeStrategy::Mean,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            scaler_type: ScalerType::Standard,
            encoder_type: EncoderType::OneHot,
            drop_first: true,
            unknown_categories: UnknownCategoryPolicy::Ignore,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set categorical impute strategy
    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    /// Builder method to set scaler type
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Builder method to set encoder type
    pub fn with_encoder(mut self, encoder_type: EncoderType) -> Self {
        self.encoder_type = encoder_type;
        self
    }

    /// Builder method to keep or drop the reference category
    pub fn with_drop_first(mut self, drop_first: bool) -> Self {
        self.drop_first = drop_first;
        self
    }

    /// Builder method to set the unseen-category policy
    pub fn with_unknown_categories(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_categories = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreprocessingConfig::default();
        assert_eq!(config.scaler_type, ScalerType::Standard);
        assert!(config.drop_first);
        assert_eq!(config.unknown_categories, UnknownCategoryPolicy::Ignore);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PreprocessingConfig::new()
            .with_scaler(ScalerType::MinMax)
            .with_drop_first(false)
            .with_unknown_categories(UnknownCategoryPolicy::Error);

        assert!(matches!(config.scaler_type, ScalerType::MinMax));
        assert!(!config.drop_first);
        assert_eq!(config.unknown_categories, UnknownCategoryPolicy::Error);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PreprocessingConfig = serde_json::from_str(r#"{"scaler_type":"None"}"#).unwrap();
        assert_eq!(config.scaler_type, ScalerType::None);
        assert_eq!(config.numeric_impute_strategy, ImputeStrategy::Mean);
    }
}
