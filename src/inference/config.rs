//! Inference configuration

use serde::{Deserialize, Serialize};

/// What a prediction does when the model has not been fit yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitPolicy {
    /// The first request fits the model
    #[default]
    Lazy,
    /// Requests fail with `NotReady` until `initialize()` has run
    Eager,
}

/// Configuration for model inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// When the cached model gets fit
    pub init_policy: InitPolicy,

    /// Requests per chunk in batch prediction; chunks run in parallel
    pub batch_size: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            init_policy: InitPolicy::Lazy,
            batch_size: 256,
        }
    }
}

impl InferenceConfig {
    /// Create a new inference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the init policy
    pub fn with_init_policy(mut self, policy: InitPolicy) -> Self {
        self.init_policy = policy;
        self
    }

    /// Builder method to set batch size
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.init_policy, InitPolicy::Lazy);
        assert_eq!(config.batch_size, 256);
    }

    #[test]
    fn test_builder_pattern() {
        let config = InferenceConfig::new()
            .with_init_policy(InitPolicy::Eager)
            .with_batch_size(0);

        assert_eq!(config.init_policy, InitPolicy::Eager);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_policy_serde() {
        let policy: InitPolicy = serde_json::from_str("\"eager\"").unwrap();
        assert_eq!(policy, InitPolicy::Eager);
    }
}
