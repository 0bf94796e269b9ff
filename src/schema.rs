//! Declared and resolved column schemas
//!
//! The declared schema lists the feature and target columns the predictor
//! knows about. Resolving it against the columns a data source actually has
//! yields a [`ResolvedSchema`], which is computed once at load time and then
//! passed explicitly to preprocessing, training and inference.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const AGE: &str = "Age";
pub const FREQUENCY: &str = "Frequency (sessions/week)";
pub const PENETRATION_DEPTH: &str = "Penetration Depth";
pub const LASER_RADIUS: &str = "Laser Radius (cm)";
pub const POWER_MW: &str = "Power (mW)";
pub const INTENSITY: &str = "Intensity";
pub const LASER_TYPE: &str = "Laser Type";

pub const EXPOSURE_TIME: &str = "Exposure Time (s)";
pub const RELAXATION_TIME: &str = "Relaxation Time (µs)";
pub const ENERGY: &str = "Energy (J)";

/// Feature columns in declaration order
pub const FEATURES: [&str; 7] = [
    AGE,
    FREQUENCY,
    PENETRATION_DEPTH,
    LASER_RADIUS,
    POWER_MW,
    INTENSITY,
    LASER_TYPE,
];

/// Target columns in declaration order
pub const TARGETS: [&str; 3] = [EXPOSURE_TIME, RELAXATION_TIME, ENERGY];

/// Features routed to the categorical branch; everything else is numeric
pub const CATEGORICAL_FEATURES: [&str; 2] = [INTENSITY, LASER_TYPE];

/// How declared columns missing from the source are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaMode {
    /// Continue with the columns that are present and report the rest
    Robust,
    /// Every declared column must be present
    Strict,
}

impl Default for SchemaMode {
    fn default() -> Self {
        SchemaMode::Robust
    }
}

/// Column role after routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Numeric,
    Categorical,
    Target,
}

/// The columns the predictor is configured to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredSchema {
    pub features: Vec<String>,
    pub targets: Vec<String>,
    pub categorical: Vec<String>,
}

impl Default for DeclaredSchema {
    fn default() -> Self {
        Self {
            features: FEATURES.iter().map(|s| s.to_string()).collect(),
            targets: TARGETS.iter().map(|s| s.to_string()).collect(),
            categorical: CATEGORICAL_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DeclaredSchema {
    pub fn new(
        features: impl IntoIterator<Item = impl Into<String>>,
        targets: impl IntoIterator<Item = impl Into<String>>,
        categorical: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            features: features.into_iter().map(Into::into).collect(),
            targets: targets.into_iter().map(Into::into).collect(),
            categorical: categorical.into_iter().map(Into::into).collect(),
        }
    }

    /// Role of a declared column, if it is declared at all
    pub fn role_of(&self, name: &str) -> Option<ColumnRole> {
        if self.targets.iter().any(|t| t == name) {
            Some(ColumnRole::Target)
        } else if self.features.iter().any(|f| f == name) {
            if self.categorical.iter().any(|c| c == name) {
                Some(ColumnRole::Categorical)
            } else {
                Some(ColumnRole::Numeric)
            }
        } else {
            None
        }
    }

    /// Intersect the declared columns with the columns a source provides.
    ///
    /// Matching is exact and case-sensitive. Declaration order is kept.
    pub fn resolve<S: AsRef<str>>(&self, available: &[S], mode: SchemaMode) -> Result<ResolvedSchema> {
        let present: HashSet<&str> = available.iter().map(|s| s.as_ref()).collect();

        let (found_features, missing_features): (Vec<String>, Vec<String>) = self
            .features
            .iter()
            .cloned()
            .partition(|f| present.contains(f.as_str()));
        let (found_targets, missing_targets): (Vec<String>, Vec<String>) = self
            .targets
            .iter()
            .cloned()
            .partition(|t| present.contains(t.as_str()));

        if mode == SchemaMode::Strict {
            if let Some(name) = missing_features.iter().chain(missing_targets.iter()).next() {
                return Err(PredictorError::Schema(name.clone()));
            }
        }

        if found_features.is_empty() {
            return Err(PredictorError::Configuration(
                "none of the declared feature columns exist in the data source".to_string(),
            ));
        }
        if found_targets.is_empty() {
            return Err(PredictorError::Configuration(
                "none of the declared target columns exist in the data source".to_string(),
            ));
        }

        let (categorical_features, numeric_features): (Vec<String>, Vec<String>) = found_features
            .iter()
            .cloned()
            .partition(|f| self.categorical.contains(f));

        Ok(ResolvedSchema {
            features: found_features,
            numeric_features,
            categorical_features,
            targets: found_targets,
            missing_features,
            missing_targets,
        })
    }
}

/// Concrete schema shared by every downstream component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSchema {
    /// Available features in declaration order
    pub features: Vec<String>,
    pub numeric_features: Vec<String>,
    pub categorical_features: Vec<String>,
    /// Available targets in declaration order
    pub targets: Vec<String>,
    pub missing_features: Vec<String>,
    pub missing_targets: Vec<String>,
}

impl ResolvedSchema {
    /// True when no declared column was missing
    pub fn is_complete(&self) -> bool {
        self.missing_features.is_empty() && self.missing_targets.is_empty()
    }

    /// Features followed by targets
    pub fn selected_columns(&self) -> Vec<String> {
        self.features.iter().chain(self.targets.iter()).cloned().collect()
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical_features.iter().any(|c| c == name)
    }

    pub fn n_targets(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_columns() -> Vec<String> {
        FEATURES.iter().chain(TARGETS.iter()).map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_complete() {
        let schema = DeclaredSchema::default()
            .resolve(&all_columns(), SchemaMode::Strict)
            .unwrap();
        assert!(schema.is_complete());
        assert_eq!(schema.features.len(), 7);
        assert_eq!(schema.categorical_features, vec![INTENSITY, LASER_TYPE]);
        assert_eq!(schema.numeric_features[0], AGE);
        assert_eq!(schema.targets, vec![EXPOSURE_TIME, RELAXATION_TIME, ENERGY]);
    }

    #[test]
    fn test_resolve_robust_reports_missing() {
        let cols: Vec<String> = all_columns().into_iter().filter(|c| c != POWER_MW && c != ENERGY).collect();
        let schema = DeclaredSchema::default().resolve(&cols, SchemaMode::Robust).unwrap();
        assert!(!schema.is_complete());
        assert_eq!(schema.missing_features, vec![POWER_MW]);
        assert_eq!(schema.missing_targets, vec![ENERGY]);
        assert_eq!(schema.n_targets(), 2);
        assert!(!schema.features.contains(&POWER_MW.to_string()));
    }

    #[test]
    fn test_resolve_strict_fails_on_missing() {
        let cols: Vec<String> = all_columns().into_iter().filter(|c| c != AGE).collect();
        let err = DeclaredSchema::default().resolve(&cols, SchemaMode::Strict).unwrap_err();
        assert!(matches!(err, PredictorError::Schema(ref name) if name == AGE));
    }

    #[test]
    fn test_resolve_no_overlap_is_configuration_error() {
        let cols = vec!["foo", "bar"];
        let err = DeclaredSchema::default().resolve(&cols, SchemaMode::Robust).unwrap_err();
        assert!(matches!(err, PredictorError::Configuration(_)));

        let only_features: Vec<&str> = FEATURES.to_vec();
        let err = DeclaredSchema::default().resolve(&only_features, SchemaMode::Robust).unwrap_err();
        assert!(matches!(err, PredictorError::Configuration(_)));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let mut cols = all_columns();
        cols.retain(|c| c != AGE);
        cols.push("age".to_string());
        let schema = DeclaredSchema::default().resolve(&cols, SchemaMode::Robust).unwrap();
        assert_eq!(schema.missing_features, vec![AGE]);
    }

    #[test]
    fn test_role_of() {
        let declared = DeclaredSchema::default();
        assert_eq!(declared.role_of(LASER_TYPE), Some(ColumnRole::Categorical));
        assert_eq!(declared.role_of(AGE), Some(ColumnRole::Numeric));
        assert_eq!(declared.role_of(ENERGY), Some(ColumnRole::Target));
        assert_eq!(declared.role_of("Notes"), None);
    }
}
