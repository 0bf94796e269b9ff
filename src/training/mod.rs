//! Model training module
//!
//! Regression models used by the predictor:
//! - CART regression trees with seeded per-split feature subsets
//! - Random forests of those trees
//! - A multi-output wrapper holding one forest per target

mod models;
pub mod decision_tree;
pub mod random_forest;
pub mod multi_output;

pub use models::{Regressor, RegressionMetrics};
pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::{ForestConfig, MaxFeatures, RandomForest};
pub use multi_output::MultiOutputRegressor;
