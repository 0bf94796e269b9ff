//! Random Forest implementation

use crate::error::{PredictorError, Result};
use super::decision_tree::DecisionTree;
use super::models::Regressor;
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for max features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    /// Number of features tried per split, at least one
    pub fn resolve(&self, n_features: usize) -> usize {
        match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        }
        .clamp(1, n_features.max(1))
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features tried per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Base seed; tree `i` uses `random_state + i`
    pub random_state: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: 42,
        }
    }
}

impl ForestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of trees
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Check hyperparameters before any tree is built
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(PredictorError::Configuration(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            if !(f > 0.0 && f <= 1.0) {
                return Err(PredictorError::Configuration(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )));
            }
        }
        Ok(())
    }
}

/// Random forest regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

impl RandomForest {
    /// Create a new regressor forest
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_importances: None,
            n_features: 0,
        }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PredictorError::TrainingError("no training samples".to_string()));
        }

        self.n_features = n_features;
        let max_features = self.config.max_features.resolve(n_features);
        let config = &self.config;

        // Trees are built in parallel; each owns a seeded stream, and
        // collect keeps them in index order
        let trees = (0..config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let seed = config.random_state.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if config.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);

                let mut tree = DecisionTree::new()
                    .with_max_depth(config.max_depth)
                    .with_min_samples_split(config.min_samples_split)
                    .with_min_samples_leaf(config.min_samples_leaf)
                    .with_max_features(Some(max_features))
                    .with_random_state(rng.next_u64());
                tree.fit(&x_boot, &y_boot)?;

                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total_importances {
            *imp /= n_trees;
        }

        // Normalize
        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    /// Mean prediction over all trees
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PredictorError::ModelNotFitted);
        }

        let all_predictions = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<Array1<f64>>>>()?;

        // Summed in tree order so the result is independent of scheduling
        let mut sum = Array1::<f64>::zeros(x.nrows());
        for preds in &all_predictions {
            sum += preds;
        }

        Ok(sum / all_predictions.len() as f64)
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict(self, x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut rf = RandomForest::new(ForestConfig::new().with_n_estimators(10));
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();

        let mse: f64 = predictions.iter().zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>() / y.len() as f64;

        assert!(mse < 2.0, "MSE too high: {}", mse);
        assert_eq!(rf.n_trees(), 10);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let x = array![[1.0, 9.0], [2.0, 7.0], [3.0, 8.0], [4.0, 1.0], [5.0, 3.0], [6.0, 2.0]];
        let y = array![2.0, 4.0, 3.0, 8.0, 7.0, 9.0];
        let config = ForestConfig::new()
            .with_n_estimators(25)
            .with_max_features(MaxFeatures::Fixed(1));

        let mut a = RandomForest::new(config.clone());
        let mut b = RandomForest::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        let queries = array![[2.5, 5.0], [4.5, 4.0]];
        assert_eq!(a.predict(&queries).unwrap(), b.predict(&queries).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_without_bootstrap_matches_single_tree() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 4.0, 9.0, 16.0];

        let mut rf = RandomForest::new(ForestConfig::new().with_n_estimators(5).with_bootstrap(false));
        rf.fit(&x, &y).unwrap();

        assert_eq!(rf.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut rf = RandomForest::new(ForestConfig::new().with_n_estimators(10));
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[0] > importances[1]);
        assert!((importances.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(10), 4);
        assert_eq!(MaxFeatures::Log2.resolve(10), 4);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(9), 5);
        assert_eq!(MaxFeatures::Fixed(20).resolve(9), 9);
        assert_eq!(MaxFeatures::All.resolve(9), 9);
        assert_eq!(MaxFeatures::Fixed(0).resolve(9), 1);
    }

    #[test]
    fn test_invalid_config() {
        let mut rf = RandomForest::new(ForestConfig::new().with_n_estimators(0));
        assert!(matches!(
            rf.fit(&array![[1.0]], &array![1.0]),
            Err(PredictorError::Configuration(_))
        ));
        assert!(matches!(rf.predict(&array![[1.0]]), Err(PredictorError::ModelNotFitted)));
    }
}
