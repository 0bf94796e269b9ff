//! Regression tree implementation

use crate::error::{PredictorError, Result};
use super::models::Regressor;
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// CART regression tree using the MSE criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered at each split; `None` means all
    pub max_features: Option<usize>,
    /// Seed for the per-split feature subsets
    pub random_state: u64,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Best split found for one feature: (feature, threshold, gain)
type Candidate = (usize, f64, f64);

impl DecisionTree {
    /// Create a new regressor tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 0,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set the number of features tried per split
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PredictorError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if n_samples == 0 || n_features == 0 {
            return Err(PredictorError::ValidationError(format!(
                "cannot fit a tree on a {}x{} matrix",
                n_samples, n_features
            )));
        }

        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(PredictorError::ValidationError(
                "training data contains NaN or infinite values".to_string(),
            ));
        }

        self.n_features = n_features;
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng, &mut importances));

        // Normalize feature importances
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let value = mean(&y_subset);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(&y_subset);

        if should_stop {
            return TreeNode::Leaf { value, n_samples };
        }

        let features = self.candidate_features(rng);
        let Some((feature_idx, threshold, gain)) = self.find_best_split(x, y, indices, &features) else {
            return TreeNode::Leaf { value, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return TreeNode::Leaf { value, n_samples };
        }

        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng, importances));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng, importances));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
            impurity: variance(&y_subset),
        }
    }

    /// Features to scan at one node, ascending
    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let k = self.max_features.unwrap_or(self.n_features).clamp(1, self.n_features);
        if k >= self.n_features {
            return (0..self.n_features).collect();
        }
        let mut features = sample(rng, self.n_features, k).into_vec();
        features.sort_unstable();
        features
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
    ) -> Option<Candidate> {
        let n = indices.len() as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let total_sq_sum: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        let parent_impurity = total_sq_sum / n - (total_sum / n).powi(2);

        // Each feature independently finds its best split
        let feature_results: Vec<Option<Candidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut sorted: Vec<(f64, f64)> = indices.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
                sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut best: Option<Candidate> = None;
                let mut left_sum = 0.0f64;
                let mut left_sq_sum = 0.0f64;

                // Sweep thresholds left to right, accumulating the left side incrementally
                for split in 1..sorted.len() {
                    let (prev, yi) = sorted[split - 1];
                    left_sum += yi;
                    left_sq_sum += yi * yi;

                    let next = sorted[split].0;
                    if !prev.is_finite() || !next.is_finite() || next <= prev {
                        continue;
                    }

                    let left_count = split;
                    let right_count = sorted.len() - split;
                    if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                        continue;
                    }

                    let left_impurity = mse_from_sums(left_count, left_sum, left_sq_sum);
                    let right_impurity = mse_from_sums(
                        right_count,
                        total_sum - left_sum,
                        total_sq_sum - left_sq_sum,
                    );
                    let weighted = (left_count as f64 * left_impurity + right_count as f64 * right_impurity) / n;

                    let gain = parent_impurity - weighted;
                    if gain > best.map_or(1e-12, |b| b.2) {
                        best = Some((feature_idx, split_threshold(prev, next), gain));
                    }
                }

                best
            })
            .collect();

        // First feature wins ties so the result does not depend on scheduling
        feature_results
            .into_iter()
            .flatten()
            .fold(None, |best: Option<Candidate>, c| match best {
                Some(b) if b.2 >= c.2 => Some(b),
                _ => Some(c),
            })
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PredictorError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(PredictorError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows().into_iter().map(|row| predict_sample(root, row)).collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, count_leaves)
    }
}

/// Midpoint of two adjacent distinct values, falling back to `prev` when
/// rounding would put the midpoint on `next`
fn split_threshold(prev: f64, next: f64) -> f64 {
    let mid = prev / 2.0 + next / 2.0;
    if mid >= prev && mid < next {
        mid
    } else {
        prev
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTree::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }
}

fn predict_sample(mut node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
    loop {
        match node {
            TreeNode::Leaf { value, .. } => return *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                node = if sample[*feature_idx] <= *threshold { &**left } else { &**right };
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

/// Var = E[X²] - E[X]², clamped at zero against rounding
fn mse_from_sums(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}

fn mean(y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    y.iter().sum::<f64>() / y.len() as f64
}

fn variance(y: &[f64]) -> f64 {
    let m = mean(y);
    if y.is_empty() {
        return 0.0;
    }
    y.iter().map(|&v| (v - m).powi(2)).sum::<f64>() / y.len() as f64
}

fn is_pure(y: &[f64]) -> bool {
    match y.first() {
        None => true,
        Some(&first) => y.iter().all(|&v| (v - first).abs() < 1e-10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_simple() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        // Fully grown tree memorizes distinct points
        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions, y);
        assert_eq!(tree.get_n_leaves(), 5);
    }

    #[test]
    fn test_midpoint_threshold() {
        let x = array![[0.0], [0.0], [10.0], [10.0]];
        let y = array![1.0, 1.0, 3.0, 3.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert!(matches!(tree.root, Some(TreeNode::Split { threshold, .. }) if threshold == 5.0));
        assert_eq!(tree.predict(&array![[5.0], [5.1]]).unwrap(), array![1.0, 3.0]);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let mut tree = DecisionTree::new().with_max_depth(Some(1));
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_depth(), 2);
        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(3);
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_seeded_feature_subsets_are_deterministic() {
        let x = array![
            [1.0, 5.0, 2.0],
            [2.0, 3.0, 8.0],
            [3.0, 1.0, 4.0],
            [4.0, 4.0, 6.0],
            [5.0, 2.0, 1.0],
            [6.0, 6.0, 9.0]
        ];
        let y = array![3.0, 1.0, 4.0, 1.0, 5.0, 9.0];

        let fit = || {
            let mut tree = DecisionTree::new().with_max_features(Some(1)).with_random_state(7);
            tree.fit(&x, &y).unwrap();
            tree.predict(&array![[2.5, 2.5, 2.5]]).unwrap()
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_non_finite_training_values_rejected() {
        let y = array![1.0, 2.0, 3.0];
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let x = array![[1.0], [bad], [3.0]];
            let err = DecisionTree::new().fit(&x, &y).unwrap_err();
            assert!(matches!(err, PredictorError::ValidationError(_)));
        }

        let x = array![[1.0], [2.0], [3.0]];
        assert!(DecisionTree::new().fit(&x, &array![1.0, f64::NAN, 3.0]).is_err());
    }

    #[test]
    fn test_adjacent_values_still_partition() {
        let low = 1.0f64;
        let high = f64::from_bits(low.to_bits() + 1);
        let threshold = split_threshold(low, high);
        assert!(threshold >= low && threshold < high);

        let x = array![[low], [low], [high], [high]];
        let y = array![0.0, 0.0, 10.0, 10.0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_n_leaves(), 2);
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_extreme_values_split_without_overflow() {
        let threshold = split_threshold(-f64::MAX, f64::MAX);
        assert!(threshold.is_finite());

        let x = array![[-f64::MAX], [f64::MAX]];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &array![1.0, 2.0]).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), array![1.0, 2.0]);
    }

    #[test]
    fn test_predict_unfitted_and_shape() {
        let tree = DecisionTree::new();
        assert!(matches!(tree.predict(&array![[1.0]]), Err(PredictorError::ModelNotFitted)));

        let mut tree = DecisionTree::new();
        tree.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        assert!(matches!(
            tree.predict(&array![[1.0, 2.0]]),
            Err(PredictorError::ShapeError { .. })
        ));
    }
}
