//! Decision tree classifier (CART, Gini impurity)
//!
//! Nodes are stored in a flat arena and grown with an explicit work stack, so
//! fully grown trees on large text corpora never recurse deeply.

use crate::error::{Result, TriageError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Impurities below this are treated as pure.
const IMPURITY_EPSILON: f64 = 1e-12;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with predicted class
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node; children are arena indices
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        impurity: f64,
    },
}

/// Gini impurity of a class histogram
fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

struct PendingNode {
    slot: usize,
    indices: Vec<usize>,
    depth: usize,
}

/// Decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node arena; index 0 is the root
    nodes: Vec<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Number of non-constant features to evaluate per split (all if None)
    pub max_features: Option<usize>,
    /// Seed for feature sampling
    pub random_state: Option<u64>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    classes: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_classifier()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new_classifier() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
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

    /// Set number of features evaluated per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to all rows of the training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_sample(x, y, indices)
    }

    /// Fit the tree to a sample of rows. Repeated indices act as sample weights,
    /// which is how bootstrap samples are passed in without copying rows.
    pub fn fit_sample(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        sample_indices: Vec<usize>,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(TriageError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if sample_indices.is_empty() {
            return Err(TriageError::ValidationError(
                "Cannot fit a tree on zero samples".to_string(),
            ));
        }

        if let Some(&bad) = sample_indices.iter().find(|&&i| i >= n_samples) {
            return Err(TriageError::ValidationError(format!(
                "Sample index {} out of range for {} rows",
                bad, n_samples
            )));
        }

        self.n_features = n_features;
        self.classes = unique_classes(y);
        let y_idx: Vec<usize> = y.iter().map(|&v| self.class_index(v)).collect();

        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut importances = vec![0.0; n_features];
        self.nodes = self.grow(x, &y_idx, sample_indices, &mut importances, &mut rng);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn class_index(&self, value: f64) -> usize {
        self.classes
            .iter()
            .position(|&c| c == value)
            .unwrap_or(0)
    }

    fn class_counts(&self, y_idx: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &i in indices {
            counts[y_idx[i]] += 1;
        }
        counts
    }

    fn leaf_value(&self, counts: &[usize]) -> f64 {
        // first maximum wins, so ties go to the smallest class
        let mut best = 0;
        for (class_idx, &count) in counts.iter().enumerate() {
            if count > counts[best] {
                best = class_idx;
            }
        }
        self.classes.get(best).copied().unwrap_or(0.0)
    }

    fn grow(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        root_indices: Vec<usize>,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> Vec<TreeNode> {
        let placeholder = TreeNode::Leaf { value: 0.0, n_samples: 0 };
        let mut nodes = vec![placeholder.clone()];
        let mut stack = vec![PendingNode { slot: 0, indices: root_indices, depth: 0 }];

        while let Some(PendingNode { slot, indices, depth }) = stack.pop() {
            let n_samples = indices.len();
            let counts = self.class_counts(y_idx, &indices);
            let impurity = gini(&counts, n_samples);

            let should_stop = n_samples < self.min_samples_split
                || n_samples < 2 * self.min_samples_leaf
                || self.max_depth.map_or(false, |d| depth >= d)
                || impurity <= IMPURITY_EPSILON;

            let split = if should_stop {
                None
            } else {
                self.find_best_split(x, y_idx, &indices, &counts, impurity, rng)
            };

            let Some(split) = split else {
                nodes[slot] = TreeNode::Leaf {
                    value: self.leaf_value(&counts),
                    n_samples,
                };
                continue;
            };

            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

            importances[split.feature_idx] += n_samples as f64 * split.gain;

            let left = nodes.len();
            nodes.push(placeholder.clone());
            let right = nodes.len();
            nodes.push(placeholder.clone());

            nodes[slot] = TreeNode::Split {
                feature_idx: split.feature_idx,
                threshold: split.threshold,
                left,
                right,
                n_samples,
                impurity,
            };

            stack.push(PendingNode { slot: right, indices: right_indices, depth: depth + 1 });
            stack.push(PendingNode { slot: left, indices: left_indices, depth: depth + 1 });
        }

        nodes
    }

    /// Scan features in random order until `max_features` non-constant ones
    /// have been evaluated. Constant features do not count against the budget.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let budget = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        let n = indices.len();

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0usize;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(n);
        let mut left_counts = vec![0usize; parent_counts.len()];
        let mut right_counts = vec![0usize; parent_counts.len()];

        for feature_idx in features {
            if visited >= budget {
                break;
            }

            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (x[[i, feature_idx]], y_idx[i])));

            let first = pairs[0].0;
            if pairs.iter().all(|&(v, _)| v == first) {
                continue;
            }
            visited += 1;

            pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
            left_counts.iter_mut().for_each(|c| *c = 0);
            right_counts.copy_from_slice(parent_counts);

            for pos in 0..n - 1 {
                let (value, class) = pairs[pos];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let next = pairs[pos + 1].0;
                if next <= value {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.map_or(0.0, |b| b.gain) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(SplitCandidate { feature_idx, threshold, gain });
                }
            }
        }

        best
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(TriageError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(TriageError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    fn predict_row(&self, sample: ArrayView1<f64>) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Classes seen during fit, ascending
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth (a lone leaf has depth 1)
    pub fn get_depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let TreeNode::Split { left, right, .. } = &self.nodes[node] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }
}

/// Sorted distinct label values
pub(crate) fn unique_classes(y: &Array1<f64>) -> Vec<f64> {
    let mut classes: Vec<f64> = y.iter().copied().collect();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}
