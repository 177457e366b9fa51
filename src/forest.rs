//! Random Forest classifier for next-syscall prediction
//!
//! A bagged ensemble of decision trees over the binary one-hot features
//! produced by the encoder. Each tree is grown on a bootstrap sample with
//! random feature-subset splits chosen by Gini impurity; leaves keep class
//! histograms so the forest can emit a full probability vector.
//!
//! Training is seeded so repeated fits on identical data are reproducible.
//!
//! # References
//!
//! Breiman, L. (2001). Random forests. Machine Learning, 45(1), 5-32.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Fixed training seed for reproducible fits
const TRAINING_SEED: u64 = 42;

/// Depth cap; one-hot features are binary so paths stay short anyway
const MAX_DEPTH: usize = 24;

/// A node in a classification tree
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    /// Internal node splitting on one binary feature (absent / present)
    Internal {
        feature_idx: usize,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    /// Leaf node with per-class sample counts
    Leaf { class_counts: Vec<u32> },
}

impl TreeNode {
    /// Walk the tree and return the leaf histogram for a sample
    fn leaf_counts<'a>(&'a self, sample: &[f64]) -> &'a [u32] {
        match self {
            TreeNode::Internal {
                feature_idx,
                left,
                right,
            } => {
                if sample[*feature_idx] < 0.5 {
                    left.leaf_counts(sample)
                } else {
                    right.leaf_counts(sample)
                }
            }
            TreeNode::Leaf { class_counts } => class_counts,
        }
    }
}

/// Random Forest - ensemble of Gini-split decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<TreeNode>,
    n_estimators: usize,
    n_classes: usize,
}

impl RandomForestClassifier {
    /// Create an untrained forest
    pub fn new(n_estimators: usize, n_classes: usize) -> Self {
        RandomForestClassifier {
            trees: Vec::new(),
            n_estimators,
            n_classes,
        }
    }

    /// Number of trees requested for this forest
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Number of output classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Fit the forest on a feature matrix and aligned label vector
    ///
    /// Labels must be < `n_classes`. Fitting on an empty set leaves the
    /// forest without trees; `predict_proba` then falls back to uniform.
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[usize]) {
        self.trees.clear();
        if features.is_empty() {
            return;
        }

        let mut rng = StdRng::seed_from_u64(TRAINING_SEED);
        let n_features = features[0].len();
        // Standard mtry heuristic for classification
        let n_candidates = (n_features as f64).sqrt().ceil() as usize;

        for _ in 0..self.n_estimators {
            // Bootstrap sample with replacement
            let indices: Vec<usize> = (0..features.len())
                .map(|_| rng.gen_range(0..features.len()))
                .collect();

            let tree = self.build_node(features, labels, &indices, 0, n_candidates, &mut rng);
            self.trees.push(tree);
        }
    }

    /// Recursively grow a tree node over the given sample indices
    fn build_node(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        depth: usize,
        n_candidates: usize,
        rng: &mut StdRng,
    ) -> TreeNode {
        let class_counts = self.count_classes(labels, indices);

        // Stop on purity, exhaustion, or the depth cap
        let present = class_counts.iter().filter(|&&c| c > 0).count();
        if present <= 1 || indices.len() <= 1 || depth >= MAX_DEPTH {
            return TreeNode::Leaf { class_counts };
        }

        let n_features = features[0].len();
        let parent_impurity = gini(&class_counts, indices.len());

        // Evaluate a random subset of features, keep the best Gini gain
        let mut best: Option<(usize, f64)> = None;
        for _ in 0..n_candidates {
            let feature_idx = rng.gen_range(0..n_features);
            if let Some(impurity) = self.split_impurity(features, labels, indices, feature_idx) {
                let gain = parent_impurity - impurity;
                if gain > 1e-12 && best.map_or(true, |(_, g)| gain > g) {
                    best = Some((feature_idx, gain));
                }
            }
        }

        let Some((feature_idx, _)) = best else {
            return TreeNode::Leaf { class_counts };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| features[i][feature_idx] < 0.5);

        let left = Box::new(self.build_node(
            features,
            labels,
            &left_indices,
            depth + 1,
            n_candidates,
            rng,
        ));
        let right = Box::new(self.build_node(
            features,
            labels,
            &right_indices,
            depth + 1,
            n_candidates,
            rng,
        ));

        TreeNode::Internal {
            feature_idx,
            left,
            right,
        }
    }

    /// Weighted Gini impurity of splitting on `feature_idx`, or `None`
    /// when the split leaves one side empty
    fn split_impurity(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        indices: &[usize],
        feature_idx: usize,
    ) -> Option<f64> {
        let mut left_counts = vec![0u32; self.n_classes];
        let mut right_counts = vec![0u32; self.n_classes];
        let mut left_total = 0usize;

        for &i in indices {
            if features[i][feature_idx] < 0.5 {
                left_counts[labels[i]] += 1;
                left_total += 1;
            } else {
                right_counts[labels[i]] += 1;
            }
        }

        let right_total = indices.len() - left_total;
        if left_total == 0 || right_total == 0 {
            return None;
        }

        let n = indices.len() as f64;
        let weighted = (left_total as f64 / n) * gini(&left_counts, left_total)
            + (right_total as f64 / n) * gini(&right_counts, right_total);
        Some(weighted)
    }

    fn count_classes(&self, labels: &[usize], indices: &[usize]) -> Vec<u32> {
        let mut counts = vec![0u32; self.n_classes];
        for &i in indices {
            counts[labels[i]] += 1;
        }
        counts
    }

    /// Per-class probability vector for a sample, aligned to label order
    ///
    /// Averages the normalized leaf histograms across trees; an unfitted
    /// forest yields the uniform distribution.
    pub fn predict_proba(&self, sample: &[f64]) -> Vec<f64> {
        if self.trees.is_empty() {
            return vec![1.0 / self.n_classes as f64; self.n_classes];
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let counts = tree.leaf_counts(sample);
            let total: u32 = counts.iter().sum();
            if total == 0 {
                continue;
            }
            for (p, &c) in proba.iter_mut().zip(counts.iter()) {
                *p += c as f64 / total as f64;
            }
        }

        let sum: f64 = proba.iter().sum();
        if sum > 0.0 {
            for p in &mut proba {
                *p /= sum;
            }
        } else {
            proba.fill(1.0 / self.n_classes as f64);
        }
        proba
    }

    /// Most probable class index for a sample
    pub fn predict(&self, sample: &[f64]) -> usize {
        let proba = self.predict_proba(sample);
        proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

/// Gini impurity of a class histogram
fn gini(counts: &[u32], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}
