//! Random forest classifier for the 3-class enrollment outcome task.

use serde::{Deserialize, Serialize};

mod search;
mod train;

pub use search::{
    CandidateScore, DEFAULT_CANDIDATES, DEFAULT_CV_FOLDS, SearchOptions, SearchOutcome,
    SearchSpace, random_search,
};
pub use train::{ClassWeight, ForestHyperparams, train_forest};

/// Serialized model format version.
pub const MODEL_VERSION: i64 = 1;

/// Node of a fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal split: `feature <= threshold` goes left.
    Split {
        /// Feature index in training column order.
        feature: u16,
        /// Split threshold in feature units.
        threshold: f64,
        /// Index of the left child in the node arena.
        left: u32,
        /// Index of the right child in the node arena.
        right: u32,
    },
    /// Terminal node holding a normalized class distribution.
    Leaf {
        /// Per-class probability, summing to 1.
        dist: Vec<f64>,
    },
}

/// Single fitted decision tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node arena, root first.
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk the tree and return the leaf distribution for a feature row.
    pub fn leaf_dist(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature as usize).copied().unwrap_or(0.0);
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                TreeNode::Leaf { dist } => return dist,
            }
        }
    }
}

/// Fitted random forest with its global feature importances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Ordered class names; index is the encoded label.
    pub classes: Vec<String>,
    /// Expected feature row width.
    pub feature_count: usize,
    /// Hyperparameters the forest was fitted with.
    pub hyperparams: ForestHyperparams,
    /// Fitted trees.
    pub trees: Vec<DecisionTree>,
    /// Normalized impurity-decrease importances, one per feature.
    ///
    /// Absent on artifacts written before importances were recorded; the
    /// explainability layer degrades to an empty attribution list then.
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

impl ForestModel {
    /// Validate structural invariants of a deserialized model.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.classes.len() < 2 {
            return Err("Model must define at least 2 classes".to_string());
        }
        if self.feature_count == 0 {
            return Err("Model must define a feature width".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model has no trees".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("Tree {tree_idx} is empty"));
            }
            for node in &tree.nodes {
                match node {
                    TreeNode::Split { left, right, .. } => {
                        let bound = tree.nodes.len() as u32;
                        if *left >= bound || *right >= bound {
                            return Err(format!("Tree {tree_idx} has a dangling child index"));
                        }
                    }
                    TreeNode::Leaf { dist } => {
                        if dist.len() != self.classes.len() {
                            return Err(format!(
                                "Tree {tree_idx} leaf width {} does not match {} classes",
                                dist.len(),
                                self.classes.len()
                            ));
                        }
                    }
                }
            }
        }
        if let Some(importances) = &self.feature_importances {
            if importances.len() != self.feature_count {
                return Err("feature_importances length must match feature_count".to_string());
            }
        }
        Ok(())
    }

    /// Average the per-tree leaf distributions into class probabilities.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let k = self.classes.len();
        let mut probs = vec![0.0f64; k];
        for tree in &self.trees {
            for (class_idx, p) in tree.leaf_dist(features).iter().enumerate() {
                probs[class_idx] += p;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        for p in &mut probs {
            *p /= n_trees;
        }
        probs
    }

    /// Most probable class index; ties resolve to the lowest index.
    pub fn predict_class_index(&self, features: &[f64]) -> usize {
        let probs = self.predict_proba(features);
        let mut best_idx = 0usize;
        let mut best_val = f64::NEG_INFINITY;
        for (idx, &p) in probs.iter().enumerate() {
            if p > best_val {
                best_val = p;
                best_idx = idx;
            }
        }
        best_idx
    }
}
