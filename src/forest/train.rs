//! Random forest fitting: bootstrap sampling, weighted Gini splits,
//! impurity-decrease importances.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{DecisionTree, ForestModel, MODEL_VERSION, TreeNode};

/// Class-balancing strategy applied through sample weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// All samples weigh 1.
    None,
    /// `total / (n_classes * count)` computed on the full training set.
    Balanced,
    /// Balanced weights recomputed on each tree's bootstrap sample.
    BalancedSubsample,
}

/// Forest hyperparameters; the search engine samples these from its space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestHyperparams {
    /// Number of trees.
    pub n_estimators: usize,
    /// Depth cap; `None` grows until leaves are pure or too small.
    pub max_depth: Option<usize>,
    /// Minimum samples at a node to attempt a split.
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split.
    pub min_samples_leaf: usize,
    /// Draw each tree's sample with replacement.
    pub bootstrap: bool,
    /// Class-balancing strategy.
    pub class_weight: ClassWeight,
    /// Master seed; per-tree seeds derive from it.
    pub seed: u64,
}

impl Default for ForestHyperparams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            class_weight: ClassWeight::None,
            seed: 42,
        }
    }
}

/// Fit a forest on a full feature matrix.
///
/// Rows are in training column order: the caller aligns columns through the
/// schema before this point, never here.
pub fn train_forest(
    x: &[Vec<f64>],
    y: &[usize],
    classes: &[String],
    params: &ForestHyperparams,
) -> Result<ForestModel, String> {
    if x.is_empty() {
        return Err("Empty training set".to_string());
    }
    if x.len() != y.len() {
        return Err("Mismatched feature/label lengths".to_string());
    }
    let n_classes = classes.len();
    if n_classes < 2 {
        return Err("Need at least 2 classes".to_string());
    }
    let width = x[0].len();
    if width == 0 {
        return Err("Feature rows are empty".to_string());
    }
    for row in x {
        if row.len() != width {
            return Err("Inconsistent feature row width".to_string());
        }
    }
    if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
        return Err(format!("Label {label} outside {n_classes} classes"));
    }
    if params.n_estimators == 0 {
        return Err("n_estimators must be at least 1".to_string());
    }
    if params.min_samples_split < 2 || params.min_samples_leaf < 1 {
        return Err("Invalid split/leaf minimums".to_string());
    }

    let n = x.len();
    let base_weights = match params.class_weight {
        ClassWeight::Balanced => balanced_weights(y, n_classes),
        _ => vec![1.0; n_classes],
    };
    let max_features = ((width as f64).sqrt().round() as usize).clamp(1, width);

    let mut trees = Vec::with_capacity(params.n_estimators);
    let mut importances = vec![0.0f64; width];
    for tree_idx in 0..params.n_estimators {
        let mut rng = StdRng::seed_from_u64(
            params
                .seed
                .wrapping_add((tree_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        );
        let indices: Vec<usize> = if params.bootstrap {
            (0..n).map(|_| rng.random_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        let class_weights = if params.class_weight == ClassWeight::BalancedSubsample {
            let sampled: Vec<usize> = indices.iter().map(|&idx| y[idx]).collect();
            balanced_weights(&sampled, n_classes)
        } else {
            base_weights.clone()
        };

        let mut builder = TreeBuilder {
            x,
            y,
            n_classes,
            class_weights: &class_weights,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features,
            nodes: Vec::new(),
            importances: &mut importances,
            rng,
        };
        let total_weight = builder.node_weight(&indices);
        builder.build(indices, 0, total_weight);
        trees.push(DecisionTree {
            nodes: builder.nodes,
        });
    }

    let total: f64 = importances.iter().sum();
    if total > 0.0 {
        for value in &mut importances {
            *value /= total;
        }
    }

    let model = ForestModel {
        model_version: MODEL_VERSION,
        classes: classes.to_vec(),
        feature_count: width,
        hyperparams: params.clone(),
        trees,
        feature_importances: Some(importances),
    };
    model.validate()?;
    Ok(model)
}

fn balanced_weights(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    let total = y.len() as f64;
    counts
        .into_iter()
        .map(|count| {
            if count == 0 {
                0.0
            } else {
                total / (n_classes as f64 * count as f64)
            }
        })
        .collect()
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    class_weights: &'a [f64],
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
    nodes: Vec<TreeNode>,
    importances: &'a mut [f64],
    rng: StdRng,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl TreeBuilder<'_> {
    /// Recursively grow the subtree for `indices`, returning its node index.
    fn build(&mut self, indices: Vec<usize>, depth: usize, total_weight: f64) -> u32 {
        let counts = self.weighted_counts(&indices);
        let node_weight: f64 = counts.iter().sum();
        let impurity = gini(&counts, node_weight);

        let depth_reached = self.max_depth.is_some_and(|cap| depth >= cap);
        if depth_reached
            || indices.len() < self.min_samples_split
            || impurity == 0.0
            || node_weight == 0.0
        {
            return self.push_leaf(&counts, node_weight);
        }

        let Some(split) = self.best_split(&indices, &counts, node_weight, impurity) else {
            return self.push_leaf(&counts, node_weight);
        };

        if total_weight > 0.0 {
            self.importances[split.feature] += (node_weight / total_weight) * split.decrease;
        }

        let node_idx = self.nodes.len() as u32;
        // Reserve the slot so children land after their parent.
        self.nodes.push(TreeNode::Leaf { dist: Vec::new() });
        let left = self.build(split.left, depth + 1, total_weight);
        let right = self.build(split.right, depth + 1, total_weight);
        self.nodes[node_idx as usize] = TreeNode::Split {
            feature: split.feature as u16,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }

    fn push_leaf(&mut self, counts: &[f64], node_weight: f64) -> u32 {
        let dist = if node_weight > 0.0 {
            counts.iter().map(|&c| c / node_weight).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        };
        let idx = self.nodes.len() as u32;
        self.nodes.push(TreeNode::Leaf { dist });
        idx
    }

    fn best_split(
        &mut self,
        indices: &[usize],
        parent_counts: &[f64],
        parent_weight: f64,
        parent_impurity: f64,
    ) -> Option<BestSplit> {
        let width = self.x[0].len();
        let mut features: Vec<usize> = (0..width).collect();
        features.shuffle(&mut self.rng);
        features.truncate(self.max_features);
        // Candidate order must not affect the winner.
        features.sort_unstable();

        let mut best: Option<(usize, f64, f64)> = None;
        for &feature in &features {
            let mut ordered: Vec<(f64, usize)> = indices
                .iter()
                .map(|&idx| (self.x[idx][feature], idx))
                .collect();
            ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_counts = vec![0.0f64; self.n_classes];
            let mut left_weight = 0.0f64;
            let mut left_n = 0usize;
            for pos in 0..ordered.len().saturating_sub(1) {
                let (value, idx) = ordered[pos];
                let w = self.class_weights[self.y[idx]];
                left_counts[self.y[idx]] += w;
                left_weight += w;
                left_n += 1;

                let next_value = ordered[pos + 1].0;
                if next_value == value {
                    continue;
                }
                let right_n = ordered.len() - left_n;
                if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                    continue;
                }
                let right_weight = parent_weight - left_weight;
                if left_weight <= 0.0 || right_weight <= 0.0 {
                    continue;
                }
                let right_counts: Vec<f64> = parent_counts
                    .iter()
                    .zip(left_counts.iter())
                    .map(|(&p, &l)| p - l)
                    .collect();
                let weighted_child = (left_weight / parent_weight) * gini(&left_counts, left_weight)
                    + (right_weight / parent_weight) * gini(&right_counts, right_weight);
                let decrease = parent_impurity - weighted_child;
                if decrease <= 0.0 {
                    continue;
                }
                let threshold = (value + next_value) / 2.0;
                let better = match best {
                    Some((_, _, best_decrease)) => decrease > best_decrease,
                    None => true,
                };
                if better {
                    best = Some((feature, threshold, decrease));
                }
            }
        }

        let (feature, threshold, decrease) = best?;
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &idx in indices {
            if self.x[idx][feature] <= threshold {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }
        Some(BestSplit {
            feature,
            threshold,
            decrease,
            left,
            right,
        })
    }

    fn weighted_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0f64; self.n_classes];
        for &idx in indices {
            counts[self.y[idx]] += self.class_weights[self.y[idx]];
        }
        counts
    }

    fn node_weight(&self, indices: &[usize]) -> f64 {
        self.weighted_counts(indices).iter().sum()
    }
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let mut sum_sq = 0.0;
    for &count in counts {
        let p = count / total;
        sum_sq += p * p;
    }
    1.0 - sum_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        vec!["Dropout".into(), "Enrolled".into(), "Graduate".into()]
    }

    /// Three well-separated clusters along the first feature.
    fn separable_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for idx in 0..12 {
            let jitter = (idx % 4) as f64 * 0.1;
            x.push(vec![0.0 + jitter, 1.0]);
            y.push(0);
            x.push(vec![5.0 + jitter, 1.0]);
            y.push(1);
            x.push(vec![10.0 + jitter, 1.0]);
            y.push(2);
        }
        (x, y)
    }

    fn small_params() -> ForestHyperparams {
        ForestHyperparams {
            n_estimators: 10,
            ..ForestHyperparams::default()
        }
    }

    #[test]
    fn learns_separable_clusters() {
        let (x, y) = separable_data();
        let model = train_forest(&x, &y, &classes(), &small_params()).unwrap();
        assert_eq!(model.predict_class_index(&[0.2, 1.0]), 0);
        assert_eq!(model.predict_class_index(&[5.2, 1.0]), 1);
        assert_eq!(model.predict_class_index(&[10.2, 1.0]), 2);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (x, y) = separable_data();
        let model = train_forest(&x, &y, &classes(), &small_params()).unwrap();
        for row in &x {
            let sum: f64 = model.predict_proba(row).iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "sum was {sum}");
        }
    }

    #[test]
    fn importances_are_normalized_and_informative() {
        let (x, y) = separable_data();
        let model = train_forest(&x, &y, &classes(), &small_params()).unwrap();
        let importances = model.feature_importances.as_ref().unwrap();
        assert_eq!(importances.len(), 2);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // Only the first feature separates the classes.
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let (x, y) = separable_data();
        let params = small_params();
        let first = train_forest(&x, &y, &classes(), &params).unwrap();
        let second = train_forest(&x, &y, &classes(), &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_differ() {
        let (x, y) = separable_data();
        let first = train_forest(&x, &y, &classes(), &small_params()).unwrap();
        let second = train_forest(
            &x,
            &y,
            &classes(),
            &ForestHyperparams {
                seed: 7,
                ..small_params()
            },
        )
        .unwrap();
        assert_ne!(first.trees, second.trees);
    }

    #[test]
    fn balanced_weights_invert_frequency() {
        let weights = balanced_weights(&[0, 0, 0, 1], 2);
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let err = train_forest(&[vec![0.0]], &[0, 1], &classes(), &small_params());
        assert!(err.is_err());
        let err = train_forest(&[], &[], &classes(), &small_params());
        assert!(err.is_err());
        let err = train_forest(&[vec![0.0]], &[5], &classes(), &small_params());
        assert!(err.is_err());
    }

    #[test]
    fn max_depth_one_yields_shallow_trees() {
        let (x, y) = separable_data();
        let params = ForestHyperparams {
            max_depth: Some(1),
            ..small_params()
        };
        let model = train_forest(&x, &y, &classes(), &params).unwrap();
        for tree in &model.trees {
            // Depth 1: at most one split and two leaves.
            assert!(tree.nodes.len() <= 3);
        }
    }
}
