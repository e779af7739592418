//! Randomized hyperparameter search with cross-validated ROC-AUC scoring.
//!
//! Candidates are drawn in a deterministic order from a seeded generator, so a
//! run is reproducible and ties on mean score keep the earlier candidate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{ClassWeight, ForestHyperparams, ForestModel, train_forest};
use crate::metrics::roc_auc_ovr;
use crate::split::stratified_folds;

/// Default cap on evaluated candidates.
pub const DEFAULT_CANDIDATES: usize = 50;
/// Default number of cross-validation folds.
pub const DEFAULT_CV_FOLDS: usize = 5;

/// Declared parameter sets the sampler may draw from.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    /// Candidate tree counts.
    pub n_estimators: Vec<usize>,
    /// Candidate depth caps.
    pub max_depth: Vec<Option<usize>>,
    /// Candidate split minimums.
    pub min_samples_split: Vec<usize>,
    /// Candidate leaf minimums.
    pub min_samples_leaf: Vec<usize>,
    /// Candidate bootstrap settings.
    pub bootstrap: Vec<bool>,
    /// Candidate class-balancing strategies.
    pub class_weight: Vec<ClassWeight>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200, 300, 500],
            max_depth: vec![None, Some(10), Some(20), Some(30)],
            min_samples_split: vec![2, 5, 10],
            min_samples_leaf: vec![1, 2, 4],
            bootstrap: vec![true, false],
            class_weight: vec![
                ClassWeight::Balanced,
                ClassWeight::BalancedSubsample,
                ClassWeight::None,
            ],
        }
    }
}

impl SearchSpace {
    fn validate(&self) -> Result<(), String> {
        if self.n_estimators.is_empty()
            || self.max_depth.is_empty()
            || self.min_samples_split.is_empty()
            || self.min_samples_leaf.is_empty()
            || self.bootstrap.is_empty()
            || self.class_weight.is_empty()
        {
            return Err("Search space has an empty parameter set".to_string());
        }
        Ok(())
    }

    /// Whether every field of `params` (except the seed) comes from this space.
    pub fn contains(&self, params: &ForestHyperparams) -> bool {
        self.n_estimators.contains(&params.n_estimators)
            && self.max_depth.contains(&params.max_depth)
            && self.min_samples_split.contains(&params.min_samples_split)
            && self.min_samples_leaf.contains(&params.min_samples_leaf)
            && self.bootstrap.contains(&params.bootstrap)
            && self.class_weight.contains(&params.class_weight)
    }

    fn sample(&self, rng: &mut StdRng, seed: u64) -> ForestHyperparams {
        ForestHyperparams {
            n_estimators: self.n_estimators[rng.random_range(0..self.n_estimators.len())],
            max_depth: self.max_depth[rng.random_range(0..self.max_depth.len())],
            min_samples_split: self.min_samples_split
                [rng.random_range(0..self.min_samples_split.len())],
            min_samples_leaf: self.min_samples_leaf
                [rng.random_range(0..self.min_samples_leaf.len())],
            bootstrap: self.bootstrap[rng.random_range(0..self.bootstrap.len())],
            class_weight: self.class_weight[rng.random_range(0..self.class_weight.len())],
            seed,
        }
    }
}

/// Search budget and reproducibility knobs.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Hard cap on evaluated candidates.
    pub candidates: usize,
    /// Cross-validation fold count.
    pub cv_folds: usize,
    /// Seed for sampling, fold assignment and the refit forest.
    pub seed: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES,
            cv_folds: DEFAULT_CV_FOLDS,
            seed: 42,
        }
    }
}

/// Mean cross-validated score of one evaluated candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Sampled configuration.
    pub params: ForestHyperparams,
    /// Mean ROC-AUC across folds.
    pub mean_score: f64,
}

/// Winning configuration with the forest refit on the full training set.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Forest refit with the best configuration.
    pub model: ForestModel,
    /// Winning hyperparameters.
    pub best_params: ForestHyperparams,
    /// Mean cross-validated ROC-AUC of the winner.
    pub cv_score: f64,
    /// Every evaluated candidate, in sampling order.
    pub evaluated: Vec<CandidateScore>,
}

/// Randomized search over `space`, scored by macro one-vs-rest ROC-AUC.
pub fn random_search(
    x: &[Vec<f64>],
    y: &[usize],
    classes: &[String],
    space: &SearchSpace,
    options: &SearchOptions,
) -> Result<SearchOutcome, String> {
    space.validate()?;
    if options.candidates == 0 {
        return Err("Candidate budget must be at least 1".to_string());
    }
    let folds = stratified_folds(y, &format!("cv-{}", options.seed), options.cv_folds)?;
    for fold in &folds {
        if fold.is_empty() {
            return Err("Too few rows for the requested fold count".to_string());
        }
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let sampled: Vec<ForestHyperparams> = (0..options.candidates)
        .map(|_| space.sample(&mut rng, options.seed))
        .collect();

    let n_classes = classes.len();
    let mut evaluated = Vec::with_capacity(sampled.len());
    let mut best: Option<(usize, f64)> = None;
    for (candidate_idx, params) in sampled.iter().enumerate() {
        let mut score_sum = 0.0;
        for fold in &folds {
            let (train_x, train_y, test_x, test_y) = fold_partition(x, y, fold);
            let model = train_forest(&train_x, &train_y, classes, params)?;
            let probs: Vec<Vec<f64>> = test_x.iter().map(|row| model.predict_proba(row)).collect();
            score_sum += roc_auc_ovr(&test_y, &probs, n_classes);
        }
        let mean_score = score_sum / folds.len() as f64;
        tracing::debug!(
            candidate = candidate_idx,
            mean_score,
            ?params,
            "evaluated candidate"
        );
        // Strict comparison keeps the first candidate on ties.
        let improved = match best {
            Some((_, best_score)) => mean_score > best_score,
            None => true,
        };
        if improved {
            best = Some((candidate_idx, mean_score));
        }
        evaluated.push(CandidateScore {
            params: params.clone(),
            mean_score,
        });
    }

    let (best_idx, cv_score) =
        best.ok_or_else(|| "No candidate could be evaluated".to_string())?;
    let best_params = sampled[best_idx].clone();
    tracing::info!(candidate = best_idx, cv_score, "refitting best configuration");
    let model = train_forest(x, y, classes, &best_params)?;
    Ok(SearchOutcome {
        model,
        best_params,
        cv_score,
        evaluated,
    })
}

fn fold_partition(
    x: &[Vec<f64>],
    y: &[usize],
    fold: &[usize],
) -> (Vec<Vec<f64>>, Vec<usize>, Vec<Vec<f64>>, Vec<usize>) {
    let in_fold: std::collections::BTreeSet<usize> = fold.iter().copied().collect();
    let mut train_x = Vec::new();
    let mut train_y = Vec::new();
    let mut test_x = Vec::new();
    let mut test_y = Vec::new();
    for idx in 0..x.len() {
        if in_fold.contains(&idx) {
            test_x.push(x[idx].clone());
            test_y.push(y[idx]);
        } else {
            train_x.push(x[idx].clone());
            train_y.push(y[idx]);
        }
    }
    (train_x, train_y, test_x, test_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        vec!["Dropout".into(), "Enrolled".into(), "Graduate".into()]
    }

    fn clustered_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for idx in 0..10 {
            let jitter = idx as f64 * 0.05;
            x.push(vec![0.0 + jitter, 0.3]);
            y.push(0);
            x.push(vec![4.0 + jitter, 0.3]);
            y.push(1);
            x.push(vec![8.0 + jitter, 0.3]);
            y.push(2);
        }
        (x, y)
    }

    fn tiny_space() -> SearchSpace {
        SearchSpace {
            n_estimators: vec![5, 10],
            max_depth: vec![None, Some(4)],
            min_samples_split: vec![2],
            min_samples_leaf: vec![1],
            bootstrap: vec![true],
            class_weight: vec![ClassWeight::None, ClassWeight::Balanced],
        }
    }

    fn tiny_options() -> SearchOptions {
        SearchOptions {
            candidates: 4,
            cv_folds: 2,
            seed: 42,
        }
    }

    #[test]
    fn winner_comes_from_declared_space() {
        let (x, y) = clustered_data();
        let space = tiny_space();
        let outcome = random_search(&x, &y, &classes(), &space, &tiny_options()).unwrap();
        assert!(space.contains(&outcome.best_params));
        for candidate in &outcome.evaluated {
            assert!(space.contains(&candidate.params));
        }
        assert_eq!(outcome.evaluated.len(), 4);
    }

    #[test]
    fn separable_data_scores_high() {
        let (x, y) = clustered_data();
        let outcome =
            random_search(&x, &y, &classes(), &tiny_space(), &tiny_options()).unwrap();
        assert!(outcome.cv_score > 0.9, "cv_score was {}", outcome.cv_score);
        assert_eq!(outcome.model.hyperparams, outcome.best_params);
    }

    #[test]
    fn search_is_reproducible() {
        let (x, y) = clustered_data();
        let first = random_search(&x, &y, &classes(), &tiny_space(), &tiny_options()).unwrap();
        let second = random_search(&x, &y, &classes(), &tiny_space(), &tiny_options()).unwrap();
        assert_eq!(first.best_params, second.best_params);
        assert_eq!(first.cv_score, second.cv_score);
        assert_eq!(first.model, second.model);
    }

    #[test]
    fn rejects_zero_candidates() {
        let (x, y) = clustered_data();
        let options = SearchOptions {
            candidates: 0,
            ..tiny_options()
        };
        assert!(random_search(&x, &y, &classes(), &tiny_space(), &options).is_err());
    }

    #[test]
    fn rejects_empty_space() {
        let (x, y) = clustered_data();
        let space = SearchSpace {
            n_estimators: Vec::new(),
            ..tiny_space()
        };
        assert!(random_search(&x, &y, &classes(), &space, &tiny_options()).is_err());
    }

    #[test]
    fn default_space_matches_declared_sets() {
        let space = SearchSpace::default();
        assert_eq!(space.n_estimators, vec![100, 200, 300, 500]);
        assert_eq!(space.max_depth, vec![None, Some(10), Some(20), Some(30)]);
        assert!(space.contains(&ForestHyperparams {
            n_estimators: 500,
            max_depth: Some(30),
            min_samples_split: 10,
            min_samples_leaf: 4,
            bootstrap: false,
            class_weight: ClassWeight::BalancedSubsample,
            seed: 0,
        }));
        assert!(!space.contains(&ForestHyperparams {
            n_estimators: 50,
            ..ForestHyperparams::default()
        }));
    }
}
