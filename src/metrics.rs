//! Evaluation metrics for the outcome classifier.

use serde::{Deserialize, Serialize};

/// Confusion matrix for a `K`-class classifier.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u64>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Record one (truth, predicted) pair. Out-of-range labels are ignored.
    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        self.counts[truth * self.n_classes + predicted] += 1;
    }

    /// Count for a (truth, predicted) cell.
    pub fn get(&self, truth: usize, predicted: usize) -> u64 {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Fraction of correctly classified rows; 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        let mut correct = 0u64;
        let mut total = 0u64;
        for truth in 0..self.n_classes {
            for predicted in 0..self.n_classes {
                let v = self.get(truth, predicted);
                total += v;
                if truth == predicted {
                    correct += v;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }
}

/// Precision/recall/F1 breakdown for one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassReport {
    /// Class name.
    pub class: String,
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// True rows for the class.
    pub support: u64,
}

/// Holdout evaluation snapshot persisted in artifact metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Overall accuracy.
    pub accuracy: f64,
    /// Per-class breakdown, indexed like the label encoding.
    pub per_class: Vec<ClassReport>,
}

/// Build the evaluation report from a confusion matrix.
pub fn evaluation_report(cm: &ConfusionMatrix, classes: &[String]) -> EvaluationReport {
    let k = cm.n_classes;
    let mut per_class = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f64;
        let mut fp = 0.0;
        let mut fn_ = 0.0;
        let mut support = 0u64;
        for predicted in 0..k {
            let v = cm.get(class_idx, predicted);
            support += v;
            if predicted != class_idx {
                fn_ += v as f64;
            }
        }
        for truth in 0..k {
            if truth != class_idx {
                fp += cm.get(truth, class_idx) as f64;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        per_class.push(ClassReport {
            class: classes
                .get(class_idx)
                .cloned()
                .unwrap_or_else(|| class_idx.to_string()),
            precision,
            recall,
            f1,
            support,
        });
    }
    EvaluationReport {
        accuracy: cm.accuracy(),
        per_class,
    }
}

/// Macro-averaged one-vs-rest ROC-AUC for a multi-class probability matrix.
///
/// `probs[i][c]` is the predicted probability of class `c` for row `i`.
/// Classes with no positive or no negative rows carry no information and are
/// skipped; if every class is degenerate the score falls back to 0.5.
pub fn roc_auc_ovr(y: &[usize], probs: &[Vec<f64>], n_classes: usize) -> f64 {
    let mut sum = 0.0;
    let mut counted = 0usize;
    for class_idx in 0..n_classes {
        let scores: Vec<f64> = probs
            .iter()
            .map(|row| row.get(class_idx).copied().unwrap_or(0.0))
            .collect();
        if let Some(auc) = binary_auc(y, class_idx, &scores) {
            sum += auc;
            counted += 1;
        }
    }
    if counted == 0 { 0.5 } else { sum / counted as f64 }
}

/// Rank-statistic AUC for one class against the rest, with tied-score handling.
fn binary_auc(y: &[usize], positive: usize, scores: &[f64]) -> Option<f64> {
    let n = y.len();
    let n_pos = y.iter().filter(|&&label| label == positive).count();
    if n_pos == 0 || n_pos == n {
        return None;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks across ties, then apply the Mann-Whitney identity.
    let mut rank_sum_pos = 0.0f64;
    let mut idx = 0usize;
    while idx < n {
        let mut end = idx + 1;
        while end < n && scores[order[end]] == scores[order[idx]] {
            end += 1;
        }
        let avg_rank = ((idx + 1 + end) as f64) / 2.0;
        for &row in &order[idx..end] {
            if y[row] == positive {
                rank_sum_pos += avg_rank;
            }
        }
        idx = end;
    }
    let n_pos_f = n_pos as f64;
    let n_neg_f = (n - n_pos) as f64;
    Some((rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg_f))
}
