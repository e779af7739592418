//! Deterministic stratified splits keyed by a seed string.
//!
//! Rows are ordered per class by a hash of `(seed, class, row index)`, so the
//! same seed always yields the same partition regardless of input order in
//! memory or platform.

/// Split row indices into a train/holdout pair, stratified by label.
///
/// `holdout_fraction` must lie in `(0, 1)`. Classes with a single row keep it
/// in the training set.
pub fn stratified_holdout(
    y: &[usize],
    seed: &str,
    holdout_fraction: f64,
) -> Result<(Vec<usize>, Vec<usize>), String> {
    if !(holdout_fraction > 0.0 && holdout_fraction < 1.0) {
        return Err(format!("Invalid holdout fraction: {holdout_fraction}"));
    }
    let mut train = Vec::new();
    let mut holdout = Vec::new();
    for entries in rank_by_class(y, seed) {
        let n = entries.len();
        let mut holdout_n = ((n as f64) * holdout_fraction).round() as usize;
        if holdout_n >= n {
            holdout_n = n.saturating_sub(1);
        }
        for (pos, (_key, idx)) in entries.into_iter().enumerate() {
            if pos < holdout_n {
                holdout.push(idx);
            } else {
                train.push(idx);
            }
        }
    }
    train.sort_unstable();
    holdout.sort_unstable();
    Ok((train, holdout))
}

/// Assign every row to one of `k` cross-validation folds, stratified by label.
pub fn stratified_folds(y: &[usize], seed: &str, k: usize) -> Result<Vec<Vec<usize>>, String> {
    if k < 2 {
        return Err(format!("Need at least 2 folds, got {k}"));
    }
    let mut folds = vec![Vec::new(); k];
    for entries in rank_by_class(y, seed) {
        for (pos, (_key, idx)) in entries.into_iter().enumerate() {
            folds[pos % k].push(idx);
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

fn rank_by_class(y: &[usize], seed: &str) -> Vec<Vec<(u128, usize)>> {
    let n_classes = y.iter().copied().max().map_or(0, |max| max + 1);
    let mut by_class: Vec<Vec<(u128, usize)>> = vec![Vec::new(); n_classes];
    for (idx, &label) in y.iter().enumerate() {
        let hash = blake3::hash(format!("{seed}|{label}|{idx}").as_bytes());
        let key = u128::from_le_bytes(hash.as_bytes()[0..16].try_into().expect("slice size"));
        by_class[label].push((key, idx));
    }
    for entries in &mut by_class {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
    }
    by_class
}
