//! Driver attribution for individual predictions.
//!
//! Two independent mechanisms, reported side by side and never merged:
//! a statistical heuristic ranked by `raw value x global importance`, and
//! fixed rule checks against known risk indicators. The heuristic uses the
//! forest's global split-usage importances, not a per-instance decomposition,
//! and works on unnormalized feature scales; the direction label is a sign
//! convention, not a causal claim.

use serde::Serialize;

use crate::forest::ForestModel;
use crate::schema::FeatureVector;

/// Canonical driver count for compact reports.
pub const COMPACT_DRIVER_COUNT: usize = 3;
/// Driver count for detailed reports.
pub const DETAILED_DRIVER_COUNT: usize = 5;

/// Sign convention for a heuristic contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Contribution > 0.
    AddsToRisk,
    /// Contribution <= 0.
    SupportsRetention,
}

impl Direction {
    /// Label used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddsToRisk => "adds to risk",
            Self::SupportsRetention => "supports retention",
        }
    }
}

/// One ranked heuristic driver behind a prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationDriver {
    /// Schema field name.
    pub field: String,
    /// Raw value from the validated request.
    pub value: f64,
    /// `value x importance`; magnitude used for ranking.
    pub contribution: f64,
    /// Sign convention label.
    pub direction: Direction,
}

/// Rank fields by `|value x importance|` and keep the top `k`.
///
/// Returns an empty list when the model exposes no importances, so a
/// prediction never fails for lack of an explanation.
pub fn attribute(model: &ForestModel, vector: &FeatureVector, k: usize) -> Vec<ExplanationDriver> {
    let Some(importances) = model.feature_importances.as_ref() else {
        return Vec::new();
    };
    let values = vector.values();
    if importances.len() != values.len() {
        return Vec::new();
    }
    let mut drivers: Vec<ExplanationDriver> = crate::schema::FEATURES
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let contribution = values[idx] * importances[idx];
            ExplanationDriver {
                field: spec.name.to_string(),
                value: values[idx],
                contribution,
                direction: if contribution > 0.0 {
                    Direction::AddsToRisk
                } else {
                    Direction::SupportsRetention
                },
            }
        })
        .collect();
    // Stable sort keeps schema order among equal magnitudes.
    drivers.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    drivers.truncate(k);
    drivers
}

/// Fixed rule checks against known risk indicators, in a fixed order.
///
/// Independent of the statistical ranking; runs even when attribution is
/// unavailable.
pub fn rule_drivers(vector: &FeatureVector) -> Vec<String> {
    let mut drivers = Vec::new();
    if vector.get("tuition_fees_up_to_date") == Some(0.0) {
        drivers.push("Tuition Fees Unpaid".to_string());
    }
    if vector.get("scholarship_holder") == Some(0.0) {
        drivers.push("No Scholarship Support".to_string());
    }
    if vector.get("debtor") == Some(1.0) {
        drivers.push("Existing Debtor".to_string());
    }
    drivers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{ForestHyperparams, MODEL_VERSION, train_forest};
    use crate::schema::{self, FEATURE_COUNT, tests::valid_payload};

    fn fitted_model(importances: Option<Vec<f64>>) -> ForestModel {
        let x = vec![
            vec![0.0; FEATURE_COUNT],
            vec![1.0; FEATURE_COUNT],
            vec![2.0; FEATURE_COUNT],
            vec![3.0; FEATURE_COUNT],
        ];
        let y = vec![0, 1, 2, 0];
        let classes = vec![
            "Dropout".to_string(),
            "Enrolled".to_string(),
            "Graduate".to_string(),
        ];
        let params = ForestHyperparams {
            n_estimators: 3,
            ..ForestHyperparams::default()
        };
        let mut model = train_forest(&x, &y, &classes, &params).unwrap();
        assert_eq!(model.model_version, MODEL_VERSION);
        model.feature_importances = importances;
        model
    }

    #[test]
    fn ranks_by_absolute_contribution() {
        let mut importances = vec![0.0; FEATURE_COUNT];
        let grade_idx = schema::field_index("admission_grade").unwrap();
        let gdp_idx = schema::field_index("gdp").unwrap();
        let age_idx = schema::field_index("age_at_enrollment").unwrap();
        importances[grade_idx] = 0.5;
        importances[gdp_idx] = 0.3;
        importances[age_idx] = 0.01;
        let model = fitted_model(Some(importances));

        let mut payload = valid_payload();
        payload.insert("admission_grade".into(), 120.0);
        payload.insert("gdp".into(), -2.0);
        payload.insert("age_at_enrollment".into(), 30.0);
        let vector = schema::validate(&payload).unwrap();

        let drivers = attribute(&model, &vector, 3);
        assert_eq!(drivers.len(), 3);
        assert_eq!(drivers[0].field, "admission_grade");
        assert_eq!(drivers[0].direction, Direction::AddsToRisk);
        assert_eq!(drivers[1].field, "gdp");
        assert_eq!(drivers[1].direction, Direction::SupportsRetention);
        assert!((drivers[1].contribution - -0.6).abs() < 1e-12);
        assert_eq!(drivers[2].field, "age_at_enrollment");
    }

    #[test]
    fn caller_selects_driver_count() {
        let model = fitted_model(Some(vec![0.1; FEATURE_COUNT]));
        let vector = schema::validate(&valid_payload()).unwrap();
        assert_eq!(attribute(&model, &vector, COMPACT_DRIVER_COUNT).len(), 3);
        assert_eq!(attribute(&model, &vector, DETAILED_DRIVER_COUNT).len(), 5);
    }

    #[test]
    fn missing_importances_degrade_to_empty() {
        let model = fitted_model(None);
        let vector = schema::validate(&valid_payload()).unwrap();
        assert!(attribute(&model, &vector, 3).is_empty());
        // Rule drivers still run.
        assert!(!rule_drivers(&vector).is_empty());
    }

    #[test]
    fn mismatched_importance_width_degrades_to_empty() {
        let model = fitted_model(Some(vec![0.5; 3]));
        let vector = schema::validate(&valid_payload()).unwrap();
        assert!(attribute(&model, &vector, 3).is_empty());
    }

    #[test]
    fn rule_drivers_fire_in_fixed_order() {
        let mut payload = valid_payload();
        payload.insert("tuition_fees_up_to_date".into(), 0.0);
        payload.insert("scholarship_holder".into(), 0.0);
        payload.insert("debtor".into(), 1.0);
        let vector = schema::validate(&payload).unwrap();
        assert_eq!(
            rule_drivers(&vector),
            vec![
                "Tuition Fees Unpaid".to_string(),
                "No Scholarship Support".to_string(),
                "Existing Debtor".to_string(),
            ]
        );
    }

    #[test]
    fn rule_drivers_absent_for_healthy_profile() {
        let mut payload = valid_payload();
        payload.insert("tuition_fees_up_to_date".into(), 1.0);
        payload.insert("scholarship_holder".into(), 1.0);
        payload.insert("debtor".into(), 0.0);
        let vector = schema::validate(&payload).unwrap();
        assert!(rule_drivers(&vector).is_empty());
    }
}
