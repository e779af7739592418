//! Inference over a loaded model artifact.
//!
//! The service owns an explicitly constructed artifact handle: load happens
//! once in the constructor and the bundle is shared read-only behind an `Arc`
//! afterwards, so concurrent predictions never race a lazy initializer.
//! Reloading is a caller decision made by constructing a fresh service.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::artifact::{self, ArtifactError, ModelArtifact};
use crate::dataset::Outcome;
use crate::explain::{self, COMPACT_DRIVER_COUNT, ExplanationDriver};
use crate::risk::{self, RiskLevel};
use crate::schema::{self, FeatureVector, SchemaError};

/// Failures surfaced by the inference path.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request payload failed schema validation; caller error, never
    /// retried and never coerced into a weakened prediction.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The artifact could not be loaded.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    /// The artifact's stored column order disagrees with the schema; fatal
    /// version skew that must never be silently reordered around.
    #[error(
        "Artifact column order diverges from the schema at position {position}: \
         artifact has '{artifact}', schema has '{schema}'"
    )]
    ColumnMismatch {
        /// First diverging position.
        position: usize,
        /// Name stored in the artifact at that position.
        artifact: String,
        /// Name the schema expects at that position.
        schema: String,
    },
    /// The artifact's label mapping is not the expected outcome set.
    #[error("Artifact label mapping {found:?} does not cover the outcome classes")]
    LabelMismatch {
        /// Classes stored in the artifact.
        found: Vec<String>,
    },
}

/// Complete response for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Decoded outcome label.
    pub label: String,
    /// Per-class probabilities, indexed like the artifact's class list.
    pub probabilities: Vec<f64>,
    /// Probability of the Dropout class.
    pub dropout_probability: f64,
    /// `round(dropout_probability * 100, 2)`.
    pub risk_score: f64,
    /// Discrete risk band.
    pub risk_level: RiskLevel,
    /// Ranked heuristic drivers (top 3); empty when attribution is
    /// unavailable.
    pub drivers: Vec<ExplanationDriver>,
    /// Rule-based drivers, independent of the heuristic ranking.
    pub rule_drivers: Vec<String>,
}

/// Prediction front-end bound to one immutable artifact.
#[derive(Debug, Clone)]
pub struct InferenceService {
    artifact: Arc<ModelArtifact>,
}

impl InferenceService {
    /// Load the artifact at `path` and bind a service to it.
    pub fn open(path: &Path) -> Result<Self, ServiceError> {
        let artifact = artifact::load(path)?;
        Self::from_artifact(artifact)
    }

    /// Bind a service to an already-loaded artifact.
    ///
    /// Column order and label mapping are checked here, once, so the per-call
    /// path can trust both.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ServiceError> {
        let expected = schema::order();
        let stored = &artifact.feature_order;
        for position in 0..expected.len().max(stored.len()) {
            let schema_name = expected.get(position).map(String::as_str).unwrap_or("");
            let stored_name = stored.get(position).map(String::as_str).unwrap_or("");
            if schema_name != stored_name {
                return Err(ServiceError::ColumnMismatch {
                    position,
                    artifact: stored_name.to_string(),
                    schema: schema_name.to_string(),
                });
            }
        }
        let expected_classes: Vec<String> =
            Outcome::CLASSES.iter().map(|name| name.to_string()).collect();
        if artifact.classes != expected_classes {
            return Err(ServiceError::LabelMismatch {
                found: artifact.classes.clone(),
            });
        }
        Ok(Self {
            artifact: Arc::new(artifact),
        })
    }

    /// The bound artifact, for metadata display.
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Validate a named payload and predict.
    pub fn predict(
        &self,
        payload: &BTreeMap<String, f64>,
    ) -> Result<PredictionResult, ServiceError> {
        let vector = schema::validate(payload)?;
        Ok(self.predict_vector(&vector))
    }

    /// Predict for an already-validated vector.
    ///
    /// Deterministic: the same artifact and vector always produce an
    /// identical result.
    pub fn predict_vector(&self, vector: &FeatureVector) -> PredictionResult {
        let model = &self.artifact.model;
        let probabilities = model.predict_proba(vector.values());
        let class_idx = model.predict_class_index(vector.values());
        let label = self.artifact.classes[class_idx].clone();
        let dropout_probability = probabilities[Outcome::Dropout.class_index()];
        let (risk_score, risk_level) = risk::score(dropout_probability);
        let drivers = explain::attribute(model, vector, COMPACT_DRIVER_COUNT);
        let rule_drivers = explain::rule_drivers(vector);
        PredictionResult {
            label,
            probabilities,
            dropout_probability,
            risk_score,
            risk_level,
            drivers,
            rule_drivers,
        }
    }
}
