//! Persistence for trained model artifacts.
//!
//! An artifact is written once per training run and never mutated; saves stage
//! to a temporary file and rename into place so a concurrent reader can never
//! observe a half-written bundle.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::forest::{ForestHyperparams, ForestModel};
use crate::metrics::EvaluationReport;

/// Serialized artifact format version.
pub const ARTIFACT_VERSION: i64 = 1;

/// Validation scores recorded at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationMetrics {
    /// Mean cross-validated macro ROC-AUC of the winning configuration.
    pub cv_roc_auc: f64,
    /// Holdout evaluation, when a holdout split was taken.
    #[serde(default)]
    pub holdout: Option<EvaluationReport>,
}

/// Immutable bundle of a fitted forest and the metadata inference relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Artifact format version.
    pub artifact_version: i64,
    /// Unix timestamp of the training run that produced this bundle.
    pub created_at_unix: i64,
    /// Training column order; inference must match it exactly.
    pub feature_order: Vec<String>,
    /// Label-code mapping: index in this list is the encoded class.
    pub classes: Vec<String>,
    /// Winning hyperparameters.
    pub hyperparams: ForestHyperparams,
    /// Scores recorded at training time.
    pub metrics: ValidationMetrics,
    /// The fitted forest.
    pub model: ForestModel,
}

impl ModelArtifact {
    /// Assemble an artifact stamped with the current time.
    pub fn new(
        model: ForestModel,
        feature_order: Vec<String>,
        metrics: ValidationMetrics,
    ) -> Self {
        Self {
            artifact_version: ARTIFACT_VERSION,
            created_at_unix: OffsetDateTime::now_utc().unix_timestamp(),
            feature_order,
            classes: model.classes.clone(),
            hyperparams: model.hyperparams.clone(),
            metrics,
            model,
        }
    }

    /// Check internal consistency of a deserialized bundle.
    pub fn validate(&self) -> Result<(), String> {
        if self.artifact_version != ARTIFACT_VERSION {
            return Err(format!(
                "Unsupported artifact_version {} (expected {ARTIFACT_VERSION})",
                self.artifact_version
            ));
        }
        if self.feature_order.len() != self.model.feature_count {
            return Err(format!(
                "feature_order has {} names but the model expects {} features",
                self.feature_order.len(),
                self.model.feature_count
            ));
        }
        if self.classes != self.model.classes {
            return Err("Artifact classes disagree with the model classes".to_string());
        }
        self.model.validate()
    }
}

/// Failures while persisting or loading an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Nothing exists at the expected path; callers should treat the service
    /// as unavailable rather than as a user error.
    #[error("No model artifact at {path}")]
    NotFound {
        /// Path that was probed.
        path: PathBuf,
    },
    /// Filesystem failure while reading or writing.
    #[error("Artifact I/O failed for {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file exists but is not a valid bundle of the expected shape.
    #[error("Artifact at {path} is not a valid model bundle: {reason}")]
    Format {
        /// Path involved.
        path: PathBuf,
        /// What failed during decoding or validation.
        reason: String,
    },
}

/// Atomically write an artifact to `path`.
pub fn save(artifact: &ModelArtifact, path: &Path) -> Result<(), ArtifactError> {
    artifact.validate().map_err(|reason| ArtifactError::Format {
        path: path.to_path_buf(),
        reason,
    })?;
    let bytes = serde_json::to_vec_pretty(artifact).map_err(|err| ArtifactError::Format {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp).map_err(|source| ArtifactError::Io {
        path: tmp.clone(),
        source,
    })?;
    file.write_all(&bytes).map_err(|source| ArtifactError::Io {
        path: tmp.clone(),
        source,
    })?;
    file.flush().map_err(|source| ArtifactError::Io {
        path: tmp.clone(),
        source,
    })?;
    drop(file);
    fs::rename(&tmp, path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate an artifact from `path`.
pub fn load(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    if !path.is_file() {
        return Err(ArtifactError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let artifact: ModelArtifact =
        serde_json::from_slice(&bytes).map_err(|err| ArtifactError::Format {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    artifact.validate().map_err(|reason| ArtifactError::Format {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{ForestHyperparams, train_forest};
    use tempfile::tempdir;

    fn fitted_artifact() -> ModelArtifact {
        let x = vec![
            vec![0.0, 1.0],
            vec![0.1, 1.0],
            vec![5.0, 1.0],
            vec![5.1, 1.0],
            vec![9.0, 1.0],
            vec![9.1, 1.0],
        ];
        let y = vec![0, 0, 1, 1, 2, 2];
        let classes = vec![
            "Dropout".to_string(),
            "Enrolled".to_string(),
            "Graduate".to_string(),
        ];
        let params = ForestHyperparams {
            n_estimators: 5,
            ..ForestHyperparams::default()
        };
        let model = train_forest(&x, &y, &classes, &params).unwrap();
        ModelArtifact::new(
            model,
            vec!["first".into(), "second".into()],
            ValidationMetrics {
                cv_roc_auc: 0.97,
                holdout: None,
            },
        )
    }

    #[test]
    fn round_trips_losslessly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = fitted_artifact();
        save(&artifact, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.model, artifact.model);
        assert_eq!(loaded.feature_order, artifact.feature_order);
        assert_eq!(loaded.classes, artifact.classes);
        assert_eq!(loaded.created_at_unix, artifact.created_at_unix);
        // Loaded model predicts identically to the in-memory one.
        let row = vec![5.05, 1.0];
        assert_eq!(loaded.model.predict_proba(&row), artifact.model.predict_proba(&row));
    }

    #[test]
    fn save_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        save(&fitted_artifact(), &path).unwrap();
        assert!(path.is_file());
        assert!(!dir.path().join("model.tmp").exists());
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load(&path), Err(ArtifactError::NotFound { .. })));
    }

    #[test]
    fn garbage_bytes_are_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Format { .. })));
    }

    #[test]
    fn inconsistent_bundle_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut artifact = fitted_artifact();
        save(&artifact, &path).unwrap();
        // Tamper after the fact: drop a feature name.
        artifact.feature_order.pop();
        let bytes = serde_json::to_vec(&artifact).unwrap();
        fs::write(&path, bytes).unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Format { .. })));
    }
}
