//! Training configuration loaded from a TOML file.
//!
//! Every knob has a default, so an absent file and an empty file both yield
//! the standard tuning budget. Command-line flags are applied on top by the
//! training binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that may occur while loading training configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// The parsed values are unusable.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tuning and split settings for a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    /// Hyperparameter candidates sampled during random search.
    pub candidates: usize,
    /// Cross-validation folds per candidate.
    pub cv_folds: usize,
    /// Master seed for the split, the search and the forest.
    pub seed: u64,
    /// Fraction of rows reserved for the final holdout evaluation.
    pub holdout_fraction: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            candidates: 50,
            cv_folds: 5,
            seed: 42,
            holdout_fraction: 0.2,
        }
    }
}

impl TrainConfig {
    /// Load from `path`, returning defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no training run could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates == 0 {
            return Err(ConfigError::Invalid("candidates must be at least 1".into()));
        }
        if self.cv_folds < 2 {
            return Err(ConfigError::Invalid("cv_folds must be at least 2".into()));
        }
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(ConfigError::Invalid(
                "holdout_fraction must be strictly between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}
