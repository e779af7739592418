//! Core library for the student retention intelligence engine.
/// Versioned model artifact persistence.
pub mod artifact;
/// Training configuration file support.
pub mod config;
/// Delimited training-data loading and target encoding.
pub mod dataset;
/// Per-prediction driver attribution.
pub mod explain;
/// Random forest classifier and hyperparameter search.
pub mod forest;
/// Logging setup.
pub mod logging;
/// Classification evaluation metrics.
pub mod metrics;
/// Counselor report rendering.
pub mod report;
/// Risk banding from dropout probability.
pub mod risk;
/// Canonical feature schema.
pub mod schema;
/// Inference service over a loaded artifact.
pub mod service;
/// Deterministic stratified splits.
pub mod split;
