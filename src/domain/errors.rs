use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning raw records into feature vectors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Feature transform used before it was fitted")]
    NotFitted,

    #[error("Cannot fit feature transform on an empty record set")]
    EmptyFit,

    #[error("Field out of range: {field}")]
    OutOfRange { field: &'static str },
}

/// Errors related to persisting and loading trained artifacts
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("No trained artifact found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Artifact I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact at {location} is corrupt: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("Unsupported artifact format v{found} (expected v{expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Failure inside the regression estimator (fit or inference)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} failed: {reason}")]
pub struct ModelError {
    pub stage: &'static str,
    pub reason: String,
}

impl ModelError {
    pub fn new(stage: &'static str, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Errors that abort a training run
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("No usable training rows ({skipped} malformed rows skipped)")]
    EmptyDataset { skipped: usize },

    #[error("Failed to read training data: {reason}")]
    Source { reason: String },

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Errors returned to prediction callers
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Schema(#[from] FeatureError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PredictionError {
    /// True when the caller sent a malformed record. Everything else is a
    /// server-side problem.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Schema(FeatureError::MissingField { .. } | FeatureError::OutOfRange { .. })
        )
    }
}
