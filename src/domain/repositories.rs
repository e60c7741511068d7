//! Storage and data source abstractions.
//!
//! - `ArtifactStore`: persists and loads the single trained artifact
//! - `DatasetSource`: yields labeled historical records for training
//!
//! Both are synchronous. Loading an artifact is the only blocking step on the
//! prediction path and happens once per process.

use crate::domain::errors::{ArtifactError, TrainingError};
use crate::domain::pricing::artifact::TrainedArtifact;
use crate::domain::pricing::record::{Dataset, TargetKind};

/// Persistence for trained artifacts
pub trait ArtifactStore: Send + Sync {
    /// Publish an artifact. Readers never observe a partially written one.
    fn save(&self, artifact: &TrainedArtifact) -> Result<(), ArtifactError>;

    /// Load the current artifact, or `ArtifactError::NotFound`.
    fn load(&self) -> Result<TrainedArtifact, ArtifactError>;

    /// Human readable location for logs.
    fn location(&self) -> String;
}

/// Batch source of labeled training rows
pub trait DatasetSource {
    /// Read every row, skipping and counting malformed ones.
    fn load(&self, target: TargetKind) -> Result<Dataset, TrainingError>;
}
