//! In-Memory Artifact Store
//!
//! Thread-safe, in-memory implementation of `ArtifactStore`.
//!
//! # Features
//!
//! - **Thread-safe**: Uses `RwLock` for concurrent access
//! - **Round-trips**: Stores the serialized JSON bytes, so every load decodes
//!   exactly what a file-backed store would
//! - **Testing**: Counts loads and can simulate slow storage
//!
//! # Limitations
//!
//! - Data is lost on application restart

use crate::domain::errors::ArtifactError;
use crate::domain::pricing::artifact::TrainedArtifact;
use crate::domain::repositories::ArtifactStore;
use crate::infrastructure::artifact_store::{decode_artifact, encode_artifact};
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const LOCATION: &str = "memory://artifact";

#[derive(Default)]
pub struct InMemoryArtifactStore {
    bytes: RwLock<Option<Vec<u8>>>,
    loads: AtomicUsize,
    load_delay: Duration,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every `load`, widening the window for concurrent callers.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Number of `load` calls made so far, successful or not.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn save(&self, artifact: &TrainedArtifact) -> Result<(), ArtifactError> {
        let encoded = encode_artifact(artifact, LOCATION)?;
        *self.bytes.write().unwrap_or_else(|e| e.into_inner()) = Some(encoded);
        Ok(())
    }

    fn load(&self) -> Result<TrainedArtifact, ArtifactError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            std::thread::sleep(self.load_delay);
        }

        let guard = self.bytes.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_deref() {
            Some(bytes) => decode_artifact(bytes, LOCATION),
            None => Err(ArtifactError::NotFound {
                path: PathBuf::from(LOCATION),
            }),
        }
    }

    fn location(&self) -> String {
        LOCATION.to_string()
    }
}
