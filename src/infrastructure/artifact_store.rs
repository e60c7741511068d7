use crate::domain::errors::ArtifactError;
use crate::domain::pricing::artifact::{ARTIFACT_FORMAT_VERSION, TrainedArtifact};
use crate::domain::repositories::ArtifactStore;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Serialize an artifact to its on-disk JSON form.
pub fn encode_artifact(artifact: &TrainedArtifact, location: &str) -> Result<Vec<u8>, ArtifactError> {
    serde_json::to_vec(artifact).map_err(|e| ArtifactError::Corrupt {
        location: location.to_string(),
        reason: format!("serialization failed: {}", e),
    })
}

/// Parse an artifact, rejecting unknown format versions before full decoding.
pub fn decode_artifact(bytes: &[u8], location: &str) -> Result<TrainedArtifact, ArtifactError> {
    #[derive(Deserialize)]
    struct VersionProbe {
        format_version: u32,
    }

    let corrupt = |e: serde_json::Error| ArtifactError::Corrupt {
        location: location.to_string(),
        reason: e.to_string(),
    };

    let probe: VersionProbe = serde_json::from_slice(bytes).map_err(corrupt)?;
    if probe.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found: probe.format_version,
            expected: ARTIFACT_FORMAT_VERSION,
        });
    }
    serde_json::from_slice(bytes).map_err(corrupt)
}

/// Artifact stored as a single JSON file at a fixed path.
pub struct FsArtifactStore {
    path: PathBuf,
}

impl FsArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling of the target so the final rename never crosses filesystems.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, artifact: &TrainedArtifact) -> Result<(), ArtifactError> {
        let io_error = |source: io::Error| ArtifactError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let bytes = encode_artifact(artifact, &self.location())?;

        // Atomic write: write to temp file then rename
        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, &bytes).and_then(|_| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_error(e));
        }

        info!(
            "Saved {} artifact ({} bytes) to {:?}",
            artifact.target,
            bytes.len(),
            self.path
        );
        Ok(())
    }

    fn load(&self) -> Result<TrainedArtifact, ArtifactError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(ArtifactError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let artifact = decode_artifact(&bytes, &self.location())?;
        info!(
            "Loaded {} artifact trained at {} from {:?}",
            artifact.target, artifact.trained_at, self.path
        );
        Ok(artifact)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rentcast-store-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let store = FsArtifactStore::new(scratch_dir().join("absent.json"));
        match store.load() {
            Err(ArtifactError::NotFound { path }) => assert!(path.ends_with("absent.json")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_file_is_corrupt() {
        let dir = scratch_dir();
        let path = dir.join("model.json");
        fs::write(&path, b"not json").unwrap();
        let store = FsArtifactStore::new(&path);
        assert!(matches!(store.load(), Err(ArtifactError::Corrupt { .. })));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_future_format_version_is_rejected() {
        let dir = scratch_dir();
        let path = dir.join("model.json");
        fs::write(&path, br#"{"format_version": 99}"#).unwrap();
        let store = FsArtifactStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(ArtifactError::UnsupportedVersion {
                found: 99,
                expected: ARTIFACT_FORMAT_VERSION
            })
        ));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let store = FsArtifactStore::new("/srv/models/rent_model.json");
        let temp = store.temp_path();
        assert_eq!(temp.parent(), Some(Path::new("/srv/models")));
        let name = temp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".rent_model.json."));
        assert!(name.ends_with(".tmp"));
    }
}
