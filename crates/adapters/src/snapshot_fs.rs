//! JSON file snapshot store

use async_trait::async_trait;
use social_state_domain::{PersistenceError, SnapshotStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Stores the durable record in one file. Writes go to a sibling temp file
/// that is then renamed over the target, so a crash never leaves a torn
/// record behind.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    path: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::Io(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, payload: &[u8]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PersistenceError::Io(format!("Failed to create directory: {}", e)))?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, payload)
            .await
            .map_err(|e| PersistenceError::Io(format!("Failed to write {}: {}", temp.display(), e)))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| PersistenceError::Io(format!("Failed to replace {}: {}", self.path.display(), e)))?;

        tracing::debug!(path = %self.path.display(), bytes = payload.len(), "Wrote snapshot");
        Ok(())
    }
}
