//! In-memory snapshot store for testing and ephemeral sessions

use async_trait::async_trait;
use social_state_domain::{PersistenceError, SnapshotStore};
use std::sync::RwLock;

/// In-memory snapshot store implementation
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    record: RwLock<Option<Vec<u8>>>,
    writes: RwLock<u64>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing record
    pub fn with_record(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            record: RwLock::new(Some(payload.into())),
            writes: RwLock::new(0),
        }
    }

    /// Number of successful saves
    pub fn writes(&self) -> u64 {
        self.writes.read().map(|w| *w).unwrap_or_default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        let record = self
            .record
            .read()
            .map_err(|e| PersistenceError::Io(e.to_string()))?;
        Ok(record.clone())
    }

    async fn save(&self, payload: &[u8]) -> Result<(), PersistenceError> {
        let mut record = self
            .record
            .write()
            .map_err(|e| PersistenceError::Io(e.to_string()))?;
        *record = Some(payload.to_vec());

        let mut writes = self
            .writes
            .write()
            .map_err(|e| PersistenceError::Io(e.to_string()))?;
        *writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemorySnapshotStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(b"one").await.unwrap();
        store.save(b"two").await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_seeded_record() {
        let store = InMemorySnapshotStore::with_record("seed");
        assert_eq!(store.load().await.unwrap(), Some(b"seed".to_vec()));
        assert_eq!(store.writes(), 0);
    }
}
