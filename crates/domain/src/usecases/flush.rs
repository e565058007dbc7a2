//! Coalescing snapshot writer
//!
//! Mutations hand the complete durable snapshot to a [`FlushHandle`]. The
//! handle keeps only the newest one (a `watch` slot of depth one) and a
//! single background task writes it after a short debounce window. Because
//! one task writes sequentially, flushes land in submission order and the
//! last write to land always carries the last submitted snapshot.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::persistence::{self, PersistedState};
use crate::ports::{PersistenceError, SnapshotStore};

#[derive(Debug, Clone)]
struct PendingSnapshot {
    generation: u64,
    state: Arc<PersistedState>,
}

/// Progress of the flush worker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushStatus {
    /// Generation of the last snapshot a write was attempted for
    pub completed_generation: u64,
    /// Number of writes attempted
    pub writes: u64,
    /// Error of the most recent write, cleared by the next success
    pub last_error: Option<PersistenceError>,
}

/// Submission side of the flush worker. Cheap to clone; the worker stops
/// once every handle is dropped and the pending snapshot is written.
#[derive(Debug, Clone)]
pub struct FlushHandle {
    slot: Arc<watch::Sender<Option<PendingSnapshot>>>,
    status: watch::Receiver<FlushStatus>,
}

impl FlushHandle {
    /// Replace any pending snapshot with this one. Never blocks.
    pub fn submit(&self, generation: u64, state: PersistedState) {
        self.slot.send_replace(Some(PendingSnapshot {
            generation,
            state: Arc::new(state),
        }));
    }

    pub fn status(&self) -> FlushStatus {
        self.status.borrow().clone()
    }

    /// Wait until a snapshot of at least `generation` has been written and
    /// report how that write went
    pub async fn settle(&self, generation: u64) -> Result<(), PersistenceError> {
        let mut status = self.status.clone();
        let landed = status
            .wait_for(|s| s.completed_generation >= generation)
            .await
            .map_err(|_| PersistenceError::Io("flush worker stopped".to_string()))?;

        match &landed.last_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Background writer for durable snapshots
pub struct FlushWorker<S: SnapshotStore + ?Sized> {
    store: Arc<S>,
    window: Duration,
}

impl<S> FlushWorker<S>
where
    S: SnapshotStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, window: Duration) -> Self {
        Self { store, window }
    }

    /// Start the worker on the current tokio runtime
    pub fn spawn(self) -> (FlushHandle, JoinHandle<()>) {
        let (slot_tx, slot_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(FlushStatus::default());

        let handle = FlushHandle {
            slot: Arc::new(slot_tx),
            status: status_rx,
        };
        let task = tokio::spawn(self.run(slot_rx, status_tx));

        (handle, task)
    }

    async fn run(
        self,
        mut slot: watch::Receiver<Option<PendingSnapshot>>,
        status: watch::Sender<FlushStatus>,
    ) {
        // `changed` still yields an unseen value after the last handle is
        // dropped, so the final snapshot is always written.
        while slot.changed().await.is_ok() {
            if !self.window.is_zero() {
                tokio::time::sleep(self.window).await;
            }

            let pending = slot.borrow_and_update().clone();
            let Some(pending) = pending else {
                continue;
            };

            let result = self.write(&pending.state).await;
            match &result {
                Ok(()) => tracing::debug!(generation = pending.generation, "Flushed snapshot"),
                Err(error) => tracing::warn!(
                    generation = pending.generation,
                    error = %error,
                    "Snapshot flush failed, will retry on next mutation"
                ),
            }

            status.send_modify(|s| {
                s.completed_generation = pending.generation;
                s.writes += 1;
                s.last_error = result.err();
            });
        }

        tracing::debug!("Flush worker stopped");
    }

    async fn write(&self, state: &PersistedState) -> Result<(), PersistenceError> {
        let bytes = persistence::serialize(state)?;
        self.store.save(&bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PostId, SourceTag};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<Vec<u8>>>,
        fail: bool,
    }

    #[async_trait]
    impl SnapshotStore for RecordingStore {
        async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
            Ok(self.writes.lock().unwrap().last().cloned())
        }

        async fn save(&self, payload: &[u8]) -> Result<(), PersistenceError> {
            if self.fail {
                return Err(PersistenceError::Io("disk full".to_string()));
            }
            self.writes.lock().unwrap().push(payload.to_vec());
            Ok(())
        }
    }

    fn state_liking(n: u64) -> PersistedState {
        let mut state = PersistedState::default();
        for i in 1..=n {
            state
                .engagement
                .liked_post_ids
                .insert(PostId::remote(SourceTag::DummyJson, i));
        }
        state
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_into_latest_snapshot() {
        let store = Arc::new(RecordingStore::default());
        let (handle, _task) =
            FlushWorker::new(Arc::clone(&store), Duration::from_millis(50)).spawn();

        for generation in 1..=5 {
            handle.submit(generation, state_liking(generation));
        }
        handle.settle(5).await.unwrap();

        let writes = store.writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        let landed = persistence::deserialize(&writes[0]);
        assert_eq!(landed.engagement.liked_post_ids.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_landed_write_is_last_submission() {
        let store = Arc::new(RecordingStore::default());
        let (handle, _task) =
            FlushWorker::new(Arc::clone(&store), Duration::from_millis(10)).spawn();

        handle.submit(1, state_liking(1));
        handle.settle(1).await.unwrap();
        handle.submit(2, state_liking(2));
        handle.submit(3, state_liking(3));
        handle.settle(3).await.unwrap();

        let writes = store.writes.lock().unwrap().clone();
        let last = persistence::deserialize(writes.last().unwrap());
        assert_eq!(last.engagement.liked_post_ids.len(), 3);
        assert_eq!(handle.status().completed_generation, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_drains_pending_snapshot() {
        let store = Arc::new(RecordingStore::default());
        let (handle, task) =
            FlushWorker::new(Arc::clone(&store), Duration::from_millis(10)).spawn();

        handle.submit(1, state_liking(2));
        drop(handle);
        task.await.unwrap();

        assert_eq!(store.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_is_reported_not_fatal() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let (handle, _task) = FlushWorker::new(store, Duration::ZERO).spawn();

        handle.submit(1, state_liking(1));
        let result = handle.settle(1).await;

        assert_eq!(result, Err(PersistenceError::Io("disk full".to_string())));
        assert!(handle.status().last_error.is_some());
    }

    #[tokio::test]
    async fn test_settle_without_submissions_returns_immediately() {
        let store = Arc::new(RecordingStore::default());
        let (handle, _task) = FlushWorker::new(store, Duration::ZERO).spawn();
        handle.settle(0).await.unwrap();
    }
}
