//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{FeedPage, SourceTag, UserId};

/// Error type for feed source operations
#[derive(Debug, Error)]
pub enum FeedSourceError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Port for fetching raw post pages from an upstream feed
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch one page of `limit` records starting at `offset`
    async fn fetch_page(
        &self,
        source: SourceTag,
        offset: u64,
        limit: u32,
    ) -> Result<FeedPage, FeedSourceError>;
}

/// Port supplying the locally authenticated viewer
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is signed in
    fn current_viewer(&self) -> Option<UserId>;
}

/// Error type for snapshot persistence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Database error: {0}")]
    Database(String),
}

/// Port for storing the single namespaced durable record
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored record, `None` if nothing was ever written
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Replace the stored record
    async fn save(&self, payload: &[u8]) -> Result<(), PersistenceError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
