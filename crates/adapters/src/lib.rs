//! social-state adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `feed`: HTTP and stub feed sources
//! - `snapshot`: File, SQLite and in-memory snapshot stores
//! - `identity`: Static identity provider

mod snapshot_fs;
mod snapshot_memory;
mod snapshot_sqlite;

pub mod feed;
pub mod identity;

/// Re-exports for snapshot adapters
pub mod snapshot {
    pub use crate::snapshot_fs::FsSnapshotStore;
    pub use crate::snapshot_memory::InMemorySnapshotStore;
    pub use crate::snapshot_sqlite::{DEFAULT_NAMESPACE, SqliteSnapshotStore};
}
