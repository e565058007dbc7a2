//! Application use cases / business logic

pub mod engine;
pub mod feed_sync;
pub mod flush;

pub use engine::SocialEngine;
pub use feed_sync::{FeedSync, FeedSyncConfig, PageReport, SourceReport, SyncError};
pub use flush::{FlushHandle, FlushStatus, FlushWorker};
