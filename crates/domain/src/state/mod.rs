//! In-memory state components owned by the engine

pub mod comments;
pub mod engagement;
pub mod repository;

pub use comments::CommentIndex;
pub use engagement::{Engagement, EngagementState, EngagementTracker};
pub use repository::{FeedRecord, IngestSummary, PostRepository, RemoteFields};
