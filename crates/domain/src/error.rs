//! Errors returned by engine mutation entry points

use thiserror::Error;

use crate::model::{CommentId, PostId};

/// Failure of a single engine operation.
///
/// None of these are fatal: the engine state is unchanged when one is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Post not found: {0}")]
    PostNotFound(PostId),
    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),
    #[error("Authentication required to {0}")]
    AuthRequired(&'static str),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::PostNotFound(_) | EngineError::CommentNotFound(_)
        )
    }
}
