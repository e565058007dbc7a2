//! Like/save membership for the local viewer

use std::collections::BTreeSet;

use crate::model::{Comment, CommentId, Post, PostId};

/// Authoritative engagement sets. Post and comment flags are derived from
/// these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementState {
    pub liked_post_ids: BTreeSet<PostId>,
    pub saved_post_ids: BTreeSet<PostId>,
    pub liked_comment_ids: BTreeSet<CommentId>,
}

/// Whether an engagement call changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Applied,
    Unchanged,
}

impl Engagement {
    pub fn is_applied(&self) -> bool {
        matches!(self, Engagement::Applied)
    }
}

/// Applies engagement transitions.
///
/// Every method checks membership and updates set, counter and flag in one
/// call on exclusively borrowed data, so no caller can observe a flag that
/// disagrees with the set.
#[derive(Debug, Default)]
pub struct EngagementTracker {
    state: EngagementState,
}

impl EngagementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngagementState {
        &self.state
    }

    pub fn is_liked(&self, id: &PostId) -> bool {
        self.state.liked_post_ids.contains(id)
    }

    pub fn is_saved(&self, id: &PostId) -> bool {
        self.state.saved_post_ids.contains(id)
    }

    pub fn is_comment_liked(&self, id: &CommentId) -> bool {
        self.state.liked_comment_ids.contains(id)
    }

    pub(crate) fn like(&mut self, post: &mut Post) -> Engagement {
        post.is_liked = true;
        if !self.state.liked_post_ids.insert(post.id) {
            return Engagement::Unchanged;
        }
        post.counters.likes = post.counters.likes.saturating_add(1);
        Engagement::Applied
    }

    pub(crate) fn unlike(&mut self, post: &mut Post) -> Engagement {
        post.is_liked = false;
        if !self.state.liked_post_ids.remove(&post.id) {
            return Engagement::Unchanged;
        }
        post.counters.likes = post.counters.likes.saturating_sub(1);
        Engagement::Applied
    }

    pub(crate) fn save(&mut self, post: &mut Post) -> Engagement {
        post.is_saved = true;
        if self.state.saved_post_ids.insert(post.id) {
            Engagement::Applied
        } else {
            Engagement::Unchanged
        }
    }

    pub(crate) fn unsave(&mut self, post: &mut Post) -> Engagement {
        post.is_saved = false;
        if self.state.saved_post_ids.remove(&post.id) {
            Engagement::Applied
        } else {
            Engagement::Unchanged
        }
    }

    pub(crate) fn like_comment(&mut self, comment: &mut Comment) -> Engagement {
        comment.is_liked = true;
        if !self.state.liked_comment_ids.insert(comment.id) {
            return Engagement::Unchanged;
        }
        comment.like_count = comment.like_count.saturating_add(1);
        Engagement::Applied
    }

    pub(crate) fn unlike_comment(&mut self, comment: &mut Comment) -> Engagement {
        comment.is_liked = false;
        if !self.state.liked_comment_ids.remove(&comment.id) {
            return Engagement::Unchanged;
        }
        comment.like_count = comment.like_count.saturating_sub(1);
        Engagement::Applied
    }

    /// Derive flags for a post entering the repository. A remote post the
    /// viewer liked in an earlier session gets the viewer's like added to
    /// the upstream total.
    pub(crate) fn adopt(&self, post: &mut Post) {
        post.is_liked = self.is_liked(&post.id);
        post.is_saved = self.is_saved(&post.id);
        if post.is_liked {
            post.counters.likes = post.counters.likes.saturating_add(1);
        }
    }

    /// Re-derive flags without touching counters
    pub(crate) fn sync_flags(&self, post: &mut Post) {
        post.is_liked = self.is_liked(&post.id);
        post.is_saved = self.is_saved(&post.id);
    }

    /// Re-check a restored local post's like counter against the loaded
    /// set. Local posts only ever carry the viewer's own like, so a counter
    /// that still assumes a like the set no longer holds is lowered by one.
    pub(crate) fn reconcile_local_likes(&self, post: &mut Post) {
        if self.is_liked(&post.id) {
            post.counters.likes = post.counters.likes.max(1);
        } else {
            post.counters.likes = post.counters.likes.saturating_sub(1);
        }
    }

    pub(crate) fn sync_comment_flag(&self, comment: &mut Comment) {
        comment.is_liked = self.is_comment_liked(&comment.id);
    }

    /// Purge a deleted post and its comments from every set
    pub(crate) fn forget_post(&mut self, id: &PostId, comment_ids: &[CommentId]) {
        self.state.liked_post_ids.remove(id);
        self.state.saved_post_ids.remove(id);
        for comment_id in comment_ids {
            self.state.liked_comment_ids.remove(comment_id);
        }
    }

    pub(crate) fn restore(&mut self, state: EngagementState) {
        self.state = state;
    }
}
