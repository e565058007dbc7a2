//! Derived read views

use serde::Serialize;

use crate::model::{Comment, Post, PostId};
use crate::state::{CommentIndex, EngagementTracker, PostRepository};

/// Totals over every post currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngagementSummary {
    pub total_posts: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    /// Interactions (likes, comments and shares) per post; 0 when empty
    pub engagement_rate: f64,
}

/// Read-only views composed from the engine's state components.
///
/// `liked_posts` and `saved_posts` scan the whole collection, which is fine
/// for the hundreds to low thousands of posts a client holds. A larger
/// deployment would want a secondary index ordered like the repository.
#[derive(Clone, Copy)]
pub struct QueryFacade<'a> {
    posts: &'a PostRepository,
    comments: &'a CommentIndex,
    engagement: &'a EngagementTracker,
}

impl<'a> QueryFacade<'a> {
    pub(crate) fn new(
        posts: &'a PostRepository,
        comments: &'a CommentIndex,
        engagement: &'a EngagementTracker,
    ) -> Self {
        Self {
            posts,
            comments,
            engagement,
        }
    }

    /// Every post in read order
    pub fn posts(self) -> impl Iterator<Item = &'a Post> {
        self.posts.iter()
    }

    pub fn post(&self, id: &PostId) -> Option<&'a Post> {
        self.posts.get(id)
    }

    pub fn liked_posts(&self) -> Vec<&'a Post> {
        let engagement = self.engagement;
        self.posts
            .iter()
            .filter(|post| engagement.is_liked(&post.id))
            .collect()
    }

    pub fn saved_posts(&self) -> Vec<&'a Post> {
        let engagement = self.engagement;
        self.posts
            .iter()
            .filter(|post| engagement.is_saved(&post.id))
            .collect()
    }

    /// Comments of a post, oldest first; empty for unknown or deleted posts
    pub fn post_comments(&self, id: &PostId) -> &'a [Comment] {
        self.comments.comments_for(id)
    }

    pub fn is_post_liked(&self, id: &PostId) -> bool {
        self.engagement.is_liked(id)
    }

    pub fn is_post_saved(&self, id: &PostId) -> bool {
        self.engagement.is_saved(id)
    }

    pub fn summary(&self) -> EngagementSummary {
        let mut summary = self.posts.iter().fold(EngagementSummary::default(), |mut acc, post| {
            acc.total_posts += 1;
            acc.total_likes += u64::from(post.counters.likes);
            acc.total_comments += u64::from(post.counters.comments);
            acc.total_shares += u64::from(post.counters.shares);
            acc
        });
        if summary.total_posts > 0 {
            let interactions = summary.total_likes + summary.total_comments + summary.total_shares;
            summary.engagement_rate = interactions as f64 / summary.total_posts as f64;
        }
        summary
    }

    /// Case-insensitive match on title, body or tags, in read order
    pub fn search(&self, query: &str) -> Vec<&'a Post> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.posts
            .iter()
            .filter(|post| {
                post.title.to_lowercase().contains(&needle)
                    || post.body.to_lowercase().contains(&needle)
                    || post.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
