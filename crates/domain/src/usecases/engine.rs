//! Social engine - the single mutation entry point
//!
//! Owns the post repository, comment index and engagement tracker. Every
//! mutation takes `&mut self`, checks the viewer and the target, applies the
//! transition and hands a fresh snapshot to the flush worker when anything
//! changed.

use std::sync::Arc;

use crate::error::EngineError;
use crate::model::{
    Comment, CommentId, FeedPage, Post, PostDraft, PostId, PostOrigin, PostPatch, SharePlatform,
    UserId,
};
use crate::persistence::PersistedState;
use crate::policy::{ComposePolicy, ComposeValidator};
use crate::ports::Clock;
use crate::query::QueryFacade;
use crate::state::{
    CommentIndex, Engagement, EngagementTracker, FeedRecord, IngestSummary, PostRepository,
};
use crate::usecases::flush::FlushHandle;

/// Composition of the state components
pub struct SocialEngine {
    posts: PostRepository,
    comments: CommentIndex,
    engagement: EngagementTracker,
    compose: ComposeValidator,
    clock: Arc<dyn Clock>,
    flush: Option<FlushHandle>,
    generation: u64,
}

impl SocialEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            posts: PostRepository::new(),
            comments: CommentIndex::new(),
            engagement: EngagementTracker::new(),
            compose: ComposeValidator::default(),
            clock,
            flush: None,
            generation: 0,
        }
    }

    pub fn with_compose_policy(mut self, policy: ComposePolicy) -> Self {
        self.compose = ComposeValidator::new(policy);
        self
    }

    /// Submit a snapshot to `handle` after every applied mutation
    pub fn with_flush(mut self, handle: FlushHandle) -> Self {
        self.flush = Some(handle);
        self
    }

    /// Load a durable record. Flags of posts and comments already held are
    /// re-derived from the restored sets.
    pub fn restore(&mut self, state: PersistedState) {
        self.engagement.restore(state.engagement);
        self.comments.restore(state.comments, state.next_comment_id);
        self.posts.restore(
            state.local_posts,
            state.deleted_post_ids,
            state.next_local_post_id,
        );

        for post in self.posts.iter_mut() {
            self.engagement.sync_flags(post);
            if let PostOrigin::Local = post.origin() {
                let comment_count = self.comments.count_for(&post.id);
                post.counters.comments = u32::try_from(comment_count).unwrap_or(u32::MAX);
                self.engagement.reconcile_local_likes(post);
            }
        }
        for comment in self.comments.iter_mut() {
            self.engagement.sync_comment_flag(comment);
        }

        tracing::info!(
            posts = self.posts.len(),
            comments = self.comments.len(),
            liked = self.engagement.state().liked_post_ids.len(),
            saved = self.engagement.state().saved_post_ids.len(),
            "Restored engagement state"
        );
    }

    /// Current durable subset
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            engagement: self.engagement.state().clone(),
            comments: self.comments.to_map(),
            local_posts: self.posts.local_posts().cloned().collect(),
            deleted_post_ids: self.posts.tombstones().clone(),
            next_comment_id: self.comments.next_id(),
            next_local_post_id: self.posts.next_local_id(),
        }
    }

    /// Number of snapshots submitted so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> QueryFacade<'_> {
        QueryFacade::new(&self.posts, &self.comments, &self.engagement)
    }

    /// Merge one batch of raw records from a single source.
    ///
    /// New posts start from the upstream like total plus the viewer's own
    /// persisted like, and from the number of comments already held for them.
    pub fn ingest<R: FeedRecord>(&mut self, records: impl IntoIterator<Item = R>) -> IngestSummary {
        let source = R::SOURCE;
        let summary = self.posts.ingest_batch(records, self.clock.now());

        for id in &summary.inserted {
            let comment_count = self.comments.count_for(id);
            if let Some(post) = self.posts.get_mut(id) {
                post.counters.comments = u32::try_from(comment_count).unwrap_or(u32::MAX);
                self.engagement.adopt(post);
            }
        }

        tracing::debug!(
            source = %source,
            inserted = summary.inserted.len(),
            refreshed = summary.refreshed,
            skipped = summary.skipped,
            "Ingested batch"
        );
        summary
    }

    pub fn ingest_page(&mut self, page: FeedPage) -> IngestSummary {
        match page {
            FeedPage::Placeholder(posts) => self.ingest(posts),
            FeedPage::Dummy { posts, .. } => self.ingest(posts),
        }
    }

    /// Compose a new local post
    pub fn create_post(
        &mut self,
        draft: PostDraft,
        viewer: Option<UserId>,
    ) -> Result<Post, EngineError> {
        let viewer = require_viewer(viewer, "create a post")?;
        let draft = self.compose.validate(&draft)?;

        let id = self.posts.create_local(draft, viewer, self.clock.now());
        let post = self
            .posts
            .get(&id)
            .cloned()
            .ok_or(EngineError::PostNotFound(id))?;

        tracing::info!(post_id = %id, author = %viewer, "Created post");
        self.persist();
        Ok(post)
    }

    /// Shallow-merge `patch` into a post. The merged title and body must
    /// still satisfy the compose policy.
    pub fn update_post(&mut self, id: &PostId, patch: PostPatch) -> Result<Post, EngineError> {
        let current = self.posts.get(id).ok_or(EngineError::PostNotFound(*id))?;
        if patch.is_empty() {
            return Ok(current.clone());
        }

        let title = patch.title.as_deref().unwrap_or(&current.title).trim().to_string();
        let body = patch.body.as_deref().unwrap_or(&current.body).trim().to_string();
        self.compose.check_content(&title, &body)?;

        // Body hashtags join the tag set on edits the same way they do on create
        let tags = if patch.body.is_some() || patch.tags.is_some() {
            let base = patch.tags.as_deref().unwrap_or(&current.tags);
            Some(self.compose.merge_hashtags(base, &body))
        } else {
            None
        };

        let patch = PostPatch {
            title: patch.title.map(|_| title),
            body: patch.body.map(|_| body),
            tags,
            ..patch
        };
        let post = self.posts.update(id, patch)?.clone();

        tracing::info!(post_id = %id, "Updated post");
        self.persist();
        Ok(post)
    }

    /// Delete a post, its comments and every engagement entry naming them
    pub fn delete_post(&mut self, id: &PostId) -> Result<Post, EngineError> {
        let post = self.posts.remove(id)?;
        let removed = self.comments.cascade_remove(id);
        self.engagement.forget_post(id, &removed);

        tracing::info!(post_id = %id, comments = removed.len(), "Deleted post");
        self.persist();
        Ok(post)
    }

    pub fn like(&mut self, id: &PostId, viewer: Option<UserId>) -> Result<Engagement, EngineError> {
        require_viewer(viewer, "like a post")?;
        let post = self.posts.get_mut(id).ok_or(EngineError::PostNotFound(*id))?;
        let outcome = self.engagement.like(post);
        self.after_engagement(outcome, id, "Liked post");
        Ok(outcome)
    }

    pub fn unlike(&mut self, id: &PostId, viewer: Option<UserId>) -> Result<Engagement, EngineError> {
        require_viewer(viewer, "unlike a post")?;
        let post = self.posts.get_mut(id).ok_or(EngineError::PostNotFound(*id))?;
        let outcome = self.engagement.unlike(post);
        self.after_engagement(outcome, id, "Unliked post");
        Ok(outcome)
    }

    pub fn save(&mut self, id: &PostId, viewer: Option<UserId>) -> Result<Engagement, EngineError> {
        require_viewer(viewer, "save a post")?;
        let post = self.posts.get_mut(id).ok_or(EngineError::PostNotFound(*id))?;
        let outcome = self.engagement.save(post);
        self.after_engagement(outcome, id, "Saved post");
        Ok(outcome)
    }

    pub fn unsave(&mut self, id: &PostId, viewer: Option<UserId>) -> Result<Engagement, EngineError> {
        require_viewer(viewer, "unsave a post")?;
        let post = self.posts.get_mut(id).ok_or(EngineError::PostNotFound(*id))?;
        let outcome = self.engagement.unsave(post);
        self.after_engagement(outcome, id, "Unsaved post");
        Ok(outcome)
    }

    /// Record a share event and return the new share count. Shares are
    /// events, so every call counts.
    pub fn share(
        &mut self,
        id: &PostId,
        viewer: Option<UserId>,
        platform: SharePlatform,
    ) -> Result<u32, EngineError> {
        require_viewer(viewer, "share a post")?;
        let post = self.posts.get_mut(id).ok_or(EngineError::PostNotFound(*id))?;
        post.counters.shares = post.counters.shares.saturating_add(1);
        let shares = post.counters.shares;
        let origin = post.origin();

        tracing::info!(post_id = %id, platform = %platform, shares, "Shared post");
        // Remote counters are rebuilt from the feed, only local ones are durable
        if origin == PostOrigin::Local {
            self.persist();
        }
        Ok(shares)
    }

    pub fn add_comment(
        &mut self,
        post_id: &PostId,
        viewer: Option<UserId>,
        body: &str,
    ) -> Result<Comment, EngineError> {
        let viewer = require_viewer(viewer, "comment")?;
        let body = body.trim();
        if body.is_empty() {
            return Err(EngineError::Validation("comment body is empty".to_string()));
        }
        let post = self
            .posts
            .get_mut(post_id)
            .ok_or(EngineError::PostNotFound(*post_id))?;

        post.counters.comments = post.counters.comments.saturating_add(1);
        let comment = self
            .comments
            .append(*post_id, viewer, body.to_string(), self.clock.now())
            .clone();

        tracing::info!(post_id = %post_id, comment_id = %comment.id, "Added comment");
        self.persist();
        Ok(comment)
    }

    pub fn like_comment(
        &mut self,
        id: &CommentId,
        viewer: Option<UserId>,
    ) -> Result<Engagement, EngineError> {
        require_viewer(viewer, "like a comment")?;
        let comment = self
            .comments
            .get_mut(id)
            .ok_or(EngineError::CommentNotFound(*id))?;
        let outcome = self.engagement.like_comment(comment);
        if outcome.is_applied() {
            tracing::info!(comment_id = %id, "Liked comment");
            self.persist();
        }
        Ok(outcome)
    }

    pub fn unlike_comment(
        &mut self,
        id: &CommentId,
        viewer: Option<UserId>,
    ) -> Result<Engagement, EngineError> {
        require_viewer(viewer, "unlike a comment")?;
        let comment = self
            .comments
            .get_mut(id)
            .ok_or(EngineError::CommentNotFound(*id))?;
        let outcome = self.engagement.unlike_comment(comment);
        if outcome.is_applied() {
            tracing::info!(comment_id = %id, "Unliked comment");
            self.persist();
        }
        Ok(outcome)
    }

    fn after_engagement(&mut self, outcome: Engagement, id: &PostId, message: &'static str) {
        if outcome.is_applied() {
            tracing::info!(post_id = %id, "{}", message);
            self.persist();
        } else {
            tracing::debug!(post_id = %id, "{} (no change)", message);
        }
    }

    /// Bump the generation and hand the snapshot to the flush worker
    fn persist(&mut self) {
        self.generation += 1;
        if let Some(flush) = &self.flush {
            flush.submit(self.generation, self.snapshot());
        }
    }
}

fn require_viewer(viewer: Option<UserId>, action: &'static str) -> Result<UserId, EngineError> {
    viewer.ok_or(EngineError::AuthRequired(action))
}
