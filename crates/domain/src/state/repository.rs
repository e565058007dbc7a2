//! Canonical post collection merging remote pages and local creations

use std::collections::{BTreeSet, HashMap, VecDeque};
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::model::{
    DummyPost, PlaceholderPost, Post, PostCounters, PostDraft, PostId, PostOrigin, PostPatch,
    SourceTag, UserId,
};
use crate::policy::normalize_tags;

/// Remote-owned fields of a post, as produced by a source adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFields {
    pub remote_id: u64,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    /// Like total reported upstream, used only as the initial counter
    pub likes: u32,
}

/// Per-source normalization adapter.
///
/// Each raw record type names the feed it comes from, so the source
/// discriminant is fixed at ingestion and never inferred later.
pub trait FeedRecord {
    const SOURCE: SourceTag;

    fn into_remote(self) -> RemoteFields;
}

impl FeedRecord for PlaceholderPost {
    const SOURCE: SourceTag = SourceTag::JsonPlaceholder;

    fn into_remote(self) -> RemoteFields {
        RemoteFields {
            remote_id: self.id,
            author_id: UserId(self.user_id),
            title: self.title,
            body: self.body,
            tags: Vec::new(),
            likes: 0,
        }
    }
}

impl FeedRecord for DummyPost {
    const SOURCE: SourceTag = SourceTag::DummyJson;

    fn into_remote(self) -> RemoteFields {
        RemoteFields {
            remote_id: self.id,
            author_id: UserId(self.user_id),
            title: self.title,
            body: self.body,
            tags: normalize_tags(&self.tags),
            likes: self.reactions.likes,
        }
    }
}

/// Result of merging one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Posts seen for the first time, in arrival order
    pub inserted: Vec<PostId>,
    /// Already known posts whose remote fields were refreshed
    pub refreshed: usize,
    /// Records dropped because the post was deleted locally
    pub skipped: usize,
}

impl IngestSummary {
    pub fn merge(&mut self, other: IngestSummary) {
        self.inserted.extend(other.inserted);
        self.refreshed += other.refreshed;
        self.skipped += other.skipped;
    }
}

/// Owns canonical post records.
///
/// Read order is insertion order: remote records append, local creations
/// prepend.
#[derive(Debug)]
pub struct PostRepository {
    posts: HashMap<PostId, Post>,
    order: VecDeque<PostId>,
    tombstones: BTreeSet<PostId>,
    next_local_id: u64,
}

impl Default for PostRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PostRepository {
    pub fn new() -> Self {
        Self {
            posts: HashMap::new(),
            order: VecDeque::new(),
            tombstones: BTreeSet::new(),
            next_local_id: 1,
        }
    }

    /// Merge a batch of raw records from one source.
    ///
    /// Known posts only get their remote fields refreshed; counters, media,
    /// location and engagement flags are left alone.
    pub fn ingest_batch<R, I>(&mut self, records: I, ingested_at: OffsetDateTime) -> IngestSummary
    where
        R: FeedRecord,
        I: IntoIterator<Item = R>,
    {
        let mut summary = IngestSummary::default();

        for record in records {
            let remote = record.into_remote();
            let id = PostId::remote(R::SOURCE, remote.remote_id);

            if self.tombstones.contains(&id) {
                summary.skipped += 1;
                continue;
            }

            if let Some(existing) = self.posts.get_mut(&id) {
                existing.author_id = remote.author_id;
                existing.title = remote.title;
                existing.body = remote.body;
                existing.tags = remote.tags;
                summary.refreshed += 1;
                continue;
            }

            let post = Post {
                id,
                author_id: remote.author_id,
                title: remote.title,
                body: remote.body,
                media: None,
                tags: remote.tags,
                location: None,
                created_at: ingested_at,
                counters: PostCounters {
                    likes: remote.likes,
                    ..Default::default()
                },
                is_liked: false,
                is_saved: false,
            };
            self.posts.insert(id, post);
            self.order.push_back(id);
            summary.inserted.push(id);
        }

        summary
    }

    /// Insert a validated draft under a fresh local id, at the front
    pub fn create_local(
        &mut self,
        draft: PostDraft,
        author_id: UserId,
        created_at: OffsetDateTime,
    ) -> PostId {
        let id = PostId::Local(self.next_local_id);
        self.next_local_id += 1;

        let post = Post {
            id,
            author_id,
            title: draft.title,
            body: draft.body,
            media: draft.media,
            tags: draft.tags,
            location: draft.location,
            created_at,
            counters: PostCounters::default(),
            is_liked: false,
            is_saved: false,
        };
        self.posts.insert(id, post);
        self.order.push_front(id);
        id
    }

    /// Shallow merge of the fields present in `patch`
    pub fn update(&mut self, id: &PostId, patch: PostPatch) -> Result<&Post, EngineError> {
        let post = self
            .posts
            .get_mut(id)
            .ok_or(EngineError::PostNotFound(*id))?;

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(body) = patch.body {
            post.body = body;
        }
        if let Some(media) = patch.media {
            post.media = Some(media);
        }
        if let Some(tags) = patch.tags {
            post.tags = normalize_tags(&tags);
        }
        if let Some(location) = patch.location {
            post.location = Some(location);
        }

        Ok(post)
    }

    /// Delete a post. Remote identities are tombstoned so a later page
    /// cannot bring them back under the same id.
    pub fn remove(&mut self, id: &PostId) -> Result<Post, EngineError> {
        let post = self
            .posts
            .remove(id)
            .ok_or(EngineError::PostNotFound(*id))?;
        self.order.retain(|existing| existing != id);
        if let PostOrigin::Remote(_) = post.origin() {
            self.tombstones.insert(*id);
        }
        Ok(post)
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &PostId) -> Option<&mut Post> {
        self.posts.get_mut(id)
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.posts.contains_key(id)
    }

    /// All posts in read order
    pub fn iter(&self) -> impl Iterator<Item = &Post> + '_ {
        self.order.iter().filter_map(|id| self.posts.get(id))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Post> + '_ {
        self.posts.values_mut()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn next_local_id(&self) -> u64 {
        self.next_local_id
    }

    pub fn tombstones(&self) -> &BTreeSet<PostId> {
        &self.tombstones
    }

    /// Locally created posts in read order
    pub fn local_posts(&self) -> impl Iterator<Item = &Post> + '_ {
        self.iter().filter(|post| post.id.is_local())
    }

    /// Replace local posts, tombstones and the local id high-water mark
    /// with persisted values. Remote posts already present stay, except
    /// those the restored tombstones name.
    pub(crate) fn restore(
        &mut self,
        local_posts: Vec<Post>,
        tombstones: BTreeSet<PostId>,
        next_local_id: u64,
    ) {
        self.posts.retain(|id, _| !id.is_local() && !tombstones.contains(id));
        self.order.retain(|id| !id.is_local() && !tombstones.contains(id));

        let mut max_local = 0;
        for post in local_posts.into_iter().rev() {
            let PostId::Local(seq) = post.id else {
                continue;
            };
            if self.posts.contains_key(&post.id) {
                continue;
            }
            max_local = max_local.max(seq);
            self.order.push_front(post.id);
            self.posts.insert(post.id, post);
        }

        self.tombstones = tombstones;
        self.next_local_id = next_local_id.max(max_local + 1).max(1);
    }
}
