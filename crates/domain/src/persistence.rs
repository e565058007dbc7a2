//! Durable record codec
//!
//! The durable subset (engagement sets, comments, locally composed posts,
//! tombstones and id high-water marks) is written as one camelCase JSON
//! record tagged with [`SCHEMA_VERSION`]. Loading never fails: anything
//! missing or malformed falls back to an empty default, field by field and
//! entry by entry.
//!
//! Defaults applied by [`migrate`]:
//! - no `version`: legacy record, read with the same rules; the legacy
//!   field names `likedPosts`, `savedPosts` and `likedComments` are accepted
//! - absent or non-array id lists: empty set; entries that are not valid
//!   ids (including bare numbers, whose source namespace is unknown) are
//!   dropped
//! - `comments` as a post-keyed object, or as a legacy flat array grouped by
//!   each entry's `postId`; entries that do not parse are dropped
//! - `nextCommentId` / `nextLocalPostId`: at least one past the largest id
//!   loaded

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;

use crate::model::{Comment, CommentId, Post, PostCounters, PostId, UserId};
use crate::ports::PersistenceError;
use crate::state::EngagementState;

/// Current durable record layout
pub const SCHEMA_VERSION: u64 = 1;

/// Durable subset of engine state
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub engagement: EngagementState,
    pub comments: BTreeMap<PostId, Vec<Comment>>,
    /// Locally composed posts in read order
    pub local_posts: Vec<Post>,
    pub deleted_post_ids: BTreeSet<PostId>,
    pub next_comment_id: u64,
    pub next_local_post_id: u64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            engagement: EngagementState::default(),
            comments: BTreeMap::new(),
            local_posts: Vec::new(),
            deleted_post_ids: BTreeSet::new(),
            next_comment_id: 1,
            next_local_post_id: 1,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordOut<'a> {
    version: u64,
    liked_post_ids: &'a BTreeSet<PostId>,
    saved_post_ids: &'a BTreeSet<PostId>,
    liked_comment_ids: &'a BTreeSet<CommentId>,
    comments: BTreeMap<PostId, Vec<CommentRecord>>,
    local_posts: Vec<PostRecord>,
    deleted_post_ids: &'a BTreeSet<PostId>,
    next_comment_id: u64,
    next_local_post_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentRecord {
    id: CommentId,
    #[serde(default)]
    post_id: Option<PostId>,
    #[serde(alias = "userId")]
    author_id: UserId,
    #[serde(default)]
    body: String,
    #[serde(default, alias = "likes")]
    like_count: u32,
    #[serde(with = "time::serde::rfc3339", default = "unix_epoch")]
    created_at: OffsetDateTime,
}

impl CommentRecord {
    fn from_comment(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            post_id: Some(comment.post_id),
            author_id: comment.author_id,
            body: comment.body.clone(),
            like_count: comment.like_count,
            created_at: comment.created_at,
        }
    }

    fn into_comment(self, post_id: PostId) -> Comment {
        Comment {
            id: self.id,
            post_id,
            author_id: self.author_id,
            body: self.body,
            like_count: self.like_count,
            created_at: self.created_at,
            is_liked: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    id: PostId,
    author_id: UserId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    media: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(with = "time::serde::rfc3339", default = "unix_epoch")]
    created_at: OffsetDateTime,
    #[serde(default)]
    counters: PostCounters,
}

impl PostRecord {
    fn from_post(post: &Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title.clone(),
            body: post.body.clone(),
            media: post.media.clone(),
            tags: post.tags.clone(),
            location: post.location.clone(),
            created_at: post.created_at,
            counters: post.counters,
        }
    }

    fn into_post(self) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            body: self.body,
            media: self.media,
            tags: self.tags,
            location: self.location,
            created_at: self.created_at,
            counters: self.counters,
            is_liked: false,
            is_saved: false,
        }
    }
}

fn unix_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

/// Encode the durable subset. Sets come out sorted and de-duplicated and
/// comment lists keyed by post id, so equal states give equal bytes.
pub fn serialize(state: &PersistedState) -> Result<Vec<u8>, PersistenceError> {
    let record = RecordOut {
        version: SCHEMA_VERSION,
        liked_post_ids: &state.engagement.liked_post_ids,
        saved_post_ids: &state.engagement.saved_post_ids,
        liked_comment_ids: &state.engagement.liked_comment_ids,
        comments: state
            .comments
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(id, list)| (*id, list.iter().map(CommentRecord::from_comment).collect()))
            .collect(),
        local_posts: state.local_posts.iter().map(PostRecord::from_post).collect(),
        deleted_post_ids: &state.deleted_post_ids,
        next_comment_id: state.next_comment_id,
        next_local_post_id: state.next_local_post_id,
    };

    serde_json::to_vec(&record).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

/// Decode a stored record. Never fails; see the module docs for defaults.
pub fn deserialize(bytes: &[u8]) -> PersistedState {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => migrate(value),
        Err(error) => {
            tracing::warn!(error = %error, "Stored record is not valid JSON, starting empty");
            PersistedState::default()
        }
    }
}

/// Bring a record of any known version (or none) to the current shape
pub fn migrate(value: Value) -> PersistedState {
    let Value::Object(record) = value else {
        tracing::warn!("Stored record is not an object, starting empty");
        return PersistedState::default();
    };

    match record.get("version").and_then(Value::as_u64) {
        None => tracing::info!("Loading legacy record without schema version"),
        Some(version) if version > SCHEMA_VERSION => {
            tracing::warn!(version, "Record written by a newer schema, reading known fields")
        }
        Some(_) => {}
    }

    let engagement = EngagementState {
        liked_post_ids: post_id_set(field(&record, "likedPostIds", "likedPosts"), "likedPostIds"),
        saved_post_ids: post_id_set(field(&record, "savedPostIds", "savedPosts"), "savedPostIds"),
        liked_comment_ids: comment_id_set(
            field(&record, "likedCommentIds", "likedComments"),
            "likedCommentIds",
        ),
    };

    let comments = comment_lists(record.get("comments"));
    let local_posts: Vec<Post> = entries(record.get("localPosts"), "localPosts")
        .iter()
        .filter_map(|entry| serde_json::from_value::<PostRecord>(entry.clone()).ok())
        .filter(|post| post.id.is_local())
        .map(PostRecord::into_post)
        .collect();
    let deleted_post_ids = post_id_set(record.get("deletedPostIds"), "deletedPostIds");

    let max_comment_id = comments
        .values()
        .flatten()
        .map(|c| c.id.0)
        .max()
        .unwrap_or(0);
    let max_local_id = local_posts
        .iter()
        .filter_map(|p| match p.id {
            PostId::Local(seq) => Some(seq),
            PostId::Remote { .. } => None,
        })
        .max()
        .unwrap_or(0);

    let next_comment_id = record
        .get("nextCommentId")
        .and_then(Value::as_u64)
        .unwrap_or(1)
        .max(max_comment_id + 1);
    let next_local_post_id = record
        .get("nextLocalPostId")
        .and_then(Value::as_u64)
        .unwrap_or(1)
        .max(max_local_id + 1);

    PersistedState {
        engagement,
        comments,
        local_posts,
        deleted_post_ids,
        next_comment_id,
        next_local_post_id,
    }
}

fn field<'a>(record: &'a Map<String, Value>, name: &str, legacy: &str) -> Option<&'a Value> {
    record.get(name).or_else(|| record.get(legacy))
}

fn entries<'a>(value: Option<&'a Value>, name: &str) -> &'a [Value] {
    match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => &[],
        Some(_) => {
            tracing::warn!(field = name, "Malformed field in stored record, using empty default");
            &[]
        }
    }
}

fn post_id_set(value: Option<&Value>, name: &str) -> BTreeSet<PostId> {
    let items = entries(value, name);
    let set: BTreeSet<PostId> = items
        .iter()
        .filter_map(|v| v.as_str()?.parse().ok())
        .collect();
    if set.len() < items.len() {
        tracing::debug!(field = name, dropped = items.len() - set.len(), "Dropped unusable ids");
    }
    set
}

fn comment_id_set(value: Option<&Value>, name: &str) -> BTreeSet<CommentId> {
    entries(value, name)
        .iter()
        .filter_map(Value::as_u64)
        .map(CommentId)
        .collect()
}

fn comment_lists(value: Option<&Value>) -> BTreeMap<PostId, Vec<Comment>> {
    let mut lists: BTreeMap<PostId, Vec<Comment>> = BTreeMap::new();

    match value {
        Some(Value::Object(by_post)) => {
            for (key, list) in by_post {
                let Ok(post_id) = key.parse::<PostId>() else {
                    tracing::debug!(key = %key, "Dropped comments under unusable post id");
                    continue;
                };
                for entry in entries(Some(list), "comments") {
                    if let Ok(record) = serde_json::from_value::<CommentRecord>(entry.clone()) {
                        lists.entry(post_id).or_default().push(record.into_comment(post_id));
                    }
                }
            }
        }
        // Legacy layout: one flat list, each entry naming its post
        Some(Value::Array(flat)) => {
            for entry in flat {
                let Ok(record) = serde_json::from_value::<CommentRecord>(entry.clone()) else {
                    continue;
                };
                if let Some(post_id) = record.post_id {
                    lists.entry(post_id).or_default().push(record.into_comment(post_id));
                }
            }
        }
        None | Some(Value::Null) => {}
        Some(_) => tracing::warn!("Malformed comments in stored record, using empty default"),
    }

    for list in lists.values_mut() {
        list.sort_by_key(|c| c.id);
    }
    lists
}
