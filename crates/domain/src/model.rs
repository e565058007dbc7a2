//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Upstream feed a remote post was ingested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// Bare-list feed (jsonplaceholder-style `[post, ...]`)
    #[serde(rename = "jsonplaceholder")]
    JsonPlaceholder,
    /// Envelope feed (dummyjson-style `{posts, total}`) with tags and reactions
    #[serde(rename = "dummyjson")]
    DummyJson,
}

impl SourceTag {
    pub const ALL: [SourceTag; 2] = [SourceTag::JsonPlaceholder, SourceTag::DummyJson];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::JsonPlaceholder => "jsonplaceholder",
            SourceTag::DummyJson => "dummyjson",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jsonplaceholder" => Ok(SourceTag::JsonPlaceholder),
            "dummyjson" => Ok(SourceTag::DummyJson),
            other => Err(ParseIdError(other.to_string())),
        }
    }
}

/// Error parsing a textual identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier '{0}'")]
pub struct ParseIdError(pub String);

/// Stable post identifier.
///
/// Remote posts are qualified by their source so the two upstream id spaces
/// never collide, and local creations live in their own namespace. The
/// textual form is `<namespace>:<number>`, e.g. `dummyjson:7` or `local:3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PostId {
    Remote { source: SourceTag, remote_id: u64 },
    Local(u64),
}

impl PostId {
    pub fn remote(source: SourceTag, remote_id: u64) -> Self {
        PostId::Remote { source, remote_id }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, PostId::Local(_))
    }

    /// Where the post came from
    pub fn origin(&self) -> PostOrigin {
        match self {
            PostId::Remote { source, .. } => PostOrigin::Remote(*source),
            PostId::Local(_) => PostOrigin::Local,
        }
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Remote { source, remote_id } => write!(f, "{}:{}", source, remote_id),
            PostId::Local(seq) => write!(f, "local:{}", seq),
        }
    }
}

impl FromStr for PostId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseIdError(s.to_string());
        let (namespace, number) = s.split_once(':').ok_or_else(invalid)?;
        let number: u64 = number.parse().map_err(|_| invalid())?;

        if namespace == "local" {
            return Ok(PostId::Local(number));
        }

        let source = namespace.parse::<SourceTag>().map_err(|_| invalid())?;
        Ok(PostId::remote(source, number))
    }
}

impl TryFrom<String> for PostId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PostId> for String {
    fn from(id: PostId) -> Self {
        id.to_string()
    }
}

/// Explicit source discriminant of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrigin {
    Remote(SourceTag),
    Local,
}

/// Monotonic comment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(CommentId)
            .map_err(|_| ParseIdError(s.to_string()))
    }
}

/// User identifier (post authors, comment authors, the local viewer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Engagement counters on a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostCounters {
    pub likes: u32,
    pub comments: u32,
    pub shares: u32,
}

/// Canonical normalized post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    /// Media reference (URL or local URI); never fetched by the engine
    pub media: Option<String>,
    /// Deduplicated, in first-seen order
    pub tags: Vec<String>,
    pub location: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub counters: PostCounters,
    /// Mirrors membership in the liked set
    pub is_liked: bool,
    /// Mirrors membership in the saved set
    pub is_saved: bool,
}

impl Post {
    pub fn origin(&self) -> PostOrigin {
        self.id.origin()
    }
}

/// Input of the compose flow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
    pub media: Option<String>,
    pub tags: Vec<String>,
    pub location: Option<String>,
}

/// Shallow edit of a post; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub media: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.media.is_none()
            && self.tags.is_none()
            && self.location.is_none()
    }
}

/// Reply attached to a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub like_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Mirrors membership in the liked-comment set
    pub is_liked: bool,
}

/// Destination a post was shared to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePlatform {
    Instagram,
    Facebook,
    Twitter,
    Whatsapp,
    Copy,
}

impl SharePlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePlatform::Instagram => "instagram",
            SharePlatform::Facebook => "facebook",
            SharePlatform::Twitter => "twitter",
            SharePlatform::Whatsapp => "whatsapp",
            SharePlatform::Copy => "copy",
        }
    }
}

impl fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePlatform {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "instagram" => Ok(SharePlatform::Instagram),
            "facebook" => Ok(SharePlatform::Facebook),
            "twitter" => Ok(SharePlatform::Twitter),
            "whatsapp" => Ok(SharePlatform::Whatsapp),
            "copy" => Ok(SharePlatform::Copy),
            _ => Err(ParseIdError(s.to_string())),
        }
    }
}

/// Raw record from the bare-list feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderPost {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

/// Reaction totals reported by the envelope feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyReactions {
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub dislikes: u32,
}

/// Raw record from the envelope feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DummyPost {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub user_id: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reactions: DummyReactions,
}

/// One page as returned by a feed source, in its source-specific shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPage {
    Placeholder(Vec<PlaceholderPost>),
    Dummy { posts: Vec<DummyPost>, total: u64 },
}

impl FeedPage {
    pub fn source(&self) -> SourceTag {
        match self {
            FeedPage::Placeholder(_) => SourceTag::JsonPlaceholder,
            FeedPage::Dummy { .. } => SourceTag::DummyJson,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FeedPage::Placeholder(posts) => posts.len(),
            FeedPage::Dummy { posts, .. } => posts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
