//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use social_state_domain::{CommentId, PostId, SharePlatform};
use std::path::PathBuf;

/// social-state: local social feed with likes, saves, comments and composed posts
#[derive(Parser, Debug)]
#[command(name = "social-state")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Skip fetching the remote feeds
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync and list the feed
    Feed(FeedArgs),

    /// Compose, edit and delete posts
    Post(PostArgs),

    /// Like a post
    Like(TargetArgs),

    /// Remove a like from a post
    Unlike(TargetArgs),

    /// Save a post
    Save(TargetArgs),

    /// Remove a post from saved
    Unsave(TargetArgs),

    /// Share a post to a platform
    Share(ShareArgs),

    /// Comment on posts
    Comment(CommentArgs),

    /// Engagement totals over the feed
    Stats(StatsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    #[command(subcommand)]
    pub command: FeedCommands,
}

#[derive(Subcommand, Debug)]
pub enum FeedCommands {
    /// Fetch configured sources and report what changed
    Sync {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List posts in read order
    List {
        /// Only liked posts
        #[arg(long, conflicts_with = "saved")]
        liked: bool,

        /// Only saved posts
        #[arg(long)]
        saved: bool,

        /// Case-insensitive search over title, body and tags
        #[arg(long)]
        search: Option<String>,

        /// Show at most this many posts
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[command(subcommand)]
    pub command: PostCommands,
}

#[derive(Subcommand, Debug)]
pub enum PostCommands {
    /// Compose a new post
    Create {
        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        body: String,

        /// Media reference (URL or local URI)
        #[arg(long)]
        media: Option<String>,

        /// Tag, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        location: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit fields of a post; omitted fields stay as they are
    Update {
        id: PostId,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        body: Option<String>,

        #[arg(long)]
        media: Option<String>,

        /// Replace the tag set, repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Delete a post with its comments
    Delete { id: PostId },
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Post id, e.g. dummyjson:7 or local:1
    pub id: PostId,
}

#[derive(Args, Debug)]
pub struct ShareArgs {
    /// Post id, e.g. dummyjson:7 or local:1
    pub id: PostId,

    /// instagram, facebook, twitter, whatsapp or copy
    #[arg(long, default_value = "copy")]
    pub platform: SharePlatform,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommands,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Comment on a post
    Add {
        post_id: PostId,

        #[arg(long)]
        body: String,
    },

    /// List comments of a post, oldest first
    List {
        post_id: PostId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Like a comment
    Like { id: CommentId },

    /// Remove a like from a comment
    Unlike { id: CommentId },
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
