//! Subcommand implementations

pub mod comment;
pub mod config;
pub mod doctor;
pub mod engage;
pub mod feed;
pub mod post;
pub mod stats;

mod session;

use social_state_domain::{Comment, Post};
use std::path::PathBuf;

/// Global options shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub offline: bool,
}

fn print_post(post: &Post) {
    let mut marks = String::new();
    if post.is_liked {
        marks.push_str(" [liked]");
    }
    if post.is_saved {
        marks.push_str(" [saved]");
    }

    println!(
        "{}  likes:{} comments:{} shares:{}{}",
        post.id, post.counters.likes, post.counters.comments, post.counters.shares, marks
    );
    if !post.title.is_empty() {
        println!("  {}", post.title);
    }
    if !post.tags.is_empty() {
        println!("  #{}", post.tags.join(" #"));
    }
}

fn print_comment(comment: &Comment) {
    let liked = if comment.is_liked { " [liked]" } else { "" };
    println!(
        "#{} by {}  likes:{}{}  {}",
        comment.id, comment.author_id, comment.like_count, liked, comment.body
    );
}
