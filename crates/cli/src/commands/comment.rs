//! Comment command - add, list and like comments

use anyhow::Result;
use social_state_domain::Engagement;

use super::session::Session;
use super::{Context, print_comment};
use crate::args::{CommentArgs, CommentCommands};

pub async fn execute(args: CommentArgs, ctx: Context) -> Result<()> {
    let mut session = Session::open(&ctx).await?;
    session.refresh().await?;
    let viewer = session.viewer();

    let outcome = match args.command {
        CommentCommands::Add { post_id, body } => session
            .engine
            .add_comment(&post_id, viewer, &body)
            .map(|comment| {
                println!("Added comment #{} to {}", comment.id, post_id);
            }),
        CommentCommands::List { post_id, json } => {
            // Unknown and deleted posts simply have no comments
            let comments = session.engine.query().post_comments(&post_id);
            if json {
                match serde_json::to_string_pretty(comments) {
                    Ok(text) => println!("{}", text),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode comments"),
                }
            } else if comments.is_empty() {
                println!("No comments");
            } else {
                comments.iter().for_each(print_comment);
            }
            Ok(())
        }
        CommentCommands::Like { id } => session.engine.like_comment(&id, viewer).map(|e| {
            let verb = match e {
                Engagement::Applied => "Liked",
                Engagement::Unchanged => "Already liked",
            };
            println!("{} comment #{}", verb, id);
        }),
        CommentCommands::Unlike { id } => session.engine.unlike_comment(&id, viewer).map(|e| {
            let verb = match e {
                Engagement::Applied => "Unliked",
                Engagement::Unchanged => "Not liked",
            };
            println!("{} comment #{}", verb, id);
        }),
    };

    session.close().await?;
    outcome.map_err(Into::into)
}
