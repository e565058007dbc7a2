//! Post command - compose, edit and delete posts

use anyhow::Result;
use social_state_domain::{PostDraft, PostPatch};

use super::session::Session;
use super::{Context, print_post};
use crate::args::{PostArgs, PostCommands};

pub async fn execute(args: PostArgs, ctx: Context) -> Result<()> {
    let mut session = Session::open(&ctx).await?;
    session.refresh().await?;
    let viewer = session.viewer();

    let outcome = match args.command {
        PostCommands::Create {
            title,
            body,
            media,
            tags,
            location,
            json,
        } => {
            let draft = PostDraft {
                title,
                body,
                media,
                tags,
                location,
            };
            session.engine.create_post(draft, viewer).map(|post| {
                if json {
                    match serde_json::to_string_pretty(&post) {
                        Ok(text) => println!("{}", text),
                        Err(e) => tracing::warn!(error = %e, "Failed to encode post"),
                    }
                } else {
                    println!("Created {}", post.id);
                    print_post(&post);
                }
            })
        }
        PostCommands::Update {
            id,
            title,
            body,
            media,
            tags,
            location,
        } => {
            let patch = PostPatch {
                title,
                body,
                media,
                tags: (!tags.is_empty()).then_some(tags),
                location,
            };
            session.engine.update_post(&id, patch).map(|post| {
                println!("Updated {}", post.id);
                print_post(&post);
            })
        }
        PostCommands::Delete { id } => session.engine.delete_post(&id).map(|post| {
            println!("Deleted {}", post.id);
        }),
    };

    // Persist whatever did apply before reporting the failure
    session.close().await?;
    outcome.map_err(Into::into)
}
