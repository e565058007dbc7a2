//! Feed command - sync and list posts

use anyhow::Result;
use serde::Serialize;
use social_state_domain::{Post, PostId, SourceTag};
use std::collections::HashSet;

use super::session::Session;
use super::{Context, print_post};
use crate::args::{FeedArgs, FeedCommands};

pub async fn execute(args: FeedArgs, ctx: Context) -> Result<()> {
    match args.command {
        FeedCommands::Sync { json } => sync(ctx, json).await,
        FeedCommands::List {
            liked,
            saved,
            search,
            limit,
            json,
        } => list(ctx, liked, saved, search, limit, json).await,
    }
}

#[derive(Debug, Serialize)]
struct SyncSummary {
    source: SourceTag,
    pages: usize,
    fetched: usize,
    inserted: usize,
    error: Option<String>,
}

async fn sync(ctx: Context, json: bool) -> Result<()> {
    let mut session = Session::open(&ctx).await?;
    if session.is_offline() {
        session.close().await?;
        anyhow::bail!("Feed sync is not available offline");
    }

    let reports = session.refresh().await?;
    let summaries: Vec<SyncSummary> = reports
        .iter()
        .map(|(source, report)| SyncSummary {
            source: *source,
            pages: report.pages.len(),
            fetched: report.fetched(),
            inserted: report.inserted(),
            error: report.error.as_ref().map(|e| e.to_string()),
        })
        .collect();
    let total = session.engine.query().posts().count();
    session.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "sources": summaries,
                "total_posts": total,
            }))?
        );
        return Ok(());
    }

    for summary in &summaries {
        match &summary.error {
            Some(error) => println!("✗ {}: {}", summary.source, error),
            None => println!(
                "✓ {}: {} fetched, {} new ({} pages)",
                summary.source, summary.fetched, summary.inserted, summary.pages
            ),
        }
    }
    println!("{} posts in feed", total);

    if summaries.iter().all(|s| s.error.is_some()) && !summaries.is_empty() {
        anyhow::bail!("No feed source could be synced");
    }
    Ok(())
}

async fn list(
    ctx: Context,
    liked: bool,
    saved: bool,
    search: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open(&ctx).await?;
    session.refresh().await?;

    let query = session.engine.query();
    let mut posts: Vec<&Post> = if liked {
        query.liked_posts()
    } else if saved {
        query.saved_posts()
    } else {
        query.posts().collect()
    };
    if let Some(q) = &search {
        let hits: HashSet<PostId> = query.search(q).iter().map(|p| p.id).collect();
        posts.retain(|p| hits.contains(&p.id));
    }
    if let Some(limit) = limit {
        posts.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
    } else if posts.is_empty() {
        println!("No posts");
    } else {
        for post in &posts {
            print_post(post);
        }
    }

    session.close().await
}
