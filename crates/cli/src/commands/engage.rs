//! Engagement commands - like, save and share posts

use anyhow::Result;
use social_state_domain::{Engagement, EngineError, PostId, UserId, usecases::SocialEngine};

use super::Context;
use super::session::Session;
use crate::args::{ShareArgs, TargetArgs};

type Transition = fn(&mut SocialEngine, &PostId, Option<UserId>) -> Result<Engagement, EngineError>;

pub async fn like(args: TargetArgs, ctx: Context) -> Result<()> {
    toggle(args, ctx, SocialEngine::like, "Liked", "Already liked").await
}

pub async fn unlike(args: TargetArgs, ctx: Context) -> Result<()> {
    toggle(args, ctx, SocialEngine::unlike, "Unliked", "Not liked").await
}

pub async fn save(args: TargetArgs, ctx: Context) -> Result<()> {
    toggle(args, ctx, SocialEngine::save, "Saved", "Already saved").await
}

pub async fn unsave(args: TargetArgs, ctx: Context) -> Result<()> {
    toggle(args, ctx, SocialEngine::unsave, "Unsaved", "Not saved").await
}

async fn toggle(
    args: TargetArgs,
    ctx: Context,
    transition: Transition,
    applied: &str,
    unchanged: &str,
) -> Result<()> {
    let mut session = Session::open(&ctx).await?;
    session.refresh().await?;
    let viewer = session.viewer();

    let outcome = transition(&mut session.engine, &args.id, viewer);
    if let Ok(result) = &outcome {
        let likes = session
            .engine
            .query()
            .post(&args.id)
            .map(|p| p.counters.likes)
            .unwrap_or_default();
        match result {
            Engagement::Applied => println!("{} {} (likes: {})", applied, args.id, likes),
            Engagement::Unchanged => println!("{} {} (likes: {})", unchanged, args.id, likes),
        }
    }

    session.close().await?;
    outcome.map(|_| ()).map_err(Into::into)
}

pub async fn share(args: ShareArgs, ctx: Context) -> Result<()> {
    let mut session = Session::open(&ctx).await?;
    session.refresh().await?;
    let viewer = session.viewer();

    let outcome = session.engine.share(&args.id, viewer, args.platform);
    if let Ok(shares) = &outcome {
        println!("Shared {} to {} (shares: {})", args.id, args.platform, shares);
    }

    session.close().await?;
    outcome.map(|_| ()).map_err(Into::into)
}
