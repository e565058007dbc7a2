//! Stats command - engagement totals over the feed

use anyhow::Result;

use super::Context;
use super::session::Session;
use crate::args::StatsArgs;

pub async fn execute(args: StatsArgs, ctx: Context) -> Result<()> {
    let mut session = Session::open(&ctx).await?;
    session.refresh().await?;

    let summary = session.engine.query().summary();
    session.close().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Posts:           {}", summary.total_posts);
    println!("Likes:           {}", summary.total_likes);
    println!("Comments:        {}", summary.total_comments);
    println!("Shares:          {}", summary.total_shares);
    println!("Engagement rate: {:.1} per post", summary.engagement_rate);
    Ok(())
}
