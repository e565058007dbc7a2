//! social-state CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; a config that fails to load is reported by the command
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| {
            config::AppConfig::load(cli.config.as_deref())
                .ok()
                .map(|c| c.general.log_level)
        })
        .unwrap_or_else(|| "info".to_string());
    init_logging(&log_level)?;

    let ctx = commands::Context {
        config_path: cli.config,
        offline: cli.offline,
    };

    // Execute command
    match cli.command {
        Commands::Feed(args) => commands::feed::execute(args, ctx).await,
        Commands::Post(args) => commands::post::execute(args, ctx).await,
        Commands::Like(args) => commands::engage::like(args, ctx).await,
        Commands::Unlike(args) => commands::engage::unlike(args, ctx).await,
        Commands::Save(args) => commands::engage::save(args, ctx).await,
        Commands::Unsave(args) => commands::engage::unsave(args, ctx).await,
        Commands::Share(args) => commands::engage::share(args, ctx).await,
        Commands::Comment(args) => commands::comment::execute(args, ctx).await,
        Commands::Stats(args) => commands::stats::execute(args, ctx).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, ctx).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
