//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use social_state_adapters::snapshot::SqliteSnapshotStore;
use social_state_domain::persistence;
use time::format_description::well_known::Rfc3339;

use super::Context;
use super::session::build_store;
use crate::args::DoctorArgs;
use crate::config::{AppConfig, FeedProvider, StateBackend};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    state: CheckResult,
    identity: CheckResult,
    feed: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, ctx: Context) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        state: CheckResult::error("Not checked"),
        identity: CheckResult::error("Not checked"),
        feed: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(ctx.config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.state = check_state(config).await;
        report.identity = check_identity(config);
        report.feed = check_feed(config, ctx.offline);
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.state,
        &report.identity,
        &report.feed,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_state(config: &AppConfig) -> CheckResult {
    let backend = match config.general.state_backend {
        StateBackend::File => "file",
        StateBackend::Sqlite => "sqlite",
        StateBackend::Memory => {
            return CheckResult::warn("In-memory state; nothing is kept between runs");
        }
    };
    let location = config.general.state_path.display().to_string();

    let store = match build_store(config).await {
        Ok(store) => store,
        Err(e) => return CheckResult::error(format!("Failed to open {} store: {:#}", backend, e)),
    };

    match store.load().await {
        Ok(None) => CheckResult::ok(format!("No state yet ({}: {})", backend, location)),
        Ok(Some(bytes)) => {
            let state = persistence::deserialize(&bytes);
            CheckResult::ok(format!("State readable ({}: {})", backend, location)).with_details(
                serde_json::json!({
                    "bytes": bytes.len(),
                    "liked_posts": state.engagement.liked_post_ids.len(),
                    "saved_posts": state.engagement.saved_post_ids.len(),
                    "comments": state.comments.values().map(Vec::len).sum::<usize>(),
                    "local_posts": state.local_posts.len(),
                    "updated_at": last_written(config).await,
                }),
            )
        }
        Err(e) => CheckResult::error(format!("Failed to read state: {}", e)),
    }
}

/// Write time of the SQLite record; the other backends do not track it
async fn last_written(config: &AppConfig) -> Option<String> {
    if config.general.state_backend != StateBackend::Sqlite {
        return None;
    }
    let store = SqliteSnapshotStore::new(
        &config.general.state_path,
        config.general.state_namespace.clone(),
    )
    .await
    .ok()?;
    match store.updated_at().await {
        Ok(Some(at)) => at.format(&Rfc3339).ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Could not read record timestamp");
            None
        }
    }
}

fn check_identity(config: &AppConfig) -> CheckResult {
    match config.identity.viewer() {
        Some(id) => CheckResult::ok(format!("Signed in as user {}", id)),
        None => CheckResult::warn("No viewer configured; read-only mode"),
    }
}

fn check_feed(config: &AppConfig, offline_flag: bool) -> CheckResult {
    if offline_flag || config.feed.offline {
        return CheckResult::ok("Offline; feeds are not fetched");
    }

    if config.feed.sources.is_empty() {
        return CheckResult::warn("No feed sources configured");
    }

    if config.feed.page_size == 0 {
        return CheckResult::error("feed.page_size must be at least 1");
    }

    if config.feed.provider == FeedProvider::Stub {
        return CheckResult::warn("Stub feed provider; serving canned posts");
    }

    let sources: Vec<String> = config.feed.sources.iter().map(|s| s.to_string()).collect();
    CheckResult::ok(format!(
        "Sources: {}, page size {}, up to {} pages",
        sources.join(", "),
        config.feed.page_size,
        config.feed.max_pages
    ))
}

fn print_report(report: &DoctorReport) {
    println!("social-state Doctor Report");
    println!("==========================");
    println!();

    print_check("Config", &report.config);
    print_check("State", &report.state);
    print_check("Identity", &report.identity);
    print_check("Feed", &report.feed);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
