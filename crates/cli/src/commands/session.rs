//! Composition root shared by the state-touching commands

use anyhow::{Context as _, Result};
use social_state_adapters::{
    feed::{HttpFeedSource, StubFeedSource},
    identity::StaticIdentity,
    snapshot::{FsSnapshotStore, InMemorySnapshotStore, SqliteSnapshotStore},
};
use social_state_domain::{
    FeedSource, IdentityProvider, SnapshotStore, SourceTag, SystemClock, UserId, persistence,
    usecases::{FeedSync, FeedSyncConfig, FlushHandle, FlushWorker, SocialEngine, SourceReport},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::Context;
use crate::config::{AppConfig, FeedProvider, StateBackend};

/// Loaded engine plus the flush worker writing it back
pub struct Session {
    pub engine: SocialEngine,
    pub config: AppConfig,
    identity: StaticIdentity,
    flush: FlushHandle,
    worker: JoinHandle<()>,
    offline: bool,
}

impl Session {
    /// Load configuration and the durable record, and start the flush worker
    pub async fn open(ctx: &Context) -> Result<Self> {
        let config = AppConfig::load(ctx.config_path.as_deref())?;
        let store = build_store(&config).await?;

        let state = match store.load().await.context("Failed to read state")? {
            Some(bytes) => persistence::deserialize(&bytes),
            None => {
                tracing::info!("No stored state, starting empty");
                Default::default()
            }
        };

        let window = Duration::from_millis(config.general.flush_debounce_ms);
        let (flush, worker) = FlushWorker::new(store, window).spawn();

        let mut engine = SocialEngine::new(Arc::new(SystemClock))
            .with_compose_policy(config.compose.policy())
            .with_flush(flush.clone());
        engine.restore(state);

        Ok(Self {
            engine,
            identity: StaticIdentity::from_config(config.identity.viewer()),
            offline: ctx.offline || config.feed.offline,
            config,
            flush,
            worker,
        })
    }

    pub fn viewer(&self) -> Option<UserId> {
        self.identity.current_viewer()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Pull the configured feeds into the engine unless running offline
    pub async fn refresh(&mut self) -> Result<Vec<(SourceTag, SourceReport)>> {
        if self.offline {
            tracing::debug!("Offline, skipping feed sync");
            return Ok(Vec::new());
        }

        let source = build_feed_source(&self.config)?;
        let sync = FeedSync::new(
            source,
            FeedSyncConfig {
                page_size: self.config.feed.page_size,
                max_pages: self.config.feed.max_pages,
            },
        );

        let reports = sync
            .sync_all(&mut self.engine, &self.config.feed.sources)
            .await;
        for (tag, report) in &reports {
            if let Some(error) = &report.error {
                tracing::warn!(source = %tag, error = %error, "Feed unavailable");
            }
        }
        Ok(reports)
    }

    /// Wait for the last snapshot to land, then stop the worker
    pub async fn close(self) -> Result<()> {
        let generation = self.engine.generation();
        let settled = self.flush.settle(generation).await;

        drop(self.engine);
        drop(self.flush);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "Flush worker ended abnormally");
        }

        settled.context("Failed to persist state")
    }
}

pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn SnapshotStore>> {
    let path = &config.general.state_path;
    let store: Arc<dyn SnapshotStore> = match config.general.state_backend {
        StateBackend::File => Arc::new(FsSnapshotStore::new(path.clone())),
        StateBackend::Sqlite => Arc::new(
            SqliteSnapshotStore::new(path, config.general.state_namespace.clone())
                .await
                .context("Failed to initialize SQLite state store")?,
        ),
        StateBackend::Memory => Arc::new(InMemorySnapshotStore::new()),
    };
    Ok(store)
}

fn build_feed_source(config: &AppConfig) -> Result<Arc<dyn FeedSource>> {
    let source: Arc<dyn FeedSource> = match config.feed.provider {
        FeedProvider::Http => Arc::new(
            HttpFeedSource::with_base_urls(
                config.feed.jsonplaceholder_base_url.clone(),
                config.feed.dummyjson_base_url.clone(),
                Duration::from_secs(config.feed.timeout_secs),
            )
            .context("Failed to initialize feed source")?,
        ),
        FeedProvider::Stub => {
            tracing::debug!("Using stub feed provider");
            Arc::new(StubFeedSource::sample())
        }
    };
    Ok(source)
}
