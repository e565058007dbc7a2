//! Feed sync use case - pulls pages from the feed source into the engine

use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{FeedPage, SourceTag};
use crate::ports::{FeedSource, FeedSourceError};
use crate::usecases::engine::SocialEngine;

/// Configuration for feed syncing
#[derive(Debug, Clone)]
pub struct FeedSyncConfig {
    /// Records requested per page
    pub page_size: u32,
    /// Pages fetched per source in one `sync_all`
    pub max_pages: u32,
}

impl Default for FeedSyncConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_pages: 1,
        }
    }
}

/// Errors from feed syncing
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Feed source error: {0}")]
    Source(#[from] FeedSourceError),
    #[error("Asked for a {requested} page, got a {returned} page")]
    SourceMismatch {
        requested: SourceTag,
        returned: SourceTag,
    },
}

/// Outcome of syncing one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub source: SourceTag,
    pub offset: u64,
    pub fetched: usize,
    pub inserted: usize,
    pub refreshed: usize,
    pub skipped: usize,
    /// Offset of the following page, `None` once the feed is exhausted
    pub next_offset: Option<u64>,
}

/// Outcome of syncing one source across pages
#[derive(Debug, Default)]
pub struct SourceReport {
    pub pages: Vec<PageReport>,
    /// Set when a fetch failed; pages before it were still ingested
    pub error: Option<SyncError>,
}

impl SourceReport {
    pub fn inserted(&self) -> usize {
        self.pages.iter().map(|p| p.inserted).sum()
    }

    pub fn fetched(&self) -> usize {
        self.pages.iter().map(|p| p.fetched).sum()
    }
}

/// Feed sync orchestrator
pub struct FeedSync<F: FeedSource + ?Sized> {
    source: Arc<F>,
    config: FeedSyncConfig,
}

impl<F: FeedSource + ?Sized> FeedSync<F> {
    pub fn new(source: Arc<F>, config: FeedSyncConfig) -> Self {
        Self { source, config }
    }

    /// Fetch one page and ingest it
    pub async fn sync_page(
        &self,
        engine: &mut SocialEngine,
        source: SourceTag,
        offset: u64,
        limit: u32,
    ) -> Result<PageReport, SyncError> {
        let page = self.fetch(source, offset, limit).await?;
        Ok(ingest(engine, page, offset, limit))
    }

    /// Walk up to `max_pages` pages of every source.
    ///
    /// Sources are fetched concurrently page by page and ingested in the
    /// order given, so the resulting read order does not depend on network
    /// timing. A failing source stops only itself.
    pub async fn sync_all(
        &self,
        engine: &mut SocialEngine,
        sources: &[SourceTag],
    ) -> Vec<(SourceTag, SourceReport)> {
        let limit = self.config.page_size.max(1);
        let mut reports: Vec<(SourceTag, SourceReport)> = sources
            .iter()
            .map(|tag| (*tag, SourceReport::default()))
            .collect();
        let mut cursors: Vec<Option<u64>> = vec![Some(0); sources.len()];

        for _ in 0..self.config.max_pages {
            let pending: Vec<(usize, SourceTag, u64)> = sources
                .iter()
                .enumerate()
                .filter_map(|(i, tag)| cursors[i].map(|offset| (i, *tag, offset)))
                .collect();
            if pending.is_empty() {
                break;
            }

            let fetched = join_all(
                pending
                    .iter()
                    .map(|(_, tag, offset)| self.fetch(*tag, *offset, limit)),
            )
            .await;

            for ((i, tag, offset), result) in pending.into_iter().zip(fetched) {
                match result {
                    Ok(page) => {
                        let report = ingest(engine, page, offset, limit);
                        cursors[i] = report.next_offset;
                        reports[i].1.pages.push(report);
                    }
                    Err(e) => {
                        tracing::warn!(source = %tag, offset, error = %e, "Feed sync failed");
                        cursors[i] = None;
                        reports[i].1.error = Some(e);
                    }
                }
            }
        }

        reports
    }

    async fn fetch(&self, source: SourceTag, offset: u64, limit: u32) -> Result<FeedPage, SyncError> {
        tracing::debug!(source = %source, offset, limit, "Fetching feed page");
        let page = self.source.fetch_page(source, offset, limit).await?;
        if page.source() != source {
            return Err(SyncError::SourceMismatch {
                requested: source,
                returned: page.source(),
            });
        }
        Ok(page)
    }
}

fn ingest(engine: &mut SocialEngine, page: FeedPage, offset: u64, limit: u32) -> PageReport {
    let source = page.source();
    let fetched = page.len();
    let next_offset = next_offset(&page, offset, limit);
    let summary = engine.ingest_page(page);

    tracing::info!(
        source = %source,
        offset,
        fetched,
        inserted = summary.inserted.len(),
        "Synced feed page"
    );

    PageReport {
        source,
        offset,
        fetched,
        inserted: summary.inserted.len(),
        refreshed: summary.refreshed,
        skipped: summary.skipped,
        next_offset,
    }
}

/// Offset of the page after this one. Bare lists end on a short page;
/// envelopes end once `total` is reached.
fn next_offset(page: &FeedPage, offset: u64, limit: u32) -> Option<u64> {
    let len = page.len() as u64;
    let next = offset + len;
    match page {
        _ if len == 0 => None,
        FeedPage::Placeholder(_) if len < u64::from(limit) => None,
        FeedPage::Dummy { total, .. } if next >= *total => None,
        _ => Some(next),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DummyPost, DummyReactions, PlaceholderPost, PostId};
    use crate::ports::Clock;
    use async_trait::async_trait;
    use time::OffsetDateTime;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            OffsetDateTime::UNIX_EPOCH
        }
    }

    /// 25 placeholder posts, 12 dummy posts; dummy can be made to fail
    struct FakeSource {
        dummy_fails: bool,
    }

    #[async_trait]
    impl FeedSource for FakeSource {
        async fn fetch_page(
            &self,
            source: SourceTag,
            offset: u64,
            limit: u32,
        ) -> Result<FeedPage, FeedSourceError> {
            let end = |total: u64| (offset + u64::from(limit)).min(total);
            match source {
                SourceTag::JsonPlaceholder => Ok(FeedPage::Placeholder(
                    (offset + 1..=end(25))
                        .map(|id| PlaceholderPost {
                            id,
                            user_id: 1,
                            title: format!("p{}", id),
                            body: String::new(),
                        })
                        .collect(),
                )),
                SourceTag::DummyJson if self.dummy_fails => {
                    Err(FeedSourceError::Network("connection reset".to_string()))
                }
                SourceTag::DummyJson => Ok(FeedPage::Dummy {
                    posts: (offset + 1..=end(12))
                        .map(|id| DummyPost {
                            id,
                            title: format!("d{}", id),
                            body: String::new(),
                            user_id: 1,
                            tags: vec![],
                            reactions: DummyReactions::default(),
                        })
                        .collect(),
                    total: 12,
                }),
            }
        }
    }

    fn engine() -> SocialEngine {
        SocialEngine::new(Arc::new(FixedClock))
    }

    fn sync(dummy_fails: bool, page_size: u32, max_pages: u32) -> FeedSync<FakeSource> {
        FeedSync::new(
            Arc::new(FakeSource { dummy_fails }),
            FeedSyncConfig {
                page_size,
                max_pages,
            },
        )
    }

    #[tokio::test]
    async fn test_sync_page_reports_next_offset() {
        let mut engine = engine();
        let sync = sync(false, 10, 1);

        let first = sync
            .sync_page(&mut engine, SourceTag::JsonPlaceholder, 0, 10)
            .await
            .unwrap();
        assert_eq!(first.fetched, 10);
        assert_eq!(first.next_offset, Some(10));

        let last = sync
            .sync_page(&mut engine, SourceTag::JsonPlaceholder, 20, 10)
            .await
            .unwrap();
        assert_eq!(last.fetched, 5);
        assert_eq!(last.next_offset, None);
    }

    #[tokio::test]
    async fn test_envelope_ends_at_total() {
        let mut engine = engine();
        let sync = sync(false, 6, 5);

        let reports = sync.sync_all(&mut engine, &[SourceTag::DummyJson]).await;

        let (_, report) = &reports[0];
        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.fetched(), 12);
        assert_eq!(report.pages[1].next_offset, None);
        assert_eq!(engine.query().posts().count(), 12);
    }

    #[tokio::test]
    async fn test_failing_source_does_not_stop_others() {
        let mut engine = engine();
        let sync = sync(true, 10, 3);

        let reports = sync
            .sync_all(&mut engine, &[SourceTag::DummyJson, SourceTag::JsonPlaceholder])
            .await;

        assert!(reports[0].1.error.is_some());
        assert!(reports[0].1.pages.is_empty());
        assert!(reports[1].1.error.is_none());
        assert_eq!(reports[1].1.inserted(), 25);
    }

    #[tokio::test]
    async fn test_ingest_order_follows_source_order() {
        let mut engine = engine();
        let sync = sync(false, 2, 1);

        sync.sync_all(&mut engine, &[SourceTag::DummyJson, SourceTag::JsonPlaceholder])
            .await;

        let ids: Vec<PostId> = engine.query().posts().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![
                PostId::remote(SourceTag::DummyJson, 1),
                PostId::remote(SourceTag::DummyJson, 2),
                PostId::remote(SourceTag::JsonPlaceholder, 1),
                PostId::remote(SourceTag::JsonPlaceholder, 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_resync_does_not_duplicate() {
        let mut engine = engine();
        let sync = sync(false, 10, 1);

        sync.sync_page(&mut engine, SourceTag::DummyJson, 0, 10).await.unwrap();
        let again = sync
            .sync_page(&mut engine, SourceTag::DummyJson, 0, 10)
            .await
            .unwrap();

        assert_eq!(again.inserted, 0);
        assert_eq!(again.refreshed, 10);
        assert_eq!(engine.query().posts().count(), 10);
    }
}
