//! Feed source adapters

mod http;

pub use http::{DUMMYJSON_BASE_URL, HttpFeedSource, JSONPLACEHOLDER_BASE_URL};

use async_trait::async_trait;
use social_state_domain::{
    DummyPost, DummyReactions, FeedPage, FeedSource, FeedSourceError, PlaceholderPost, SourceTag,
};

/// Stub feed source for testing and offline mode. Pages through fixed
/// record lists the same way the real feeds do.
#[derive(Debug, Clone, Default)]
pub struct StubFeedSource {
    placeholder: Vec<PlaceholderPost>,
    dummy: Vec<DummyPost>,
}

impl StubFeedSource {
    /// Create an empty stub
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_placeholder_posts(mut self, posts: Vec<PlaceholderPost>) -> Self {
        self.placeholder = posts;
        self
    }

    pub fn with_dummy_posts(mut self, posts: Vec<DummyPost>) -> Self {
        self.dummy = posts;
        self
    }

    /// A small canned feed on both sources, served by the `stub` provider
    pub fn sample() -> Self {
        let placeholder = [
            (1, 1, "Morning light", "First coffee on the balcony"),
            (2, 1, "Bike commute", "Twelve kilometres before nine"),
            (3, 2, "Bookshelf", "Finally sorted by colour"),
        ]
        .into_iter()
        .map(|(id, user_id, title, body)| PlaceholderPost {
            id,
            user_id,
            title: title.to_string(),
            body: body.to_string(),
        })
        .collect();

        let dummy = [
            (1, 3, "Street food tour", &["food", "travel"][..], 12),
            (2, 4, "Trail running", &["fitness"][..], 7),
        ]
        .into_iter()
        .map(|(id, user_id, title, tags, likes)| DummyPost {
            id,
            title: title.to_string(),
            body: format!("{} notes", title),
            user_id,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            reactions: DummyReactions { likes, dislikes: 0 },
        })
        .collect();

        Self::empty()
            .with_placeholder_posts(placeholder)
            .with_dummy_posts(dummy)
    }
}

fn window<T: Clone>(records: &[T], offset: u64, limit: u32) -> Vec<T> {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(records.len());
    records
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl FeedSource for StubFeedSource {
    async fn fetch_page(
        &self,
        source: SourceTag,
        offset: u64,
        limit: u32,
    ) -> Result<FeedPage, FeedSourceError> {
        let page = match source {
            SourceTag::JsonPlaceholder => {
                FeedPage::Placeholder(window(&self.placeholder, offset, limit))
            }
            SourceTag::DummyJson => FeedPage::Dummy {
                posts: window(&self.dummy, offset, limit),
                total: self.dummy.len() as u64,
            },
        };
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(id: u64) -> DummyPost {
        DummyPost {
            id,
            title: format!("title {}", id),
            body: "body".to_string(),
            user_id: 1,
            tags: vec![],
            reactions: DummyReactions::default(),
        }
    }

    #[tokio::test]
    async fn test_stub_pages_through_records() {
        let stub = StubFeedSource::empty().with_dummy_posts((1..=5).map(dummy).collect());

        let page = stub.fetch_page(SourceTag::DummyJson, 3, 10).await.unwrap();
        let FeedPage::Dummy { posts, total } = page else {
            panic!("expected an envelope page");
        };
        assert_eq!(total, 5);
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 5]);
    }

    #[tokio::test]
    async fn test_sample_serves_both_sources() {
        let stub = StubFeedSource::sample();

        let page = stub
            .fetch_page(SourceTag::JsonPlaceholder, 0, 10)
            .await
            .unwrap();
        assert_eq!(page.len(), 3);

        let FeedPage::Dummy { posts, total } =
            stub.fetch_page(SourceTag::DummyJson, 0, 1).await.unwrap()
        else {
            panic!("expected an envelope page");
        };
        assert_eq!(total, 2);
        assert_eq!(posts[0].reactions.likes, 12);
    }

    #[tokio::test]
    async fn test_stub_past_end_is_empty() {
        let stub = StubFeedSource::empty();
        let page = stub
            .fetch_page(SourceTag::JsonPlaceholder, 40, 10)
            .await
            .unwrap();
        assert!(page.is_empty());
    }
}
