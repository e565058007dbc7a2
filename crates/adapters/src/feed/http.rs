//! HTTP feed source for the two public post feeds

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use social_state_domain::{
    DummyPost, FeedPage, FeedSource, FeedSourceError, PlaceholderPost, SourceTag,
};
use std::time::Duration;

pub const JSONPLACEHOLDER_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DUMMYJSON_BASE_URL: &str = "https://dummyjson.com";

/// Reads pages from jsonplaceholder (bare list, `_start`/`_limit`) and
/// dummyjson (`{posts,total}` envelope, `skip`/`limit`)
pub struct HttpFeedSource {
    client: Client,
    placeholder_base_url: String,
    dummy_base_url: String,
}

impl HttpFeedSource {
    pub fn with_base_urls(
        placeholder_base_url: String,
        dummy_base_url: String,
        timeout: Duration,
    ) -> Result<Self, FeedSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedSourceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            placeholder_base_url: placeholder_base_url.trim_end_matches('/').to_string(),
            dummy_base_url: dummy_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, FeedSourceError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FeedSourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedSourceError::Api(format!("{}: {}", status, body)));
        }

        Ok(response)
    }

    async fn fetch_placeholder(&self, offset: u64, limit: u32) -> Result<FeedPage, FeedSourceError> {
        let url = format!("{}/posts", self.placeholder_base_url);
        let response = self
            .get(&url, &[("_start", offset.to_string()), ("_limit", limit.to_string())])
            .await?;

        let posts: Vec<PlaceholderPost> = response
            .json()
            .await
            .map_err(|e| FeedSourceError::Decode(e.to_string()))?;

        Ok(FeedPage::Placeholder(posts))
    }

    async fn fetch_dummy(&self, offset: u64, limit: u32) -> Result<FeedPage, FeedSourceError> {
        let url = format!("{}/posts", self.dummy_base_url);
        let response = self
            .get(&url, &[("skip", offset.to_string()), ("limit", limit.to_string())])
            .await?;

        let envelope: DummyEnvelope = response
            .json()
            .await
            .map_err(|e| FeedSourceError::Decode(e.to_string()))?;

        Ok(FeedPage::Dummy {
            posts: envelope.posts,
            total: envelope.total,
        })
    }
}

#[derive(Deserialize)]
struct DummyEnvelope {
    posts: Vec<DummyPost>,
    #[serde(default)]
    total: u64,
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_page(
        &self,
        source: SourceTag,
        offset: u64,
        limit: u32,
    ) -> Result<FeedPage, FeedSourceError> {
        tracing::info!(source = %source, offset, limit, "Fetching posts");

        let page = match source {
            SourceTag::JsonPlaceholder => self.fetch_placeholder(offset, limit).await?,
            SourceTag::DummyJson => self.fetch_dummy(offset, limit).await?,
        };

        tracing::info!(source = %source, count = page.len(), "Fetched posts");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> HttpFeedSource {
        HttpFeedSource::with_base_urls(server.uri(), server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_placeholder_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("_start", "10"))
            .and(query_param("_limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"userId": 2, "id": 11, "title": "et ea vero", "body": "delectus reiciendis"},
                {"userId": 2, "id": 12, "title": "in quibusdam", "body": "itaque id aut"}
            ])))
            .mount(&mock_server)
            .await;

        let page = source_for(&mock_server)
            .fetch_page(SourceTag::JsonPlaceholder, 10, 2)
            .await
            .unwrap();

        let FeedPage::Placeholder(posts) = page else {
            panic!("expected a bare list page");
        };
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, 11);
        assert_eq!(posts[0].user_id, 2);
    }

    #[tokio::test]
    async fn test_fetch_dummy_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("skip", "0"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [{
                    "id": 1,
                    "title": "His mother had always taught him",
                    "body": "His mother had always taught him not to ever think of himself.",
                    "userId": 121,
                    "tags": ["history", "american", "crime"],
                    "reactions": {"likes": 192, "dislikes": 25},
                    "views": 305
                }],
                "total": 251,
                "skip": 0,
                "limit": 1
            })))
            .mount(&mock_server)
            .await;

        let page = source_for(&mock_server)
            .fetch_page(SourceTag::DummyJson, 0, 1)
            .await
            .unwrap();

        let FeedPage::Dummy { posts, total } = page else {
            panic!("expected an envelope page");
        };
        assert_eq!(total, 251);
        assert_eq!(posts[0].reactions.likes, 192);
        assert_eq!(posts[0].tags, vec!["history", "american", "crime"]);
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let result = source_for(&mock_server)
            .fetch_page(SourceTag::DummyJson, 0, 10)
            .await;

        assert!(matches!(result, Err(FeedSourceError::Api(msg)) if msg.contains("maintenance")));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": "not a list"
            })))
            .mount(&mock_server)
            .await;

        let result = source_for(&mock_server)
            .fetch_page(SourceTag::DummyJson, 0, 10)
            .await;

        assert!(matches!(result, Err(FeedSourceError::Decode(_))));
    }
}
