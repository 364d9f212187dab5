//! Google Custom Search client, image vertical only

use super::http::{build_client, send_json, trim_base};
use super::{ProviderId, SearchProvider, SearchQuery};
use crate::engine::ToolKind;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const GOOGLE_CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// The API never returns more than 10 items per page
const MAX_PAGE_SIZE: usize = 10;

pub struct GoogleImageClient {
    client: Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl GoogleImageClient {
    /// Create a client for the given API key and search engine id
    pub fn new(
        api_key: impl Into<String>,
        cx: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            cx: cx.into(),
            endpoint: GOOGLE_CSE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, endpoint: &str) -> Self {
        self.endpoint = trim_base(endpoint);
        self
    }
}

#[async_trait]
impl SearchProvider for GoogleImageClient {
    fn id(&self) -> ProviderId {
        ProviderId::Google
    }

    fn cache_params(&self) -> String {
        format!("cx={}", self.cx)
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Value> {
        if query.kind != ToolKind::ImageSearch {
            return Err(ResolveError::ConfigurationMissing(format!(
                "Google Custom Search does not serve {}",
                query.kind
            )));
        }

        let num = query.count.min(MAX_PAGE_SIZE).to_string();
        let request = self.client.get(&self.endpoint).query(&[
            ("key", self.api_key.as_str()),
            ("cx", self.cx.as_str()),
            ("q", query.text.as_str()),
            ("searchType", "image"),
            ("num", num.as_str()),
        ]);

        send_json(ProviderId::Google, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http::test_server::serve;
    use crate::error::ErrorKind;

    fn images(text: &str, count: usize) -> SearchQuery {
        SearchQuery {
            kind: ToolKind::ImageSearch,
            text: text.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_image_search_against_local_server() {
        let base_url = serve(|target| {
            if target.contains("q=quota") {
                (429, r#"{"error": {"message": "Quota exceeded"}}"#.to_string())
            } else if target.contains("searchType=image") && target.contains("num=10") {
                (200, r#"{"items": [{"link": "https://img.example/1.jpg"}]}"#.to_string())
            } else {
                (400, String::new())
            }
        })
        .await;
        let client = GoogleImageClient::new("key", "cx", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&base_url);

        let raw = client.fetch(&images("aurora", 25)).await.unwrap();
        assert!(raw["items"].is_array());

        let err = client.fetch(&images("quota", 3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderRejected);
    }

    #[tokio::test]
    #[ignore] // Requires GOOGLE_CSE_API_KEY, GOOGLE_CSE_CX and network access
    async fn test_live_image_search() {
        let api_key = std::env::var("GOOGLE_CSE_API_KEY").expect("GOOGLE_CSE_API_KEY not set");
        let cx = std::env::var("GOOGLE_CSE_CX").expect("GOOGLE_CSE_CX not set");
        let client = GoogleImageClient::new(api_key, cx, Duration::from_secs(10)).unwrap();
        let query = SearchQuery {
            kind: ToolKind::ImageSearch,
            text: "northern lights".to_string(),
            count: 3,
        };
        let raw = client.fetch(&query).await.unwrap();
        assert!(raw["items"].is_array());
    }
}
