//! YouTube Data API v3 client

use super::http::{build_client, send_json, trim_base};
use super::{ProviderId, SearchProvider, SearchQuery};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube video search client
///
/// A fetch is two upstream calls: the search itself, then a best-effort
/// details lookup (duration, view count) for the returned video ids. The raw
/// payload is `{"search": ..., "videos": ...}` with `videos` null when the
/// details call failed.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            base_url: YOUTUBE_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    async fn search(&self, query: &SearchQuery) -> Result<Value> {
        let max_results = query.count.to_string();
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("q", query.text.as_str()),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ]);

        send_json(ProviderId::Youtube, request).await
    }

    async fn details(&self, video_ids: &[&str]) -> Result<Value> {
        let ids = video_ids.join(",");
        let request = self
            .client
            .get(format!("{}/videos", self.base_url))
            .query(&[
                ("part", "contentDetails,statistics"),
                ("id", ids.as_str()),
                ("key", self.api_key.as_str()),
            ]);

        send_json(ProviderId::Youtube, request).await
    }
}

fn video_ids(search: &Value) -> Vec<&str> {
    search["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"]["videoId"].as_str())
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl SearchProvider for YoutubeClient {
    fn id(&self) -> ProviderId {
        ProviderId::Youtube
    }

    fn cache_params(&self) -> String {
        String::new()
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Value> {
        tracing::debug!(query = %query.text, count = query.count, "YouTube search");

        let search = self.search(query).await?;
        let ids = video_ids(&search);
        if ids.is_empty() {
            return Ok(json!({ "search": search, "videos": null }));
        }

        let videos = match self.details(&ids).await {
            Ok(videos) => videos,
            Err(e) => {
                tracing::warn!("YouTube video details unavailable: {}", e);
                Value::Null
            },
        };

        Ok(json!({ "search": search, "videos": videos }))
    }
}
