//! Brave Search API client (web and image verticals)

use super::http::{SharedRateLimiter, build_client, rate_limiter, send_json, trim_base};
use super::{ProviderId, SearchProvider, SearchQuery};
use crate::config::SafeSearch;
use crate::engine::ToolKind;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const BRAVE_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Brave Search client
///
/// One client serves both verticals; the query kind picks the endpoint.
pub struct BraveClient {
    client: Client,
    api_key: String,
    base_url: String,
    safesearch: SafeSearch,
    rate_limiter: SharedRateLimiter,
}

impl BraveClient {
    /// Create a new Brave client
    ///
    /// # Arguments
    /// * `api_key` - Brave subscription token
    /// * `timeout` - Per-request timeout
    /// * `rate_limit` - Requests per minute
    pub fn new(api_key: impl Into<String>, timeout: Duration, rate_limit: u32) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            base_url: BRAVE_BASE_URL.to_string(),
            safesearch: SafeSearch::default(),
            rate_limiter: rate_limiter(rate_limit),
        })
    }

    /// Safety level for image searches
    pub fn with_safesearch(mut self, safesearch: SafeSearch) -> Self {
        self.safesearch = safesearch;
        self
    }

    /// Point the client at a different server
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    async fn web(&self, query: &SearchQuery) -> Result<Value> {
        let count = query.count.to_string();
        let request = self
            .client
            .get(format!("{}/web/search", self.base_url))
            .header("X-Subscription-Token", &self.api_key)
            .query(&[
                ("q", query.text.as_str()),
                ("count", count.as_str()),
                ("result_filter", "web"),
                ("extra_snippets", "true"),
            ]);

        send_json(ProviderId::Brave, request).await
    }

    async fn images(&self, query: &SearchQuery) -> Result<Value> {
        let count = query.count.to_string();
        let request = self
            .client
            .get(format!("{}/images/search", self.base_url))
            .header("X-Subscription-Token", &self.api_key)
            .query(&[
                ("q", query.text.as_str()),
                ("count", count.as_str()),
                ("safesearch", self.safesearch.as_str()),
            ]);

        send_json(ProviderId::Brave, request).await
    }
}

#[async_trait]
impl SearchProvider for BraveClient {
    fn id(&self) -> ProviderId {
        ProviderId::Brave
    }

    fn cache_params(&self) -> String {
        format!("safesearch={}", self.safesearch.as_str())
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(
            kind = %query.kind,
            query = %query.text,
            count = query.count,
            "Brave search"
        );

        match query.kind {
            ToolKind::WebSearch => self.web(query).await,
            ToolKind::ImageSearch => self.images(query).await,
            other => Err(ResolveError::ConfigurationMissing(format!(
                "Brave does not serve {other}"
            ))),
        }
    }
}
