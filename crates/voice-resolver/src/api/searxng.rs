//! SearXNG metasearch client

use super::http::{build_client, send_json, trim_base};
use super::{ProviderId, SearchProvider, SearchQuery};
use crate::engine::ToolKind;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Client for a self-hosted SearXNG instance
pub struct SearxngClient {
    client: Client,
    base_url: String,
    engines: Vec<String>,
}

impl SearxngClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: trim_base(base_url),
            engines: Vec::new(),
        })
    }

    /// Restrict the search to the given engines
    pub fn with_engines(mut self, engines: Vec<String>) -> Self {
        self.engines = engines;
        self
    }
}

#[async_trait]
impl SearchProvider for SearxngClient {
    fn id(&self) -> ProviderId {
        ProviderId::Searxng
    }

    fn cache_params(&self) -> String {
        format!("engines={}", self.engines.join(","))
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Value> {
        let category = match query.kind {
            ToolKind::WebSearch => "general",
            ToolKind::ImageSearch => "images",
            other => {
                return Err(ResolveError::ConfigurationMissing(format!(
                    "SearXNG does not serve {other}"
                )));
            },
        };

        tracing::debug!(category, query = %query.text, "SearXNG search");

        let mut params = vec![
            ("q", query.text.clone()),
            ("categories", category.to_string()),
            ("format", "json".to_string()),
        ];
        if !self.engines.is_empty() {
            params.push(("engines", self.engines.join(",")));
        }

        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&params);

        send_json(ProviderId::Searxng, request).await
    }
}
