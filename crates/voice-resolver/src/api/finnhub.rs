//! Finnhub client for equity quotes, company profiles and forex rates

use super::http::{SharedRateLimiter, build_client, rate_limiter, send_json, trim_base};
use super::{ProviderId, QuoteRequest, QuoteSource};
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub client with rate limiting
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `timeout` - Per-request timeout
    /// * `rate_limit` - Requests per minute (free tier: 60, premium: 300+)
    pub fn new(api_key: impl Into<String>, timeout: Duration, rate_limit: u32) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            base_url: FINNHUB_BASE_URL.to_string(),
            rate_limiter: rate_limiter(rate_limit),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    async fn get(&self, path: &str, param: (&str, &str)) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(&[param, ("token", self.api_key.as_str())]);

        send_json(ProviderId::Finnhub, request).await
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    fn id(&self) -> ProviderId {
        ProviderId::Finnhub
    }

    async fn fetch(&self, request: &QuoteRequest) -> Result<Value> {
        tracing::debug!(?request, "Finnhub request");

        match request {
            QuoteRequest::Equity { ticker } => {
                self.get("/quote", ("symbol", ticker.as_str())).await
            },
            QuoteRequest::Profile { ticker } => {
                self.get("/stock/profile2", ("symbol", ticker.as_str())).await
            },
            QuoteRequest::ForexRates { base } => {
                self.get("/forex/rates", ("base", base.as_str())).await
            },
            QuoteRequest::Crypto { .. } => Err(ResolveError::ConfigurationMissing(format!(
                "Finnhub is not configured for {}",
                request.describe()
            ))),
        }
    }
}
