//! CoinGecko market data client (no API key required)

use super::http::{SharedRateLimiter, build_client, rate_limiter, send_json, trim_base};
use super::{ProviderId, QuoteRequest, QuoteSource};
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl CoinGeckoClient {
    /// Create a new client; the public API allows roughly 30 requests per minute
    pub fn new(timeout: Duration, rate_limit: u32) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: COINGECKO_BASE_URL.to_string(),
            rate_limiter: rate_limiter(rate_limit),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base(base_url);
        self
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoClient {
    fn id(&self) -> ProviderId {
        ProviderId::Coingecko
    }

    async fn fetch(&self, request: &QuoteRequest) -> Result<Value> {
        let QuoteRequest::Crypto {
            coin_id,
            vs_currency,
        } = request
        else {
            return Err(ResolveError::ConfigurationMissing(format!(
                "CoinGecko is not configured for {}",
                request.describe()
            )));
        };

        self.rate_limiter.until_ready().await;
        tracing::debug!(coin = %coin_id, "CoinGecko markets lookup");

        let request = self
            .client
            .get(format!("{}/coins/markets", self.base_url))
            .query(&[
                ("vs_currency", vs_currency.as_str()),
                ("ids", coin_id.as_str()),
                ("price_change_percentage", "24h"),
            ]);

        send_json(ProviderId::Coingecko, request).await
    }
}
