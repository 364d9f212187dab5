//! API clients for upstream data providers
//!
//! Every client performs one logical request/response cycle and hands back the
//! raw provider payload. Shaping that payload is the normalizer's job.

pub mod brave;
pub mod coingecko;
pub mod finnhub;
pub mod google;
pub mod home_assistant;
mod http;
pub mod searxng;
pub mod wikipedia;
pub mod youtube;

pub use brave::BraveClient;
pub use coingecko::CoinGeckoClient;
pub use finnhub::FinnhubClient;
pub use google::GoogleImageClient;
pub use home_assistant::HomeAssistantClient;
pub use searxng::SearxngClient;
pub use wikipedia::WikipediaClient;
pub use youtube::YoutubeClient;

use crate::engine::{ForecastGranularity, ToolKind};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity of an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Brave,
    Searxng,
    Google,
    Youtube,
    Wikipedia,
    HomeAssistant,
    Finnhub,
    Coingecko,
}

impl ProviderId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brave => "brave",
            Self::Searxng => "searxng",
            Self::Google => "google",
            Self::Youtube => "youtube",
            Self::Wikipedia => "wikipedia",
            Self::HomeAssistant => "home_assistant",
            Self::Finnhub => "finnhub",
            Self::Coingecko => "coingecko",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search request as seen by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub kind: ToolKind,
    pub text: String,
    /// Number of results wanted, already capped
    pub count: usize,
}

/// Providers backing web, image, video and encyclopedia lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Provider parameters that change the output (safety level, engines,
    /// article detail, language), folded into the cache key
    fn cache_params(&self) -> String;

    async fn fetch(&self, query: &SearchQuery) -> Result<Value>;
}

/// Requests understood by a weather source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherRequest {
    /// Forecast entries of the given granularity for a weather entity
    Forecast {
        entity_id: String,
        granularity: ForecastGranularity,
    },
    /// Current state of an entity; `Value::Null` if the entity does not exist
    State { entity_id: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn fetch(&self, request: &WeatherRequest) -> Result<Value>;
}

/// Requests understood by a quote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteRequest {
    Equity { ticker: String },
    Profile { ticker: String },
    Crypto { coin_id: String, vs_currency: String },
    ForexRates { base: String },
}

impl QuoteRequest {
    fn describe(&self) -> &'static str {
        match self {
            Self::Equity { .. } => "equity quotes",
            Self::Profile { .. } => "company profiles",
            Self::Crypto { .. } => "crypto quotes",
            Self::ForexRates { .. } => "forex rates",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn fetch(&self, request: &QuoteRequest) -> Result<Value>;
}
