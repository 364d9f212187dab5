//! Canonical, provider-agnostic result types

use crate::api::ProviderId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of tool the engine resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WebSearch,
    ImageSearch,
    VideoSearch,
    Encyclopedia,
    Weather,
    Financial,
}

impl ToolKind {
    /// All kinds, in a fixed order
    pub const ALL: [ToolKind; 6] = [
        ToolKind::WebSearch,
        ToolKind::ImageSearch,
        ToolKind::VideoSearch,
        ToolKind::Encyclopedia,
        ToolKind::Weather,
        ToolKind::Financial,
    ];

    /// Name the tool is advertised under
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::WebSearch => "search_web",
            Self::ImageSearch => "search_images",
            Self::VideoSearch => "search_videos",
            Self::Encyclopedia => "search_wikipedia",
            Self::Weather => "get_weather_forecast",
            Self::Financial => "get_financial_data",
        }
    }

    /// Upper bound on the number of results the agent may request
    pub fn max_results(self) -> usize {
        match self {
            Self::WebSearch => 6,
            Self::ImageSearch | Self::VideoSearch => 10,
            Self::Encyclopedia | Self::Weather | Self::Financial => 1,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WebSearch => "web search",
            Self::ImageSearch => "image search",
            Self::VideoSearch => "video search",
            Self::Encyclopedia => "encyclopedia",
            Self::Weather => "weather",
            Self::Financial => "financial",
        };
        f.write_str(name)
    }
}

/// How the rendering layer should present a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Show the single best item immediately
    AutoDisplay,
    /// Offer the results as a browsable list
    ListDisplay,
}

/// Provider-agnostic result of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalResult {
    SearchResultList(SearchResultList),
    SingleArticle(Article),
    Forecast(Forecast),
    FinancialQuote(FinancialQuote),
}

impl CanonicalResult {
    /// Number of items carried by the result
    pub fn item_count(&self) -> usize {
        match self {
            Self::SearchResultList(list) => list.items.len(),
            Self::Forecast(forecast) => forecast.periods.len(),
            Self::SingleArticle(_) | Self::FinancialQuote(_) => 1,
        }
    }

    /// Image the tool layer features next to the result
    ///
    /// The first http(s) thumbnail for searches, the condition icon for
    /// forecasts.
    pub fn featured_image(&self) -> Option<&str> {
        match self {
            Self::SearchResultList(list) => list
                .items
                .iter()
                .filter_map(|item| item.thumbnail_url.as_deref())
                .find(|url| url.starts_with("http")),
            Self::SingleArticle(article) => article.thumbnail_url.as_deref(),
            Self::FinancialQuote(quote) => quote.logo_url.as_deref(),
            Self::Forecast(forecast) => forecast.condition_icon.as_deref(),
        }
    }
}

/// Ordered search results in provider relevance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultList {
    pub tool: ToolKind,
    pub provider: ProviderId,
    pub query: String,
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaDetails>,
}

/// Per-tool extra metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaDetails {
    Image {
        image_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
    Video {
        video_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        published_at: Option<String>,
        /// Canonical duration in whole seconds
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<u64>,
        /// Provider-reported view count, unformatted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_count: Option<u64>,
    },
}

/// A single encyclopedia article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub provider: ProviderId,
    pub query: String,
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub source_url: String,
}

/// Granularity of forecast periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastGranularity {
    Daily,
    TwiceDaily,
    Hourly,
}

impl ForecastGranularity {
    /// Value of the `type` field in a forecast service call
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::TwiceDaily => "twice_daily",
            Self::Hourly => "hourly",
        }
    }
}

/// Concrete time window a forecast covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "span", rename_all = "snake_case")]
pub enum ResolvedWindow {
    Day { date: NaiveDate },
    Week { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub entity_id: String,
    pub window: ResolvedWindow,
    pub granularity: ForecastGranularity,
    pub periods: Vec<ForecastPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentConditions>,
    /// Icon for the condition of the first period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    /// Start of the period as reported by the provider (RFC 3339)
    pub starts_at: String,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_probability: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_daytime: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Temperature {
    Range { low: f64, high: f64 },
    Point { value: f64 },
}

/// Live sensor readings, only attached for the present moment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<SensorReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<SensorReading>,
}

impl CurrentConditions {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Equity,
    Crypto,
    ForexPair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialQuote {
    pub instrument: InstrumentKind,
    pub provider: ProviderId,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    pub price: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<Conversion>,
}

/// Currency conversion details for forex quotes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub rate: f64,
    pub converted_amount: f64,
}

/// What the dispatcher hands back for one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResolution {
    pub display: DisplayMode,
    pub result: CanonicalResult,
}
