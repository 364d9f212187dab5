//! Tool dispatcher - the entry point of the resolution engine
//!
//! A [`ToolCall`] goes in, a [`ToolResolution`] comes out. Search and
//! encyclopedia lookups are served through the [`StampedeCache`]; weather and
//! financial lookups always go to the provider.

use super::classify::classify;
use super::forecast::{WindowSpan, horizon_days, resolve_window};
use super::normalize;
use super::result::{
    CanonicalResult, CurrentConditions, Forecast, ForecastGranularity, SensorReading, ToolKind,
    ToolResolution,
};
use super::symbol::{ResolvedSymbol, resolve_currency_pair, resolve_symbol};
use crate::api::home_assistant::{features, supports};
use crate::api::{
    BraveClient, CoinGeckoClient, FinnhubClient, GoogleImageClient, HomeAssistantClient,
    ProviderId, QuoteRequest, QuoteSource, SearchProvider, SearchQuery, SearxngClient,
    WeatherRequest, WeatherSource, WikipediaClient, YoutubeClient,
};
use crate::cache::{CacheKey, StampedeCache};
use crate::config::{EngineConfig, ProviderConfig};
use crate::error::{ResolveError, Result};
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Quote currency for crypto prices
const CRYPTO_VS_CURRENCY: &str = "usd";

/// Shared result cache used by the dispatcher
pub type ResultCache = StampedeCache<CacheKey, CanonicalResult>;

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// A typed tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Web, image or video search
    Search {
        kind: ToolKind,
        query: String,
        num_results: Option<usize>,
        /// The agent's explicit single-target flag
        singular: bool,
    },
    Encyclopedia {
        query: String,
    },
    Weather {
        /// Relative day expression such as `tomorrow`, `friday` or `week`
        range: String,
    },
    Stock {
        symbol: String,
    },
    Currency {
        from: String,
        to: String,
        amount: Option<f64>,
    },
}

impl ToolCall {
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Search { kind, .. } => *kind,
            Self::Encyclopedia { .. } => ToolKind::Encyclopedia,
            Self::Weather { .. } => ToolKind::Weather,
            Self::Stock { .. } | Self::Currency { .. } => ToolKind::Financial,
        }
    }
}

/// Resolves tool calls against the configured providers
pub struct ToolDispatcher {
    config: Arc<EngineConfig>,
    cache: Arc<ResultCache>,
    search: HashMap<ToolKind, Arc<dyn SearchProvider>>,
    weather: Option<Arc<dyn WeatherSource>>,
    equities: Option<Arc<dyn QuoteSource>>,
    crypto: Option<Arc<dyn QuoteSource>>,
    today: Clock,
}

impl ToolDispatcher {
    /// Start building a dispatcher for the given configuration
    pub fn builder(config: EngineConfig) -> ToolDispatcherBuilder {
        ToolDispatcherBuilder::new(config)
    }

    /// Build a dispatcher with HTTP clients for every configured provider
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::builder(config).with_default_providers()?.build())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Tool kinds whose configuration is complete
    pub fn enabled_kinds(&self) -> Vec<ToolKind> {
        ToolKind::ALL
            .into_iter()
            .filter(|kind| {
                self.config
                    .provider_for(*kind)
                    .is_some_and(|provider| provider.ensure_ready().is_ok())
            })
            .collect()
    }

    /// Start the background task that purges expired cache entries
    pub fn spawn_cache_sweeper(&self) -> JoinHandle<()> {
        self.cache.spawn_sweeper(self.config.cache_sweep_interval())
    }

    /// Resolve a tool call into a canonical result and a display decision
    pub async fn resolve(&self, call: ToolCall) -> Result<ToolResolution> {
        let kind = call.kind();
        tracing::info!(tool = kind.tool_name(), "Resolving tool call");

        let outcome = match call {
            ToolCall::Search {
                kind,
                query,
                num_results,
                singular,
            } => {
                if !matches!(
                    kind,
                    ToolKind::WebSearch | ToolKind::ImageSearch | ToolKind::VideoSearch
                ) {
                    return Err(ResolveError::InvalidArguments(format!(
                        "{kind} is not a search tool"
                    )));
                }
                self.resolve_cached(kind, &query, num_results, singular).await
            },
            ToolCall::Encyclopedia { query } => {
                self.resolve_cached(ToolKind::Encyclopedia, &query, None, true).await
            },
            ToolCall::Weather { range } => self.resolve_weather(&range).await,
            ToolCall::Stock { symbol } => self.resolve_stock(&symbol).await,
            ToolCall::Currency { from, to, amount } => {
                self.resolve_currency(&from, &to, amount).await
            },
        };

        if let Err(e) = &outcome {
            tracing::debug!(tool = kind.tool_name(), error = %e, "Tool call failed");
        }
        outcome
    }

    /// Provider entry for a kind, checked for completeness
    fn provider_config(&self, kind: ToolKind) -> Result<&ProviderConfig> {
        let provider = self.config.provider_for(kind).ok_or_else(|| {
            ResolveError::ConfigurationMissing(format!(
                "{} is not enabled: no provider configured",
                kind.tool_name()
            ))
        })?;
        provider.ensure_ready()?;
        Ok(provider)
    }

    async fn resolve_cached(
        &self,
        kind: ToolKind,
        query: &str,
        requested: Option<usize>,
        singular: bool,
    ) -> Result<ToolResolution> {
        let provider = self.provider_config(kind)?;
        let source = self.search.get(&kind).cloned().ok_or_else(|| missing_source(kind))?;

        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::InvalidArguments("query is required".to_string()));
        }

        let configured = provider.num_results().clamp(1, kind.max_results());
        let count = match requested {
            Some(0) => {
                return Err(ResolveError::InvalidArguments(
                    "num_results must be at least 1".to_string(),
                ));
            },
            Some(n) => n.min(configured),
            None => configured,
        };

        let key = CacheKey::new(kind, query, source.id(), source.cache_params(), count);
        let request = SearchQuery {
            kind,
            text: query.to_string(),
            count,
        };

        let result = self
            .cache
            .get_or_fetch(key, self.config.cache_ttl(kind), move || async move {
                let raw = source.fetch(&request).await?;
                normalize_lookup(source.id(), &request, &raw)
            })
            .await?;

        Ok(ToolResolution {
            display: classify(kind, singular, result.item_count()),
            result,
        })
    }

    async fn resolve_weather(&self, range: &str) -> Result<ToolResolution> {
        let ProviderConfig::HomeAssistantWeather {
            daily_entity,
            hourly_entity,
            temperature_sensor,
            humidity_sensor,
            ..
        } = self.provider_config(ToolKind::Weather)?
        else {
            return Err(ResolveError::ConfigurationMissing(
                "weather requires a Home Assistant provider".to_string(),
            ));
        };
        let source = self
            .weather
            .clone()
            .ok_or_else(|| missing_source(ToolKind::Weather))?;

        let today = (self.today)();
        let daily_raw = source
            .fetch(&WeatherRequest::Forecast {
                entity_id: daily_entity.clone(),
                granularity: ForecastGranularity::Daily,
            })
            .await?;
        let daily = normalize::forecast_periods(&daily_raw, daily_entity)?;
        let horizon = horizon_days(
            daily.iter().filter_map(|period| normalize::period_date(&period.starts_at)),
            today,
        );

        let mut window = resolve_window(range, today, horizon, false)?;
        let (granularity, entity_id) = match window.span {
            WindowSpan::Week => (ForecastGranularity::Daily, daily_entity.clone()),
            WindowSpan::Day { .. } => {
                self.single_day_source(source.as_ref(), daily_entity, hourly_entity.as_deref())
                    .await
            },
        };
        window.hourly = granularity == ForecastGranularity::Hourly;
        tracing::debug!(
            horizon,
            granularity = granularity.as_str(),
            entity = %entity_id,
            "Resolved forecast window"
        );

        let periods = if granularity == ForecastGranularity::Daily {
            daily
        } else {
            let raw = source
                .fetch(&WeatherRequest::Forecast {
                    entity_id: entity_id.clone(),
                    granularity,
                })
                .await?;
            normalize::forecast_periods(&raw, &entity_id)?
        };

        let dates = window.dates(today);
        let periods: Vec<_> = periods
            .into_iter()
            .filter(|period| {
                normalize::period_date(&period.starts_at).is_some_and(|date| dates.contains(&date))
            })
            .collect();
        if periods.is_empty() {
            return Err(ResolveError::NoMatch(format!(
                "{entity_id} has no forecast entries for '{}'",
                range.trim()
            )));
        }

        let current = if window.include_current {
            let conditions = CurrentConditions {
                temperature: read_sensor(source.as_ref(), temperature_sensor.as_deref()).await,
                humidity: read_sensor(source.as_ref(), humidity_sensor.as_deref()).await,
            };
            (!conditions.is_empty()).then_some(conditions)
        } else {
            None
        };

        let condition_icon = periods
            .first()
            .and_then(|period| normalize::condition_icon(period, &self.config.weather_icon_path));

        Ok(ToolResolution {
            display: classify(ToolKind::Weather, false, periods.len()),
            result: CanonicalResult::Forecast(Forecast {
                entity_id,
                window: window.resolved(today),
                granularity,
                periods,
                current,
                condition_icon,
            }),
        })
    }

    /// Finest forecast available for a single day
    ///
    /// Hourly if the hourly entity supports it, otherwise twice-daily if the
    /// daily entity supports it, otherwise daily. A failed capability lookup
    /// counts as unsupported.
    async fn single_day_source(
        &self,
        source: &dyn WeatherSource,
        daily_entity: &str,
        hourly_entity: Option<&str>,
    ) -> (ForecastGranularity, String) {
        if let Some(hourly) = hourly_entity.filter(|id| !id.trim().is_empty()) {
            if entity_supports(source, hourly, features::FORECAST_HOURLY).await {
                return (ForecastGranularity::Hourly, hourly.to_string());
            }
        }

        if entity_supports(source, daily_entity, features::FORECAST_TWICE_DAILY).await {
            (ForecastGranularity::TwiceDaily, daily_entity.to_string())
        } else {
            (ForecastGranularity::Daily, daily_entity.to_string())
        }
    }

    async fn resolve_stock(&self, symbol: &str) -> Result<ToolResolution> {
        self.provider_config(ToolKind::Financial)?;

        let quote = match resolve_symbol(symbol)? {
            ResolvedSymbol::Crypto { symbol, coin_id } => {
                let source = self
                    .crypto
                    .clone()
                    .ok_or_else(|| missing_source(ToolKind::Financial))?;
                tracing::debug!(symbol = %symbol, coin_id, "Resolved crypto symbol");

                let raw = source
                    .fetch(&QuoteRequest::Crypto {
                        coin_id: coin_id.to_string(),
                        vs_currency: CRYPTO_VS_CURRENCY.to_string(),
                    })
                    .await?;
                normalize::crypto_quote(&symbol, &raw, CRYPTO_VS_CURRENCY)?
            },
            ResolvedSymbol::Equity { ticker } => {
                let source = self
                    .equities
                    .clone()
                    .ok_or_else(|| missing_source(ToolKind::Financial))?;

                let raw = source
                    .fetch(&QuoteRequest::Equity {
                        ticker: ticker.clone(),
                    })
                    .await?;
                let price = normalize::equity_price(&ticker, &raw)?;

                let profile = source
                    .fetch(&QuoteRequest::Profile {
                        ticker: ticker.clone(),
                    })
                    .await;
                let profile = match profile {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        tracing::warn!("Failed to fetch company profile for {}: {}", ticker, e);
                        None
                    },
                };
                normalize::equity_quote(&ticker, price, &raw, profile.as_ref())
            },
        };

        Ok(ToolResolution {
            display: classify(ToolKind::Financial, false, 1),
            result: CanonicalResult::FinancialQuote(quote),
        })
    }

    async fn resolve_currency(
        &self,
        from: &str,
        to: &str,
        amount: Option<f64>,
    ) -> Result<ToolResolution> {
        self.provider_config(ToolKind::Financial)?;
        let pair = resolve_currency_pair(from, to, amount)?;
        let source = self
            .equities
            .clone()
            .ok_or_else(|| missing_source(ToolKind::Financial))?;

        let quote = if pair.is_identity() {
            normalize::conversion_quote(source.id(), &pair, 1.0)
        } else {
            let raw = source
                .fetch(&QuoteRequest::ForexRates {
                    base: pair.from.clone(),
                })
                .await?;
            normalize::forex_conversion(&raw, &pair)?
        };

        Ok(ToolResolution {
            display: classify(ToolKind::Financial, false, 1),
            result: CanonicalResult::FinancialQuote(quote),
        })
    }
}

fn missing_source(kind: ToolKind) -> ResolveError {
    ResolveError::ConfigurationMissing(format!("no provider client registered for {kind}"))
}

/// Normalize a cacheable lookup; an empty outcome is a miss and is not cached
fn normalize_lookup(
    provider: ProviderId,
    request: &SearchQuery,
    raw: &Value,
) -> Result<CanonicalResult> {
    if request.kind == ToolKind::Encyclopedia {
        return normalize::article(provider, &request.text, raw)
            .map(CanonicalResult::SingleArticle)
            .ok_or_else(|| {
                ResolveError::NoMatch(format!("no article found for '{}'", request.text))
            });
    }

    let list =
        normalize::search_results(provider, request.kind, &request.text, raw, request.count)?;
    if list.items.is_empty() {
        return Err(ResolveError::NoMatch(format!(
            "no {} results for '{}'",
            request.kind, request.text
        )));
    }
    Ok(CanonicalResult::SearchResultList(list))
}

async fn entity_supports(source: &dyn WeatherSource, entity_id: &str, feature: u64) -> bool {
    let request = WeatherRequest::State {
        entity_id: entity_id.to_string(),
    };
    match source.fetch(&request).await {
        Ok(state) => supports(&state, feature),
        Err(e) => {
            tracing::warn!("Failed to read capabilities of {}: {}", entity_id, e);
            false
        },
    }
}

async fn read_sensor(source: &dyn WeatherSource, entity_id: Option<&str>) -> Option<SensorReading> {
    let entity_id = entity_id.map(str::trim).filter(|id| !id.is_empty())?;
    let request = WeatherRequest::State {
        entity_id: entity_id.to_string(),
    };
    match source.fetch(&request).await {
        Ok(state) => normalize::sensor_reading(&state),
        Err(e) => {
            tracing::warn!("Failed to read sensor {}: {}", entity_id, e);
            None
        },
    }
}

/// Builder for [`ToolDispatcher`]
///
/// Anything not injected explicitly is created on [`build`](Self::build):
/// an empty cache and a clock reading the local date. Provider clients are
/// only created by [`with_default_providers`](Self::with_default_providers).
pub struct ToolDispatcherBuilder {
    config: EngineConfig,
    cache: Option<Arc<ResultCache>>,
    search: HashMap<ToolKind, Arc<dyn SearchProvider>>,
    weather: Option<Arc<dyn WeatherSource>>,
    equities: Option<Arc<dyn QuoteSource>>,
    crypto: Option<Arc<dyn QuoteSource>>,
    today: Option<Clock>,
}

impl ToolDispatcherBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cache: None,
            search: HashMap::new(),
            weather: None,
            equities: None,
            crypto: None,
            today: None,
        }
    }

    /// Share an existing cache
    pub fn cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn search_provider(mut self, kind: ToolKind, provider: Arc<dyn SearchProvider>) -> Self {
        self.search.insert(kind, provider);
        self
    }

    pub fn weather_source(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.weather = Some(source);
        self
    }

    /// Source for equity quotes, company profiles and forex rates
    pub fn equity_source(mut self, source: Arc<dyn QuoteSource>) -> Self {
        self.equities = Some(source);
        self
    }

    pub fn crypto_source(mut self, source: Arc<dyn QuoteSource>) -> Self {
        self.crypto = Some(source);
        self
    }

    /// Override the clock used to resolve relative days
    pub fn today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Some(Arc::new(today));
        self
    }

    /// Create HTTP clients for every configured provider not injected yet
    pub fn with_default_providers(mut self) -> Result<Self> {
        let timeout = self.config.request_timeout();
        let rate_limit = self.config.rate_limit_per_minute;

        for provider in &self.config.providers {
            let kind = provider.kind();
            let search: Option<Arc<dyn SearchProvider>> = match provider {
                ProviderConfig::BraveWeb { api_key, .. } => {
                    Some(Arc::new(BraveClient::new(api_key.clone(), timeout, rate_limit)?))
                },
                ProviderConfig::BraveImage {
                    api_key, safesearch, ..
                } => Some(Arc::new(
                    BraveClient::new(api_key.clone(), timeout, rate_limit)?
                        .with_safesearch(*safesearch),
                )),
                ProviderConfig::SearxngWeb { url, engines, .. }
                | ProviderConfig::SearxngImage { url, engines, .. } => Some(Arc::new(
                    SearxngClient::new(url, timeout)?.with_engines(engines.clone()),
                )),
                ProviderConfig::GoogleImage { api_key, cx, .. } => Some(Arc::new(
                    GoogleImageClient::new(api_key.clone(), cx.clone(), timeout)?,
                )),
                ProviderConfig::Youtube { api_key, .. } => {
                    Some(Arc::new(YoutubeClient::new(api_key.clone(), timeout)?))
                },
                ProviderConfig::Wikipedia { detail, language } => {
                    Some(Arc::new(WikipediaClient::new(language, *detail, timeout)?))
                },
                ProviderConfig::HomeAssistantWeather { url, token, .. } => {
                    if self.weather.is_none() {
                        self.weather =
                            Some(Arc::new(HomeAssistantClient::new(url, token.clone(), timeout)?));
                    }
                    None
                },
                ProviderConfig::Finnhub { api_key } => {
                    if self.equities.is_none() {
                        let client = FinnhubClient::new(api_key.clone(), timeout, rate_limit)?;
                        self.equities = Some(Arc::new(client));
                    }
                    if self.crypto.is_none() {
                        self.crypto = Some(Arc::new(CoinGeckoClient::new(timeout, rate_limit)?));
                    }
                    None
                },
            };

            if let Some(search) = search {
                self.search.entry(kind).or_insert(search);
            }
        }

        Ok(self)
    }

    pub fn build(self) -> ToolDispatcher {
        ToolDispatcher {
            config: Arc::new(self.config),
            cache: self.cache.unwrap_or_default(),
            search: self.search,
            weather: self.weather,
            equities: self.equities,
            crypto: self.crypto,
            today: self
                .today
                .unwrap_or_else(|| Arc::new(|| Local::now().date_naive())),
        }
    }
}
