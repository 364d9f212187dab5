//! Configuration for tool resolution
//!
//! Provider credentials and entity selection are owned by whoever builds the
//! [`EngineConfig`]; the engine only reads them.

use crate::api::ProviderId;
use crate::engine::ToolKind;
use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use voice_utils::{env_list, env_parse, env_var};

const DEFAULT_NUM_RESULTS: usize = 3;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;
const DEFAULT_WEATHER_ICON_PATH: &str = "/voice_tools/weather_icons";

fn default_num_results() -> usize {
    DEFAULT_NUM_RESULTS
}

fn default_language() -> String {
    "en".to_string()
}

/// Brave image search safety level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeSearch {
    Off,
    #[default]
    Moderate,
    Strict,
}

impl SafeSearch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Moderate => "moderate",
            Self::Strict => "strict",
        }
    }
}

impl std::str::FromStr for SafeSearch {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "moderate" => Ok(Self::Moderate),
            "strict" => Ok(Self::Strict),
            other => Err(ResolveError::ConfigurationMissing(format!(
                "unknown safesearch level '{other}'"
            ))),
        }
    }
}

/// How much of an encyclopedia article to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleDetail {
    /// The short page summary
    #[default]
    Concise,
    /// The full introduction section
    Detailed,
}

impl ArticleDetail {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Detailed => "detailed",
        }
    }
}

/// Configuration for one tool entry
///
/// Exactly one entry per tool kind may be present in an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderConfig {
    BraveWeb {
        api_key: String,
        #[serde(default = "default_num_results")]
        num_results: usize,
    },
    SearxngWeb {
        url: String,
        #[serde(default)]
        engines: Vec<String>,
        #[serde(default = "default_num_results")]
        num_results: usize,
    },
    BraveImage {
        api_key: String,
        #[serde(default = "default_num_results")]
        num_results: usize,
        #[serde(default)]
        safesearch: SafeSearch,
    },
    SearxngImage {
        url: String,
        #[serde(default)]
        engines: Vec<String>,
        #[serde(default = "default_num_results")]
        num_results: usize,
    },
    GoogleImage {
        api_key: String,
        cx: String,
        #[serde(default = "default_num_results")]
        num_results: usize,
    },
    Youtube {
        api_key: String,
        #[serde(default = "default_num_results")]
        num_results: usize,
    },
    Wikipedia {
        #[serde(default)]
        detail: ArticleDetail,
        #[serde(default = "default_language")]
        language: String,
    },
    HomeAssistantWeather {
        url: String,
        token: String,
        daily_entity: String,
        #[serde(default)]
        hourly_entity: Option<String>,
        #[serde(default)]
        temperature_sensor: Option<String>,
        #[serde(default)]
        humidity_sensor: Option<String>,
    },
    Finnhub {
        api_key: String,
    },
}

impl ProviderConfig {
    /// The tool kind this entry configures
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::BraveWeb { .. } | Self::SearxngWeb { .. } => ToolKind::WebSearch,
            Self::BraveImage { .. } | Self::SearxngImage { .. } | Self::GoogleImage { .. } => {
                ToolKind::ImageSearch
            },
            Self::Youtube { .. } => ToolKind::VideoSearch,
            Self::Wikipedia { .. } => ToolKind::Encyclopedia,
            Self::HomeAssistantWeather { .. } => ToolKind::Weather,
            Self::Finnhub { .. } => ToolKind::Financial,
        }
    }

    /// The upstream provider serving this entry
    pub fn provider_id(&self) -> ProviderId {
        match self {
            Self::BraveWeb { .. } | Self::BraveImage { .. } => ProviderId::Brave,
            Self::SearxngWeb { .. } | Self::SearxngImage { .. } => ProviderId::Searxng,
            Self::GoogleImage { .. } => ProviderId::Google,
            Self::Youtube { .. } => ProviderId::Youtube,
            Self::Wikipedia { .. } => ProviderId::Wikipedia,
            Self::HomeAssistantWeather { .. } => ProviderId::HomeAssistant,
            Self::Finnhub { .. } => ProviderId::Finnhub,
        }
    }

    /// Configured default (and cap) for the number of results
    pub fn num_results(&self) -> usize {
        match self {
            Self::BraveWeb { num_results, .. }
            | Self::SearxngWeb { num_results, .. }
            | Self::BraveImage { num_results, .. }
            | Self::SearxngImage { num_results, .. }
            | Self::GoogleImage { num_results, .. }
            | Self::Youtube { num_results, .. } => *num_results,
            Self::Wikipedia { .. } | Self::HomeAssistantWeather { .. } | Self::Finnhub { .. } => 1,
        }
    }

    /// Fail fast when a required credential, URL or entity is blank
    pub fn ensure_ready(&self) -> Result<()> {
        let required: Vec<(&str, &str)> = match self {
            Self::BraveWeb { api_key, .. } | Self::BraveImage { api_key, .. } => {
                vec![("Brave API key", api_key.as_str())]
            },
            Self::SearxngWeb { url, .. } | Self::SearxngImage { url, .. } => {
                vec![("SearXNG server URL", url.as_str())]
            },
            Self::GoogleImage { api_key, cx, .. } => vec![
                ("Google Custom Search API key", api_key.as_str()),
                ("Google Custom Search Engine ID (cx)", cx.as_str()),
            ],
            Self::Youtube { api_key, .. } => vec![("YouTube API key", api_key.as_str())],
            Self::Wikipedia { language, .. } => vec![("Wikipedia language", language.as_str())],
            Self::HomeAssistantWeather {
                url,
                token,
                daily_entity,
                ..
            } => vec![
                ("Home Assistant URL", url.as_str()),
                ("Home Assistant token", token.as_str()),
                ("daily weather entity", daily_entity.as_str()),
            ],
            Self::Finnhub { api_key } => vec![("Finnhub API key", api_key.as_str())],
        };

        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((what, _)) => Err(ResolveError::ConfigurationMissing(format!(
                "{what} not configured"
            ))),
            None => Ok(()),
        }
    }
}

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// One entry per enabled tool
    pub providers: Vec<ProviderConfig>,

    /// Cache TTL applied to every cacheable tool kind
    pub cache_ttl_secs: u64,

    /// Per tool kind TTL overrides
    pub cache_ttl_overrides: BTreeMap<ToolKind, u64>,

    /// How often expired cache entries are swept
    pub cache_sweep_interval_secs: u64,

    /// Request timeout for every upstream call
    pub request_timeout_secs: u64,

    /// Requests per minute allowed against rate limited providers
    pub rate_limit_per_minute: u32,

    /// URL path the weather condition icons are served from
    pub weather_icon_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,            // 1 hour
            cache_ttl_overrides: BTreeMap::new(),
            cache_sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS, // 10 minutes
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            weather_icon_path: DEFAULT_WEATHER_ICON_PATH.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ResolveError::ConfigurationMissing(format!("invalid configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ResolveError::ConfigurationMissing(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Build a configuration from environment variables
    ///
    /// Tools whose credentials are absent are simply not enabled.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(ttl) = env_parse::<u64>("VOICE_TOOLS_CACHE_TTL") {
            builder = builder.cache_ttl(Duration::from_secs(ttl));
        }
        if let Some(timeout) = env_parse::<u64>("VOICE_TOOLS_REQUEST_TIMEOUT") {
            builder = builder.request_timeout(Duration::from_secs(timeout));
        }
        if let Some(limit) = env_parse::<u32>("VOICE_TOOLS_RATE_LIMIT") {
            builder = builder.rate_limit_per_minute(limit);
        }
        if let Some(path) = env_var("WEATHER_ICON_PATH") {
            builder = builder.weather_icon_path(path);
        }

        let brave_key = env_var("BRAVE_API_KEY");
        let searxng_url = env_var("SEARXNG_URL");

        let web_results = env_parse("WEB_SEARCH_NUM_RESULTS").unwrap_or(DEFAULT_NUM_RESULTS);
        match (env_var("WEB_SEARCH_PROVIDER").as_deref(), &brave_key, &searxng_url) {
            (Some("searxng"), _, Some(url)) | (None, None, Some(url)) => {
                builder = builder.provider(ProviderConfig::SearxngWeb {
                    url: url.clone(),
                    engines: env_list("SEARXNG_WEB_ENGINES"),
                    num_results: web_results,
                });
            },
            (Some("brave") | None, Some(key), _) => {
                builder = builder.provider(ProviderConfig::BraveWeb {
                    api_key: key.clone(),
                    num_results: web_results,
                });
            },
            _ => {},
        }

        let image_results = env_parse("IMAGE_SEARCH_NUM_RESULTS").unwrap_or(DEFAULT_NUM_RESULTS);
        let google = env_var("GOOGLE_CSE_API_KEY").zip(env_var("GOOGLE_CSE_CX"));
        match (env_var("IMAGE_SEARCH_PROVIDER").as_deref(), &brave_key, &searxng_url) {
            (Some("google"), _, _) => {
                if let Some((api_key, cx)) = google {
                    builder = builder.provider(ProviderConfig::GoogleImage {
                        api_key,
                        cx,
                        num_results: image_results,
                    });
                }
            },
            (Some("searxng"), _, Some(url)) | (None, None, Some(url)) => {
                builder = builder.provider(ProviderConfig::SearxngImage {
                    url: url.clone(),
                    engines: env_list("SEARXNG_IMAGE_ENGINES"),
                    num_results: image_results,
                });
            },
            (Some("brave") | None, Some(key), _) => {
                builder = builder.provider(ProviderConfig::BraveImage {
                    api_key: key.clone(),
                    num_results: image_results,
                    safesearch: env_parse("BRAVE_SAFESEARCH").unwrap_or_default(),
                });
            },
            _ => {},
        }

        if let Some(api_key) = env_var("YOUTUBE_API_KEY") {
            builder = builder.provider(ProviderConfig::Youtube {
                api_key,
                num_results: env_parse("VIDEO_SEARCH_NUM_RESULTS").unwrap_or(DEFAULT_NUM_RESULTS),
            });
        }

        if env_parse::<bool>("WIKIPEDIA_ENABLED").unwrap_or(true) {
            let detail = match env_var("WIKIPEDIA_DETAIL").as_deref() {
                Some("detailed") => ArticleDetail::Detailed,
                _ => ArticleDetail::Concise,
            };
            builder = builder.provider(ProviderConfig::Wikipedia {
                detail,
                language: env_var("WIKIPEDIA_LANGUAGE").unwrap_or_else(default_language),
            });
        }

        if let (Some(url), Some(token), Some(daily_entity)) = (
            env_var("HASS_URL"),
            env_var("HASS_TOKEN"),
            env_var("WEATHER_DAILY_ENTITY"),
        ) {
            builder = builder.provider(ProviderConfig::HomeAssistantWeather {
                url,
                token,
                daily_entity,
                hourly_entity: env_var("WEATHER_HOURLY_ENTITY"),
                temperature_sensor: env_var("WEATHER_TEMPERATURE_SENSOR"),
                humidity_sensor: env_var("WEATHER_HUMIDITY_SENSOR"),
            });
        }

        if let Some(api_key) = env_var("FINNHUB_API_KEY") {
            builder = builder.provider(ProviderConfig::Finnhub { api_key });
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeMap::new();
        for provider in &self.providers {
            if let Some(previous) = seen.insert(provider.kind(), provider.provider_id()) {
                return Err(ResolveError::ConfigurationMissing(format!(
                    "{} configured twice ({previous} and {})",
                    provider.kind(),
                    provider.provider_id()
                )));
            }
        }

        if self.cache_ttl_secs == 0 || self.cache_ttl_overrides.values().any(|ttl| *ttl == 0) {
            return Err(ResolveError::ConfigurationMissing(
                "cache TTL must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ResolveError::ConfigurationMissing(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_per_minute == 0 {
            return Err(ResolveError::ConfigurationMissing(
                "rate limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured entry for a tool kind, if any
    pub fn provider_for(&self, kind: ToolKind) -> Option<&ProviderConfig> {
        self.providers.iter().find(|provider| provider.kind() == kind)
    }

    /// Cache TTL for a tool kind
    pub fn cache_ttl(&self, kind: ToolKind) -> Duration {
        let secs = self
            .cache_ttl_overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.cache_ttl_secs);
        Duration::from_secs(secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    providers: Vec<ProviderConfig>,
    cache_ttl: Option<Duration>,
    cache_ttl_overrides: BTreeMap<ToolKind, u64>,
    cache_sweep_interval: Option<Duration>,
    request_timeout: Option<Duration>,
    rate_limit_per_minute: Option<u32>,
    weather_icon_path: Option<String>,
}

impl EngineConfigBuilder {
    /// Enable a tool with the given provider configuration
    pub fn provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.push(provider);
        self
    }

    /// Set the cache TTL for every cacheable tool
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Override the cache TTL for a single tool kind
    pub fn cache_ttl_for(mut self, kind: ToolKind, ttl: Duration) -> Self {
        self.cache_ttl_overrides.insert(kind, ttl.as_secs());
        self
    }

    /// Set the cache sweep interval
    pub fn cache_sweep_interval(mut self, interval: Duration) -> Self {
        self.cache_sweep_interval = Some(interval);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the per-minute request budget for rate limited providers
    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    /// Set the URL path the weather condition icons are served from
    pub fn weather_icon_path(mut self, path: impl Into<String>) -> Self {
        self.weather_icon_path = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            providers: self.providers,
            cache_ttl_secs: self
                .cache_ttl
                .map_or(defaults.cache_ttl_secs, |ttl| ttl.as_secs()),
            cache_ttl_overrides: self.cache_ttl_overrides,
            cache_sweep_interval_secs: self
                .cache_sweep_interval
                .map_or(defaults.cache_sweep_interval_secs, |every| every.as_secs()),
            request_timeout_secs: self
                .request_timeout
                .map_or(defaults.request_timeout_secs, |timeout| timeout.as_secs()),
            rate_limit_per_minute: self
                .rate_limit_per_minute
                .unwrap_or(defaults.rate_limit_per_minute),
            weather_icon_path: self.weather_icon_path.unwrap_or(defaults.weather_icon_path),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.providers.is_empty());
        assert_eq!(config.cache_ttl(ToolKind::WebSearch), Duration::from_secs(3600));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.weather_icon_path, "/voice_tools/weather_icons");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .provider(ProviderConfig::Youtube {
                api_key: "yt".to_string(),
                num_results: 5,
            })
            .cache_ttl(Duration::from_secs(600))
            .cache_ttl_for(ToolKind::Encyclopedia, Duration::from_secs(86_400))
            .request_timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(config.cache_ttl(ToolKind::VideoSearch), Duration::from_secs(600));
        assert_eq!(config.cache_ttl(ToolKind::Encyclopedia), Duration::from_secs(86_400));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.provider_for(ToolKind::VideoSearch).map(ProviderConfig::num_results),
            Some(5)
        );
        assert!(config.provider_for(ToolKind::WebSearch).is_none());
    }

    #[test]
    fn test_duplicate_tool_kind_rejected() {
        let result = EngineConfig::builder()
            .provider(ProviderConfig::BraveWeb {
                api_key: "k".to_string(),
                num_results: 3,
            })
            .provider(ProviderConfig::SearxngWeb {
                url: "http://localhost:8080".to_string(),
                engines: vec![],
                num_results: 3,
            })
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(EngineConfig::builder().cache_ttl(Duration::ZERO).build().is_err());
        assert!(EngineConfig::builder().rate_limit_per_minute(0).build().is_err());
        assert!(EngineConfig::builder().request_timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_ensure_ready_reports_missing_credential() {
        let provider = ProviderConfig::GoogleImage {
            api_key: "key".to_string(),
            cx: "  ".to_string(),
            num_results: 3,
        };
        let err = provider.ensure_ready().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
        assert!(err.to_string().contains("cx"));

        let provider = ProviderConfig::Finnhub {
            api_key: "key".to_string(),
        };
        assert!(provider.ensure_ready().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = EngineConfig::from_json_str(
            r#"{
                "cache_ttl_secs": 120,
                "weather_icon_path": "/local/weather",
                "providers": [
                    { "provider": "brave_image", "api_key": "abc", "safesearch": "strict" },
                    { "provider": "wikipedia", "detail": "detailed" },
                    {
                        "provider": "home_assistant_weather",
                        "url": "http://homeassistant.local:8123",
                        "token": "t",
                        "daily_entity": "weather.home"
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.cache_ttl(ToolKind::ImageSearch), Duration::from_secs(120));
        assert_eq!(config.weather_icon_path, "/local/weather");
        assert_eq!(
            config.provider_for(ToolKind::ImageSearch),
            Some(&ProviderConfig::BraveImage {
                api_key: "abc".to_string(),
                num_results: 3,
                safesearch: SafeSearch::Strict,
            })
        );
        assert_eq!(
            config.provider_for(ToolKind::Encyclopedia),
            Some(&ProviderConfig::Wikipedia {
                detail: ArticleDetail::Detailed,
                language: "en".to_string(),
            })
        );
        assert_eq!(
            config.provider_for(ToolKind::Weather).map(ProviderConfig::provider_id),
            Some(ProviderId::HomeAssistant)
        );
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }

    #[test]
    fn test_safesearch_parse() {
        assert_eq!("STRICT".parse::<SafeSearch>().unwrap(), SafeSearch::Strict);
        assert!("extreme".parse::<SafeSearch>().is_err());
    }
}
