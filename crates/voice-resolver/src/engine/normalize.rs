//! Provider payload normalization
//!
//! Every function here is pure: the same payload always yields the same
//! canonical value. Optional fields that are missing or empty are omitted,
//! never defaulted.

use super::result::{
    Article, Conversion, FinancialQuote, ForecastPeriod, InstrumentKind, MediaDetails,
    SearchItem, SearchResultList, SensorReading, Temperature, ToolKind,
};
use super::symbol::CurrencyPair;
use crate::api::ProviderId;
use crate::error::{ResolveError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .unwrap_or_else(|e| panic!("invalid duration pattern: {e}"))
});

static RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s*[x×]\s*(\d+)\s*$")
        .unwrap_or_else(|e| panic!("invalid resolution pattern: {e}"))
});

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Non-empty trimmed string
fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn http_url(value: &Value) -> Option<String> {
    text(value).filter(|url| is_http(url))
}

/// Unsigned integer that may arrive as a number or a numeric string
fn unsigned(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn dimension(value: &Value) -> Option<u32> {
    unsigned(value).and_then(|n| u32::try_from(n).ok())
}

fn items<'a>(value: &'a Value) -> impl Iterator<Item = &'a Value> {
    value.as_array().into_iter().flatten()
}

/// URL host with a leading `www.` removed
pub fn site_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Parse an ISO-8601 duration (`PT1H2M3S`, `P1DT2H`) into whole seconds
pub fn parse_iso8601_duration(raw: &str) -> Option<u64> {
    let captures = ISO_DURATION.captures(raw.trim())?;
    let mut seen = false;
    let mut total: u64 = 0;
    for (group, unit) in [(1, 604_800), (2, 86_400), (3, 3_600), (4, 60), (5, 1)] {
        if let Some(m) = captures.get(group) {
            seen = true;
            let amount: u64 = m.as_str().parse().ok()?;
            total = total.checked_add(amount.checked_mul(unit)?)?;
        }
    }
    seen.then_some(total)
}

/// Decode the handful of HTML entities YouTube leaves in titles
fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// Normalize a raw search payload into at most `max` items in provider order
pub fn search_results(
    provider: ProviderId,
    kind: ToolKind,
    query: &str,
    raw: &Value,
    max: usize,
) -> Result<SearchResultList> {
    let items: Vec<SearchItem> = match (provider, kind) {
        (ProviderId::Brave, ToolKind::WebSearch) => {
            items(&raw["web"]["results"]).filter_map(brave_web_item).take(max).collect()
        },
        (ProviderId::Brave, ToolKind::ImageSearch) => {
            items(&raw["results"]).filter_map(brave_image_item).take(max).collect()
        },
        (ProviderId::Searxng, ToolKind::WebSearch) => {
            items(&raw["results"]).filter_map(searxng_web_item).take(max).collect()
        },
        (ProviderId::Searxng, ToolKind::ImageSearch) => {
            items(&raw["results"]).filter_map(searxng_image_item).take(max).collect()
        },
        (ProviderId::Google, ToolKind::ImageSearch) => {
            items(&raw["items"]).filter_map(google_image_item).take(max).collect()
        },
        (ProviderId::Youtube, ToolKind::VideoSearch) => youtube_items(raw, max),
        _ => {
            return Err(ResolveError::ConfigurationMissing(format!(
                "{provider} cannot serve {kind}"
            )));
        },
    };

    Ok(SearchResultList {
        tool: kind,
        provider,
        query: query.trim().to_string(),
        items,
    })
}

fn brave_web_item(item: &Value) -> Option<SearchItem> {
    let source_url = http_url(&item["url"])?;

    let mut parts: Vec<String> = text(&item["description"]).into_iter().collect();
    parts.extend(items(&item["extra_snippets"]).filter_map(text));
    let snippet = (!parts.is_empty()).then(|| parts.join(" "));

    Some(SearchItem {
        title: text(&item["title"]).unwrap_or_else(|| source_url.clone()),
        snippet,
        thumbnail_url: http_url(&item["thumbnail"]["src"]),
        site_name: site_name(&source_url),
        source_url,
        media: None,
    })
}

fn brave_image_item(item: &Value) -> Option<SearchItem> {
    let properties = &item["properties"];
    let image_url = http_url(&properties["url"])?;
    let source_url = http_url(&item["url"]).unwrap_or_else(|| image_url.clone());

    Some(SearchItem {
        title: text(&item["title"]).unwrap_or_default(),
        snippet: None,
        thumbnail_url: http_url(&item["thumbnail"]["src"]),
        site_name: site_name(&source_url),
        media: Some(MediaDetails::Image {
            image_url,
            width: dimension(&properties["width"]),
            height: dimension(&properties["height"]),
            source: text(&item["source"]),
        }),
        source_url,
    })
}

fn searxng_web_item(item: &Value) -> Option<SearchItem> {
    let source_url = http_url(&item["url"])?;
    let thumbnail = ["img_src", "thumbnail", "thumbnail_src"]
        .iter()
        .find_map(|field| text(&item[*field]))
        .filter(|url| is_http(url));

    Some(SearchItem {
        title: text(&item["title"]).unwrap_or_else(|| source_url.clone()),
        snippet: text(&item["content"]),
        thumbnail_url: thumbnail,
        site_name: site_name(&source_url),
        source_url,
        media: None,
    })
}

fn searxng_image_item(item: &Value) -> Option<SearchItem> {
    let image_url = http_url(&item["img_src"])?;
    let source_url = http_url(&item["url"]).unwrap_or_else(|| image_url.clone());
    let (width, height) = item["resolution"]
        .as_str()
        .and_then(|res| RESOLUTION.captures(res))
        .map_or((None, None), |c| {
            (c[1].parse().ok(), c[2].parse().ok())
        });

    Some(SearchItem {
        title: text(&item["title"]).unwrap_or_default(),
        snippet: text(&item["content"]),
        thumbnail_url: http_url(&item["thumbnail_src"]),
        site_name: site_name(&source_url),
        media: Some(MediaDetails::Image {
            image_url,
            width,
            height,
            source: text(&item["engine"]),
        }),
        source_url,
    })
}

fn google_image_item(item: &Value) -> Option<SearchItem> {
    let image = &item["image"];
    let image_url = http_url(&item["link"])?;
    let source_url = http_url(&image["contextLink"]).unwrap_or_else(|| image_url.clone());

    Some(SearchItem {
        title: text(&item["title"]).unwrap_or_default(),
        snippet: text(&item["snippet"]),
        thumbnail_url: http_url(&image["thumbnailLink"]),
        site_name: site_name(&source_url),
        media: Some(MediaDetails::Image {
            image_url,
            width: dimension(&image["width"]),
            height: dimension(&image["height"]),
            source: text(&item["displayLink"]),
        }),
        source_url,
    })
}

fn youtube_items(raw: &Value, max: usize) -> Vec<SearchItem> {
    let details: HashMap<&str, &Value> = items(&raw["videos"]["items"])
        .filter_map(|video| video["id"].as_str().map(|id| (id, video)))
        .collect();

    items(&raw["search"]["items"])
        .filter_map(|item| {
            let video_id = text(&item["id"]["videoId"])?;
            let snippet = &item["snippet"];
            let detail = details.get(video_id.as_str()).copied().unwrap_or(&Value::Null);
            let source_url = format!("https://www.youtube.com/watch?v={video_id}");
            let thumbnail = ["high", "medium", "default"]
                .iter()
                .find_map(|size| http_url(&snippet["thumbnails"][*size]["url"]));

            Some(SearchItem {
                title: text(&snippet["title"])
                    .map(|t| decode_entities(&t))
                    .unwrap_or_default(),
                snippet: text(&snippet["description"]).map(|d| decode_entities(&d)),
                thumbnail_url: thumbnail,
                site_name: site_name(&source_url),
                source_url,
                media: Some(MediaDetails::Video {
                    channel: text(&snippet["channelTitle"]),
                    published_at: text(&snippet["publishedAt"]),
                    duration_seconds: detail["contentDetails"]["duration"]
                        .as_str()
                        .and_then(parse_iso8601_duration),
                    view_count: unsigned(&detail["statistics"]["viewCount"]),
                    video_id,
                }),
            })
        })
        .take(max)
        .collect()
}

// ---------------------------------------------------------------------------
// Encyclopedia
// ---------------------------------------------------------------------------

/// The article carried by a Wikipedia payload, if any
///
/// The full introduction is preferred when present; the summary extract is
/// the fallback.
pub fn article(provider: ProviderId, query: &str, raw: &Value) -> Option<Article> {
    let summary = &raw["summary"];
    if summary.is_null() {
        return None;
    }

    let title = text(&summary["title"])?;
    let text_body = text(&raw["intro"]).or_else(|| text(&summary["extract"]))?;
    let source_url = http_url(&summary["content_urls"]["desktop"]["page"])
        .or_else(|| http_url(&summary["content_urls"]["mobile"]["page"]))?;

    Some(Article {
        provider,
        query: query.trim().to_string(),
        title,
        summary: text_body,
        thumbnail_url: http_url(&summary["thumbnail"]["source"]),
        source_url,
    })
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Calendar date of a forecast entry, in the entry's own offset
pub fn period_date(starts_at: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(starts_at)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(starts_at, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(starts_at, "%Y-%m-%d").ok())
}

/// Forecast entries for `entity_id` from a `weather.get_forecasts` response
///
/// Accepts both the REST shape (`service_response.<entity>.forecast`) and
/// the bare service shape (`<entity>.forecast`).
pub fn forecast_periods(raw: &Value, entity_id: &str) -> Result<Vec<ForecastPeriod>> {
    let forecast = [&raw["service_response"][entity_id]["forecast"], &raw[entity_id]["forecast"]]
        .into_iter()
        .find(|candidate| candidate.is_array())
        .ok_or_else(|| {
            ResolveError::ProviderUnavailable(format!(
                "home_assistant returned no forecast for {entity_id}"
            ))
        })?;

    Ok(items(forecast).filter_map(forecast_period).collect())
}

fn forecast_period(entry: &Value) -> Option<ForecastPeriod> {
    let starts_at = text(&entry["datetime"])?;
    let high = float(&entry["temperature"]);
    let low = float(&entry["templow"]);
    let temperature = match (low, high) {
        (Some(low), Some(high)) => Some(Temperature::Range { low, high }),
        (None, Some(value)) => Some(Temperature::Point { value }),
        _ => None,
    };

    Some(ForecastPeriod {
        starts_at,
        condition: text(&entry["condition"]).unwrap_or_else(|| "unknown".to_string()),
        temperature,
        precipitation_probability: float(&entry["precipitation_probability"])
            .map(|p| p.clamp(0.0, 100.0).round() as u8),
        humidity: float(&entry["humidity"]),
        wind_speed: float(&entry["wind_speed"]),
        is_daytime: entry["is_daytime"].as_bool(),
    })
}

/// Home Assistant condition to (day, night) icon name
const CONDITION_ICONS: [(&str, &str, &str); 15] = [
    ("clear-night", "clear_night", "clear_night"),
    ("cloudy", "cloudy", "cloudy"),
    ("fog", "haze_fog_dust_smoke", "haze_fog_dust_smoke"),
    ("hail", "mixed_rain_hail_sleet", "mixed_rain_hail_sleet"),
    ("lightning", "isolated_thunderstorms", "isolated_thunderstorms"),
    ("lightning-rainy", "strong_thunderstorms", "strong_thunderstorms"),
    ("partlycloudy", "partly_cloudy_day", "partly_cloudy_night"),
    ("pouring", "heavy_rain", "heavy_rain"),
    ("rainy", "showers_rain", "showers_rain"),
    ("snowy", "heavy_snow", "heavy_snow"),
    ("snowy-rainy", "mixed_rain_snow", "mixed_rain_snow"),
    ("sunny", "clear_day", "clear_day"),
    ("windy", "windy", "windy"),
    ("windy-variant", "windy", "windy"),
    ("exceptional", "tropical_storm_hurricane", "tropical_storm_hurricane"),
];

/// Icon URL for the leading forecast period
///
/// Periods without a day/night flag count as daytime. Unknown conditions
/// have no icon.
pub fn condition_icon(period: &ForecastPeriod, base_path: &str) -> Option<String> {
    let (_, day, night) = CONDITION_ICONS
        .iter()
        .find(|(condition, _, _)| *condition == period.condition)?;
    let name = if period.is_daytime.unwrap_or(true) { day } else { night };
    Some(format!("{}/{name}.svg", base_path.trim_end_matches('/')))
}

/// Reading of a sensor entity state; unavailable or non-numeric states are absent
pub fn sensor_reading(state: &Value) -> Option<SensorReading> {
    let value = text(&state["state"])
        .filter(|s| s != "unavailable" && s != "unknown")
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())?;

    Some(SensorReading {
        value,
        unit: text(&state["attributes"]["unit_of_measurement"]),
    })
}

// ---------------------------------------------------------------------------
// Financial
// ---------------------------------------------------------------------------

/// Current price of a Finnhub quote
///
/// Finnhub answers unknown tickers with a zero price instead of an error.
pub fn equity_price(symbol: &str, quote: &Value) -> Result<f64> {
    float(&quote["c"]).filter(|c| *c != 0.0).ok_or_else(|| {
        ResolveError::NoMatch(format!(
            "no quote data found for symbol '{symbol}', check that the ticker is valid"
        ))
    })
}

/// Equity quote from a priced Finnhub quote and an optional company profile
pub fn equity_quote(
    symbol: &str,
    price: f64,
    quote: &Value,
    profile: Option<&Value>,
) -> FinancialQuote {
    let profile = profile.unwrap_or(&Value::Null);

    FinancialQuote {
        instrument: InstrumentKind::Equity,
        provider: ProviderId::Finnhub,
        symbol: symbol.to_string(),
        name: text(&profile["name"]),
        exchange: text(&profile["exchange"]),
        price,
        currency: text(&profile["currency"]).unwrap_or_else(|| "USD".to_string()),
        change: float(&quote["d"]),
        percent_change: float(&quote["dp"]),
        high: float(&quote["h"]),
        low: float(&quote["l"]),
        open: float(&quote["o"]),
        previous_close: float(&quote["pc"]),
        market_cap: None,
        logo_url: http_url(&profile["logo"]),
        conversion: None,
    }
}

/// Crypto quote from a CoinGecko `/coins/markets` listing
pub fn crypto_quote(symbol: &str, raw: &Value, vs_currency: &str) -> Result<FinancialQuote> {
    let no_match = || ResolveError::NoMatch(format!("no market data found for '{symbol}'"));
    let coin = items(raw).next().ok_or_else(no_match)?;
    let price = float(&coin["current_price"]).ok_or_else(no_match)?;

    Ok(FinancialQuote {
        instrument: InstrumentKind::Crypto,
        provider: ProviderId::Coingecko,
        symbol: text(&coin["symbol"]).map_or_else(|| symbol.to_string(), |s| s.to_uppercase()),
        name: text(&coin["name"]),
        exchange: None,
        price,
        currency: vs_currency.to_uppercase(),
        change: float(&coin["price_change_24h"]),
        percent_change: float(&coin["price_change_percentage_24h"]),
        high: float(&coin["high_24h"]),
        low: float(&coin["low_24h"]),
        open: None,
        previous_close: None,
        market_cap: float(&coin["market_cap"]),
        logo_url: http_url(&coin["image"]),
        conversion: None,
    })
}

/// Conversion quote for a known rate
///
/// The reported rate is rounded to 6 places and the converted amount to 2;
/// the conversion itself uses the unrounded rate.
pub fn conversion_quote(provider: ProviderId, pair: &CurrencyPair, rate: f64) -> FinancialQuote {
    let rounded_rate = round_to(rate, 6);

    FinancialQuote {
        instrument: InstrumentKind::ForexPair,
        provider,
        symbol: format!("{}/{}", pair.from, pair.to),
        name: None,
        exchange: None,
        price: rounded_rate,
        currency: pair.to.clone(),
        change: None,
        percent_change: None,
        high: None,
        low: None,
        open: None,
        previous_close: None,
        market_cap: None,
        logo_url: None,
        conversion: Some(Conversion {
            from: pair.from.clone(),
            to: pair.to.clone(),
            amount: pair.amount,
            rate: rounded_rate,
            converted_amount: round_to(pair.amount * rate, 2),
        }),
    }
}

/// Conversion quote from a Finnhub `/forex/rates` payload keyed by `pair.from`
pub fn forex_conversion(raw: &Value, pair: &CurrencyPair) -> Result<FinancialQuote> {
    let rate = float(&raw["quote"][pair.to.as_str()])
        .filter(|rate| *rate > 0.0)
        .ok_or_else(|| {
            ResolveError::NoMatch(format!(
                "exchange rate for {} to {} not available",
                pair.from, pair.to
            ))
        })?;

    Ok(conversion_quote(ProviderId::Finnhub, pair, rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn brave_images(n: usize) -> Value {
        let results: Vec<Value> = (1..=n)
            .map(|i| {
                json!({
                    "title": format!("Golden retriever {i}"),
                    "url": format!("https://www.example.com/dogs/{i}"),
                    "source": "example.com",
                    "thumbnail": { "src": format!("https://imgs.search.brave.com/{i}.jpg") },
                    "properties": {
                        "url": format!("https://cdn.example.com/{i}.jpg"),
                        "width": 1200,
                        "height": 800
                    }
                })
            })
            .collect();
        json!({ "type": "images", "results": results })
    }

    #[test]
    fn test_brave_images_truncate_in_order() {
        let list = search_results(
            ProviderId::Brave,
            ToolKind::ImageSearch,
            "golden retrievers",
            &brave_images(5),
            3,
        )
        .unwrap();

        assert_eq!(list.items.len(), 3);
        let titles: Vec<_> = list.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Golden retriever 1", "Golden retriever 2", "Golden retriever 3"]);

        let first = &list.items[0];
        assert_eq!(first.site_name.as_deref(), Some("example.com"));
        assert_eq!(
            first.media,
            Some(MediaDetails::Image {
                image_url: "https://cdn.example.com/1.jpg".to_string(),
                width: Some(1200),
                height: Some(800),
                source: Some("example.com".to_string()),
            })
        );
    }

    #[test]
    fn test_brave_web_joins_extra_snippets() {
        let raw = json!({
            "web": { "results": [
                {
                    "title": "Rust",
                    "url": "https://www.rust-lang.org/",
                    "description": "A language empowering everyone.",
                    "extra_snippets": ["Fast.", "", "Reliable."]
                },
                { "title": "No url" }
            ]}
        });

        let list = search_results(ProviderId::Brave, ToolKind::WebSearch, "rust", &raw, 6).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(
            list.items[0].snippet.as_deref(),
            Some("A language empowering everyone. Fast. Reliable.")
        );
        assert_eq!(list.items[0].site_name.as_deref(), Some("rust-lang.org"));
        assert!(list.items[0].thumbnail_url.is_none());
    }

    #[test]
    fn test_searxng_web_filters_non_http() {
        let raw = json!({ "results": [
            { "url": "", "title": "empty" },
            { "url": "ftp://files.example.com", "title": "ftp" },
            {
                "url": "https://example.org/page",
                "title": "Page",
                "content": "Body",
                "img_src": "",
                "thumbnail": "//relative/thumb.png"
            },
            {
                "url": "https://example.org/other",
                "title": "Other",
                "thumbnail_src": "https://example.org/t.png"
            }
        ]});

        let list = search_results(ProviderId::Searxng, ToolKind::WebSearch, "q", &raw, 3).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].title, "Page");
        assert!(list.items[0].thumbnail_url.is_none());
        assert_eq!(
            list.items[1].thumbnail_url.as_deref(),
            Some("https://example.org/t.png")
        );
    }

    #[test]
    fn test_searxng_images_require_http_source() {
        let raw = json!({ "results": [
            { "img_src": "data:image/png;base64,AAAA", "title": "inline" },
            {
                "img_src": "https://images.example/cat.jpg",
                "url": "https://example/cat",
                "title": "Cat",
                "engine": "bing images",
                "resolution": "1920 x 1080"
            }
        ]});

        let list =
            search_results(ProviderId::Searxng, ToolKind::ImageSearch, "cat", &raw, 3).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(
            list.items[0].media,
            Some(MediaDetails::Image {
                image_url: "https://images.example/cat.jpg".to_string(),
                width: Some(1920),
                height: Some(1080),
                source: Some("bing images".to_string()),
            })
        );
    }

    #[test]
    fn test_google_images() {
        let raw = json!({ "items": [{
            "title": "Aurora",
            "link": "https://photos.example/aurora.jpg",
            "displayLink": "photos.example",
            "image": {
                "contextLink": "https://photos.example/gallery",
                "thumbnailLink": "https://encrypted-tbn0.gstatic.com/x",
                "width": 640,
                "height": 480
            }
        }]});

        let list =
            search_results(ProviderId::Google, ToolKind::ImageSearch, "aurora", &raw, 3).unwrap();
        let item = &list.items[0];
        assert_eq!(item.source_url, "https://photos.example/gallery");
        assert_eq!(item.thumbnail_url.as_deref(), Some("https://encrypted-tbn0.gstatic.com/x"));
    }

    #[test]
    fn test_youtube_merges_details() {
        let raw = json!({
            "search": { "items": [
                {
                    "id": { "videoId": "abc123" },
                    "snippet": {
                        "title": "Sourdough &amp; you",
                        "description": "Bake it",
                        "channelTitle": "Bread Channel",
                        "publishedAt": "2024-02-01T10:00:00Z",
                        "thumbnails": {
                            "default": { "url": "https://i.ytimg.com/vi/abc123/default.jpg" },
                            "medium": { "url": "https://i.ytimg.com/vi/abc123/mqdefault.jpg" }
                        }
                    }
                },
                { "id": { "videoId": "nodetails" }, "snippet": { "title": "Second" } }
            ]},
            "videos": { "items": [{
                "id": "abc123",
                "contentDetails": { "duration": "PT1H2M3S" },
                "statistics": { "viewCount": "98765" }
            }]}
        });

        let list =
            search_results(ProviderId::Youtube, ToolKind::VideoSearch, "bread", &raw, 10).unwrap();
        assert_eq!(list.items.len(), 2);

        let first = &list.items[0];
        assert_eq!(first.title, "Sourdough & you");
        assert_eq!(first.source_url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(
            first.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/abc123/mqdefault.jpg")
        );
        assert_eq!(
            first.media,
            Some(MediaDetails::Video {
                video_id: "abc123".to_string(),
                channel: Some("Bread Channel".to_string()),
                published_at: Some("2024-02-01T10:00:00Z".to_string()),
                duration_seconds: Some(3723),
                view_count: Some(98_765),
            })
        );

        match &list.items[1].media {
            Some(MediaDetails::Video {
                duration_seconds,
                view_count,
                ..
            }) => {
                assert!(duration_seconds.is_none());
                assert!(view_count.is_none());
            },
            other => panic!("Expected video details, got {other:?}"),
        }
    }

    #[test]
    fn test_youtube_without_details_payload() {
        let raw = json!({
            "search": { "items": [{ "id": { "videoId": "x" }, "snippet": { "title": "X" } }] },
            "videos": null
        });
        let list =
            search_results(ProviderId::Youtube, ToolKind::VideoSearch, "x", &raw, 3).unwrap();
        assert_eq!(list.items.len(), 1);
    }

    #[test]
    fn test_mismatched_provider_and_kind() {
        let err = search_results(ProviderId::Google, ToolKind::WebSearch, "q", &json!({}), 3)
            .unwrap_err();
        assert!(matches!(err, ResolveError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_iso8601_durations() {
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("P1DT2H"), Some(93_600));
        assert_eq!(parse_iso8601_duration("PT45S"), Some(45));
        assert_eq!(parse_iso8601_duration("P0D"), Some(0));
        assert_eq!(parse_iso8601_duration("P1W"), Some(604_800));
        assert_eq!(parse_iso8601_duration("P"), None);
        assert_eq!(parse_iso8601_duration("1:02:03"), None);
    }

    #[test]
    fn test_article_prefers_intro() {
        let raw = json!({
            "summary": {
                "type": "standard",
                "title": "Marie Curie",
                "extract": "Polish-French physicist.",
                "thumbnail": { "source": "https://upload.wikimedia.org/curie.jpg" },
                "content_urls": {
                    "desktop": { "page": "https://en.wikipedia.org/wiki/Marie_Curie" }
                }
            },
            "intro": "Marie Salomea Skłodowska-Curie was a Polish and naturalised-French \
                physicist and chemist."
        });

        let article = article(ProviderId::Wikipedia, "marie curie", &raw).unwrap();
        assert_eq!(article.title, "Marie Curie");
        assert!(article.summary.starts_with("Marie Salomea"));
        assert_eq!(
            article.thumbnail_url.as_deref(),
            Some("https://upload.wikimedia.org/curie.jpg")
        );

        let concise = json!({ "summary": raw["summary"].clone(), "intro": null });
        let article = super::article(ProviderId::Wikipedia, "marie curie", &concise).unwrap();
        assert_eq!(article.summary, "Polish-French physicist.");
    }

    #[test]
    fn test_no_article() {
        assert!(article(ProviderId::Wikipedia, "q", &json!({ "summary": null })).is_none());
    }

    fn daily_forecast() -> Value {
        json!({
            "service_response": {
                "weather.home": {
                    "forecast": [
                        {
                            "datetime": "2025-06-13T10:00:00+02:00",
                            "condition": "sunny",
                            "temperature": 24.0,
                            "templow": 13.5,
                            "precipitation_probability": 5,
                            "wind_speed": 11.2
                        },
                        {
                            "datetime": "2025-06-14T10:00:00+02:00",
                            "condition": "rainy",
                            "temperature": 18.0,
                            "precipitation_probability": 80.4,
                            "humidity": 71
                        },
                        { "condition": "cloudy" }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_forecast_periods() {
        let periods = forecast_periods(&daily_forecast(), "weather.home").unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].temperature, Some(Temperature::Range { low: 13.5, high: 24.0 }));
        assert_eq!(periods[1].temperature, Some(Temperature::Point { value: 18.0 }));
        assert_eq!(periods[1].precipitation_probability, Some(80));
        assert_eq!(
            period_date(&periods[1].starts_at),
            NaiveDate::from_ymd_opt(2025, 6, 14)
        );
    }

    #[test]
    fn test_forecast_periods_bare_shape() {
        let raw = json!({ "weather.home": { "forecast": [] } });
        assert!(forecast_periods(&raw, "weather.home").unwrap().is_empty());

        let err = forecast_periods(&raw, "weather.other").unwrap_err();
        assert!(matches!(err, ResolveError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_period_date_keeps_entry_offset() {
        assert_eq!(
            period_date("2025-06-13T23:30:00-05:00"),
            NaiveDate::from_ymd_opt(2025, 6, 13)
        );
        assert_eq!(period_date("2025-06-13"), NaiveDate::from_ymd_opt(2025, 6, 13));
        assert_eq!(period_date("soon"), None);
    }

    #[test]
    fn test_condition_icon() {
        let mut periods = forecast_periods(&daily_forecast(), "weather.home").unwrap();
        assert_eq!(
            condition_icon(&periods[1], "/local/weather/").as_deref(),
            Some("/local/weather/showers_rain.svg")
        );

        periods[0].condition = "partlycloudy".to_string();
        assert_eq!(
            condition_icon(&periods[0], "/icons").as_deref(),
            Some("/icons/partly_cloudy_day.svg")
        );
        periods[0].is_daytime = Some(false);
        assert_eq!(
            condition_icon(&periods[0], "/icons").as_deref(),
            Some("/icons/partly_cloudy_night.svg")
        );

        periods[0].condition = "unknown".to_string();
        assert!(condition_icon(&periods[0], "/icons").is_none());
    }

    #[test]
    fn test_sensor_reading() {
        let state = json!({ "state": "21.4", "attributes": { "unit_of_measurement": "°C" } });
        assert_eq!(
            sensor_reading(&state),
            Some(SensorReading {
                value: 21.4,
                unit: Some("°C".to_string())
            })
        );
        assert!(sensor_reading(&json!({ "state": "unavailable" })).is_none());
        assert!(sensor_reading(&Value::Null).is_none());
    }

    #[test]
    fn test_equity_quote() {
        let quote = json!({
            "c": 189.5, "d": 1.25, "dp": 0.66, "h": 190.0, "l": 187.1, "o": 188.0, "pc": 188.25
        });
        let profile = json!({
            "name": "Apple Inc",
            "exchange": "NASDAQ NMS - GLOBAL MARKET",
            "currency": "USD",
            "logo": "https://static.finnhub.io/logo/aapl.png"
        });

        let price = equity_price("AAPL", &quote).unwrap();
        assert_eq!(price, 189.5);

        let q = equity_quote("AAPL", price, &quote, Some(&profile));
        assert_eq!(q.instrument, InstrumentKind::Equity);
        assert_eq!(q.name.as_deref(), Some("Apple Inc"));
        assert_eq!(q.previous_close, Some(188.25));
        assert_eq!(q.logo_url.as_deref(), Some("https://static.finnhub.io/logo/aapl.png"));

        let bare = equity_quote("AAPL", price, &quote, None);
        assert_eq!(bare.currency, "USD");
        assert!(bare.name.is_none());
    }

    #[test]
    fn test_equity_price_missing() {
        let quote = json!({ "c": 0, "d": null, "dp": null });
        let err = equity_price("ZZZZ", &quote).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch(_)));
        assert!(equity_price("ZZZZ", &json!({})).is_err());
    }

    #[test]
    fn test_crypto_quote() {
        let raw = json!([{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://coin-images.coingecko.com/bitcoin.png",
            "current_price": 67_000.5,
            "market_cap": 1_320_000_000_000.0_f64,
            "high_24h": 68_000,
            "low_24h": 66_000,
            "price_change_24h": -350.2,
            "price_change_percentage_24h": -0.52
        }]);

        let q = crypto_quote("BTC", &raw, "usd").unwrap();
        assert_eq!(q.instrument, InstrumentKind::Crypto);
        assert_eq!(q.symbol, "BTC");
        assert_eq!(q.currency, "USD");
        assert_eq!(q.high, Some(68_000.0));
        assert_eq!(q.percent_change, Some(-0.52));

        assert!(matches!(crypto_quote("BTC", &json!([]), "usd"), Err(ResolveError::NoMatch(_))));
    }

    #[test]
    fn test_forex_conversion_rounding() {
        let pair = CurrencyPair {
            from: "USD".to_string(),
            to: "EUR".to_string(),
            amount: 100.0,
        };
        let raw = json!({ "base": "USD", "quote": { "EUR": 0.923_456_789, "GBP": 0.79 } });

        let q = forex_conversion(&raw, &pair).unwrap();
        let conversion = q.conversion.unwrap();
        assert_eq!(conversion.rate, 0.923_457);
        assert_eq!(conversion.converted_amount, 92.35);
        assert_eq!(q.symbol, "USD/EUR");

        let missing = CurrencyPair {
            to: "JPY".to_string(),
            ..pair
        };
        assert!(matches!(forex_conversion(&raw, &missing), Err(ResolveError::NoMatch(_))));
    }

    #[test]
    fn test_normalization_is_stable() {
        let raw = brave_images(4);
        let first =
            search_results(ProviderId::Brave, ToolKind::ImageSearch, "dogs", &raw, 4).unwrap();
        let second =
            search_results(ProviderId::Brave, ToolKind::ImageSearch, "dogs", &raw, 4).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
