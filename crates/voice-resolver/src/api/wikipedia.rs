//! Wikipedia search and page summary client

use super::http::{build_client, send_json, send_json_optional, trim_base};
use super::{ProviderId, SearchProvider, SearchQuery};
use crate::config::ArticleDetail;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Number of search hits considered when looking for a real article
const SEARCH_LIMIT: &str = "3";

/// Wikipedia client
///
/// The raw payload is `{"summary": ..., "intro": ...}`: the REST summary of
/// the first search hit that is not a disambiguation page (null when there is
/// none) and, at the detailed level, the plain-text introduction.
pub struct WikipediaClient {
    client: Client,
    base_url: String,
    detail: ArticleDetail,
    language: String,
}

impl WikipediaClient {
    pub fn new(language: &str, detail: ArticleDetail, timeout: Duration) -> Result<Self> {
        let language = language.trim().to_ascii_lowercase();
        Ok(Self {
            client: build_client(timeout)?,
            base_url: format!("https://{language}.wikipedia.org"),
            detail,
            language,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    async fn search_titles(&self, text: &str) -> Result<Vec<String>> {
        let request = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", text),
                ("srlimit", SEARCH_LIMIT),
                ("format", "json"),
            ]);

        let raw = send_json(ProviderId::Wikipedia, request).await?;
        Ok(raw["query"]["search"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .filter_map(|hit| hit["title"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn summary_url(&self, title: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/rest_v1/page/summary", self.base_url))
            .map_err(|e| {
                ResolveError::ConfigurationMissing(format!("invalid Wikipedia URL: {e}"))
            })?;
        url.path_segments_mut()
            .map_err(|()| {
                ResolveError::ConfigurationMissing("invalid Wikipedia URL".to_string())
            })?
            .push(&title.replace(' ', "_"));
        Ok(url)
    }

    /// First summary among `titles` that is a real article
    ///
    /// Disambiguation pages and missing pages are skipped. When no article
    /// turns up, the last failed summary request is returned as the error.
    async fn best_summary(&self, titles: &[String]) -> Result<Option<Value>> {
        let mut last_error = None;
        for title in titles {
            let request = self.client.get(self.summary_url(title)?);
            match send_json_optional(ProviderId::Wikipedia, request).await {
                Ok(Some(summary)) if summary["type"] == "disambiguation" => {
                    tracing::debug!(title = %title, "Skipping disambiguation page");
                },
                Ok(Some(summary)) => return Ok(Some(summary)),
                Ok(None) => tracing::debug!(title = %title, "No summary page"),
                Err(e) => {
                    tracing::debug!(title = %title, "Wikipedia summary unavailable: {}", e);
                    last_error = Some(e);
                },
            }
        }
        last_error.map_or(Ok(None), Err)
    }

    async fn intro(&self, title: &str) -> Option<String> {
        let request = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "true"),
                ("explaintext", "true"),
                ("titles", title),
                ("format", "json"),
            ]);

        match send_json(ProviderId::Wikipedia, request).await {
            Ok(raw) => raw["query"]["pages"].as_object().and_then(|pages| {
                pages
                    .values()
                    .filter_map(|page| page["extract"].as_str())
                    .find(|extract| !extract.trim().is_empty())
                    .map(str::to_string)
            }),
            Err(e) => {
                tracing::debug!(title = %title, "Wikipedia intro unavailable: {}", e);
                None
            },
        }
    }
}

#[async_trait]
impl SearchProvider for WikipediaClient {
    fn id(&self) -> ProviderId {
        ProviderId::Wikipedia
    }

    fn cache_params(&self) -> String {
        format!("lang={};detail={}", self.language, self.detail.as_str())
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Value> {
        tracing::debug!(query = %query.text, "Wikipedia lookup");

        let titles = self.search_titles(&query.text).await?;
        let Some(summary) = self.best_summary(&titles).await? else {
            return Ok(json!({ "summary": null, "intro": null }));
        };

        let intro = match (self.detail, summary["title"].as_str()) {
            (ArticleDetail::Detailed, Some(title)) => self.intro(title).await,
            _ => None,
        };

        Ok(json!({ "summary": summary, "intro": intro }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http::test_server::serve;
    use crate::engine::ToolKind;
    use crate::error::ErrorKind;

    fn lookup(text: &str) -> SearchQuery {
        SearchQuery {
            kind: ToolKind::Encyclopedia,
            text: text.to_string(),
            count: 1,
        }
    }

    async fn local_client(route: fn(&str) -> (u16, String)) -> WikipediaClient {
        let base_url = serve(route).await;
        WikipediaClient::new("en", ArticleDetail::Concise, Duration::from_secs(5))
            .unwrap()
            .with_base_url(&base_url)
    }

    fn search_hits(titles: &[&str]) -> String {
        let hits: Vec<Value> = titles.iter().map(|title| json!({ "title": title })).collect();
        json!({ "query": { "search": hits } }).to_string()
    }

    #[tokio::test]
    async fn test_summary_outage_is_an_error() {
        let client = local_client(|target| {
            if target.starts_with("/w/api.php") {
                (200, search_hits(&["Marie Curie"]))
            } else {
                (503, String::new())
            }
        })
        .await;

        let err = client.fetch(&lookup("Marie Curie")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    }

    #[tokio::test]
    async fn test_skips_disambiguation_and_missing_pages() {
        let client = local_client(|target| match target {
            "/api/rest_v1/page/summary/Mercury" => {
                (200, json!({ "type": "disambiguation", "title": "Mercury" }).to_string())
            },
            "/api/rest_v1/page/summary/Gone" => (404, String::new()),
            "/api/rest_v1/page/summary/Mercury_planet" => {
                let summary = json!({
                    "type": "standard",
                    "title": "Mercury planet",
                    "extract": "Closest planet to the Sun."
                });
                (200, summary.to_string())
            },
            _ => (200, search_hits(&["Mercury", "Gone", "Mercury planet"])),
        })
        .await;

        let raw = client.fetch(&lookup("mercury")).await.unwrap();
        assert_eq!(raw["summary"]["title"], "Mercury planet");
        assert!(raw["intro"].is_null());
    }

    #[tokio::test]
    async fn test_only_missing_pages_is_no_article() {
        let client = local_client(|target| {
            if target.starts_with("/w/api.php") {
                (200, search_hits(&["Gone", "Also gone"]))
            } else {
                (404, String::new())
            }
        })
        .await;

        let raw = client.fetch(&lookup("gone")).await.unwrap();
        assert!(raw["summary"].is_null());
    }

    #[test]
    fn test_summary_url_encodes_title() {
        let client =
            WikipediaClient::new("en", ArticleDetail::Concise, Duration::from_secs(5)).unwrap();
        let url = client.summary_url("AC/DC (band)").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/AC%2FDC_(band)"
        );
    }

    #[test]
    fn test_cache_params() {
        let client =
            WikipediaClient::new(" DE ", ArticleDetail::Detailed, Duration::from_secs(5)).unwrap();
        assert_eq!(client.cache_params(), "lang=de;detail=detailed");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_lookup() {
        let client =
            WikipediaClient::new("en", ArticleDetail::Concise, Duration::from_secs(10)).unwrap();
        let raw = client.fetch(&lookup("Marie Curie")).await.unwrap();
        assert_eq!(raw["summary"]["title"], "Marie Curie");
    }
}
