//! Web, image and video search tools

use super::{dispatch, parse_params, report};
use crate::engine::{ToolCall, ToolDispatcher, ToolKind};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use voice_tools::{Result, Tool};

const WEB_INSTRUCTION: &str = "Summarize the key information from these search results in 2-3 \
    concise sentences. Do NOT list individual URLs, titles, or sources. The user cannot see the \
    raw results, so synthesize the information into a helpful answer.";

const IMAGE_INSTRUCTION: &str = "Do NOT include image URLs or markdown image syntax in your \
    response. The images will be displayed automatically by the UI. Simply tell the user what \
    you found in plain text, e.g. 'Here are some cat images I found from Unsplash and Google \
    Images.'";

const VIDEO_INSTRUCTION: &str = "Do NOT include video URLs in your response. The videos will be \
    displayed automatically by the UI. Simply tell the user what you found in plain text, e.g. \
    'Here are some cooking tutorial videos I found on YouTube.'";

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    num_results: Option<usize>,
    #[serde(default)]
    auto_display: Option<bool>,
    #[serde(default)]
    auto_play: Option<bool>,
}

/// Search tool for one of the search kinds
pub struct SearchTool {
    kind: ToolKind,
    dispatcher: Arc<ToolDispatcher>,
}

impl SearchTool {
    pub fn new(kind: ToolKind, dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { kind, dispatcher }
    }

    fn instruction(&self) -> &'static str {
        match self.kind {
            ToolKind::ImageSearch => IMAGE_INSTRUCTION,
            ToolKind::VideoSearch => VIDEO_INSTRUCTION,
            _ => WEB_INSTRUCTION,
        }
    }

    /// The agent's single-target flag for this kind, if it has one
    fn singular(&self, params: &SearchParams) -> bool {
        let flag = match self.kind {
            ToolKind::VideoSearch => params.auto_play,
            _ => params.auto_display,
        };
        flag.unwrap_or(false)
    }
}

#[async_trait]
impl Tool for SearchTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: SearchParams = parse_params(params)?;
        tracing::info!(tool = self.name(), query = %params.query, "Search requested");

        let call = ToolCall::Search {
            kind: self.kind,
            singular: self.singular(&params),
            query: params.query,
            num_results: params.num_results,
        };
        let resolution = dispatch(&self.dispatcher, call).await?;

        Ok(report(self.kind, &resolution, self.instruction()))
    }

    fn name(&self) -> &str {
        self.kind.tool_name()
    }

    fn description(&self) -> &str {
        match self.kind {
            ToolKind::ImageSearch => {
                "Search the internet for images matching a query. Returns a list of image \
                 results with URLs, titles, and thumbnails. Use this when the user asks to find, \
                 search for, or show images."
            },
            ToolKind::VideoSearch => {
                "Search YouTube for videos matching a query. Returns a list of video results with \
                 URLs, titles, thumbnails, and channel info. Use this when the user asks to find, \
                 search for, or show videos."
            },
            _ => {
                "Search the internet for information on a topic. Returns web page results with \
                 titles and snippets. Use this when the user asks a question requiring current \
                 information, facts, or general knowledge."
            },
        }
    }

    fn input_schema(&self) -> Value {
        let max = self.kind.max_results();
        let noun = match self.kind {
            ToolKind::ImageSearch => "image",
            ToolKind::VideoSearch => "video",
            _ => "web",
        };

        let mut schema = json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": format!("The {noun} search query")
                },
                "num_results": {
                    "type": "integer",
                    "description": format!("Number of {noun} results to return (1-{max})"),
                    "minimum": 1,
                    "maximum": max
                }
            },
            "required": ["query"]
        });

        match self.kind {
            ToolKind::ImageSearch => {
                schema["properties"]["auto_display"] = json!({
                    "type": "boolean",
                    "description": "Set to true when the user wants to see a specific image \
                        displayed immediately (e.g. 'show me the Mona Lisa'). Set to false when \
                        the user wants to browse multiple results."
                });
            },
            ToolKind::WebSearch => {
                schema["properties"]["auto_display"] = json!({
                    "type": "boolean",
                    "description": "Set to true when the user asks about one specific page or \
                        answer that should be shown directly. Set to false for open-ended \
                        questions."
                });
            },
            ToolKind::VideoSearch => {
                schema["properties"]["auto_play"] = json!({
                    "type": "boolean",
                    "description": "Set to true when the user wants to immediately watch/play a \
                        specific video. Set to false when the user wants to browse or explore \
                        multiple results."
                });
            },
            _ => {},
        }

        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockSearchProvider, ProviderId};
    use crate::config::{EngineConfig, ProviderConfig};

    fn youtube_payload() -> Value {
        json!({
            "search": { "items": [
                {
                    "id": { "videoId": "v1" },
                    "snippet": {
                        "title": "Knife skills",
                        "thumbnails": {
                            "high": { "url": "https://i.ytimg.com/vi/v1/hqdefault.jpg" }
                        }
                    }
                },
                { "id": { "videoId": "v2" }, "snippet": { "title": "Onion dicing" } }
            ]},
            "videos": null
        })
    }

    fn video_tool() -> SearchTool {
        let config = EngineConfig::builder()
            .provider(ProviderConfig::Youtube {
                api_key: "key".to_string(),
                num_results: 3,
            })
            .build()
            .unwrap();

        let mut provider = MockSearchProvider::new();
        provider.expect_id().return_const(ProviderId::Youtube);
        provider.expect_cache_params().return_const(String::new());
        provider.expect_fetch().returning(|_| Ok(youtube_payload()));

        let dispatcher = ToolDispatcher::builder(config)
            .search_provider(ToolKind::VideoSearch, Arc::new(provider))
            .build();
        SearchTool::new(ToolKind::VideoSearch, Arc::new(dispatcher))
    }

    #[test]
    fn test_tool_metadata() {
        let tool = video_tool();
        assert_eq!(tool.name(), "search_videos");
        assert!(tool.description().contains("YouTube"));

        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["num_results"]["maximum"], 10);
        assert!(schema["properties"]["auto_play"].is_object());
        assert!(schema["properties"].get("auto_display").is_none());
    }

    #[tokio::test]
    async fn test_execute_video_search() {
        let tool = video_tool();

        let output = tokio_test::assert_ok!(tool.execute(json!({ "query": "knife skills" })).await);
        assert_eq!(output["tool"], "search_videos");
        assert_eq!(output["display"], "list_display");
        assert_eq!(output["result"]["kind"], "search_result_list");
        assert_eq!(output["result"]["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(output["featured_image"], "https://i.ytimg.com/vi/v1/hqdefault.jpg");
        assert!(output["instruction"].as_str().unwrap().contains("video URLs"));

        let output = tool
            .execute(json!({ "query": "knife skills", "auto_play": true }))
            .await
            .unwrap();
        assert_eq!(output["display"], "auto_display");
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_params() {
        let tool = video_tool();

        let err = tokio_test::assert_err!(tool.execute(json!({ "num_results": 2 })).await);
        assert_eq!(err.kind(), "invalid_parameters");

        let err = tool.execute(json!({ "query": "   " })).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_parameters");
    }

    #[test]
    fn test_web_schema() {
        let tool = SearchTool::new(
            ToolKind::WebSearch,
            Arc::new(ToolDispatcher::builder(EngineConfig::default()).build()),
        );
        let schema = tool.input_schema();
        assert_eq!(schema["properties"]["num_results"]["maximum"], 6);
        assert_eq!(schema["properties"]["auto_display"]["type"], "boolean");
        assert!(schema["properties"].get("auto_play").is_none());
        assert!(tool.instruction().starts_with("Summarize"));
    }
}
