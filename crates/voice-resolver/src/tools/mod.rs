//! Agent-facing tools backed by the resolution engine
//!
//! Each tool parses its JSON arguments, hands a [`ToolCall`] to the shared
//! [`ToolDispatcher`] and renders the canonical result together with a
//! short instruction telling the agent how to voice it.

pub mod financial;
pub mod search;
pub mod weather;
pub mod wikipedia;

pub use financial::FinancialDataTool;
pub use search::SearchTool;
pub use weather::WeatherForecastTool;
pub use wikipedia::WikipediaTool;

use crate::engine::{ToolCall, ToolDispatcher, ToolKind, ToolResolution};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use voice_tools::{Tool, ToolRegistry};

/// Register one tool per enabled tool kind
pub fn build_registry(dispatcher: Arc<ToolDispatcher>) -> ToolRegistry {
    let registry = ToolRegistry::new();

    for kind in dispatcher.enabled_kinds() {
        let tool: Arc<dyn Tool> = match kind {
            ToolKind::WebSearch | ToolKind::ImageSearch | ToolKind::VideoSearch => {
                Arc::new(SearchTool::new(kind, Arc::clone(&dispatcher)))
            },
            ToolKind::Encyclopedia => Arc::new(WikipediaTool::new(Arc::clone(&dispatcher))),
            ToolKind::Weather => Arc::new(WeatherForecastTool::new(Arc::clone(&dispatcher))),
            ToolKind::Financial => Arc::new(FinancialDataTool::new(Arc::clone(&dispatcher))),
        };
        tracing::debug!(tool = kind.tool_name(), "Registered tool");
        registry.register(tool);
    }

    registry
}

fn parse_params<T: DeserializeOwned>(params: Value) -> voice_tools::Result<T> {
    serde_json::from_value(params)
        .map_err(|e| voice_tools::Error::InvalidParameters(e.to_string()))
}

async fn dispatch(
    dispatcher: &ToolDispatcher,
    call: ToolCall,
) -> voice_tools::Result<ToolResolution> {
    Ok(dispatcher.resolve(call).await?)
}

/// Common response envelope
fn report(kind: ToolKind, resolution: &ToolResolution, instruction: &str) -> Value {
    json!({
        "tool": kind.tool_name(),
        "display": resolution.display,
        "result": resolution.result,
        "featured_image": resolution.result.featured_image(),
        "instruction": instruction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArticleDetail, EngineConfig, ProviderConfig};

    #[test]
    fn test_registry_contains_enabled_tools_only() {
        let config = EngineConfig::builder()
            .provider(ProviderConfig::Wikipedia {
                detail: ArticleDetail::Concise,
                language: "en".to_string(),
            })
            .provider(ProviderConfig::Youtube {
                api_key: "key".to_string(),
                num_results: 3,
            })
            .provider(ProviderConfig::Finnhub {
                api_key: String::new(),
            })
            .build()
            .unwrap();
        let dispatcher = Arc::new(ToolDispatcher::from_config(config).unwrap());

        let registry = build_registry(dispatcher);
        assert_eq!(
            registry.names(),
            vec!["search_videos".to_string(), "search_wikipedia".to_string()]
        );
    }

    #[test]
    fn test_invalid_params() {
        #[derive(Debug, serde::Deserialize)]
        struct Params {
            #[allow(dead_code)]
            query: String,
        }

        let err = parse_params::<Params>(json!({ "q": "x" })).unwrap_err();
        assert_eq!(err.kind(), "invalid_parameters");
    }
}
