//! Encyclopedia lookup tool

use super::{dispatch, parse_params, report};
use crate::engine::{ToolCall, ToolDispatcher, ToolKind};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use voice_tools::{Result, Tool};

const INSTRUCTION: &str = "Relay the key information from this Wikipedia article in a concise, \
    conversational way. Do NOT mention Wikipedia, the URL, or that this came from an article. \
    Just share the knowledge naturally.";

#[derive(Debug, Deserialize)]
struct WikipediaParams {
    query: String,
}

/// Tool returning the best matching Wikipedia article
pub struct WikipediaTool {
    dispatcher: Arc<ToolDispatcher>,
}

impl WikipediaTool {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: WikipediaParams = parse_params(params)?;
        tracing::info!(query = %params.query, "Wikipedia search requested");

        let resolution = dispatch(
            &self.dispatcher,
            ToolCall::Encyclopedia {
                query: params.query,
            },
        )
        .await?;

        Ok(report(ToolKind::Encyclopedia, &resolution, INSTRUCTION))
    }

    fn name(&self) -> &str {
        ToolKind::Encyclopedia.tool_name()
    }

    fn description(&self) -> &str {
        "Look up a topic on Wikipedia. Returns the most relevant article's summary and \
         thumbnail. Use when the user asks about a topic, person, place, event, or concept."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The Wikipedia search query"
                }
            },
            "required": ["query"]
        })
    }
}
