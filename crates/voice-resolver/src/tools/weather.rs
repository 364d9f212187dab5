//! Weather forecast tool

use super::{dispatch, parse_params, report};
use crate::engine::{CanonicalResult, ToolCall, ToolDispatcher, ToolKind};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use voice_tools::{Result, Tool};

const INSTRUCTION: &str = "Summarize the weather forecast naturally. Mention temperatures, \
    conditions, and precipitation chances. If current humidity is provided, mention it as well. \
    Do NOT list raw numbers or data verbatim. Give a conversational summary.";

/// Upper bounds (inclusive) of each precipitation wording
const PRECIPITATION_OUTLOOK: [(u8, &str); 8] = [
    (0, "no chance"),
    (5, "very unlikely"),
    (15, "unlikely"),
    (30, "possible"),
    (50, "moderate"),
    (70, "likely"),
    (85, "very likely"),
    (95, "extremely likely"),
];

const RANGE_OPTIONS: [&str; 10] = [
    "week",
    "today",
    "tomorrow",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Spoken wording for a precipitation probability in percent
pub fn precipitation_outlook(probability: u8) -> &'static str {
    PRECIPITATION_OUTLOOK
        .iter()
        .find(|(limit, _)| probability <= *limit)
        .map_or("almost guaranteed", |(_, wording)| *wording)
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    range: String,
}

/// Forecast tool backed by a Home Assistant weather entity
pub struct WeatherForecastTool {
    dispatcher: Arc<ToolDispatcher>,
}

impl WeatherForecastTool {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: WeatherParams = parse_params(params)?;
        tracing::info!(range = %params.range, "Weather forecast requested");

        let call = ToolCall::Weather {
            range: params.range,
        };
        let resolution = dispatch(&self.dispatcher, call).await?;
        let mut output = report(ToolKind::Weather, &resolution, INSTRUCTION);

        if let CanonicalResult::Forecast(forecast) = &resolution.result {
            let outlook: Vec<Value> = forecast
                .periods
                .iter()
                .filter_map(|period| {
                    period.precipitation_probability.map(|probability| {
                        json!({
                            "starts_at": period.starts_at,
                            "outlook": precipitation_outlook(probability),
                        })
                    })
                })
                .collect();
            output["precipitation_outlook"] = Value::Array(outlook);
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        ToolKind::Weather.tool_name()
    }

    fn description(&self) -> &str {
        "Get the weather forecast. Use 'week' for the weekly outlook, 'today' or 'tomorrow' for \
         those days, or a day name (monday-sunday) for a specific upcoming day. If the user says \
         'tonight', use 'today'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "range": {
                    "type": "string",
                    "description": "The time range: 'week', 'today', 'tomorrow', or a day name \
                        (monday-sunday).",
                    "enum": RANGE_OPTIONS
                }
            },
            "required": ["range"]
        })
    }
}
