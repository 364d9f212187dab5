//! Stock, crypto and currency tool

use super::{dispatch, parse_params, report};
use crate::engine::{CanonicalResult, InstrumentKind, ToolCall, ToolDispatcher, ToolKind};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use voice_tools::{Error, Result, Tool};

const CRYPTO_INSTRUCTION: &str = "Present the cryptocurrency price naturally. Mention the coin \
    name, current price in USD, and whether it's up or down in the last 24 hours with the change \
    amount and percentage.";

const STOCK_INSTRUCTION: &str = "Present the stock price naturally. Mention the company name, \
    current price with currency, and whether it's up or down today with the change amount and \
    percentage.";

const CURRENCY_INSTRUCTION: &str =
    "Present the currency conversion naturally. State the converted amount and the exchange rate.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum QueryType {
    Stock,
    Currency,
}

#[derive(Debug, Deserialize)]
struct FinancialParams {
    query_type: QueryType,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    from_currency: Option<String>,
    #[serde(default)]
    to_currency: Option<String>,
    #[serde(default)]
    amount: Option<f64>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FinancialParams {
    fn into_call(self) -> Result<ToolCall> {
        match self.query_type {
            QueryType::Stock => {
                let symbol = present(self.symbol).ok_or_else(|| {
                    Error::InvalidParameters(
                        "Stock ticker symbol is required for stock queries.".to_string(),
                    )
                })?;
                Ok(ToolCall::Stock { symbol })
            },
            QueryType::Currency => match (present(self.from_currency), present(self.to_currency)) {
                (Some(from), Some(to)) => Ok(ToolCall::Currency {
                    from,
                    to,
                    amount: self.amount,
                }),
                _ => Err(Error::InvalidParameters(
                    "Both from_currency and to_currency are required for currency queries."
                        .to_string(),
                )),
            },
        }
    }
}

/// Financial lookup tool: equities, crypto and currency conversion
pub struct FinancialDataTool {
    dispatcher: Arc<ToolDispatcher>,
}

impl FinancialDataTool {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Tool for FinancialDataTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let params: FinancialParams = parse_params(params)?;
        let call = params.into_call()?;
        tracing::info!(call = ?call, "Financial data requested");

        let resolution = dispatch(&self.dispatcher, call).await?;
        let instruction = match &resolution.result {
            CanonicalResult::FinancialQuote(quote) => match quote.instrument {
                InstrumentKind::Crypto => CRYPTO_INSTRUCTION,
                InstrumentKind::Equity => STOCK_INSTRUCTION,
                InstrumentKind::ForexPair => CURRENCY_INSTRUCTION,
            },
            _ => STOCK_INSTRUCTION,
        };

        Ok(report(ToolKind::Financial, &resolution, instruction))
    }

    fn name(&self) -> &str {
        ToolKind::Financial.tool_name()
    }

    fn description(&self) -> &str {
        "Get stock prices, cryptocurrency prices, or convert currencies. Use query_type 'stock' \
         with a ticker symbol (e.g. 'AAPL', 'TSLA', 'MSFT') or a crypto symbol (e.g. 'BTC', \
         'ETH', 'DOGE') to get the current price. Use query_type 'currency' with from_currency \
         and to_currency codes (e.g. 'USD', 'EUR', 'GBP') to get exchange rates or convert amounts."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query_type": {
                    "type": "string",
                    "enum": ["stock", "currency"],
                    "description": "'stock' for stock/equity price, 'currency' for exchange rate."
                },
                "symbol": {
                    "type": "string",
                    "description": "Stock ticker (e.g. 'AAPL', 'TSLA') or crypto symbol \
                        (e.g. 'BTC', 'ETH'). Required for stock queries."
                },
                "from_currency": {
                    "type": "string",
                    "description":
                        "Source currency code (e.g. 'USD'). Required for currency queries."
                },
                "to_currency": {
                    "type": "string",
                    "description":
                        "Target currency code (e.g. 'EUR'). Required for currency queries."
                },
                "amount": {
                    "type": "number",
                    "description": "Amount to convert. Default is 1."
                }
            },
            "required": ["query_type"]
        })
    }
}
