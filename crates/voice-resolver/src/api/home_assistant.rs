//! Home Assistant REST client for weather entities

use super::http::{build_client, send_json, trim_base};
use super::{ProviderId, WeatherRequest, WeatherSource};
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;

/// Weather entity feature bits reported in `supported_features`
pub mod features {
    pub const FORECAST_DAILY: u64 = 1;
    pub const FORECAST_HOURLY: u64 = 2;
    pub const FORECAST_TWICE_DAILY: u64 = 4;
}

/// Whether an entity state advertises the given feature bit
pub fn supports(state: &Value, feature: u64) -> bool {
    state["attributes"]["supported_features"]
        .as_u64()
        .is_some_and(|bits| bits & feature != 0)
}

/// Client for a Home Assistant instance
pub struct HomeAssistantClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HomeAssistantClient {
    /// Create a client
    ///
    /// # Arguments
    /// * `base_url` - Instance URL, e.g. `http://homeassistant.local:8123`
    /// * `token` - Long-lived access token
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: trim_base(base_url),
            token: token.into(),
        })
    }

    async fn forecast(&self, entity_id: &str, granularity: &str) -> Result<Value> {
        let request = self
            .client
            .post(format!(
                "{}/api/services/weather/get_forecasts?return_response",
                self.base_url
            ))
            .bearer_auth(&self.token)
            .json(&json!({ "entity_id": entity_id, "type": granularity }));

        send_json(ProviderId::HomeAssistant, request).await
    }

    async fn state(&self, entity_id: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/api/states/{entity_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ResolveError::from_transport(ProviderId::HomeAssistant.as_str(), &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Value::Null);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::from_status(
                ProviderId::HomeAssistant.as_str(),
                status,
                &body,
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ResolveError::from_transport(ProviderId::HomeAssistant.as_str(), &e))
    }
}

#[async_trait]
impl WeatherSource for HomeAssistantClient {
    fn id(&self) -> ProviderId {
        ProviderId::HomeAssistant
    }

    async fn fetch(&self, request: &WeatherRequest) -> Result<Value> {
        match request {
            WeatherRequest::Forecast {
                entity_id,
                granularity,
            } => {
                tracing::debug!(
                    entity = %entity_id,
                    granularity = granularity.as_str(),
                    "Fetching forecast"
                );
                self.forecast(entity_id, granularity.as_str()).await
            },
            WeatherRequest::State { entity_id } => self.state(entity_id).await,
        }
    }
}
