//! Caiyun Weather Provider
//!
//! Fetches the raw v2.6 forecast bundle for a coordinate. Shaping happens
//! in the domain layer.

use super::http::{base_url, get_json};
use crate::domain::ports::{Provider, ProviderError};
use crate::domain::value_objects::Coordinates;
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.caiyunapp.com";

pub struct CaiyunWeather {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl CaiyunWeather {
    pub fn new(client: reqwest::Client, base: &str, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url(base),
            token: token.into(),
        }
    }

    fn url(&self, coords: &Coordinates) -> String {
        format!(
            "{}/v2.6/{}/{},{}/weather",
            self.base_url, self.token, coords.lng, coords.lat
        )
    }
}

#[async_trait]
impl Provider<Coordinates, Value> for CaiyunWeather {
    fn name(&self) -> &'static str {
        "caiyun"
    }

    async fn attempt(&self, coords: &Coordinates) -> Result<Value, ProviderError> {
        let request = self.client.get(self.url(coords)).query(&[
            ("alert", "true"),
            ("dailysteps", "3"),
            ("hourlysteps", "24"),
            ("lang", "zh_CN"),
        ]);
        let body = get_json(request).await?;

        match body.get("status").and_then(Value::as_str) {
            Some("ok") => Ok(body),
            Some(other) => Err(ProviderError::Malformed(format!("status {}", other))),
            None => Err(ProviderError::Malformed("missing status".to_string())),
        }
    }
}
