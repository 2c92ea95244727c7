//! Shared HTTP plumbing for provider adapters.

use crate::domain::ports::ProviderError;
use serde_json::Value;
use std::time::Duration;

/// Whole-request ceiling applied by the client itself. Chain stages apply
/// their own, shorter deadline on top.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the outbound client shared by all adapters.
pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;
    Ok(client)
}

/// Send `request` and decode the body as JSON.
///
/// Non-2xx statuses, transport failures and undecodable bodies are mapped to
/// [`ProviderError`] so the chain can log and advance.
pub async fn get_json(request: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
    let response = request.send().await.map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Http {
            status: status.as_u16(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| ProviderError::Malformed(format!("invalid json: {}", e)))
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Unavailable(e.to_string())
    }
}

/// Trim a configured base URL so paths can be appended with `/`.
pub fn base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}
