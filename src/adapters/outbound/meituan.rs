//! Meituan Location Providers
//!
//! City lookup by coordinate and IP geolocation. Both endpoints expect
//! browser-like request headers.

use super::http::{base_url, get_json};
use crate::domain::entities::IpLocation;
use crate::domain::ports::{Provider, ProviderError};
use crate::domain::value_objects::{Coordinates, NetworkAddress};
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://apimobile.meituan.com";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; weather-relay/0.1)";
const REFERER: &str = "https://i.meituan.com/";

fn browser_get(client: &reqwest::Client, url: &str) -> reqwest::RequestBuilder {
    client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(reqwest::header::ACCEPT, "application/json")
        .header(reqwest::header::REFERER, REFERER)
}

fn non_empty_str<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

// ===== City lookup =====

/// Resolves a coordinate to a city-level address.
pub struct MeituanCityLookup {
    client: reqwest::Client,
    base_url: String,
}

impl MeituanCityLookup {
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base_url: base_url(base),
        }
    }
}

#[async_trait]
impl Provider<Coordinates, String> for MeituanCityLookup {
    fn name(&self) -> &'static str {
        "meituan-city"
    }

    async fn attempt(&self, coords: &Coordinates) -> Result<String, ProviderError> {
        let url = format!(
            "{}/group/v1/city/latlng/{},{}",
            self.base_url, coords.lat, coords.lng
        );
        let body = get_json(browser_get(&self.client, &url).query(&[("tag", "0")])).await?;
        city_address(&body)
    }
}

/// Most specific name in `data`: detail, then open city name, then city.
fn city_address(body: &Value) -> Result<String, ProviderError> {
    let data = body
        .get("data")
        .ok_or_else(|| ProviderError::Malformed("missing data".to_string()))?;

    ["detail", "openCityName", "city"]
        .iter()
        .find_map(|key| non_empty_str(data, key))
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Malformed("no address fields".to_string()))
}

// ===== IP location =====

/// Locates a public network address.
pub struct MeituanIpLocator {
    client: reqwest::Client,
    base_url: String,
}

impl MeituanIpLocator {
    pub fn new(client: reqwest::Client, base: &str) -> Self {
        Self {
            client,
            base_url: base_url(base),
        }
    }
}

#[async_trait]
impl Provider<NetworkAddress, IpLocation> for MeituanIpLocator {
    fn name(&self) -> &'static str {
        "meituan-ip"
    }

    async fn attempt(&self, addr: &NetworkAddress) -> Result<IpLocation, ProviderError> {
        let url = format!("{}/locate/v2/ip/loc", self.base_url);
        let request = browser_get(&self.client, &url).query(&[("rgeo", "true"), ("ip", addr.as_str())]);
        let body = get_json(request).await?;
        ip_location(&body)
    }
}

fn ip_location(body: &Value) -> Result<IpLocation, ProviderError> {
    let data = body
        .get("data")
        .ok_or_else(|| ProviderError::Malformed("missing data".to_string()))?;

    let lat = data.get("lat").and_then(Value::as_f64);
    let lng = data.get("lng").and_then(Value::as_f64);
    let (Some(lat), Some(lng)) = (lat, lng) else {
        return Err(ProviderError::Malformed("missing coordinates".to_string()));
    };

    let address = data
        .get("rgeo")
        .map(compose_address)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| IpLocation::fallback().address);

    Ok(IpLocation { lat, lng, address })
}

/// Join the reverse-geocoded parts from coarse to fine, skipping missing
/// and repeated parts. The province is dropped when it equals the city
/// (municipalities).
fn compose_address(rgeo: &Value) -> String {
    let city = non_empty_str(rgeo, "city");
    let province = non_empty_str(rgeo, "province").filter(|p| Some(*p) != city);
    let street = non_empty_str(rgeo, "street").or_else(|| non_empty_str(rgeo, "town"));

    let mut parts: Vec<&str> = Vec::new();
    for part in [
        non_empty_str(rgeo, "country"),
        province,
        city,
        non_empty_str(rgeo, "district"),
        street,
    ]
    .into_iter()
    .flatten()
    {
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    parts.concat()
}
