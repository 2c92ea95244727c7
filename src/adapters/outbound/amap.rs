//! AMap Providers
//!
//! Reverse geocoding and place-name search. Both require an API key and
//! report success with `status == "1"`.

use super::http::{base_url, get_json};
use crate::domain::entities::Place;
use crate::domain::ports::{Provider, ProviderError};
use crate::domain::value_objects::{Coordinates, SearchQuery};
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://restapi.amap.com";

/// Results requested from, and kept from, place search.
const PAGE_SIZE: usize = 5;

fn check_status(body: &Value) -> Result<(), ProviderError> {
    match body.get("status").and_then(Value::as_str) {
        Some("1") => Ok(()),
        other => {
            let info = body.get("info").and_then(Value::as_str).unwrap_or("");
            Err(ProviderError::Malformed(format!(
                "status {} {}",
                other.unwrap_or("missing"),
                info
            )))
        }
    }
}

// ===== Reverse geocoding =====

pub struct AmapGeocoder {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl AmapGeocoder {
    pub fn new(client: reqwest::Client, base: &str, key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url(base),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Provider<Coordinates, String> for AmapGeocoder {
    fn name(&self) -> &'static str {
        "amap-regeo"
    }

    async fn attempt(&self, coords: &Coordinates) -> Result<String, ProviderError> {
        let location = format!("{},{}", coords.lng, coords.lat);
        let request = self
            .client
            .get(format!("{}/v3/geocode/regeo", self.base_url))
            .query(&[
                ("key", self.key.as_str()),
                ("location", location.as_str()),
                ("radius", "1000"),
                ("extensions", "base"),
            ]);
        let body = get_json(request).await?;
        check_status(&body)?;

        body.get("regeocode")
            .and_then(|r| r.get("formatted_address"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Malformed("missing formatted_address".to_string()))
    }
}

// ===== Place search =====

pub struct AmapPlaceSearch {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl AmapPlaceSearch {
    pub fn new(client: reqwest::Client, base: &str, key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url(base),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Provider<SearchQuery, Vec<Place>> for AmapPlaceSearch {
    fn name(&self) -> &'static str {
        "amap-search"
    }

    async fn attempt(&self, query: &SearchQuery) -> Result<Vec<Place>, ProviderError> {
        let page_size = PAGE_SIZE.to_string();
        let request = self
            .client
            .get(format!("{}/v3/place/text", self.base_url))
            .query(&[
                ("key", self.key.as_str()),
                ("keywords", query.as_str()),
                ("offset", page_size.as_str()),
                ("page", "1"),
                ("extensions", "base"),
            ]);
        let body = get_json(request).await?;
        check_status(&body)?;

        let pois = body
            .get("pois")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Malformed("missing pois".to_string()))?;

        Ok(pois.iter().filter_map(parse_poi).take(PAGE_SIZE).collect())
    }
}

/// POIs without a name or a parseable `"lng,lat"` location are skipped.
fn parse_poi(poi: &Value) -> Option<Place> {
    let name = poi.get("name")?.as_str()?.to_string();
    // AMap sends `[]` instead of an empty string for missing addresses.
    let address = poi
        .get("address")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let (lng, lat) = poi.get("location")?.as_str()?.split_once(',')?;

    Some(Place {
        lat: lat.trim().parse().ok()?,
        lng: lng.trim().parse().ok()?,
        name,
        address,
    })
}
