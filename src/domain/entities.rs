//! Domain Entities - Core business objects
//!
//! These entities represent what the relay hands back to clients and what
//! it asks providers for. They carry no transport or provider details.

use crate::domain::value_objects::{CacheKey, Capability, Coordinates, NetworkAddress, SearchQuery};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named place candidate returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub address: String,
}

/// Coordinates and a display address resolved for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpLocation {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl IpLocation {
    /// Location reported when the client cannot be located.
    pub fn fallback() -> Self {
        Self {
            lat: 39.9042,
            lng: 116.4074,
            address: "北京市".to_string(),
        }
    }
}

/// A capability request carrying only the fields that capability needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRequest {
    Geocode(Coordinates),
    Search(SearchQuery),
    IpLocate(NetworkAddress),
    Weather(Coordinates),
}

impl ProviderRequest {
    pub fn capability(&self) -> Capability {
        match self {
            Self::Geocode(_) => Capability::Geocode,
            Self::Search(_) => Capability::Search,
            Self::IpLocate(_) => Capability::IpLocate,
            Self::Weather(_) => Capability::Weather,
        }
    }

    /// Key shared by the response cache and the in-flight registry.
    pub fn cache_key(&self) -> CacheKey {
        let params = match self {
            Self::Geocode(coords) | Self::Weather(coords) => coords.normalized(),
            Self::Search(query) => query.as_str().to_string(),
            Self::IpLocate(addr) => addr.as_str().to_string(),
        };
        CacheKey::new(self.capability(), params)
    }
}

/// Icon and human-readable description for a sky condition code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub icon: String,
    pub desc: String,
}

/// Realtime conditions, already unit-converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Celsius, rounded
    pub temperature: i64,
    /// Celsius, rounded
    pub apparent_temperature: i64,
    /// Percent
    pub humidity: i64,
    /// km/h
    pub wind_speed: i64,
    /// Degrees
    pub wind_direction: i64,
    /// hPa
    pub pressure: i64,
    pub visibility: Value,
    pub skycon: String,
    pub weather_info: WeatherInfo,
    pub air_quality: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// Local hour of day, 0-23
    pub time: u32,
    pub temperature: i64,
    pub skycon: String,
    pub weather_info: WeatherInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeIndex {
    pub ultraviolet: Value,
    #[serde(rename = "carWashing")]
    pub car_washing: Value,
    pub dressing: Value,
    pub comfort: Value,
    #[serde(rename = "coldRisk")]
    pub cold_risk: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// `MM-DD`
    pub date: String,
    pub weekday: String,
    #[serde(rename = "relativeDay")]
    pub relative_day: String,
    pub max_temp: i64,
    pub min_temp: i64,
    pub skycon: String,
    pub weather_info: WeatherInfo,
    pub life_index: LifeIndex,
}

/// Normalized weather payload returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyForecast>,
    pub forecast_keypoint: Value,
    /// True for the illustrative payload served without a provider token
    pub synthetic: bool,
}
