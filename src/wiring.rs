//! Composition Root
//!
//! Builds the provider adapters, chains and services described by a
//! [`Config`]. Shared by the binary and the integration tests.

use crate::adapters::inbound::ApiState;
use crate::adapters::outbound::{
    build_client, AmapGeocoder, AmapPlaceSearch, BuiltinPlaces, CaiyunWeather,
    MeituanCityLookup, MeituanIpLocator, CLIENT_TIMEOUT,
};
use crate::application::location_service::{geocode_chain, ip_locate_chain, search_chain};
use crate::application::{LocationService, WeatherService};
use crate::config::Config;
use crate::domain::entities::Place;
use crate::domain::ports::Provider;
use crate::domain::value_objects::{Coordinates, SearchQuery};
use std::sync::Arc;

/// Wire every adapter and service for `cfg`.
pub fn build_state(cfg: &Config) -> anyhow::Result<ApiState> {
    let client = build_client(CLIENT_TIMEOUT)?;
    let timeout = cfg.provider_timeout();

    // 1. Outbound adapters
    let city_lookup = Arc::new(MeituanCityLookup::new(client.clone(), &cfg.meituan_base_url));
    let ip_locator = Arc::new(MeituanIpLocator::new(client.clone(), &cfg.meituan_base_url));

    let (reverse_geocoder, place_search) = match &cfg.amap_key {
        Some(key) => {
            tracing::info!("AMap key configured, external geocoding and search enabled");
            (
                Some(Arc::new(AmapGeocoder::new(client.clone(), &cfg.amap_base_url, key.as_str()))
                    as Arc<dyn Provider<Coordinates, String>>),
                Some(Arc::new(AmapPlaceSearch::new(client.clone(), &cfg.amap_base_url, key.as_str()))
                    as Arc<dyn Provider<SearchQuery, Vec<Place>>>),
            )
        }
        None => {
            tracing::info!("no AMap key, search uses the built-in place table only");
            (None, None)
        }
    };

    // 2. Application services
    let location = LocationService::new(
        geocode_chain(city_lookup, reverse_geocoder, timeout),
        search_chain(Arc::new(BuiltinPlaces::new()), place_search, timeout),
        ip_locate_chain(ip_locator, timeout),
        cfg.cache_ttl(),
        cfg.cache_max_entries,
    );

    let weather = match &cfg.caiyun_token {
        Some(token) => {
            tracing::info!("Caiyun token configured, serving live weather");
            let provider = Arc::new(CaiyunWeather::new(client, &cfg.caiyun_base_url, token.as_str()));
            WeatherService::live(
                provider,
                cfg.weather_timeout(),
                cfg.cache_ttl(),
                cfg.cache_max_entries,
            )
        }
        None => {
            tracing::warn!("CAIYUN_API_TOKEN not set, serving synthetic weather");
            WeatherService::synthetic()
        }
    };

    Ok(ApiState::new(
        Arc::new(location),
        Arc::new(weather),
        cfg.static_dir.as_str(),
    ))
}
