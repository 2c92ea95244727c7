//! weather-relay Library
//!
//! Exposes the relay components for use in integration tests and as a
//! library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod wiring;

// Re-export commonly used types
pub use adapters::inbound::{router, ApiServer, ApiState};
pub use application::{ChainError, FallbackChain, LocationService, WeatherError, WeatherService};
pub use config::{load_config, Config};
pub use domain::entities::{IpLocation, Place, WeatherReport};
pub use domain::ports::{MatchMode, PlaceDirectory, Provider, ProviderError};
pub use domain::value_objects::{CacheKey, Capability, Coordinates, NetworkAddress, SearchQuery};
pub use infrastructure::{ResponseCache, ShutdownController};
pub use wiring::build_state;
