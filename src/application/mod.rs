//! Application Layer
//!
//! Use cases that tie providers, caches and domain services together.

pub mod fallback_chain;
pub mod location_service;
pub mod weather_service;

pub use fallback_chain::{ChainError, FallbackChain};
pub use location_service::LocationService;
pub use weather_service::{WeatherError, WeatherService};
