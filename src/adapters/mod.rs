//! Adapters
//!
//! `inbound` serves the HTTP API; `outbound` talks to weather, geocoding
//! and IP-location providers.

pub mod inbound;
pub mod outbound;
