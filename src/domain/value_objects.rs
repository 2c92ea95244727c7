//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data-acquisition purpose served by a provider chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Coordinates to a display address
    Geocode,
    /// Free text to candidate places
    Search,
    /// Client address to coordinates
    IpLocate,
    /// Coordinates to a forecast bundle
    Weather,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geocode => "geocode",
            Self::Search => "search",
            Self::IpLocate => "ip-locate",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Stable textual form used in cache keys (4 decimal places, ~11 m).
    pub fn normalized(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lng)
    }
}

/// A trimmed, non-empty free-text place query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Returns `None` when the query is blank after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonical IPv4 or IPv6 host string.
///
/// Only `domain::services::address::normalize` builds these from raw input,
/// so a value never carries a port, brackets or uppercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkAddress(String);

impl NetworkAddress {
    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routability of a [`NetworkAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClassification {
    /// Globally routable; usable for IP location
    Public,
    /// Loopback, RFC1918, link-local or unique-local
    PrivateOrReserved,
    /// Empty, a placeholder, or not shaped like an address
    Invalid,
}

impl AddressClassification {
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Cache and in-flight registry key: capability plus normalized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    capability: Capability,
    params: String,
}

impl CacheKey {
    pub fn new(capability: Capability, params: impl Into<String>) -> Self {
        Self {
            capability,
            params: params.into(),
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.capability, self.params)
    }
}
