//! Location Service - geocode, search and IP location use cases
//!
//! Each capability runs its fallback chain behind a response cache. When a
//! chain is exhausted the caller still gets an answer: a sentinel address,
//! an empty candidate list, or the default location. Those stand-ins are
//! never cached.

use crate::application::fallback_chain::{ChainError, FallbackChain};
use crate::domain::entities::{IpLocation, Place, ProviderRequest};
use crate::domain::ports::{MatchMode, PlaceDirectory, Provider, ProviderError};
use crate::domain::services::address::classify;
use crate::domain::value_objects::{Capability, Coordinates, NetworkAddress, SearchQuery};
use crate::infrastructure::{ResponseCache, ShutdownController};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Address reported when reverse geocoding yields nothing.
pub const UNKNOWN_LOCATION: &str = "未知位置";

/// Maximum number of search candidates returned to a client.
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Chain stage backed by the built-in place table.
pub struct DirectoryStage {
    directory: Arc<dyn PlaceDirectory>,
    mode: MatchMode,
}

impl DirectoryStage {
    pub fn new(directory: Arc<dyn PlaceDirectory>, mode: MatchMode) -> Self {
        Self { directory, mode }
    }
}

#[async_trait]
impl Provider<SearchQuery, Vec<Place>> for DirectoryStage {
    fn name(&self) -> &'static str {
        match self.mode {
            MatchMode::Exact => "local-exact",
            MatchMode::Relaxed => "local-relaxed",
        }
    }

    async fn attempt(&self, query: &SearchQuery) -> Result<Vec<Place>, ProviderError> {
        Ok(self
            .directory
            .find(query.as_str(), self.mode, MAX_SEARCH_RESULTS))
    }
}

/// Search: local exact match, then the external search provider when one is
/// configured, then a relaxed local match. Empty results fall through.
pub fn search_chain(
    directory: Arc<dyn PlaceDirectory>,
    external: Option<Arc<dyn Provider<SearchQuery, Vec<Place>>>>,
    timeout: Duration,
) -> FallbackChain<SearchQuery, Vec<Place>> {
    let mut chain = FallbackChain::new(Capability::Search, timeout)
        .accept_when(|places: &Vec<Place>| !places.is_empty())
        .with_stage(Arc::new(DirectoryStage::new(directory.clone(), MatchMode::Exact)));
    if let Some(external) = external {
        chain = chain.with_stage(external);
    }
    chain.with_stage(Arc::new(DirectoryStage::new(directory, MatchMode::Relaxed)))
}

/// Geocode: city lookup, then reverse geocoding when configured.
pub fn geocode_chain(
    city_lookup: Arc<dyn Provider<Coordinates, String>>,
    reverse_geocoder: Option<Arc<dyn Provider<Coordinates, String>>>,
    timeout: Duration,
) -> FallbackChain<Coordinates, String> {
    let chain = FallbackChain::new(Capability::Geocode, timeout)
        .accept_when(|address: &String| !address.trim().is_empty())
        .with_stage(city_lookup);
    match reverse_geocoder {
        Some(geocoder) => chain.with_stage(geocoder),
        None => chain,
    }
}

/// IP location: a single provider.
pub fn ip_locate_chain(
    locator: Arc<dyn Provider<NetworkAddress, IpLocation>>,
    timeout: Duration,
) -> FallbackChain<NetworkAddress, IpLocation> {
    FallbackChain::new(Capability::IpLocate, timeout).with_stage(locator)
}

/// Location use cases.
pub struct LocationService {
    geocode: Arc<FallbackChain<Coordinates, String>>,
    search: Arc<FallbackChain<SearchQuery, Vec<Place>>>,
    ip_locate: Arc<FallbackChain<NetworkAddress, IpLocation>>,
    geocode_cache: ResponseCache<String, ChainError>,
    search_cache: ResponseCache<Vec<Place>, ChainError>,
    ip_cache: ResponseCache<IpLocation, ChainError>,
    ttl: Duration,
}

impl LocationService {
    /// Create the service. Each capability gets its own cache of
    /// `max_entries` entries.
    pub fn new(
        geocode: FallbackChain<Coordinates, String>,
        search: FallbackChain<SearchQuery, Vec<Place>>,
        ip_locate: FallbackChain<NetworkAddress, IpLocation>,
        ttl: Duration,
        max_entries: usize,
    ) -> Self {
        Self {
            geocode: Arc::new(geocode),
            search: Arc::new(search),
            ip_locate: Arc::new(ip_locate),
            geocode_cache: ResponseCache::new(max_entries),
            search_cache: ResponseCache::new(max_entries),
            ip_cache: ResponseCache::new(max_entries),
            ttl,
        }
    }

    /// Human-readable address for a coordinate, or [`UNKNOWN_LOCATION`].
    pub async fn reverse_geocode(&self, coords: Coordinates) -> String {
        let key = ProviderRequest::Geocode(coords).cache_key();
        let chain = self.geocode.clone();

        self.geocode_cache
            .get_or_fetch(key, self.ttl, move || async move { chain.run(&coords).await })
            .await
            .unwrap_or_else(|e| {
                tracing::info!("{}, answering with sentinel", e);
                UNKNOWN_LOCATION.to_string()
            })
    }

    /// Up to [`MAX_SEARCH_RESULTS`] candidates; empty when nothing matched.
    pub async fn search(&self, query: SearchQuery) -> Vec<Place> {
        let key = ProviderRequest::Search(query.clone()).cache_key();
        let chain = self.search.clone();

        let mut places = self
            .search_cache
            .get_or_fetch(key, self.ttl, move || async move { chain.run(&query).await })
            .await
            .unwrap_or_else(|e| {
                tracing::info!("{}, no candidates", e);
                Vec::new()
            });
        places.truncate(MAX_SEARCH_RESULTS);
        places
    }

    /// Locate a client. Unknown or non-public addresses get the default
    /// location without any upstream call.
    pub async fn locate(&self, client: Option<NetworkAddress>) -> IpLocation {
        let Some(addr) = client.filter(|a| classify(a).is_public()) else {
            tracing::debug!("no public client address, using default location");
            return IpLocation::fallback();
        };

        let key = ProviderRequest::IpLocate(addr.clone()).cache_key();
        let chain = self.ip_locate.clone();

        self.ip_cache
            .get_or_fetch(key, self.ttl, move || async move { chain.run(&addr).await })
            .await
            .unwrap_or_else(|e| {
                tracing::info!("{}, using default location", e);
                IpLocation::fallback()
            })
    }

    /// Number of cached entries across all capabilities.
    pub fn cached_entries(&self) -> usize {
        self.geocode_cache.len() + self.search_cache.len() + self.ip_cache.len()
    }

    /// Start expiry GC on every cache.
    pub fn start_gc(&self, interval: Duration, shutdown: &ShutdownController) {
        self.geocode_cache.start_gc(interval, shutdown.subscribe());
        self.search_cache.start_gc(interval, shutdown.subscribe());
        self.ip_cache.start_gc(interval, shutdown.subscribe());
    }
}
