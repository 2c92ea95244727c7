//! Weather Service
//!
//! Live forecasts go through a one-stage chain and the shaper, and are
//! cached. Without a provider token a synthetic report is returned instead;
//! it is never cached so configuring a token takes effect immediately.

use crate::application::fallback_chain::{ChainError, FallbackChain};
use crate::domain::entities::{ProviderRequest, WeatherReport};
use crate::domain::ports::Provider;
use crate::domain::services::weather_shaper::{shape, synthetic_report, ShapeError};
use crate::domain::value_objects::{Capability, Coordinates};
use crate::infrastructure::{ResponseCache, ShutdownController};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeatherError {
    #[error("weather provider failed: {0}")]
    Upstream(#[from] ChainError),

    #[error("weather payload could not be shaped: {0}")]
    Shaping(#[from] ShapeError),
}

pub struct WeatherService {
    chain: Option<Arc<FallbackChain<Coordinates, Value>>>,
    cache: ResponseCache<WeatherReport, WeatherError>,
    ttl: Duration,
}

impl WeatherService {
    /// Live service backed by `provider`.
    pub fn live(
        provider: Arc<dyn Provider<Coordinates, Value>>,
        timeout: Duration,
        ttl: Duration,
        max_entries: usize,
    ) -> Self {
        let chain = FallbackChain::new(Capability::Weather, timeout).with_stage(provider);
        Self {
            chain: Some(Arc::new(chain)),
            cache: ResponseCache::new(max_entries),
            ttl,
        }
    }

    /// Service that always answers with the synthetic report.
    pub fn synthetic() -> Self {
        Self {
            chain: None,
            cache: ResponseCache::new(1),
            ttl: Duration::ZERO,
        }
    }

    pub fn is_live(&self) -> bool {
        self.chain.is_some()
    }

    /// Forecast for `coords`. Provider failures are returned, not masked.
    pub async fn report(&self, coords: Coordinates) -> Result<WeatherReport, WeatherError> {
        let Some(chain) = self.chain.clone() else {
            tracing::debug!("no weather token configured, serving synthetic report");
            return Ok(synthetic_report());
        };

        let key = ProviderRequest::Weather(coords).cache_key();
        self.cache
            .get_or_fetch(key, self.ttl, move || async move {
                let raw = chain.run(&coords).await?;
                Ok::<_, WeatherError>(shape(&raw, coords.lng, Utc::now())?)
            })
            .await
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn start_gc(&self, interval: Duration, shutdown: &ShutdownController) {
        if self.is_live() {
            self.cache.start_gc(interval, shutdown.subscribe());
        }
    }
}
