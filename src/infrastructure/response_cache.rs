//! Response Cache with In-Flight Deduplication
//!
//! Bounded TTL cache in front of the provider chains. Concurrent misses for
//! the same key share one upstream call.
//!
//! Eviction is FIFO by insertion order; reads do not refresh an entry's
//! position. Failures are never stored.

use crate::domain::value_objects::CacheKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of stored entries.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

type Flight<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) < self.ttl
    }
}

/// Entries plus their insertion order. Guarded by a single mutex.
struct Store<T> {
    entries: HashMap<CacheKey, CacheEntry<T>>,
    order: VecDeque<CacheKey>,
    max_entries: usize,
}

impl<T: Clone> Store<T> {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Fresh value for `key`; drops the entry if it has expired.
    fn get_fresh(&mut self, key: &CacheKey, now: Instant) -> Option<T> {
        let fresh = self.entries.get(key).map(|e| e.is_fresh(now))?;
        if fresh {
            self.entries.get(key).map(|e| e.value.clone())
        } else {
            self.remove(key);
            None
        }
    }

    /// Insert as the newest entry, evicting the oldest when full.
    fn insert(&mut self, key: CacheKey, value: T, ttl: Duration) -> Option<CacheKey> {
        self.remove(&key);

        let mut evicted = None;
        while self.entries.len() >= self.max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted = Some(oldest);
        }

        self.order.push_back(key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
        evicted
    }

    fn remove(&mut self, key: &CacheKey) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_fresh(now));
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }
}

/// Cache of successful results keyed by [`CacheKey`].
///
/// Cloning is cheap and clones share state.
pub struct ResponseCache<T, E> {
    store: Arc<Mutex<Store<T>>>,
    in_flight: Arc<DashMap<CacheKey, Flight<T, E>>>,
}

impl<T, E> Clone for ResponseCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<T, E> ResponseCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `max_entries` values (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::new(max_entries))),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Return a live entry, if any. Expired entries are dropped.
    pub fn get(&self, key: &CacheKey) -> Option<T> {
        self.store.lock().get_fresh(key, Instant::now())
    }

    /// Store a value directly, bypassing the fetch path.
    pub fn insert(&self, key: CacheKey, value: T, ttl: Duration) {
        if let Some(evicted) = self.store.lock().insert(key, value, ttl) {
            tracing::debug!("cache full, evicted {}", evicted);
        }
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of upstream calls currently running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Drop all expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.store.lock().purge_expired(Instant::now())
    }

    /// Return the cached value for `key`, or run `fetch` once for all
    /// concurrent callers asking for the same key.
    ///
    /// A successful result is stored for `ttl`; a failure is handed to every
    /// waiting caller and then forgotten, so the next request retries.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, ttl: Duration, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if let Some(value) = self.get(&key) {
            tracing::debug!("cache hit for {}", key);
            return Ok(value);
        }

        let flight = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!("joining in-flight request for {}", key);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // Another caller may have finished between the lookup and here.
                if let Some(value) = self.get(&key) {
                    return Ok(value);
                }
                tracing::debug!("cache miss for {}, fetching", key);
                let flight = self.launch(key.clone(), ttl, fetch());
                entry.insert(flight.clone());
                flight
            }
        };

        flight.await
    }

    /// Wrap `fut` so that completion stores the result and clears the
    /// in-flight slot, then drive it on the runtime so it finishes even if
    /// every waiter goes away.
    fn launch<Fut>(&self, key: CacheKey, ttl: Duration, fut: Fut) -> Flight<T, E>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let store = self.store.clone();
        let in_flight = self.in_flight.clone();

        let flight = async move {
            let result = fut.await;
            match &result {
                Ok(value) => {
                    let evicted = store.lock().insert(key.clone(), value.clone(), ttl);
                    if let Some(evicted) = evicted {
                        tracing::debug!("cache full, evicted {}", evicted);
                    }
                }
                Err(_) => tracing::debug!("fetch for {} failed, not cached", key),
            }
            in_flight.remove(&key);
            result
        }
        .boxed()
        .shared();

        tokio::spawn(flight.clone());
        flight
    }

    /// Start the background task that purges expired entries.
    ///
    /// Stops when `shutdown` fires.
    pub fn start_gc(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let cache = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.purge_expired();
                        if removed > 0 {
                            tracing::debug!("cache GC removed {} expired entries", removed);
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("cache GC stopped");
                        break;
                    }
                }
            }
        });
    }
}
