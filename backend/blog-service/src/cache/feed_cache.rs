use actix_web::web::Bytes;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::Result;
use crate::metrics::feed::FEED_CACHE_EVENTS;

/// Fixed key of the single cached home page.
pub const INDEX_PAGE_KEY: &str = "index_page";

/// Default staleness bound for the cached home page.
pub const DEFAULT_TTL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
struct CachedEntry {
    body: Bytes,
    expires_at: Instant,
}

impl CachedEntry {
    #[inline]
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-wide cache of the rendered home page.
///
/// One entry, not keyed by user or page. Readers get the stored bytes until
/// the TTL runs out or `invalidate()` is called. Two concurrent misses may
/// both compute; the later write wins. A page computed across an
/// `invalidate()` is returned to its caller but never stored.
pub struct FeedCache {
    store: DashMap<&'static str, CachedEntry>,
    ttl: Duration,
    /// Bumped by every `invalidate()`.
    generation: AtomicU64,
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl FeedCache {
    /// A zero TTL disables caching: every call computes.
    pub fn new(ttl: Duration) -> Self {
        debug!(ttl_secs = ttl.as_secs_f64(), "Initializing home page cache");
        Self {
            store: DashMap::new(),
            ttl,
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached page if present and unexpired.
    pub fn get(&self) -> Option<Bytes> {
        // Guard must be released before remove_if touches the same shard.
        let fresh = self
            .store
            .get(INDEX_PAGE_KEY)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.body.clone());

        if fresh.is_none() {
            self.store
                .remove_if(INDEX_PAGE_KEY, |_, entry| entry.is_expired());
        }
        fresh
    }

    pub fn put(&self, body: Bytes) {
        if self.ttl.is_zero() {
            return;
        }
        self.store.insert(
            INDEX_PAGE_KEY,
            CachedEntry {
                body,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Serve the cached page, or compute, store and return a fresh one.
    /// A failed computation leaves the cache untouched.
    pub async fn get_or_compute<F, Fut>(&self, compute: F) -> Result<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        if let Some(body) = self.get() {
            FEED_CACHE_EVENTS.with_label_values(&["hit"]).inc();
            debug!(key = INDEX_PAGE_KEY, "home page cache HIT");
            return Ok(body);
        }

        FEED_CACHE_EVENTS.with_label_values(&["miss"]).inc();
        debug!(key = INDEX_PAGE_KEY, "home page cache MISS");

        let generation = self.generation.load(Ordering::Acquire);
        let body = compute().await?;
        if self.generation.load(Ordering::Acquire) == generation {
            self.put(body.clone());
        } else {
            debug!(key = INDEX_PAGE_KEY, "home page invalidated during compute, not stored");
        }
        Ok(body)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if self.store.remove(INDEX_PAGE_KEY).is_some() {
            debug!(key = INDEX_PAGE_KEY, "home page cache INVALIDATE");
        }
        FEED_CACHE_EVENTS.with_label_values(&["invalidate"]).inc();
    }
}
