//! In-memory cache for name resolutions.
//!
//! Only successful lookups are stored. Entries expire lazily on read once
//! their TTL has passed; capacity is bounded with LRU eviction.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::resolver::Resolution;

struct CachedResolution {
    resolution: Resolution,
    inserted_at: Instant,
}

/// Counters for the resolution cache.
#[derive(Default)]
pub struct ResolutionCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    /// Entries dropped because their TTL had passed.
    pub expired: AtomicU64,
    pub entry_count: AtomicU64,
}

impl ResolutionCacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// LRU + TTL cache keyed by the name exactly as the client sent it.
pub struct ResolutionCache {
    cache: RwLock<LruCache<String, CachedResolution>>,
    ttl: Duration,
    stats: ResolutionCacheStats,
}

impl ResolutionCache {
    /// A `ttl_secs` of 0 disables caching.
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        tracing::info!(
            capacity = capacity.get(),
            ttl_secs = ttl_secs,
            "Resolution cache initialized"
        );

        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(ttl_secs),
            stats: ResolutionCacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn get(&self, name: &str) -> Option<Resolution> {
        if !self.is_enabled() {
            return None;
        }

        let mut cache = self.cache.write().await;
        let expired = match cache.get(name) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("kairos_resolver_cache_hits_total").increment(1);
                return Some(entry.resolution.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired && cache.pop(name).is_some() {
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
            self.stats.entry_count.fetch_sub(1, Ordering::Relaxed);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("kairos_resolver_cache_misses_total").increment(1);
        None
    }

    pub async fn put(&self, name: &str, resolution: Resolution) {
        if !self.is_enabled() {
            return;
        }

        let entry = CachedResolution {
            resolution,
            inserted_at: Instant::now(),
        };

        // push hands back the replaced or evicted entry; either way the
        // count is unchanged.
        let mut cache = self.cache.write().await;
        if cache.push(name.to_string(), entry).is_none() {
            self.stats.entry_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> &ResolutionCacheStats {
        &self.stats
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
        self.stats.entry_count.store(0, Ordering::Relaxed);
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}
