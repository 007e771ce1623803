use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Time-boxed key/value cache injected into the benchmark engine.
///
/// A miss is always safe: callers recompute from the underlying source.
pub trait ReturnsCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn set(&self, key: &str, value: V, ttl: Duration);
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.stored_at + self.ttl
    }
}

/// Thread-safe TTL cache backed by a `DashMap`.
#[derive(Clone)]
pub struct TtlCache<V> {
    cache: Arc<DashMap<String, CacheEntry<V>>>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Drop entries whose TTL has passed.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.cache.retain(|_, entry| entry.is_live(now));
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Remove `key` only if its entry is still expired at `now`.
    fn evict_expired(&self, key: &str, now: DateTime<Utc>) {
        self.cache.remove_if(key, |_, entry| !entry.is_live(now));
    }
}

impl<V: Clone + Send + Sync> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> ReturnsCache<V> for TtlCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        if let Some(entry) = self.cache.get(key) {
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        }
        // the read guard is gone here; a concurrent set may have refreshed the key
        self.evict_expired(key, now);
        None
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        self.cache.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Utc::now(),
                ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stores_and_returns_values() {
        let cache: TtlCache<f64> = TtlCache::new();
        cache.set("benchmark_NIFTY 50 TRI", 0.18, Duration::hours(24));

        assert_eq!(cache.get("benchmark_NIFTY 50 TRI"), Some(0.18));
        assert_eq!(cache.get("benchmark_other"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache: TtlCache<f64> = TtlCache::new();
        cache.set("stale", 1.0, Duration::zero());

        assert_eq!(cache.get("stale"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_and_clear() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("a", 1, Duration::zero());
        cache.set("b", 2, Duration::hours(1));

        cache.cleanup_expired();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_keeps_a_refreshed_entry() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("k", 1, Duration::zero());
        let now = Utc::now();

        // a fresh value lands after the stale one was observed
        cache.set("k", 2, Duration::hours(1));
        cache.evict_expired("k", now);
        assert_eq!(cache.get("k"), Some(2));

        cache.evict_expired("k", now + Duration::hours(2));
        assert!(cache.is_empty());
    }
}
