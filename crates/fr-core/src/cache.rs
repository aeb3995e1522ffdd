//! Bounded TTL cache.
//!
//! A plain key → value map where every entry remembers when it was last put.
//! Reads purge expired entries lazily; writes trim the map back to
//! `max_items` by dropping the oldest entries first. An empty value is a
//! valid cached value (negative caching), the cache does not distinguish it.
//!
//! # Thread safety
//!
//! Not thread-safe. Owners that share a cache across tasks wrap it in a mutex;
//! eviction happens inside `put`, so it stays atomic with the triggering write.

use std::hash::Hash;
use std::time::{Duration, Instant};

use ahash::AHashMap;

/// Size and lifetime limits for one [`TtlCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub max_items: usize,
    pub ttl: Duration,
}

struct Entry<V> {
    stored_at: Instant,
    value: V,
}

/// Key/value store with per-entry expiry and oldest-first eviction.
pub struct TtlCache<K, V> {
    entries: AHashMap<K, Entry<V>>,
    limits: CacheLimits,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(limits: CacheLimits) -> Self {
        Self {
            entries: AHashMap::new(),
            limits,
        }
    }

    /// Look up `key` against the wall clock.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert or refresh `key` against the wall clock.
    pub fn put(&mut self, key: K, value: V) {
        self.put_at(key, value, Instant::now());
    }

    /// Look up `key` as of `now`. An entry older than the TTL is removed and
    /// reported as a miss.
    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.stored_at) > self.limits.ttl {
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or overwrite `key` as of `now`, resetting its timestamp, then
    /// evict the oldest entries until at most `max_items` remain.
    pub fn put_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, Entry { stored_at: now, value });

        let overflow = self.entries.len().saturating_sub(self.limits.max_items);
        if overflow == 0 {
            return;
        }

        let mut by_age: Vec<(Instant, K)> =
            self.entries.iter().map(|(k, e)| (e.stored_at, k.clone())).collect();
        by_age.sort_by_key(|(stored_at, _)| *stored_at);
        for (_, k) in by_age.into_iter().take(overflow) {
            self.entries.remove(&k);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
