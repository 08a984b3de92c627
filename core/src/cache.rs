//! Time-to-live cache with size-bounded eviction.
//!
//! Timestamps come from [`tokio::time::Instant`] so expiry follows the
//! runtime clock, which tests can pause and advance.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// Default entry lifetime.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum number of entries kept after [`TtlCache::cleanup`].
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// A value together with the moment it was stored.
#[derive(Debug, Clone)]
struct CachedItem<V> {
    value: V,
    timestamp: Instant,
}

/// Key/value store whose entries expire after a fixed timeout.
///
/// An entry is fresh while `now - timestamp <= timeout`. Expired entries are
/// never returned and are evicted on the lookup that finds them.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CachedItem<V>>,
    timeout: Duration,
    max_size: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(timeout: Duration, max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            timeout,
            max_size,
        }
    }

    fn is_expired(&self, item: &CachedItem<V>, now: Instant) -> bool {
        now.duration_since(item.timestamp) > self.timeout
    }

    /// Get a fresh value, evicting the entry if it has expired.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = Instant::now();
        let item = self.entries.get(key)?;
        if self.is_expired(item, now) {
            self.entries.remove(key);
            return None;
        }
        Some(item.value.clone())
    }

    /// Store a value stamped with the current time, replacing any prior entry.
    pub fn set(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            CachedItem {
                value,
                timestamp: Instant::now(),
            },
        );
    }

    /// Same freshness check as [`TtlCache::get`] without cloning the value.
    pub fn has(&mut self, key: &K) -> bool {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(item) => self.is_expired(item, now),
            None => return false,
        };
        if expired {
            self.entries.remove(key);
        }
        !expired
    }

    pub fn delete(&mut self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Evict expired entries, then the oldest ones until at most `max_size` remain.
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        let timeout = self.timeout;
        self.entries
            .retain(|_, item| now.duration_since(item.timestamp) <= timeout);

        if self.entries.len() <= self.max_size {
            return;
        }

        let mut by_age: Vec<(K, Instant)> = self
            .entries
            .iter()
            .map(|(k, item)| (k.clone(), item.timestamp))
            .collect();
        by_age.sort_by_key(|(_, timestamp)| *timestamp);

        let excess = self.entries.len() - self.max_size;
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
    }

    /// Number of stored entries, including ones that have expired but not
    /// been evicted yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_MAX_SIZE)
    }
}
