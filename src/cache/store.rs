//! Cache Store Module
//!
//! The store contract shared by every cache backend, and the in-memory TTL
//! store that implements it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats, SharedClock};

// == Cache Store Trait ==
/// Keyed, time-bounded cache of `T` values.
///
/// Validity (`now - timestamp < ttl`) is re-evaluated on every read.
pub trait CacheStore<T>: Send + Sync {
    /// Returns the value for `key` if its entry is still fresh.
    fn get(&mut self, key: &str) -> Option<T>;

    /// Returns the entry for `key` regardless of its age.
    ///
    /// Used for stale-on-error fallback, so expired entries are not dropped
    /// by this read.
    fn entry(&mut self, key: &str) -> Option<CacheEntry<T>>;

    /// Stores `value` under `key`, stamped with the current time.
    fn set(&mut self, key: &str, value: T);

    /// Removes a single entry, returning whether it existed.
    fn remove(&mut self, key: &str) -> bool;

    /// Snapshot of all fresh entries, in the store's own deterministic order.
    fn valid_entries(&self) -> Vec<(String, T)>;

    /// Removes every expired entry and returns how many were removed.
    fn purge_expired(&mut self) -> usize;

    /// Drops every entry and resets statistics.
    fn clear(&mut self);

    /// Number of stored entries, fresh or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats;

    /// Lifetime of an entry in this store.
    fn ttl(&self) -> Duration;
}

/// A store shared between the components that read and write it.
///
/// The lock is only ever held for synchronous store calls, never across a
/// network await.
pub type SharedStore<T> = Arc<RwLock<Box<dyn CacheStore<T>>>>;

/// Wraps a concrete store for sharing.
pub fn shared<T, S>(store: S) -> SharedStore<T>
where
    S: CacheStore<T> + 'static,
{
    Arc::new(RwLock::new(Box::new(store)))
}

// == TTL Store ==
/// In-memory TTL store.
///
/// No capacity bound and no LRU: an entry stops being served once it
/// expires and is dropped by `purge_expired` or `clear`. Iteration follows
/// first-insertion order; overwriting a key keeps its original position.
#[derive(Debug)]
pub struct TtlStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Keys in first-insertion order
    order: Vec<String>,
    ttl: Duration,
    clock: SharedClock,
    stats: CacheStats,
}

impl<T> TtlStore<T> {
    // == Constructor ==
    /// Creates an empty store whose entries live for `ttl`.
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            ttl,
            clock,
            stats: CacheStats::new(),
        }
    }

    fn drop_key(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    fn sync_total(&mut self) {
        self.stats.set_total_entries(self.entries.len());
    }
}

impl<T> CacheStore<T> for TtlStore<T>
where
    T: Clone + Send + Sync,
{
    // == Get ==
    /// Expired entries read as misses but stay in the map, so they remain
    /// available to [`CacheStore::entry`] until purged.
    fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();

        let fresh = self
            .entries
            .get(key)
            .filter(|entry| entry.is_valid(now, self.ttl))
            .map(|entry| entry.data.clone());

        if fresh.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        fresh
    }

    fn entry(&mut self, key: &str) -> Option<CacheEntry<T>> {
        self.entries.get(key).cloned()
    }

    // == Set ==
    fn set(&mut self, key: &str, value: T) {
        let entry = CacheEntry::new(value, self.clock.now_ms());
        if self.entries.insert(key.to_string(), entry).is_none() {
            self.order.push(key.to_string());
        }
        self.sync_total();
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.drop_key(key);
        self.sync_total();
        removed
    }

    fn valid_entries(&self) -> Vec<(String, T)> {
        let now = self.clock.now_ms();
        self.order
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .filter(|entry| entry.is_valid(now, self.ttl))
                    .map(|entry| (key.clone(), entry.data.clone()))
            })
            .collect()
    }

    // == Purge Expired ==
    fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let ttl = self.ttl;
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.drop_key(key);
        }

        self.stats.record_evictions(expired.len());
        self.sync_total();
        expired.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.reset();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
