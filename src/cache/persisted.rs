//! Persisted Cache Store Module
//!
//! A TTL store whose entries live in [`SessionStorage`] as JSON text, so
//! they outlive any single fetch within the session.
//!
//! Entries are written under `"<namespace>_<key>"`. Reads are
//! self-healing: an entry that is missing a field, fails to parse, or has
//! expired is deleted from storage the first time `get` sees it.

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, CacheStore, SessionStorage, SharedClock};

/// Outcome of decoding one raw storage entry.
enum Decoded<T> {
    Missing,
    Corrupt,
    Entry(CacheEntry<T>),
}

// == Persisted Store ==
pub struct PersistedStore<T, S> {
    storage: S,
    namespace: String,
    ttl: Duration,
    clock: SharedClock,
    stats: CacheStats,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> std::fmt::Debug for PersistedStore<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<T, S> PersistedStore<T, S>
where
    T: Serialize + DeserializeOwned,
    S: SessionStorage,
{
    /// Creates a store over `storage`, namespacing its keys with `namespace`.
    pub fn new(storage: S, namespace: impl Into<String>, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
            ttl,
            clock,
            stats: CacheStats::new(),
            _marker: PhantomData,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Direct access to the backing storage, e.g. to share it with other
    /// session data.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // == Cleanup ==
    /// Removes every expired or unreadable entry in this namespace.
    ///
    /// Meant to run once when a consumer starts, not on every read; `get`
    /// guards against stale entries on its own.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;

        for raw_key in self.namespaced_keys() {
            let stale = match self.decode(&raw_key) {
                Decoded::Entry(entry) => entry.is_expired(now, self.ttl),
                Decoded::Corrupt => true,
                Decoded::Missing => false,
            };
            if stale {
                self.storage.remove_item(&raw_key);
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(namespace = %self.namespace, removed, "session cache cleanup");
        }
        self.stats.record_evictions(removed);
        removed
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}_{}", self.namespace, key)
    }

    fn prefix(&self) -> String {
        format!("{}_", self.namespace)
    }

    /// All storage keys belonging to this namespace, in storage order.
    fn namespaced_keys(&self) -> Vec<String> {
        let prefix = self.prefix();
        (0..self.storage.len())
            .filter_map(|i| self.storage.key(i))
            .filter(|k| k.starts_with(&prefix))
            .collect()
    }

    fn decode(&self, raw_key: &str) -> Decoded<T> {
        let Some(text) = self.storage.get_item(raw_key) else {
            return Decoded::Missing;
        };
        match serde_json::from_str::<CacheEntry<T>>(&text) {
            Ok(entry) => Decoded::Entry(entry),
            Err(err) => {
                warn!(key = raw_key, error = %err, "discarding malformed session cache entry");
                Decoded::Corrupt
            }
        }
    }

    fn evict(&mut self, raw_key: &str) {
        self.storage.remove_item(raw_key);
        self.stats.record_evictions(1);
    }
}

impl<T, S> CacheStore<T> for PersistedStore<T, S>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
    S: SessionStorage,
{
    fn get(&mut self, key: &str) -> Option<T> {
        let raw_key = self.storage_key(key);
        let now = self.clock.now_ms();

        let value = match self.decode(&raw_key) {
            Decoded::Missing => None,
            Decoded::Corrupt => {
                self.evict(&raw_key);
                None
            }
            Decoded::Entry(entry) if entry.is_expired(now, self.ttl) => {
                debug!(key = %raw_key, "removing expired session cache entry");
                self.evict(&raw_key);
                None
            }
            Decoded::Entry(entry) => Some(entry.data),
        };

        if value.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        value
    }

    fn entry(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let raw_key = self.storage_key(key);
        match self.decode(&raw_key) {
            Decoded::Entry(entry) => Some(entry),
            Decoded::Corrupt => {
                self.evict(&raw_key);
                None
            }
            Decoded::Missing => None,
        }
    }

    // == Set ==
    /// A failed write is logged and dropped; it never reaches the caller.
    fn set(&mut self, key: &str, value: T) {
        let raw_key = self.storage_key(key);
        let entry = CacheEntry::new(&value, self.clock.now_ms());

        let text = match serde_json::to_string(&entry) {
            Ok(text) => text,
            Err(err) => {
                warn!(key = %raw_key, error = %err, "failed to serialize session cache entry");
                return;
            }
        };

        if let Err(err) = self.storage.set_item(&raw_key, text) {
            warn!(key = %raw_key, error = %err, "failed to write session cache entry");
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        let raw_key = self.storage_key(key);
        let existed = self.storage.get_item(&raw_key).is_some();
        self.storage.remove_item(&raw_key);
        existed
    }

    fn valid_entries(&self) -> Vec<(String, T)> {
        let now = self.clock.now_ms();
        let prefix_len = self.prefix().len();

        self.namespaced_keys()
            .into_iter()
            .filter_map(|raw_key| match self.decode(&raw_key) {
                Decoded::Entry(entry) if entry.is_valid(now, self.ttl) => {
                    Some((raw_key[prefix_len..].to_string(), entry.data))
                }
                _ => None,
            })
            .collect()
    }

    fn purge_expired(&mut self) -> usize {
        self.cleanup()
    }

    /// Removes only this namespace's keys; unrelated session data stays.
    fn clear(&mut self) {
        for raw_key in self.namespaced_keys() {
            self.storage.remove_item(&raw_key);
        }
        self.stats.reset();
    }

    fn len(&self) -> usize {
        self.namespaced_keys().len()
    }

    fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
