//! Cache Statistics Module
//!
//! Read counters for a single cache store.

use serde::Serialize;

// == Cache Stats ==
/// Tracks how a store's reads were answered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads answered by a fresh entry
    pub hits: u64,
    /// Reads that found nothing fresh (absent, expired or malformed)
    pub misses: u64,
    /// Entries removed because they expired or could not be decoded
    pub evictions: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Adds `count` removed entries.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }

    /// Zeroes every counter, used when a store is cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
