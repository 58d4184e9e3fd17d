//! Session Storage Module
//!
//! A per-session key/value text store with browser `sessionStorage`
//! semantics, and its in-memory implementation.

use thiserror::Error;

/// Default capacity of a [`MemoryStorage`]: 5 MiB.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// == Storage Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The write would take the storage past its capacity
    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },
}

// == Session Storage Trait ==
/// Text key/value storage scoped to one session.
///
/// `key(index)` enumerates stored keys in an implementation-defined but
/// stable order for `0..len()`.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Stores `value`, failing when the storage is full.
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    fn remove_item(&mut self, key: &str);

    /// Name of the key at `index`, if any.
    fn key(&self, index: usize) -> Option<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Memory Storage ==
/// Insertion-ordered in-memory storage with a byte quota.
///
/// Usage is counted as the sum of key and value lengths in bytes.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    items: Vec<(String, String)>,
    quota: usize,
    used: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage that holds at most `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: Vec::new(),
            quota,
            used: 0,
        }
    }

    /// Bytes currently in use.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|(k, _)| k == key)
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.position(key).map(|i| self.items[i].1.clone())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let existing = self.position(key);
        let freed = existing.map_or(0, |i| self.items[i].0.len() + self.items[i].1.len());
        let needed = self.used - freed + key.len() + value.len();

        if needed > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed,
                quota: self.quota,
            });
        }

        match existing {
            Some(i) => self.items[i].1 = value,
            None => self.items.push((key.to_string(), value)),
        }
        self.used = needed;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) {
        if let Some(i) = self.position(key) {
            let (k, v) = self.items.remove(i);
            self.used -= k.len() + v.len();
        }
    }

    fn key(&self, index: usize) -> Option<String> {
        self.items.get(index).map(|(k, _)| k.clone())
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
