//! Cache Module
//!
//! TTL caches that sit between catalog consumers and the network: an
//! in-memory store, a session-persisted store, and the keys and clock they
//! share.

mod clock;
mod entry;
mod key;
mod persisted;
mod stats;
mod storage;
mod store;


// Re-export public types
pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use entry::CacheEntry;
pub use key::CacheKey;
pub use persisted::PersistedStore;
pub use stats::CacheStats;
pub use storage::{MemoryStorage, SessionStorage, StorageError, DEFAULT_QUOTA_BYTES};
pub use store::{shared, CacheStore, SharedStore, TtlStore};

// == Public Constants ==
/// Lifetime of an in-memory cache entry (5 minutes)
pub const CACHE_DURATION: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Lifetime of a session-persisted cache entry (1 hour)
pub const SESSION_CACHE_DURATION: std::time::Duration = std::time::Duration::from_secs(60 * 60);
