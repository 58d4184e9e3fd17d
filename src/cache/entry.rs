//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload together with the time it was stored.
///
/// This is also the persisted wire shape: `{"data": ..., "timestamp": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry stamped at `now_ms`.
    pub fn new(data: T, now_ms: i64) -> Self {
        Self {
            data,
            timestamp: now_ms,
        }
    }

    // == Is Valid ==
    /// Checks whether the entry is still fresh.
    ///
    /// Boundary condition: an entry is valid while `now - timestamp < ttl`,
    /// so it is already stale at exactly `timestamp + ttl`. Validity is
    /// recomputed on every call, never cached.
    pub fn is_valid(&self, now_ms: i64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.timestamp) < ttl.as_millis() as i64
    }

    // == Is Expired ==
    /// Negation of [`CacheEntry::is_valid`].
    pub fn is_expired(&self, now_ms: i64, ttl: Duration) -> bool {
        !self.is_valid(now_ms, ttl)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_entry_fresh_right_after_creation() {
        let entry = CacheEntry::new("value", 1_000);
        assert!(entry.is_valid(1_000, TTL));
        assert!(!entry.is_expired(1_000, TTL));
    }

    #[test]
    fn test_entry_valid_until_just_before_ttl() {
        let entry = CacheEntry::new("value", 0);
        assert!(entry.is_valid(299_999, TTL));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("value", 0);
        assert!(entry.is_expired(300_000, TTL), "Entry should be expired at boundary");
    }

    #[test]
    fn test_entry_wire_shape() {
        let entry = CacheEntry::new(vec![1, 2, 3], 17);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"data":[1,2,3],"timestamp":17}"#);
    }

    #[test]
    fn test_entry_missing_timestamp_is_rejected() {
        let parsed = serde_json::from_str::<CacheEntry<Vec<u8>>>(r#"{"data":[1]}"#);
        assert!(parsed.is_err());
    }
}
