//! Read-through caching around a fetch.

use std::future::Future;

use tracing::{debug, warn};

use crate::cache::{CacheKey, SharedStore};
use crate::error::{FetchError, Result};

/// Serves `key` from `store`, calling `fetch` on a miss.
///
/// A fetched value is written through. When `fetch` fails, the last value
/// stored under `key` is returned instead, however old; only with nothing
/// cached does the error reach the caller. An aborted fetch (`Ok(None)`)
/// leaves the store untouched.
pub(crate) async fn read_through<T, F, Fut>(
    store: &SharedStore<T>,
    key: &CacheKey,
    fetch: F,
) -> Result<Option<T>>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, FetchError>>,
{
    // The fallback is captured before `get`, which may drop an expired
    // persisted entry.
    let fallback = {
        let mut store = store.write().await;
        let fallback = store.entry(key.as_str());
        if let Some(hit) = store.get(key.as_str()) {
            debug!(%key, "cache hit");
            return Ok(Some(hit));
        }
        fallback
    };
    debug!(%key, "cache miss");

    match fetch().await {
        Ok(Some(value)) => {
            store.write().await.set(key.as_str(), value.clone());
            Ok(Some(value))
        }
        Ok(None) => Ok(None),
        Err(err) => match fallback {
            Some(stale) => {
                warn!(
                    %key,
                    error = %err,
                    stored_at = stale.timestamp,
                    "serving cached value after fetch failure"
                );
                Ok(Some(stale.data))
            }
            None => Err(err.into()),
        },
    }
}
