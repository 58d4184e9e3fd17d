//! Expired-entry cleanup task
//!
//! Background task that periodically sweeps the session-backed collection
//! store. In-memory stores keep their expired entries for stale fallback.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::catalog::Catalog;

/// Spawns a background task that runs [`Catalog::cleanup`] periodically.
///
/// The first pass runs immediately, so entries persisted by an earlier run
/// are swept at startup; later passes run every `cleanup_interval_secs`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(catalog: Arc<Catalog>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval(period);
        loop {
            // First tick completes immediately
            ticker.tick().await;

            let removed = catalog.cleanup().await;
            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}
