//! Expired-Entry Sweep Task
//!
//! Background task that periodically removes expired cache entries.
//! Expiry is always re-checked on read, so the sweeper only reclaims memory
//! and durable space earlier than lazy expiry would.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{Clock, Store};

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep takes a short write lock on the store.
///
/// # Arguments
/// * `store` - Shared store handle, from [`FetchCache::store`](crate::fetch::FetchCache::store)
/// * `clock` - Time source shared with the cache
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_sweep_task(
    store: Arc<RwLock<Store>>,
    clock: Arc<dyn Clock>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expired-entry sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut store = store.write();
                store.purge_expired(clock.now_ms())
            };

            if removed > 0 {
                info!("sweep: removed {} expired entries", removed);
            } else {
                debug!("sweep: no expired entries found");
            }
        }
    })
}
