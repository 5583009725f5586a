//! Expiry Sweep Task
//!
//! Background task that periodically removes expired parameter entries from
//! both tiers, so entries nobody reads again do not linger until the next read.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::param::ParamCache;

/// Spawns a background task that periodically purges expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let sweep_handle = spawn_sweep_task(cache.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: Arc<ParamCache>, sweep_interval_secs: u64) -> JoinHandle<()> {
    spawn_sweep_every(cache, Duration::from_secs(sweep_interval_secs))
}

/// Same as [`spawn_sweep_task`] with an arbitrary interval.
pub fn spawn_sweep_every(cache: Arc<ParamCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
