//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries, so entries
//! nobody reads again do not hold capacity until the next eviction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{duration_ms, CacheStore, Clock};

/// Shortest pause between sweeps; a zero interval would spin on the write lock.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task loops sleep-then-sweep, so a sweep never overlaps the previous
/// one. It holds the write lock only for the duration of a single sweep.
///
/// # Arguments
/// * `cache` - shared reference to the cache
/// * `interval` - time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(CacheStore::<String>::new(1000, Duration::from_secs(300))));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V, C>(cache: Arc<RwLock<CacheStore<V, C>>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    let interval = interval.max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        info!(interval_ms = duration_ms(interval), "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup()
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
