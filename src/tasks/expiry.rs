//! TTL Expiry Task
//!
//! One-shot background timer that removes a cache entry once its TTL has
//! elapsed.

use std::hash::Hash;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::cache::CacheStore;

/// Spawns a timer that expires `key` after `ttl`.
///
/// The task sleeps without holding the lock and only locks the store to
/// remove the entry. It does nothing if the cache has been dropped or if
/// `timer_id` is no longer the entry's armed timer (re-armed, overwritten,
/// removed or evicted in the meantime).
///
/// # Arguments
/// * `runtime` - Runtime the timer runs on
/// * `store` - Weak reference to the locked store
/// * `key` - Key to expire
/// * `timer_id` - Id recorded in the entry's expiry
/// * `ttl` - Delay before firing
///
/// # Returns
/// A JoinHandle whose abort handle cancels the timer.
pub(crate) fn spawn_expiry_timer<K, V>(
    runtime: &Handle,
    store: Weak<Mutex<CacheStore<K, V>>>,
    key: K,
    timer_id: u64,
    ttl: Duration,
) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    runtime.spawn(async move {
        tokio::time::sleep(ttl).await;

        let Some(store) = store.upgrade() else {
            trace!(timer_id, "Cache dropped before TTL fired");
            return;
        };
        // The guard is released at the end of the statement, before the
        // expired value is dropped
        let expired = store.lock().expire(&key, timer_id);
        trace!(timer_id, expired = expired.is_some(), "TTL timer fired");
    })
}
