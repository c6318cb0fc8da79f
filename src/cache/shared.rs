//! Shared Cache Module
//!
//! Thread-safe handle over `CacheStore`. Every operation, reads included,
//! goes through one exclusive lock: a hit on `get` reorders the recency
//! list, so a shared read lock would not be sound here.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::cache::{CacheStore, Expiry};
use crate::error::{CacheError, Result};
use crate::tasks::spawn_expiry_timer;

// == Cache ==
/// Fixed-capacity LRU cache with optional per-entry TTL.
///
/// Cloning the handle shares the same underlying cache. Pending TTL timers
/// hold only a weak reference, so dropping the last handle frees the cache
/// and cancels every outstanding timer.
///
/// Expired entries are also purged on access, so a key never outlives its
/// TTL even if its timer fires late or its runtime has shut down. Values
/// that are replaced, removed, evicted or expired are dropped after the
/// lock is released, so a value's `Drop` may call back into the cache.
///
/// # Example
/// ```
/// use ttl_lru_cache::Cache;
///
/// let cache = Cache::new(2).unwrap();
/// cache.add(1, "a");
/// cache.add(2, "b");
/// assert_eq!(cache.get(&1), Some("a"));
///
/// cache.add(3, "c");
/// assert_eq!(cache.get(&2), None);
/// assert_eq!(cache.len(), 2);
/// ```
pub struct Cache<K, V> {
    store: Arc<Mutex<CacheStore<K, V>>>,
    capacity: usize,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// Fails with `CacheError::ZeroCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        let store = CacheStore::new(capacity)?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            capacity,
        })
    }

    /// Returns the configured capacity.
    pub fn cap(&self) -> usize {
        self.capacity
    }

    /// Returns the current number of live entries.
    pub fn len(&self) -> usize {
        let (len, expired) = {
            let mut store = self.store.lock();
            let expired = store.purge_expired();
            (store.len(), expired)
        };
        drop(expired);
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry and cancels all pending TTL timers.
    pub fn clear(&self) {
        let cleared = self.store.lock().clear();
        drop(cleared);
    }

    // == Add ==
    /// Inserts or updates a key as the most recently used entry.
    ///
    /// Updating a key that has a pending TTL cancels that TTL; the new value
    /// lives until removed or evicted.
    pub fn add(&self, key: K, value: V) {
        let displaced = self.store.lock().add(key, value);
        drop(displaced);
    }

    // == Add With TTL ==
    /// Inserts or updates a key and removes it automatically after `ttl`.
    ///
    /// A TTL already pending for the key is cancelled first, so the last
    /// call wins and expiry is timed from it. Must be called from within a
    /// tokio runtime; fails with `NoRuntime` otherwise and with `ZeroTtl`
    /// for a zero duration. The cache is left untouched on error.
    pub fn add_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::ZeroTtl);
        }
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let mut store = self.store.lock();
        let displaced = store.add(key.clone(), value);

        // The timer cannot observe the store before the lock is released,
        // by which point its expiry has been recorded.
        let timer_id = store.next_timer_id();
        let task = spawn_expiry_timer(
            &runtime,
            Arc::downgrade(&self.store),
            key.clone(),
            timer_id,
            ttl,
        );
        store.arm(&key, Expiry::new(timer_id, ttl, task.abort_handle()));
        drop(store);
        drop(displaced);
        Ok(())
    }

    // == Remove ==
    /// Removes a key; absent keys are ignored.
    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.store.lock().remove(key);
        drop(removed);
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (found, expired) = {
            let mut store = self.store.lock();
            let expired = store.purge_if_expired(key);
            (store.contains_key(key), expired)
        };
        drop(expired);
        found
    }

    /// Returns the remaining TTL of a key, or None if absent or without TTL.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (remaining, expired) = {
            let mut store = self.store.lock();
            let expired = store.purge_if_expired(key);
            (store.ttl_remaining(key), expired)
        };
        drop(expired);
        remaining
    }

    /// Returns all live keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        let (keys, expired) = {
            let mut store = self.store.lock();
            let expired = store.purge_expired();
            (store.keys(), expired)
        };
        drop(expired);
        keys
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Get ==
    /// Returns a copy of the value and promotes the entry to most recently
    /// used, or None on a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (value, expired) = {
            let mut store = self.store.lock();
            let expired = store.purge_if_expired(key);
            (store.get(key).cloned(), expired)
        };
        drop(expired);
        value
    }

    /// Like `get` but leaves the recency order untouched.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (value, expired) = {
            let mut store = self.store.lock();
            let expired = store.purge_if_expired(key);
            (store.peek(key).cloned(), expired)
        };
        drop(expired);
        value
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            capacity: self.capacity,
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
