//! Cache Store Module
//!
//! Single-threaded cache engine combining the key index with the recency
//! list and per-entry TTL bookkeeping. `Cache` wraps it in a lock.
//!
//! Operations that displace values hand them back to the caller instead of
//! dropping them, so a locked caller can drop them after releasing the lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tracing::{debug, trace};

use crate::cache::entry::{Entry, EntryId, Expiry};
use crate::cache::list::RecencyList;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// LRU storage with fixed capacity and optional per-entry expiry.
#[derive(Debug)]
pub(crate) struct CacheStore<K, V> {
    /// Key to arena slot
    index: HashMap<K, EntryId>,
    /// MRU→LRU ordering, owns the entries
    list: RecencyList<K, V>,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Number of entries with an armed TTL timer
    armed: usize,
    /// Source of unique TTL timer ids
    next_timer_id: u64,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` entries.
    ///
    /// Fails with `ZeroCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }

        Ok(Self {
            index: HashMap::with_capacity(capacity),
            list: RecencyList::with_capacity(capacity),
            capacity,
            armed: 0,
            next_timer_id: 0,
        })
    }

    /// Returns the number of stored entries, including expired ones that
    /// have not been purged yet. See `purge_expired`.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.list.len());
        self.index.len()
    }

    // == Add ==
    /// Stores a key-value pair as the most recently used entry.
    ///
    /// An existing key is updated in place and promoted; any pending TTL on
    /// it is cancelled. A new key is inserted at the front, evicting the
    /// least recently used entry first when the store is full.
    ///
    /// Returns the displaced value: the previous value on update, the
    /// evicted one on eviction.
    pub fn add(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&id) = self.index.get(&key) {
            let entry = self.list.get_mut(id)?;
            let previous = std::mem::replace(&mut entry.value, value);
            if entry.expiry.take().is_some() {
                self.armed -= 1;
            }
            self.list.promote(id);
            return Some(previous);
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let id = self.list.push_front(Entry::new(key.clone(), value));
        self.index.insert(key, id);
        evicted
    }

    /// Drops the tail entry to make room for a new key.
    fn evict_lru(&mut self) -> Option<V> {
        match self.list.evict_tail() {
            Ok(evicted) => {
                self.index.remove(&evicted.key);
                let had_ttl = evicted.expiry.is_some();
                if had_ttl {
                    self.armed -= 1;
                }
                debug!(capacity = self.capacity, had_ttl, "Evicted least recently used entry");
                Some(evicted.value)
            }
            Err(err) => unreachable!("{err} while the index holds {} keys", self.index.len()),
        }
    }

    // == Get ==
    /// Retrieves a value and marks its entry as most recently used.
    ///
    /// An entry past its TTL deadline is removed and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.live_id(key)?;
        self.list.promote(id);
        self.list.get(id).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Retrieves a value without touching the recency order.
    pub fn peek<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.live_id(key)?;
        self.list.get(id).map(|entry| &entry.value)
    }

    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_id(key).is_some()
    }

    // == Remove ==
    /// Removes an entry by key, returning its value.
    ///
    /// Removing an absent key is a no-op. A pending TTL timer is cancelled.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.remove(key)?;
        let entry = self.list.remove(id)?;
        if entry.expiry.is_some() {
            self.armed -= 1;
        }
        Some(entry.value)
    }

    // == Clear ==
    /// Removes every entry, cancels all pending TTL timers and returns the
    /// removed values.
    pub fn clear(&mut self) -> Vec<V> {
        let dropped = self.index.len();
        self.index.clear();
        self.armed = 0;
        let old = std::mem::replace(&mut self.list, RecencyList::with_capacity(self.capacity));
        debug!(dropped, "Cache cleared");
        old.into_values()
    }

    // == TTL ==
    /// Reserves an id for a timer that is about to be armed.
    pub fn next_timer_id(&mut self) -> u64 {
        self.next_timer_id = self.next_timer_id.wrapping_add(1);
        self.next_timer_id
    }

    /// Attaches a TTL timer to an existing entry, cancelling the one it
    /// replaces. Returns false if the key is absent; the expiry is then
    /// dropped and its timer aborted.
    pub fn arm<Q>(&mut self, key: &Q, expiry: Expiry) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        let Some(entry) = self.list.get_mut(id) else {
            return false;
        };

        trace!(timer_id = expiry.timer_id(), "Armed TTL timer");
        if entry.expiry.replace(expiry).is_none() {
            self.armed += 1;
        }
        true
    }

    /// Removes a key whose timer `timer_id` has fired, returning its value.
    ///
    /// Does nothing if the key is gone or its current timer is a different
    /// one, so a superseded timer never removes a newer value.
    pub fn expire<Q>(&mut self, key: &Q, timer_id: u64) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let armed = self.entry(key).and_then(Entry::timer_id);
        if armed != Some(timer_id) {
            trace!(timer_id, "Stale TTL timer ignored");
            return None;
        }

        debug!(timer_id, "Entry expired");
        self.remove(key)
    }

    /// Removes `key` if its TTL deadline has passed, returning its value.
    pub fn purge_if_expired<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.entry(key)?.is_expired() {
            return None;
        }
        debug!("Expired entry purged on access");
        self.remove(key)
    }

    /// Removes every entry past its TTL deadline, returning their values.
    ///
    /// Covers timers that fire late or never, e.g. when the runtime that
    /// armed them has shut down. Free when no TTL is armed.
    pub fn purge_expired(&mut self) -> Vec<V> {
        if self.armed == 0 {
            return Vec::new();
        }

        let expired: Vec<K> = self
            .list
            .iter()
            .filter(|entry| entry.is_expired())
            .map(|entry| entry.key.clone())
            .collect();
        if !expired.is_empty() {
            debug!(count = expired.len(), "Expired entries purged");
        }
        expired.iter().filter_map(|key| self.remove(key)).collect()
    }

    /// Returns the remaining TTL of a key, or None if it has no TTL.
    pub fn ttl_remaining<Q>(&mut self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.live_id(key)?;
        self.list.get(id).and_then(Entry::ttl_remaining)
    }

    // == Keys ==
    /// Returns all stored keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.list.iter().map(|entry| entry.key.clone()).collect()
    }

    /// Looks up a key, purging it first if its TTL has run out.
    fn live_id<Q>(&mut self, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.purge_if_expired(key);
        self.index.get(key).copied()
    }

    fn entry<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        self.list.get(id)
    }

    /// Panics if the index, the list, the capacity and the armed count
    /// disagree.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.list.check_invariants();
        assert_eq!(self.index.len(), self.list.len());
        assert!(self.index.len() <= self.capacity);
        for (key, id) in &self.index {
            let entry = self.list.get(*id).expect("index points at a free slot");
            assert!(entry.key == *key, "index and entry keys differ");
        }
        let armed = self.list.iter().filter(|entry| entry.expiry.is_some()).count();
        assert_eq!(armed, self.armed, "armed count out of sync");
    }
}
