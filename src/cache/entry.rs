//! Cache Entry Module
//!
//! Defines the recency-list node for a single key and its optional TTL timer.

use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

// == Entry Id ==
/// Stable handle of an entry slot inside the recency list arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EntryId(pub(crate) usize);

// == Expiry ==
/// A pending TTL timer attached to an entry.
///
/// Dropping the expiry aborts the timer task. Every path that destroys an
/// entry or replaces its expiry therefore cancels the outstanding timer.
#[derive(Debug)]
pub(crate) struct Expiry {
    /// Identifies the timer task that owns this registration
    timer_id: u64,
    /// Instant at which the timer fires
    deadline: Instant,
    /// Handle used to cancel the timer task
    handle: AbortHandle,
}

impl Expiry {
    // == Constructor ==
    /// Records a timer armed now for `ttl`.
    pub fn new(timer_id: u64, ttl: Duration, handle: AbortHandle) -> Self {
        Self {
            timer_id,
            deadline: Instant::now() + ttl,
            handle,
        }
    }

    pub fn timer_id(&self) -> u64 {
        self.timer_id
    }

    // == Is Expired ==
    /// Checks whether the deadline has been reached.
    ///
    /// The timer task may not have run yet (or never will, if its runtime
    /// shut down), so readers check this before serving the entry.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    // == Time To Live ==
    /// Returns the time left before the timer fires, `Duration::ZERO` once
    /// the deadline has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

impl Drop for Expiry {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// == Entry ==
/// A key/value pair plus its links in the recency ordering.
///
/// `prev` points towards the most recently used end, `next` towards the
/// least recently used end. Links are only written by the recency list.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub key: K,
    pub value: V,
    pub(crate) prev: Option<EntryId>,
    pub(crate) next: Option<EntryId>,
    /// Pending TTL timer, if any
    pub(crate) expiry: Option<Expiry>,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates a detached entry without TTL.
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
            expiry: None,
        }
    }

    /// Returns the remaining TTL, or None if no timer is armed.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expiry.as_ref().map(Expiry::remaining)
    }

    /// Returns true if a timer is armed and its deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.expiry.as_ref().is_some_and(Expiry::is_expired)
    }

    /// Returns the id of the armed timer, if any.
    pub fn timer_id(&self) -> Option<u64> {
        self.expiry.as_ref().map(Expiry::timer_id)
    }
}
