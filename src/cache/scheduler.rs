//! Expiry Scheduler Module
//!
//! Per-key eviction timers. At most one live timer exists for a key; arming
//! again cancels and replaces it.

use std::collections::HashMap;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::CacheKey;
use crate::tasks::spawn_expiry_timer;

/// Generation id of an armed timer.
pub type TimerId = u64;

// == Pending Timer ==
#[derive(Debug)]
struct PendingTimer {
    id: TimerId,
    /// `None` when the deadline is beyond what the clock can represent
    deadline: Option<Instant>,
    handle: JoinHandle<()>,
}

// == Expiry Scheduler ==
/// Tracks outstanding eviction timers keyed by request identity.
#[derive(Debug, Default)]
pub struct ExpiryScheduler {
    timers: HashMap<CacheKey, PendingTimer>,
    next_id: TimerId,
}

impl ExpiryScheduler {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Arm ==
    /// Cancels any timer for `key`, then schedules `on_expire` after `ttl`.
    ///
    /// `on_expire` receives the id of the timer that fired so it can check
    /// with [`ExpiryScheduler::complete`] that it is still the live timer.
    /// A zero `ttl`, or the absence of an async runtime, leaves the key
    /// without a timer. Returns the id of the armed timer, if any.
    pub fn arm<F>(&mut self, key: CacheKey, ttl: Duration, on_expire: F) -> Option<TimerId>
    where
        F: FnOnce(TimerId) + Send + 'static,
    {
        self.cancel(&key);

        if ttl.is_zero() {
            return None;
        }

        self.next_id += 1;
        let id = self.next_id;
        let handle = spawn_expiry_timer(ttl, move || on_expire(id))?;

        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        debug!(key = %key, ttl_ms, timer = id, "Armed expiry timer");
        self.timers.insert(
            key,
            PendingTimer {
                id,
                deadline: Instant::now().checked_add(ttl),
                handle,
            },
        );

        Some(id)
    }

    // == Cancel ==
    /// Cancels the timer for `key`. Returns true if one was outstanding.
    pub fn cancel(&mut self, key: &CacheKey) -> bool {
        match self.timers.remove(key) {
            Some(timer) => {
                timer.handle.abort();
                debug!(key = %key, timer = timer.id, "Canceled expiry timer");
                true
            }
            None => false,
        }
    }

    // == Cancel All ==
    /// Cancels every outstanding timer. Returns how many were canceled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
        count
    }

    // == Complete ==
    /// Drops the bookkeeping for a fired timer.
    ///
    /// Returns false when `id` is no longer the live timer for `key`, in
    /// which case the caller must not evict anything.
    pub fn complete(&mut self, key: &CacheKey, id: TimerId) -> bool {
        match self.timers.get(key) {
            Some(timer) if timer.id == id => {
                self.timers.remove(key);
                true
            }
            _ => false,
        }
    }

    // == Deadline ==
    /// Instant at which the timer for `key` fires.
    ///
    /// `None` also for a timer so far out that it never fires in practice.
    pub fn deadline(&self, key: &CacheKey) -> Option<Instant> {
        self.timers.get(key).and_then(|timer| timer.deadline)
    }

    // == Is Armed ==
    pub fn is_armed(&self, key: &CacheKey) -> bool {
        self.timers.contains_key(key)
    }

    // == Length ==
    /// Number of outstanding timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
