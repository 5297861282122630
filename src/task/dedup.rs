//! Time-bounded set of recently admitted task ids
//!
//! Entries expire lazily: a lookup never reports an entry older than the TTL,
//! and every admission sweeps expired entries once the map has grown past the
//! last sweep's size, so memory stays proportional to arrival rate × TTL.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Duplicate-suppression cache keyed by task id
pub struct DedupCache {
    ttl: Duration,
    inner: Mutex<Entries>,
}

struct Entries {
    seen: HashMap<String, Instant>,
    /// Map size after the last sweep; the next sweep waits until it doubles
    sweep_watermark: usize,
}

impl DedupCache {
    /// Create an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Entries {
                seen: HashMap::new(),
                sweep_watermark: 64,
            }),
        }
    }

    /// Returns true iff an unexpired entry exists for `task_id`
    pub fn contains(&self, task_id: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.inner.lock();
        entries.live(task_id, now, self.ttl)
    }

    /// Insert or refresh the entry for `task_id`
    pub fn admit(&self, task_id: &str) {
        let now = Instant::now();
        let mut entries = self.inner.lock();
        entries.insert(task_id, now, self.ttl);
    }

    /// Atomically admit `task_id` unless it is already present.
    ///
    /// Returns true if the id was admitted, false if it was a duplicate. An
    /// existing entry is not refreshed, so the window is measured from the
    /// first sighting.
    pub fn try_admit(&self, task_id: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.inner.lock();
        if entries.live(task_id, now, self.ttl) {
            return false;
        }
        entries.insert(task_id, now, self.ttl);
        true
    }

    /// Number of stored entries, including any not yet swept
    pub fn len(&self) -> usize {
        self.inner.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Entries {
    fn live(&mut self, task_id: &str, now: Instant, ttl: Duration) -> bool {
        match self.seen.get(task_id) {
            Some(first_seen) if now.duration_since(*first_seen) < ttl => true,
            Some(_) => {
                self.seen.remove(task_id);
                false
            }
            None => false,
        }
    }

    fn insert(&mut self, task_id: &str, now: Instant, ttl: Duration) {
        self.seen.insert(task_id.to_string(), now);

        if self.seen.len() >= self.sweep_watermark {
            self.seen
                .retain(|_, first_seen| now.duration_since(*first_seen) < ttl);
            self.sweep_watermark = (self.seen.len() * 2).max(64);
        }
    }
}
