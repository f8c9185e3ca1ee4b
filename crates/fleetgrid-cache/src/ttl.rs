//! TtlCache — concurrent key/value cache with per-entry expiry.
//!
//! Entries expire a fixed TTL after insertion. Expired entries are
//! treated as absent on read and removed lazily; `sweep()` removes the
//! rest. Values are never mutated in place: an update is always a new
//! insertion that replaces the previous entry.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe TTL cache keyed by `String`.
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a live entry. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.inserted_at.elapsed() < self.ttl).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => Some(value),
            Some(None) => {
                // Re-check under the shard lock; a fresh insert may have raced us.
                self.entries
                    .remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
                None
            }
            None => None,
        }
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.inserted_at.elapsed() < self.ttl)
    }

    /// Insert or replace an entry. The TTL restarts from now.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove an entry. Returns true if a live entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        self.entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.inserted_at.elapsed() < self.ttl)
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
