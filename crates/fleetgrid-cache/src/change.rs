//! ChangeMonitor — remembers the content digest last seen per key.
//!
//! Used to emit discovery logs only when provider data actually changed,
//! and to drive the catalog sequence number.

use dashmap::DashMap;
use serde::Serialize;
use tracing::warn;

use fleetgrid_core::content_digest;

struct Observed {
    /// `None` when the last value could not be hashed.
    digest: Option<String>,
    version: u64,
}

/// Outcome of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub changed: bool,
    /// Version of the content just observed. Starts at 1 and increases by
    /// one per content change; equal versions always mean equal content.
    pub version: u64,
}

#[derive(Default)]
pub struct ChangeMonitor {
    last_seen: DashMap<String, Observed>,
}

impl ChangeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `key`. The comparison and the version bump
    /// happen under the key's shard lock, so concurrent observers of the
    /// same content agree on one version.
    pub fn observe<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Observation {
        let digest = match content_digest(value) {
            Ok(digest) => Some(digest),
            Err(e) => {
                warn!(%key, error = %e, "change monitor could not hash value");
                None
            }
        };

        let mut entry = self
            .last_seen
            .entry(key.to_string())
            .or_insert_with(|| Observed {
                digest: None,
                version: 0,
            });
        let changed = entry.version == 0 || digest.is_none() || entry.digest != digest;
        if changed {
            entry.version += 1;
            entry.digest = digest;
        }
        Observation {
            changed,
            version: entry.version,
        }
    }

    /// Returns true on the first observation and whenever the content
    /// differs from the previous one.
    pub fn has_changed<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        self.observe(key, value).changed
    }

    /// Current version for `key`; 0 before the first observation.
    pub fn version(&self, key: &str) -> u64 {
        self.last_seen.get(key).map_or(0, |entry| entry.version)
    }
}
