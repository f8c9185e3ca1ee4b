//! UnavailableOfferings — short-lived record of offerings that recently
//! failed to launch with an insufficient-capacity error.
//!
//! The launch path writes entries; the instance-type resolver only reads
//! them. `seq_num` increments on every content change so readers can put
//! it in a cache key instead of hashing the whole set.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use fleetgrid_core::CapacityType;

use crate::sweeper::run_sweeper;
use crate::ttl::TtlCache;

pub struct UnavailableOfferings {
    entries: TtlCache<()>,
    seq_num: AtomicU64,
}

impl UnavailableOfferings {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: TtlCache::new(ttl),
            seq_num: AtomicU64::new(0),
        }
    }

    /// Current change counter. Only ever increases.
    pub fn seq_num(&self) -> u64 {
        self.seq_num.load(Ordering::Acquire)
    }

    pub fn is_unavailable(
        &self,
        instance_type: &str,
        zone: &str,
        capacity_type: CapacityType,
    ) -> bool {
        self.entries
            .contains(&offering_key(instance_type, zone, capacity_type))
    }

    /// Mask an offering for the configured TTL.
    pub fn mark_unavailable(
        &self,
        reason: &str,
        instance_type: &str,
        zone: &str,
        capacity_type: CapacityType,
    ) {
        debug!(
            %reason,
            %instance_type,
            %zone,
            %capacity_type,
            ttl_secs = self.entries.ttl().as_secs(),
            "removing offering from offerings"
        );
        self.entries
            .insert(offering_key(instance_type, zone, capacity_type), ());
        self.seq_num.fetch_add(1, Ordering::AcqRel);
    }

    /// Clear a mask early. Returns true if one was present.
    pub fn delete(&self, instance_type: &str, zone: &str, capacity_type: CapacityType) -> bool {
        let removed = self
            .entries
            .remove(&offering_key(instance_type, zone, capacity_type));
        if removed {
            self.seq_num.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }

    /// Evict expired masks. Bumps `seq_num` once if anything was evicted.
    pub fn sweep(&self) -> usize {
        let evicted = self.entries.sweep();
        if evicted > 0 {
            self.seq_num.fetch_add(1, Ordering::AcqRel);
        }
        evicted
    }

    /// Sweep on a fixed interval until the shutdown signal fires.
    pub async fn run_sweeper(&self, interval: Duration, shutdown: watch::Receiver<bool>) {
        run_sweeper("unavailable-offerings", interval, shutdown, || self.sweep()).await;
    }
}

fn offering_key(instance_type: &str, zone: &str, capacity_type: CapacityType) -> String {
    format!("{capacity_type}:{instance_type}:{zone}")
}
