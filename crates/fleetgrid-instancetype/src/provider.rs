//! InstanceTypeProvider — resolves the launchable instance types for a
//! (kubelet configuration, node template) pair.
//!
//! Holds three caches, all expiring on the same TTL:
//!
//! - the catalog (one entry)
//! - zone maps (one entry per distinct subnet selector)
//! - resolved lists (one entry per composite key)
//!
//! Cached values are `Arc`s and never mutated; any input change yields a
//! new composite key and a fresh computation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use fleetgrid_cache::{TtlCache, UnavailableOfferings, run_sweeper};
use fleetgrid_core::{
    KubeletConfiguration, NodeTemplate, ProbeError, Settings, ZoneSet, content_hash,
};

use crate::api::{ComputeApi, PricingFeed, SubnetResolver};
use crate::capacity::ResolvedInstanceType;
use crate::catalog::CatalogCache;
use crate::error::InstanceTypeResult;
use crate::offering::compose_offerings;
use crate::zones::ZoneMapCache;

pub struct InstanceTypeProvider {
    catalog: CatalogCache,
    zones: ZoneMapCache,
    resolved: TtlCache<Arc<Vec<ResolvedInstanceType>>>,
    resolver: Arc<dyn SubnetResolver>,
    pricing: Arc<dyn PricingFeed>,
    unavailable: Arc<UnavailableOfferings>,
}

impl InstanceTypeProvider {
    pub fn new(
        api: Arc<dyn ComputeApi>,
        resolver: Arc<dyn SubnetResolver>,
        pricing: Arc<dyn PricingFeed>,
        unavailable: Arc<UnavailableOfferings>,
        settings: &Settings,
    ) -> Self {
        Self {
            catalog: CatalogCache::new(Arc::clone(&api), settings.cache_ttl, settings.api_timeout),
            zones: ZoneMapCache::new(
                api,
                Arc::clone(&resolver),
                settings.cache_ttl,
                settings.api_timeout,
            ),
            resolved: TtlCache::new(settings.cache_ttl),
            resolver,
            pricing,
            unavailable,
        }
    }

    /// Every catalog instance type with its offerings for this template.
    ///
    /// Types with no orderable zone are included with no offerings.
    /// Catalog and zone-resolution failures abort the call and cache
    /// nothing.
    pub async fn resolve(
        &self,
        kubelet: &KubeletConfiguration,
        template: &NodeTemplate,
    ) -> InstanceTypeResult<Arc<Vec<ResolvedInstanceType>>> {
        let catalog = self.catalog.get_catalog().await?;
        let zone_map = self.zones.get_zone_map(template).await?;

        let key = resolved_cache_key(
            catalog.seq_num,
            self.unavailable.seq_num(),
            &template.uid,
            zone_map.hash,
            content_hash(kubelet)?,
        );
        if let Some(cached) = self.resolved.get(&key) {
            return Ok(cached);
        }

        let no_zones = ZoneSet::new();
        let instance_types: Vec<ResolvedInstanceType> = catalog
            .instance_types
            .values()
            .map(|record| {
                let zones = zone_map.zones(&record.instance_type).unwrap_or(&no_zones);
                let offerings =
                    compose_offerings(record, zones, &self.unavailable, self.pricing.as_ref());
                ResolvedInstanceType::new(record, kubelet, offerings)
            })
            .collect();

        debug!(
            template = %template.name,
            instance_types = instance_types.len(),
            %key,
            "resolved instance types"
        );

        let instance_types = Arc::new(instance_types);
        self.resolved.insert(key, Arc::clone(&instance_types));
        Ok(instance_types)
    }

    /// Liveness of the subnet resolver and the pricing feed, in that order.
    pub fn check_liveness(&self) -> Result<(), ProbeError> {
        self.resolver.liveness_probe()?;
        self.pricing.liveness_probe()?;
        Ok(())
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn zones(&self) -> &ZoneMapCache {
        &self.zones
    }

    /// Evict expired entries from every cache. Returns the number evicted.
    pub fn sweep(&self) -> usize {
        self.catalog.sweep() + self.zones.sweep() + self.resolved.sweep()
    }

    /// Sweep on a fixed interval until the shutdown signal fires.
    pub async fn run_cleanup(&self, interval: Duration, shutdown: watch::Receiver<bool>) {
        run_sweeper("instance-types", interval, shutdown, || self.sweep()).await;
    }
}

/// Composite key for a resolved list. Equal keys mean the cached list is
/// still valid; any differing component forces recomputation.
fn resolved_cache_key(
    catalog_seq_num: u64,
    unavailable_seq_num: u64,
    template_uid: &str,
    zones_hash: u64,
    kubelet_hash: u64,
) -> String {
    format!("{catalog_seq_num}-{unavailable_seq_num}-{template_uid}-{zones_hash:016x}-{kubelet_hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_layout() {
        assert_eq!(
            resolved_cache_key(3, 7, "uid-1", 0xabc, 0x1),
            "3-7-uid-1-0000000000000abc-0000000000000001"
        );
    }

    #[test]
    fn every_component_changes_the_key() {
        let base = resolved_cache_key(1, 1, "a", 1, 1);
        assert_ne!(base, resolved_cache_key(2, 1, "a", 1, 1));
        assert_ne!(base, resolved_cache_key(1, 2, "a", 1, 1));
        assert_ne!(base, resolved_cache_key(1, 1, "b", 1, 1));
        assert_ne!(base, resolved_cache_key(1, 1, "a", 2, 1));
        assert_ne!(base, resolved_cache_key(1, 1, "a", 1, 2));
    }
}
