//! ZoneMapCache — per subnet selector, the zones each instance type can
//! be ordered in.
//!
//! Keyed by a content hash of the selector, so templates with identical
//! selectors share one entry.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use fleetgrid_cache::{ChangeMonitor, TtlCache};
use fleetgrid_core::{InstanceTypeZones, NodeTemplate, ZoneSet, content_hash};

use crate::api::{ComputeApi, DescribeInstanceTypeOfferingsInput, SubnetResolver, call_api};
use crate::error::{InstanceTypeError, InstanceTypeResult};

pub const ZONES_CACHE_KEY_PREFIX: &str = "zones:";

/// Zone mapping for one selector, with its content hash computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMap {
    pub hash: u64,
    pub instance_type_zones: InstanceTypeZones,
}

impl ZoneMap {
    pub fn zones(&self, instance_type: &str) -> Option<&ZoneSet> {
        self.instance_type_zones.get(instance_type)
    }
}

pub struct ZoneMapCache {
    api: Arc<dyn ComputeApi>,
    resolver: Arc<dyn SubnetResolver>,
    cache: TtlCache<Arc<ZoneMap>>,
    monitor: ChangeMonitor,
    api_timeout: Option<Duration>,
}

impl ZoneMapCache {
    pub fn new(
        api: Arc<dyn ComputeApi>,
        resolver: Arc<dyn SubnetResolver>,
        ttl: Duration,
        api_timeout: Option<Duration>,
    ) -> Self {
        Self {
            api,
            resolver,
            cache: TtlCache::new(ttl),
            monitor: ChangeMonitor::new(),
            api_timeout,
        }
    }

    pub async fn get_zone_map(&self, template: &NodeTemplate) -> InstanceTypeResult<Arc<ZoneMap>> {
        let selector = &template.spec.subnet_selector;
        let selector_hash = content_hash(selector)?;
        let cache_key = format!("{ZONES_CACHE_KEY_PREFIX}{selector_hash:016x}");
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(cached);
        }

        // Constrain zones to the subnets the template can launch into.
        let subnets = call_api("ListSubnets", self.api_timeout, self.resolver.list(template)).await?;
        if subnets.is_empty() {
            return Err(InstanceTypeError::NoMatchingSubnets {
                selector: selector.clone(),
            });
        }
        let zones: ZoneSet = subnets
            .into_iter()
            .map(|subnet| subnet.availability_zone)
            .collect();

        let instance_type_zones = self.fetch(&zones).await?;

        if self.monitor.has_changed(
            &format!("zonal-offerings:{selector_hash:016x}"),
            &instance_type_zones,
        ) {
            debug!(
                subnet_selector = ?selector,
                ?zones,
                instance_type_count = instance_type_zones.len(),
                "discovered zonal offerings for subnets"
            );
        }

        let zone_map = Arc::new(ZoneMap {
            hash: content_hash(&instance_type_zones)?,
            instance_type_zones,
        });
        self.cache.insert(cache_key, Arc::clone(&zone_map));
        Ok(zone_map)
    }

    pub fn sweep(&self) -> usize {
        self.cache.sweep()
    }

    async fn fetch(&self, zones: &ZoneSet) -> InstanceTypeResult<InstanceTypeZones> {
        let input = DescribeInstanceTypeOfferingsInput::availability_zones();
        let mut instance_type_zones = InstanceTypeZones::new();
        let mut next_token = None;

        loop {
            let page = call_api(
                "DescribeInstanceTypeOfferings",
                self.api_timeout,
                self.api
                    .describe_instance_type_offerings(&input, next_token.take()),
            )
            .await?;

            for offering in page.offerings {
                if zones.contains(&offering.location) {
                    instance_type_zones
                        .entry(offering.instance_type)
                        .or_default()
                        .insert(offering.location);
                }
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(instance_type_zones)
    }
}
