//! CatalogCache — every launchable instance type, refreshed on a TTL.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use fleetgrid_cache::{ChangeMonitor, TtlCache};
use fleetgrid_core::InstanceTypeRecord;

use crate::api::{ComputeApi, DescribeInstanceTypesInput, call_api};
use crate::error::InstanceTypeResult;

pub const INSTANCE_TYPES_CACHE_KEY: &str = "types";
const CATALOG_MONITOR_KEY: &str = "instance-types";

/// One catalog snapshot and the sequence number it was published under.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub seq_num: u64,
    pub instance_types: BTreeMap<String, InstanceTypeRecord>,
}

pub struct CatalogCache {
    api: Arc<dyn ComputeApi>,
    cache: TtlCache<Arc<Catalog>>,
    /// Its version for the catalog key is the sequence number; it moves
    /// only when a refresh sees different catalog content.
    monitor: ChangeMonitor,
    api_timeout: Option<Duration>,
}

impl CatalogCache {
    pub fn new(api: Arc<dyn ComputeApi>, ttl: Duration, api_timeout: Option<Duration>) -> Self {
        Self {
            api,
            cache: TtlCache::new(ttl),
            monitor: ChangeMonitor::new(),
            api_timeout,
        }
    }

    pub fn seq_num(&self) -> u64 {
        self.monitor.version(CATALOG_MONITOR_KEY)
    }

    /// Return the cached catalog, fetching it from the provider on a miss.
    ///
    /// A failed fetch caches nothing.
    pub async fn get_catalog(&self) -> InstanceTypeResult<Arc<Catalog>> {
        if let Some(cached) = self.cache.get(INSTANCE_TYPES_CACHE_KEY) {
            return Ok(cached);
        }

        let instance_types = self.fetch().await?;

        let observed = self.monitor.observe(CATALOG_MONITOR_KEY, &instance_types);
        if observed.changed {
            debug!(
                instance_type_count = instance_types.len(),
                seq_num = observed.version,
                "discovered instance types"
            );
        }

        let catalog = Arc::new(Catalog {
            seq_num: observed.version,
            instance_types,
        });
        self.cache
            .insert(INSTANCE_TYPES_CACHE_KEY, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Drop the cached catalog so the next call refetches.
    pub fn invalidate(&self) {
        self.cache.remove(INSTANCE_TYPES_CACHE_KEY);
    }

    pub fn sweep(&self) -> usize {
        self.cache.sweep()
    }

    async fn fetch(&self) -> InstanceTypeResult<BTreeMap<String, InstanceTypeRecord>> {
        let input = DescribeInstanceTypesInput::opinionated();
        let mut instance_types = BTreeMap::new();
        let mut next_token = None;

        loop {
            let page = call_api(
                "DescribeInstanceTypes",
                self.api_timeout,
                self.api.describe_instance_types(&input, next_token.take()),
            )
            .await?;

            for record in page.instance_types {
                instance_types.insert(record.instance_type.clone(), record);
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(instance_types)
    }
}
