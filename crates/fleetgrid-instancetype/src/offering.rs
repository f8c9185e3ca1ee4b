//! Offering composition — zones × capacity types for one instance type,
//! annotated with price and availability.

use std::collections::BTreeSet;

use tracing::error;

use fleetgrid_cache::UnavailableOfferings;
use fleetgrid_core::{CapacityType, InstanceTypeRecord, Offering, ZoneSet};

use crate::api::PricingFeed;

/// Build one offering per (zone, recognized capacity type).
///
/// An offering is available only when it has a price and has not
/// recently failed with insufficient capacity. Missing prices degrade to
/// `available = false`; unknown capacity types are logged and skipped.
pub fn compose_offerings(
    record: &InstanceTypeRecord,
    zones: &ZoneSet,
    unavailable: &UnavailableOfferings,
    pricing: &dyn PricingFeed,
) -> Vec<Offering> {
    let instance_type = record.instance_type.as_str();

    // Usage classes should be distinct, but nothing guarantees it.
    let mut capacity_types = BTreeSet::new();
    for usage_class in &record.supported_usage_classes {
        match CapacityType::parse(usage_class) {
            Some(capacity_type) => {
                capacity_types.insert(capacity_type);
            }
            None => {
                error!(
                    capacity_type = %usage_class,
                    %instance_type,
                    "received unknown capacity type"
                );
            }
        }
    }

    let mut offerings = Vec::with_capacity(zones.len() * capacity_types.len());
    for zone in zones {
        for &capacity_type in &capacity_types {
            let is_unavailable = unavailable.is_unavailable(instance_type, zone, capacity_type);
            let price = match capacity_type {
                CapacityType::Spot => pricing.spot_price(instance_type, zone),
                CapacityType::OnDemand => pricing.on_demand_price(instance_type),
            };
            offerings.push(Offering {
                zone: zone.clone(),
                capacity_type,
                price,
                available: !is_unavailable && price.is_some(),
            });
        }
    }
    offerings
}
