//! fleetgrid-instancetype — which instance types can be launched, where,
//! at what price, right now.
//!
//! Combines four inputs into one decision-ready list per
//! (kubelet configuration, node template) pair:
//!
//! - the instance-type catalog (`CatalogCache`, refreshed on a TTL)
//! - the zones each type is orderable in for the template's subnets
//!   (`ZoneMapCache`, one entry per distinct subnet selector)
//! - live prices (`PricingFeed`)
//! - recent insufficient-capacity failures (`UnavailableOfferings`)
//!
//! # Resolution
//!
//! ```text
//! resolve(kubelet, template)
//!   ├── catalog      ← CatalogCache::get_catalog()
//!   ├── zone map     ← ZoneMapCache::get_zone_map(template)
//!   ├── key = catalog seq - unavailable seq - template uid
//!   │         - zone map hash - kubelet hash
//!   ├── hit  → cached Arc<Vec<ResolvedInstanceType>>
//!   └── miss → compose_offerings() per type, cache under key
//! ```
//!
//! Sequence numbers stand in for hashing the catalog and the unavailable
//! set on every call: each only increases, and only when content changes.

pub mod api;
pub mod capacity;
pub mod catalog;
pub mod error;
pub mod offering;
pub mod provider;
pub mod zones;

pub use api::{
    ApiError, ApiFuture, ComputeApi, DescribeInstanceTypeOfferingsInput,
    DescribeInstanceTypesInput, Filter, InstanceTypesPage, OfferingsPage, PricingFeed,
    SubnetResolver,
};
pub use capacity::{Overhead, ResolvedInstanceType, Resources};
pub use catalog::{Catalog, CatalogCache};
pub use error::{InstanceTypeError, InstanceTypeResult};
pub use offering::compose_offerings;
pub use provider::InstanceTypeProvider;
pub use zones::{ZoneMap, ZoneMapCache};
