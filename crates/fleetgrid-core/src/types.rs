//! Domain types shared across FleetGrid crates.
//!
//! Provider records (`InstanceTypeRecord`, `InstanceTypeOffering`,
//! `Subnet`) are plain immutable data as reported by the compute
//! provider. All types serialize to/from JSON so fixture files and the
//! content hash see the same shape.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Set of availability-zone identifiers.
pub type ZoneSet = BTreeSet<String>;

/// Instance-type name → zones where that type is orderable.
///
/// Scoped to one subnet selector. Entries with no zones are omitted.
pub type InstanceTypeZones = BTreeMap<String, ZoneSet>;

/// Subnet selector: tag key → value (`"*"` matches any value).
pub type SubnetSelector = BTreeMap<String, String>;

/// Location type used when listing zonal instance-type offerings.
pub const LOCATION_TYPE_AVAILABILITY_ZONE: &str = "availability-zone";

// ── Capacity types ───────────────────────────────────────────────

/// Purchasing option for an offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapacityType {
    Spot,
    OnDemand,
}

impl CapacityType {
    /// Parse a provider usage-class string. Unknown classes yield `None`.
    pub fn parse(usage_class: &str) -> Option<Self> {
        match usage_class {
            "spot" => Some(Self::Spot),
            "on-demand" => Some(Self::OnDemand),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::OnDemand => "on-demand",
        }
    }
}

impl fmt::Display for CapacityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Provider records ─────────────────────────────────────────────

/// Capability description of one instance type, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceTypeRecord {
    /// Instance-type name, unique within a catalog snapshot.
    pub instance_type: String,
    /// Raw usage classes ("spot", "on-demand", ...). Not guaranteed distinct.
    pub supported_usage_classes: Vec<String>,
    /// CPU architectures ("x86_64", "arm64").
    pub supported_architectures: Vec<String>,
    /// Virtualization types ("hvm", "paravirtual").
    pub supported_virtualization_types: Vec<String>,
    pub vcpus: u32,
    pub memory_mib: u64,
    #[serde(default)]
    pub gpu_count: u32,
    #[serde(default)]
    pub network: Option<NetworkInfo>,
    #[serde(default)]
    pub hypervisor: Option<String>,
    #[serde(default)]
    pub bare_metal: bool,
}

/// Network limits that bound the pod density of an instance type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub max_network_interfaces: u32,
    pub ipv4_addresses_per_interface: u32,
}

/// One (instance type, location) pair from the zonal offering listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceTypeOffering {
    pub instance_type: String,
    pub location: String,
    #[serde(default = "default_location_type")]
    pub location_type: String,
}

fn default_location_type() -> String {
    LOCATION_TYPE_AVAILABILITY_ZONE.to_string()
}

/// A subnet resolved from a node template's selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub subnet_id: String,
    pub availability_zone: String,
    #[serde(default)]
    pub available_ip_address_count: u64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

// ── Node template ────────────────────────────────────────────────

/// Provider-specific launch template for nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Unique identity of this template object.
    pub uid: String,
    pub name: String,
    pub spec: NodeTemplateSpec,
}

/// Only the subnet selector affects instance type resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplateSpec {
    pub subnet_selector: SubnetSelector,
}

// ── Kubelet ──────────────────────────────────────────────────────

/// Kubelet settings that influence the capacity of a launched node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KubeletConfiguration {
    #[serde(default)]
    pub cluster_dns: Vec<String>,
    #[serde(default)]
    pub max_pods: Option<u32>,
    #[serde(default)]
    pub pods_per_core: Option<u32>,
    #[serde(default)]
    pub system_reserved: Option<ReservedResources>,
    #[serde(default)]
    pub kube_reserved: Option<ReservedResources>,
    #[serde(default)]
    pub eviction_hard_memory_mib: Option<u64>,
}

/// A cpu/memory reservation. Unset fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReservedResources {
    #[serde(default)]
    pub cpu_millis: Option<u64>,
    #[serde(default)]
    pub memory_mib: Option<u64>,
}

// ── Offering ─────────────────────────────────────────────────────

/// One purchasable (zone, capacity type) combination of an instance type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub zone: String,
    pub capacity_type: CapacityType,
    /// Hourly price. `None` when the pricing feed has no data.
    pub price: Option<f64>,
    pub available: bool,
}
