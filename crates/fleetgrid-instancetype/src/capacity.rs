//! ResolvedInstanceType — the per-type output of resolution, with node
//! capacity and overhead derived from the kubelet configuration.

use std::collections::BTreeSet;

use serde::Serialize;

use fleetgrid_core::{CapacityType, InstanceTypeRecord, KubeletConfiguration, Offering};

/// Pod limit when neither the kubelet nor the network info bounds it.
pub const DEFAULT_MAX_PODS: u32 = 110;
/// Default hard eviction threshold for `memory.available`.
pub const DEFAULT_EVICTION_MEMORY_MIB: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Resources {
    pub cpu_millis: u64,
    pub memory_mib: u64,
}

impl Resources {
    fn saturating_sub(self, other: Resources) -> Resources {
        Resources {
            cpu_millis: self.cpu_millis.saturating_sub(other.cpu_millis),
            memory_mib: self.memory_mib.saturating_sub(other.memory_mib),
        }
    }

    fn add(self, other: Resources) -> Resources {
        Resources {
            cpu_millis: self.cpu_millis.saturating_add(other.cpu_millis),
            memory_mib: self.memory_mib.saturating_add(other.memory_mib),
        }
    }
}

/// Resources a node withholds from pods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Overhead {
    pub kube_reserved: Resources,
    pub system_reserved: Resources,
    pub eviction_threshold: Resources,
}

impl Overhead {
    pub fn total(&self) -> Resources {
        self.kube_reserved
            .add(self.system_reserved)
            .add(self.eviction_threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedInstanceType {
    pub name: String,
    /// Kubernetes architecture label value ("amd64", "arm64").
    pub architecture: String,
    pub capacity_types: Vec<CapacityType>,
    pub vcpus: u32,
    pub memory_mib: u64,
    pub gpu_count: u32,
    pub hypervisor: Option<String>,
    pub bare_metal: bool,
    pub pods: u32,
    pub overhead: Overhead,
    /// May be empty: the type is known but not currently orderable.
    pub offerings: Vec<Offering>,
}

impl ResolvedInstanceType {
    pub fn new(
        record: &InstanceTypeRecord,
        kubelet: &KubeletConfiguration,
        offerings: Vec<Offering>,
    ) -> Self {
        let pods = pods(record, kubelet);
        Self {
            name: record.instance_type.clone(),
            architecture: architecture(record),
            capacity_types: record
                .supported_usage_classes
                .iter()
                .filter_map(|class| CapacityType::parse(class))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            vcpus: record.vcpus,
            memory_mib: record.memory_mib,
            gpu_count: record.gpu_count,
            hypervisor: record.hypervisor.clone(),
            bare_metal: record.bare_metal,
            pods,
            overhead: overhead(record, kubelet, pods),
            offerings,
        }
    }

    /// Capacity left for pods after overhead.
    pub fn allocatable(&self) -> Resources {
        Resources {
            cpu_millis: u64::from(self.vcpus) * 1000,
            memory_mib: self.memory_mib,
        }
        .saturating_sub(self.overhead.total())
    }

    pub fn available_offerings(&self) -> impl Iterator<Item = &Offering> {
        self.offerings.iter().filter(|o| o.available)
    }
}

fn architecture(record: &InstanceTypeRecord) -> String {
    let supports = |arch: &str| record.supported_architectures.iter().any(|a| a == arch);
    if supports("x86_64") {
        "amd64".to_string()
    } else if supports("arm64") {
        "arm64".to_string()
    } else {
        record
            .supported_architectures
            .first()
            .cloned()
            .unwrap_or_default()
    }
}

fn pods(record: &InstanceTypeRecord, kubelet: &KubeletConfiguration) -> u32 {
    let base = kubelet.max_pods.unwrap_or_else(|| match &record.network {
        Some(network) if network.max_network_interfaces > 0 => {
            network
                .max_network_interfaces
                .saturating_mul(network.ipv4_addresses_per_interface.saturating_sub(1))
                .saturating_add(2)
        }
        _ => DEFAULT_MAX_PODS,
    });
    match kubelet.pods_per_core {
        Some(per_core) if per_core > 0 => base.min(per_core.saturating_mul(record.vcpus)),
        _ => base,
    }
}

fn overhead(record: &InstanceTypeRecord, kubelet: &KubeletConfiguration, pods: u32) -> Overhead {
    let kube = kubelet.kube_reserved.clone().unwrap_or_default();
    let system = kubelet.system_reserved.clone().unwrap_or_default();
    Overhead {
        kube_reserved: Resources {
            cpu_millis: kube
                .cpu_millis
                .unwrap_or_else(|| kube_reserved_cpu_millis(record.vcpus)),
            memory_mib: kube
                .memory_mib
                .unwrap_or(11 * u64::from(pods) + 255),
        },
        system_reserved: Resources {
            cpu_millis: system.cpu_millis.unwrap_or(0),
            memory_mib: system.memory_mib.unwrap_or(0),
        },
        eviction_threshold: Resources {
            cpu_millis: 0,
            memory_mib: kubelet
                .eviction_hard_memory_mib
                .unwrap_or(DEFAULT_EVICTION_MEMORY_MIB),
        },
    }
}

/// Tiered reservation: 6% of the first core, 1% of the second, 0.5% of
/// cores three and four, 0.25% of every core above four.
fn kube_reserved_cpu_millis(vcpus: u32) -> u64 {
    const TIERS: [(u64, u64, f64); 4] = [
        (0, 1000, 0.06),
        (1000, 2000, 0.01),
        (2000, 4000, 0.005),
        (4000, u64::MAX, 0.0025),
    ];
    let cpu = u64::from(vcpus) * 1000;
    let reserved: f64 = TIERS
        .iter()
        .map(|&(start, end, fraction)| cpu.min(end).saturating_sub(start) as f64 * fraction)
        .sum();
    reserved.round() as u64
}
