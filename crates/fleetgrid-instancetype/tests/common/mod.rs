//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetgrid_cache::UnavailableOfferings;
use fleetgrid_core::{
    InstanceTypeOffering, InstanceTypeRecord, KubeletConfiguration, NetworkInfo, NodeTemplate,
    NodeTemplateSpec, ProbeError, Settings, Subnet,
};
use fleetgrid_instancetype::{
    ApiError, ApiFuture, ComputeApi, DescribeInstanceTypeOfferingsInput,
    DescribeInstanceTypesInput, InstanceTypeProvider, InstanceTypesPage, OfferingsPage,
    PricingFeed, SubnetResolver,
};
use fleetgrid_pricing::PriceBook;

pub const ZONE_A: &str = "us-west-2a";
pub const ZONE_B: &str = "us-west-2b";
pub const ZONE_C: &str = "us-west-2c";

// ── Compute API ──────────────────────────────────────────────────

pub struct MockCompute {
    pub instance_types: Mutex<Vec<InstanceTypeRecord>>,
    pub offerings: Mutex<Vec<InstanceTypeOffering>>,
    pub page_size: usize,
    pub delay: Mutex<Option<Duration>>,
    pub fail_instance_types: Mutex<Option<ApiError>>,
    pub instance_type_calls: AtomicUsize,
    pub offering_calls: AtomicUsize,
}

impl MockCompute {
    pub fn new() -> Self {
        Self {
            instance_types: Mutex::new(default_instance_types()),
            offerings: Mutex::new(default_offerings()),
            page_size: 100,
            delay: Mutex::new(None),
            fail_instance_types: Mutex::new(None),
            instance_type_calls: AtomicUsize::new(0),
            offering_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn instance_type_calls(&self) -> usize {
        self.instance_type_calls.load(Ordering::SeqCst)
    }

    pub fn offering_calls(&self) -> usize {
        self.offering_calls.load(Ordering::SeqCst)
    }

    fn delay(&self) -> Option<Duration> {
        *self.delay.lock().unwrap()
    }
}

/// Slice `items` into a page starting at the numeric `next_token`.
fn page<T: Clone>(items: &[T], next_token: Option<String>, size: usize) -> (Vec<T>, Option<String>) {
    let start = next_token.map_or(0, |t| t.parse::<usize>().unwrap());
    let end = (start + size).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    (items[start..end].to_vec(), next)
}

impl ComputeApi for MockCompute {
    fn describe_instance_types<'a>(
        &'a self,
        input: &'a DescribeInstanceTypesInput,
        next_token: Option<String>,
    ) -> ApiFuture<'a, InstanceTypesPage> {
        Box::pin(async move {
            self.instance_type_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay() {
                tokio::time::sleep(delay).await;
            }
            let failure = self.fail_instance_types.lock().unwrap().clone();
            if let Some(err) = failure {
                return Err(err);
            }
            let matching: Vec<InstanceTypeRecord> = self
                .instance_types
                .lock()
                .unwrap()
                .iter()
                .filter(|record| input.matches(record))
                .cloned()
                .collect();
            let (instance_types, next_token) = page(&matching, next_token, self.page_size);
            Ok(InstanceTypesPage {
                instance_types,
                next_token,
            })
        })
    }

    fn describe_instance_type_offerings<'a>(
        &'a self,
        input: &'a DescribeInstanceTypeOfferingsInput,
        next_token: Option<String>,
    ) -> ApiFuture<'a, OfferingsPage> {
        Box::pin(async move {
            self.offering_calls.fetch_add(1, Ordering::SeqCst);
            let matching: Vec<InstanceTypeOffering> = self
                .offerings
                .lock()
                .unwrap()
                .iter()
                .filter(|offering| offering.location_type == input.location_type)
                .cloned()
                .collect();
            let (offerings, next_token) = page(&matching, next_token, self.page_size);
            Ok(OfferingsPage {
                offerings,
                next_token,
            })
        })
    }
}

// ── Subnets ──────────────────────────────────────────────────────

pub struct MockSubnets {
    pub subnets: Mutex<Vec<Subnet>>,
    pub live: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockSubnets {
    pub fn new() -> Self {
        Self {
            subnets: Mutex::new(vec![
                subnet("subnet-a", ZONE_A, "private"),
                subnet("subnet-b", ZONE_B, "private"),
                subnet("subnet-c", ZONE_C, "public"),
            ]),
            live: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubnetResolver for MockSubnets {
    fn list<'a>(&'a self, template: &'a NodeTemplate) -> ApiFuture<'a, Vec<Subnet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let selector = &template.spec.subnet_selector;
        let matched: Vec<Subnet> = self
            .subnets
            .lock()
            .unwrap()
            .iter()
            .filter(|subnet| {
                selector.iter().all(|(key, value)| {
                    subnet
                        .tags
                        .get(key)
                        .is_some_and(|tag| value == "*" || tag == value)
                })
            })
            .cloned()
            .collect();
        Box::pin(async move { Ok(matched) })
    }

    fn liveness_probe(&self) -> Result<(), ProbeError> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProbeError::new("subnets", "resolver stalled"))
        }
    }
}

fn subnet(id: &str, zone: &str, name: &str) -> Subnet {
    let mut tags = BTreeMap::new();
    tags.insert("Name".to_string(), name.to_string());
    Subnet {
        subnet_id: id.to_string(),
        availability_zone: zone.to_string(),
        available_ip_address_count: 250,
        tags,
    }
}

// ── Pricing ──────────────────────────────────────────────────────

pub struct MockPricing {
    pub book: Mutex<PriceBook>,
    pub live: AtomicBool,
}

impl MockPricing {
    pub fn new() -> Self {
        let mut book = PriceBook::default();
        book.on_demand.insert("m5.large".to_string(), 0.096);
        book.on_demand.insert("m6g.large".to_string(), 0.077);
        book.on_demand.insert("c5.large".to_string(), 0.085);
        for zone in [ZONE_A, ZONE_B, ZONE_C] {
            book.spot
                .entry("m5.large".to_string())
                .or_default()
                .insert(zone.to_string(), 0.035);
        }
        book.spot
            .entry("m6g.large".to_string())
            .or_default()
            .insert(ZONE_A.to_string(), 0.029);
        Self {
            book: Mutex::new(book),
            live: AtomicBool::new(true),
        }
    }
}

impl PricingFeed for MockPricing {
    fn spot_price(&self, instance_type: &str, zone: &str) -> Option<f64> {
        self.book.lock().unwrap().spot_price(instance_type, zone)
    }

    fn on_demand_price(&self, instance_type: &str) -> Option<f64> {
        self.book.lock().unwrap().on_demand_price(instance_type)
    }

    fn liveness_probe(&self) -> Result<(), ProbeError> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProbeError::new("pricing", "no successful refresh"))
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────

pub fn instance_type(name: &str, arch: &str, virt: &str, vcpus: u32) -> InstanceTypeRecord {
    InstanceTypeRecord {
        instance_type: name.to_string(),
        supported_usage_classes: vec!["on-demand".to_string(), "spot".to_string()],
        supported_architectures: vec![arch.to_string()],
        supported_virtualization_types: vec![virt.to_string()],
        vcpus,
        memory_mib: u64::from(vcpus) * 4096,
        gpu_count: 0,
        network: Some(NetworkInfo {
            max_network_interfaces: 3,
            ipv4_addresses_per_interface: 10,
        }),
        hypervisor: Some("nitro".to_string()),
        bare_metal: false,
    }
}

/// m5.large and m6g.large are orderable; c5.large has no zonal offerings;
/// t1.micro is paravirtual and filtered out of the catalog.
pub fn default_instance_types() -> Vec<InstanceTypeRecord> {
    vec![
        instance_type("m5.large", "x86_64", "hvm", 2),
        instance_type("m6g.large", "arm64", "hvm", 2),
        instance_type("c5.large", "x86_64", "hvm", 2),
        instance_type("t1.micro", "x86_64", "paravirtual", 1),
    ]
}

pub fn offering(instance_type: &str, zone: &str) -> InstanceTypeOffering {
    InstanceTypeOffering {
        instance_type: instance_type.to_string(),
        location: zone.to_string(),
        location_type: "availability-zone".to_string(),
    }
}

pub fn default_offerings() -> Vec<InstanceTypeOffering> {
    vec![
        offering("m5.large", ZONE_A),
        offering("m5.large", ZONE_B),
        offering("m5.large", ZONE_C),
        offering("m6g.large", ZONE_A),
    ]
}

pub fn template(uid: &str, subnet_name: &str) -> NodeTemplate {
    let mut subnet_selector = BTreeMap::new();
    subnet_selector.insert("Name".to_string(), subnet_name.to_string());
    NodeTemplate {
        uid: uid.to_string(),
        name: format!("template-{uid}"),
        spec: NodeTemplateSpec { subnet_selector },
    }
}

pub fn kubelet() -> KubeletConfiguration {
    KubeletConfiguration::default()
}

/// A provider wired to fresh mocks, with handles to all of them.
pub struct Harness {
    pub compute: Arc<MockCompute>,
    pub subnets: Arc<MockSubnets>,
    pub pricing: Arc<MockPricing>,
    pub unavailable: Arc<UnavailableOfferings>,
    pub provider: Arc<InstanceTypeProvider>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MockCompute::new(), Settings::default())
    }

    pub fn with(compute: MockCompute, settings: Settings) -> Self {
        let compute = Arc::new(compute);
        let subnets = Arc::new(MockSubnets::new());
        let pricing = Arc::new(MockPricing::new());
        let unavailable = Arc::new(UnavailableOfferings::new(settings.unavailable_ttl));
        let provider = Arc::new(InstanceTypeProvider::new(
            compute.clone(),
            subnets.clone(),
            pricing.clone(),
            unavailable.clone(),
            &settings,
        ));
        Self {
            compute,
            subnets,
            pricing,
            unavailable,
            provider,
        }
    }
}
