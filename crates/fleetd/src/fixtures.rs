//! File-backed collaborators.
//!
//! A fixture directory stands in for the cloud provider: it answers the
//! compute, subnet, and pricing calls from JSON files.
//!
//! | File | Contents |
//! |---|---|
//! | `instance_types.json` | `[InstanceTypeRecord]` |
//! | `offerings.json` | `[InstanceTypeOffering]` |
//! | `subnets.json` | `[Subnet]` |
//! | `prices.json` | `{ "on_demand": {type: price}, "spot": [SpotPricePoint] }` |
//! | `templates.json` | `[{ "template": NodeTemplate, "kubelet": KubeletConfiguration }]` |

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use fleetgrid_core::{
    InstanceTypeOffering, InstanceTypeRecord, KubeletConfiguration, NodeTemplate, ProbeError,
    Subnet,
};
use fleetgrid_instancetype::{
    ApiError, ApiFuture, ComputeApi, DescribeInstanceTypeOfferingsInput,
    DescribeInstanceTypesInput, InstanceTypesPage, OfferingsPage, SubnetResolver,
};
use fleetgrid_pricing::{PriceBook, PricingSource, SourceFuture, SpotPricePoint};

/// Page size for paginated describe calls.
pub const PAGE_SIZE: usize = 100;

/// Selector key matching subnets by a comma-separated list of IDs.
pub const SELECTOR_SUBNET_IDS: &str = "aws-ids";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceFixture {
    #[serde(default)]
    pub on_demand: HashMap<String, f64>,
    #[serde(default)]
    pub spot: Vec<SpotPricePoint>,
}

impl PriceFixture {
    pub fn book(&self) -> PriceBook {
        PriceBook {
            on_demand: self.on_demand.clone(),
            spot: PriceBook::spot_table(&self.spot),
        }
    }
}

/// A named node template and the kubelet settings it launches with.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateFixture {
    pub template: NodeTemplate,
    #[serde(default)]
    pub kubelet: KubeletConfiguration,
}

pub struct FixtureProvider {
    instance_types: Vec<InstanceTypeRecord>,
    offerings: Vec<InstanceTypeOffering>,
    subnets: Vec<Subnet>,
    prices: PriceFixture,
}

impl FixtureProvider {
    pub fn new(
        instance_types: Vec<InstanceTypeRecord>,
        offerings: Vec<InstanceTypeOffering>,
        subnets: Vec<Subnet>,
        prices: PriceFixture,
    ) -> Self {
        Self {
            instance_types,
            offerings,
            subnets,
            prices,
        }
    }

    pub fn prices(&self) -> &PriceFixture {
        &self.prices
    }

    fn matching_subnets(&self, template: &NodeTemplate) -> Vec<Subnet> {
        let selector = &template.spec.subnet_selector;
        if let Some(ids) = selector.get(SELECTOR_SUBNET_IDS) {
            let ids: Vec<&str> = ids.split(',').map(str::trim).collect();
            return self
                .subnets
                .iter()
                .filter(|subnet| ids.contains(&subnet.subnet_id.as_str()))
                .cloned()
                .collect();
        }
        self.subnets
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
            .collect()
    }
}

/// Slice one page out of `items`. Tokens are the start offset.
fn page<T: Clone>(
    items: Vec<T>,
    next_token: Option<String>,
) -> Result<(Vec<T>, Option<String>), ApiError> {
    let start = match next_token {
        Some(token) => token.parse::<usize>().map_err(|_| {
            ApiError::with_code("InvalidNextToken", format!("malformed token {token:?}"))
        })?,
        None => 0,
    };
    if start > items.len() {
        return Err(ApiError::with_code(
            "InvalidNextToken",
            format!("token {start} past end of results"),
        ));
    }
    let end = (start + PAGE_SIZE).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Ok((items[start..end].to_vec(), next))
}

impl ComputeApi for FixtureProvider {
    fn describe_instance_types<'a>(
        &'a self,
        input: &'a DescribeInstanceTypesInput,
        next_token: Option<String>,
    ) -> ApiFuture<'a, InstanceTypesPage> {
        Box::pin(async move {
            let matching = self
                .instance_types
                .iter()
                .filter(|record| input.matches(record))
                .cloned()
                .collect();
            let (instance_types, next_token) = page(matching, next_token)?;
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
            let matching = self
                .offerings
                .iter()
                .filter(|offering| offering.location_type == input.location_type)
                .cloned()
                .collect();
            let (offerings, next_token) = page(matching, next_token)?;
            Ok(OfferingsPage {
                offerings,
                next_token,
            })
        })
    }
}

impl SubnetResolver for FixtureProvider {
    fn list<'a>(&'a self, template: &'a NodeTemplate) -> ApiFuture<'a, Vec<Subnet>> {
        Box::pin(async move { Ok(self.matching_subnets(template)) })
    }

    fn liveness_probe(&self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl PricingSource for FixtureProvider {
    fn on_demand_prices(&self) -> SourceFuture<'_, HashMap<String, f64>> {
        Box::pin(async move { Ok(self.prices.on_demand.clone()) })
    }

    fn spot_prices(&self) -> SourceFuture<'_, Vec<SpotPricePoint>> {
        Box::pin(async move { Ok(self.prices.spot.clone()) })
    }
}

/// Everything loaded from one fixture directory.
pub struct Fixtures {
    pub provider: Arc<FixtureProvider>,
    pub templates: HashMap<String, TemplateFixture>,
}

impl Fixtures {
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let provider = FixtureProvider::new(
            read_json(dir, "instance_types.json")?,
            read_json(dir, "offerings.json")?,
            read_json(dir, "subnets.json")?,
            read_json(dir, "prices.json")?,
        );
        let templates: Vec<TemplateFixture> = read_json(dir, "templates.json")?;
        Ok(Self {
            provider: Arc::new(provider),
            templates: templates
                .into_iter()
                .map(|fixture| (fixture.template.name.clone(), fixture))
                .collect(),
        })
    }
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> anyhow::Result<T> {
    let path = dir.join(file);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
