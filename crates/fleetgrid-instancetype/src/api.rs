//! Collaborator contracts — injected for testability.
//!
//! `ComputeApi` lists the provider's instance types and their zonal
//! offerings page by page, `SubnetResolver` turns a node template's
//! selector into subnets, and `PricingFeed` answers point price lookups.
//! Transport, authentication, and retries live behind these traits.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use fleetgrid_core::{
    InstanceTypeOffering, InstanceTypeRecord, LOCATION_TYPE_AVAILABILITY_ZONE, NodeTemplate,
    ProbeError, Subnet,
};
use fleetgrid_pricing::PricingProvider;

use crate::error::{InstanceTypeError, InstanceTypeResult};

/// Boxed future returned by collaborator calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

pub const FILTER_VIRTUALIZATION_TYPE: &str = "supported-virtualization-type";
pub const FILTER_ARCHITECTURE: &str = "processor-info.supported-architecture";

/// A failed collaborator call, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Provider error code, e.g. "RequestLimitExceeded".
    pub code: Option<String>,
    pub message: String,
    /// Whether the transport considers the failure transient.
    pub retryable: bool,
}

impl ApiError {
    /// A transient failure with no provider code (network, 5xx).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            retryable: true,
        }
    }

    /// A terminal failure carrying a provider error code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self {
            code: Some("RequestLimitExceeded".to_string()),
            message: message.into(),
            retryable: true,
        }
    }
}

// ── Requests and pages ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescribeInstanceTypesInput {
    pub filters: Vec<Filter>,
}

impl DescribeInstanceTypesInput {
    /// Hardware-virtualized instance types on x86_64 or arm64 only.
    pub fn opinionated() -> Self {
        Self {
            filters: vec![
                Filter::new(FILTER_VIRTUALIZATION_TYPE, &["hvm"]),
                Filter::new(FILTER_ARCHITECTURE, &["x86_64", "arm64"]),
            ],
        }
    }

    /// Whether a record passes every filter. Unknown filter names match
    /// nothing, as the provider would reject them.
    pub fn matches(&self, record: &InstanceTypeRecord) -> bool {
        self.filters.iter().all(|filter| {
            let field = match filter.name.as_str() {
                FILTER_VIRTUALIZATION_TYPE => &record.supported_virtualization_types,
                FILTER_ARCHITECTURE => &record.supported_architectures,
                _ => return false,
            };
            field.iter().any(|value| filter.values.contains(value))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeInstanceTypeOfferingsInput {
    pub location_type: String,
}

impl DescribeInstanceTypeOfferingsInput {
    pub fn availability_zones() -> Self {
        Self {
            location_type: LOCATION_TYPE_AVAILABILITY_ZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceTypesPage {
    pub instance_types: Vec<InstanceTypeRecord>,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OfferingsPage {
    pub offerings: Vec<InstanceTypeOffering>,
    pub next_token: Option<String>,
}

// ── Collaborators ────────────────────────────────────────────────

/// Compute provider listing APIs.
pub trait ComputeApi: Send + Sync {
    fn describe_instance_types<'a>(
        &'a self,
        input: &'a DescribeInstanceTypesInput,
        next_token: Option<String>,
    ) -> ApiFuture<'a, InstanceTypesPage>;

    fn describe_instance_type_offerings<'a>(
        &'a self,
        input: &'a DescribeInstanceTypeOfferingsInput,
        next_token: Option<String>,
    ) -> ApiFuture<'a, OfferingsPage>;
}

/// Resolves a node template's subnet selector to concrete subnets.
pub trait SubnetResolver: Send + Sync {
    fn list<'a>(&'a self, template: &'a NodeTemplate) -> ApiFuture<'a, Vec<Subnet>>;

    fn liveness_probe(&self) -> Result<(), ProbeError>;
}

/// Synchronous price lookups over a feed refreshed elsewhere.
pub trait PricingFeed: Send + Sync {
    fn spot_price(&self, instance_type: &str, zone: &str) -> Option<f64>;

    fn on_demand_price(&self, instance_type: &str) -> Option<f64>;

    fn liveness_probe(&self) -> Result<(), ProbeError>;
}

impl PricingFeed for PricingProvider {
    fn spot_price(&self, instance_type: &str, zone: &str) -> Option<f64> {
        PricingProvider::spot_price(self, instance_type, zone)
    }

    fn on_demand_price(&self, instance_type: &str) -> Option<f64> {
        PricingProvider::on_demand_price(self, instance_type)
    }

    fn liveness_probe(&self) -> Result<(), ProbeError> {
        PricingProvider::liveness_probe(self)
    }
}

/// Await a collaborator call, applying the optional deadline.
pub(crate) async fn call_api<T, F>(
    operation: &'static str,
    timeout: Option<Duration>,
    call: F,
) -> InstanceTypeResult<T>
where
    F: Future<Output = Result<T, ApiError>>,
{
    let result = match timeout {
        Some(after) => tokio::time::timeout(after, call)
            .await
            .map_err(|_| InstanceTypeError::Timeout { operation, after })?,
        None => call.await,
    };
    result.map_err(|source| InstanceTypeError::Api { operation, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(arch: &str, virt: &str) -> InstanceTypeRecord {
        InstanceTypeRecord {
            instance_type: "t.test".to_string(),
            supported_usage_classes: vec!["on-demand".to_string()],
            supported_architectures: vec![arch.to_string()],
            supported_virtualization_types: vec![virt.to_string()],
            vcpus: 2,
            memory_mib: 4096,
            gpu_count: 0,
            network: None,
            hypervisor: None,
            bare_metal: false,
        }
    }

    #[test]
    fn opinionated_filter_keeps_hvm_x86_and_arm() {
        let input = DescribeInstanceTypesInput::opinionated();
        assert!(input.matches(&record("x86_64", "hvm")));
        assert!(input.matches(&record("arm64", "hvm")));
        assert!(!input.matches(&record("i386", "hvm")));
        assert!(!input.matches(&record("x86_64", "paravirtual")));
    }

    #[test]
    fn unknown_filter_matches_nothing() {
        let input = DescribeInstanceTypesInput {
            filters: vec![Filter::new("instance-storage-supported", &["true"])],
        };
        assert!(!input.matches(&record("x86_64", "hvm")));
    }

    #[tokio::test(start_paused = true)]
    async fn call_api_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ApiError>(())
        };
        let err = call_api("DescribeInstanceTypes", Some(Duration::from_secs(5)), slow)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstanceTypeError::Timeout { operation: "DescribeInstanceTypes", .. }
        ));
    }

    #[tokio::test]
    async fn call_api_wraps_failures() {
        let failing = async { Err::<(), _>(ApiError::throttled("slow down")) };
        let err = call_api("DescribeInstanceTypeOfferings", None, failing)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
