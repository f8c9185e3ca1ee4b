//! Upstream pricing API abstraction, injected for testability.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Boxed future returned by `PricingSource` methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PricingError>> + Send + 'a>>;

/// One spot price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotPricePoint {
    pub instance_type: String,
    pub zone: String,
    pub price: f64,
    /// Unix timestamp (seconds) of the observation.
    pub timestamp: u64,
}

pub trait PricingSource: Send + Sync {
    /// Fetch hourly on-demand prices keyed by instance type.
    fn on_demand_prices(&self) -> SourceFuture<'_, HashMap<String, f64>>;

    /// Fetch recent spot price history.
    fn spot_prices(&self) -> SourceFuture<'_, Vec<SpotPricePoint>>;
}
