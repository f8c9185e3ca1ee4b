//! PricingProvider — lock-free price lookups over a background-refreshed
//! `PriceBook`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use fleetgrid_core::{ProbeError, Settings};

use crate::book::PriceBook;
use crate::error::PricingError;
use crate::source::PricingSource;

/// Sentinel for "no successful refresh yet".
const NEVER: u64 = u64::MAX;

pub struct PricingProvider {
    source: Arc<dyn PricingSource>,
    book: ArcSwap<PriceBook>,
    refresh_interval: Duration,
    max_staleness: Duration,
    /// Isolated VPCs cannot reach the pricing API; only initial prices are served.
    isolated_vpc: bool,
    created_at: Instant,
    /// Milliseconds after `created_at` of the last full refresh.
    last_success_ms: AtomicU64,
}

impl PricingProvider {
    pub fn new(source: Arc<dyn PricingSource>, settings: &Settings) -> Self {
        Self {
            source,
            book: ArcSwap::from_pointee(PriceBook::default()),
            refresh_interval: settings.pricing_refresh_interval,
            max_staleness: settings.pricing_max_staleness,
            isolated_vpc: settings.isolated_vpc,
            created_at: Instant::now(),
            last_success_ms: AtomicU64::new(NEVER),
        }
    }

    /// Seed the tables served before the first refresh completes.
    pub fn with_initial_prices(self, book: PriceBook) -> Self {
        self.book.store(Arc::new(book));
        self
    }

    pub fn on_demand_price(&self, instance_type: &str) -> Option<f64> {
        self.book.load().on_demand_price(instance_type)
    }

    pub fn spot_price(&self, instance_type: &str, zone: &str) -> Option<f64> {
        self.book.load().spot_price(instance_type, zone)
    }

    /// Replace the on-demand table. A failed or empty fetch keeps the old one.
    pub async fn update_on_demand(&self) -> Result<usize, PricingError> {
        let prices = self.source.on_demand_prices().await?;
        if prices.is_empty() {
            return Err(PricingError::Empty("on-demand"));
        }
        let count = prices.len();
        self.book.rcu(|current| {
            let mut next = PriceBook::clone(current);
            next.on_demand = prices.clone();
            next
        });
        debug!(instance_types = count, "updated on-demand pricing");
        Ok(count)
    }

    /// Replace the spot table. A failed or empty fetch keeps the old one.
    pub async fn update_spot(&self) -> Result<usize, PricingError> {
        let points = self.source.spot_prices().await?;
        let table = PriceBook::spot_table(&points);
        if table.is_empty() {
            return Err(PricingError::Empty("spot"));
        }
        self.book.rcu(|current| {
            let mut next = PriceBook::clone(current);
            next.spot = table.clone();
            next
        });
        let count = self.book.load().spot_len();
        debug!(offerings = count, "updated spot pricing");
        Ok(count)
    }

    /// Refresh both tables. Failures are logged and the previous data kept.
    pub async fn refresh(&self) -> bool {
        let on_demand = self.update_on_demand().await;
        if let Err(e) = &on_demand {
            warn!(error = %e, "on-demand pricing refresh failed");
        }
        let spot = self.update_spot().await;
        if let Err(e) = &spot {
            warn!(error = %e, "spot pricing refresh failed");
        }

        let ok = on_demand.is_ok() && spot.is_ok();
        if ok {
            let elapsed = self.created_at.elapsed().as_millis() as u64;
            self.last_success_ms.store(elapsed, Ordering::Release);
        }
        ok
    }

    /// Wait for the start signal, then refresh on a fixed interval until
    /// the shutdown signal fires.
    pub async fn run(&self, mut start: watch::Receiver<bool>, mut shutdown: watch::Receiver<bool>) {
        tokio::select! {
            started = start.wait_for(|ready| *ready) => {
                if started.is_err() {
                    info!("pricing start signal dropped before start");
                    return;
                }
            }
            _ = shutdown.changed() => {
                info!("pricing refresh shut down before start");
                return;
            }
        }

        if self.isolated_vpc {
            info!("isolated VPC, serving initial prices without refresh");
            return;
        }

        info!(
            interval_secs = self.refresh_interval.as_secs(),
            "pricing refresh started"
        );

        loop {
            self.refresh().await;
            tokio::select! {
                _ = tokio::time::sleep(self.refresh_interval) => {}
                _ = shutdown.changed() => {
                    info!("pricing refresh shutting down");
                    break;
                }
            }
        }
    }

    /// Fails when the last full refresh is older than the staleness limit.
    pub fn liveness_probe(&self) -> Result<(), ProbeError> {
        if self.isolated_vpc {
            return Ok(());
        }
        let last = match self.last_success_ms.load(Ordering::Acquire) {
            NEVER => self.created_at,
            ms => self.created_at + Duration::from_millis(ms),
        };
        let age = last.elapsed();
        if age > self.max_staleness {
            return Err(ProbeError::new(
                "pricing",
                format!("no successful refresh in {}s", age.as_secs()),
            ));
        }
        Ok(())
    }
}
