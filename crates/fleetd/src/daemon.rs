//! Subsystem assembly and background tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use fleetgrid_cache::UnavailableOfferings;
use fleetgrid_core::Settings;
use fleetgrid_instancetype::{InstanceTypeProvider, InstanceTypeResult, ResolvedInstanceType};
use fleetgrid_pricing::PricingProvider;

use crate::fixtures::{Fixtures, TemplateFixture};

/// Every long-lived component, wired together.
pub struct Daemon {
    pub settings: Settings,
    pub provider: Arc<InstanceTypeProvider>,
    pub pricing: Arc<PricingProvider>,
    pub unavailable: Arc<UnavailableOfferings>,
    pub templates: HashMap<String, TemplateFixture>,
}

impl Daemon {
    pub fn assemble(settings: Settings, fixtures: Fixtures) -> Self {
        let source = fixtures.provider;

        // Fixture prices double as the initial tables, so lookups succeed
        // before the first refresh and in isolated VPCs.
        let pricing = Arc::new(
            PricingProvider::new(source.clone(), &settings)
                .with_initial_prices(source.prices().book()),
        );
        let unavailable = Arc::new(UnavailableOfferings::new(settings.unavailable_ttl));
        let provider = Arc::new(InstanceTypeProvider::new(
            source.clone(),
            source,
            pricing.clone(),
            unavailable.clone(),
            &settings,
        ));
        info!(
            region = %settings.region,
            templates = fixtures.templates.len(),
            "instance type provider initialized"
        );

        Self {
            settings,
            provider,
            pricing,
            unavailable,
            templates: fixtures.templates,
        }
    }

    /// Resolve the named template. `None` when no such template exists.
    pub async fn resolve(
        &self,
        name: &str,
    ) -> Option<InstanceTypeResult<Arc<Vec<ResolvedInstanceType>>>> {
        let fixture = self.templates.get(name)?;
        Some(
            self.provider
                .resolve(&fixture.kubelet, &fixture.template)
                .await,
        )
    }

    /// Start the pricing refresh loop and cache sweepers.
    pub fn spawn_background(&self, shutdown: &watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        // Not gated: refresh starts immediately.
        let (start_tx, start_rx) = watch::channel(true);

        let pricing = self.pricing.clone();
        let pricing_shutdown = shutdown.clone();
        let pricing_handle = tokio::spawn(async move {
            pricing.run(start_rx, pricing_shutdown).await;
            drop(start_tx);
        });

        let provider = self.provider.clone();
        let cleanup_interval = self.settings.cleanup_interval;
        let cleanup_shutdown = shutdown.clone();
        let cleanup_handle = tokio::spawn(async move {
            provider.run_cleanup(cleanup_interval, cleanup_shutdown).await;
        });

        // Swept on the unavailability TTL so expiries reach resolved
        // lists within one TTL.
        let unavailable = self.unavailable.clone();
        let unavailable_interval = self.settings.unavailable_ttl;
        let unavailable_shutdown = shutdown.clone();
        let unavailable_handle = tokio::spawn(async move {
            unavailable
                .run_sweeper(unavailable_interval, unavailable_shutdown)
                .await;
        });

        vec![pricing_handle, cleanup_handle, unavailable_handle]
    }
}
