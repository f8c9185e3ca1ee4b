//! fleetd — assembles the FleetGrid subsystems over a fixture directory.

pub mod api;
pub mod daemon;
pub mod fixtures;

pub use api::build_router;
pub use daemon::Daemon;
pub use fixtures::{FixtureProvider, Fixtures, PriceFixture, TemplateFixture};
