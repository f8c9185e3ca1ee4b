//! fleetgrid-core — shared types for the FleetGrid instance-type resolver.
//!
//! Holds the provider data transfer objects (instance-type records,
//! zonal offerings, subnets), the node template and kubelet inputs, the
//! composed `Offering` value, TOML configuration, and the canonical
//! content hash used to build cache keys.

pub mod config;
pub mod duration;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{FleetConfig, Settings};
pub use duration::parse_duration;
pub use error::{ConfigError, HashError, ProbeError};
pub use hash::{content_digest, content_hash};
pub use types::*;
