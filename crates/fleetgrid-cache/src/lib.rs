//! fleetgrid-cache — in-memory caches for FleetGrid.
//!
//! Nothing here is persisted; every cache lives for the lifetime of the
//! process and is shared across tasks by reference or `Arc`.
//!
//! # Architecture
//!
//! ```text
//! TtlCache<V>           DashMap<key, (value, inserted_at)>
//!   ├── get()           lazy expiry on read
//!   └── sweep()         drop every expired entry
//!
//! run_sweeper()         periodic sweep(s) until shutdown
//!
//! ChangeMonitor         key → (last content digest, version)
//!
//! UnavailableOfferings  TtlCache<()> keyed by capacity:type:zone
//!   └── seq_num         bumped on every content change
//! ```

pub mod change;
pub mod sweeper;
pub mod ttl;
pub mod unavailable;

pub use change::{ChangeMonitor, Observation};
pub use sweeper::run_sweeper;
pub use ttl::TtlCache;
pub use unavailable::UnavailableOfferings;
