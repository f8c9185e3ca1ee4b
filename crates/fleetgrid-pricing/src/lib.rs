//! fleetgrid-pricing — current spot and on-demand prices.
//!
//! Prices are held in an immutable `PriceBook` snapshot behind an
//! `ArcSwap`. Lookups load the current snapshot without locking; the
//! refresh loop builds a new snapshot and swaps it in.
//!
//! # Architecture
//!
//! ```text
//! PricingProvider
//!   ├── ArcSwap<PriceBook>   on-demand: type → price
//!   │                        spot: type → zone → price
//!   ├── Arc<dyn PricingSource>
//!   └── run(start, shutdown) waits for start, refreshes every interval
//! ```

pub mod book;
pub mod error;
pub mod provider;
pub mod source;

pub use book::PriceBook;
pub use error::PricingError;
pub use provider::PricingProvider;
pub use source::{PricingSource, SourceFuture, SpotPricePoint};
