//! Pricing feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("pricing source request failed: {0}")]
    Source(String),

    #[error("pricing source returned no {0} prices")]
    Empty(&'static str),
}
