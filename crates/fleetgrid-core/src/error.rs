//! Error types shared across FleetGrid crates.

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },
}

/// Failure to compute a content hash.
#[derive(Debug, Error)]
#[error("failed to hash value: {0}")]
pub struct HashError(#[from] serde_json::Error);

/// A liveness probe failure, naming the component that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{component} is not live: {reason}")]
pub struct ProbeError {
    pub component: String,
    pub reason: String,
}

impl ProbeError {
    pub fn new(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            reason: reason.into(),
        }
    }
}
