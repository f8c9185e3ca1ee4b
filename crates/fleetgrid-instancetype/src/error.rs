//! Instance-type resolution error types.

use std::time::Duration;

use thiserror::Error;

use fleetgrid_core::{HashError, SubnetSelector};

use crate::api::ApiError;

/// Errors that abort a resolution. Per-offering gaps (missing price,
/// unknown capacity type) never surface here.
#[derive(Debug, Error)]
pub enum InstanceTypeError {
    /// A provider or subnet-resolver call failed.
    #[error("{operation} failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The template's subnet selector matched nothing. Not retryable.
    #[error("no subnets matched selector {selector:?}")]
    NoMatchingSubnets { selector: SubnetSelector },

    #[error(transparent)]
    Hash(#[from] HashError),
}

impl InstanceTypeError {
    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { source, .. } => source.retryable,
            Self::Timeout { .. } => true,
            Self::NoMatchingSubnets { .. } | Self::Hash(_) => false,
        }
    }
}

pub type InstanceTypeResult<T> = Result<T, InstanceTypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_source() {
        let throttled = InstanceTypeError::Api {
            operation: "DescribeInstanceTypes",
            source: ApiError::throttled("Rate exceeded"),
        };
        assert!(throttled.is_retryable());

        let denied = InstanceTypeError::Api {
            operation: "DescribeInstanceTypes",
            source: ApiError::with_code("UnauthorizedOperation", "not authorized"),
        };
        assert!(!denied.is_retryable());

        let no_subnets = InstanceTypeError::NoMatchingSubnets {
            selector: SubnetSelector::new(),
        };
        assert!(!no_subnets.is_retryable());
    }

    #[test]
    fn api_error_message_names_operation() {
        let err = InstanceTypeError::Api {
            operation: "DescribeInstanceTypeOfferings",
            source: ApiError::new("connection reset"),
        };
        assert_eq!(
            err.to_string(),
            "DescribeInstanceTypeOfferings failed: connection reset"
        );
    }
}
