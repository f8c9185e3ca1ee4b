//! fleetgrid.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::ConfigError;

/// TTL for the catalog, zone-map, and resolved instance-type caches.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Interval between sweeps of expired cache entries.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// How long an insufficient-capacity observation masks an offering.
pub const DEFAULT_UNAVAILABLE_TTL: Duration = Duration::from_secs(3 * 60);
pub const DEFAULT_PRICING_REFRESH: Duration = Duration::from_secs(12 * 3600);
pub const DEFAULT_PRICING_MAX_STALENESS: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    pub provider: Option<ProviderConfig>,
    pub cache: Option<CacheConfig>,
    pub unavailable_offerings: Option<UnavailableOfferingsConfig>,
    pub pricing: Option<PricingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub region: Option<String>,
    pub api_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl: Option<String>,
    pub cleanup_interval: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnavailableOfferingsConfig {
    pub ttl: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    pub refresh_interval: Option<String>,
    pub max_staleness: Option<String>,
    pub isolated_vpc: Option<bool>,
}

/// Configuration with every default applied and durations parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub region: String,
    /// Deadline for each provider call. `None` disables the deadline.
    pub api_timeout: Option<Duration>,
    pub cache_ttl: Duration,
    pub cleanup_interval: Duration,
    pub unavailable_ttl: Duration,
    pub pricing_refresh_interval: Duration,
    pub pricing_max_staleness: Duration,
    pub isolated_vpc: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            api_timeout: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            unavailable_ttl: DEFAULT_UNAVAILABLE_TTL,
            pricing_refresh_interval: DEFAULT_PRICING_REFRESH,
            pricing_max_staleness: DEFAULT_PRICING_MAX_STALENESS,
            isolated_vpc: false,
        }
    }
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve defaults and parse every duration field.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();
        let provider = self.provider.clone().unwrap_or_default();
        let cache = self.cache.clone().unwrap_or_default();
        let unavailable = self.unavailable_offerings.clone().unwrap_or_default();
        let pricing = self.pricing.clone().unwrap_or_default();

        Ok(Settings {
            region: provider.region.unwrap_or(defaults.region),
            api_timeout: provider
                .api_timeout
                .as_deref()
                .map(|v| duration_field("provider.api_timeout", v))
                .transpose()?,
            cache_ttl: optional_duration("cache.ttl", cache.ttl.as_deref(), defaults.cache_ttl)?,
            cleanup_interval: optional_duration(
                "cache.cleanup_interval",
                cache.cleanup_interval.as_deref(),
                defaults.cleanup_interval,
            )?,
            unavailable_ttl: optional_duration(
                "unavailable_offerings.ttl",
                unavailable.ttl.as_deref(),
                defaults.unavailable_ttl,
            )?,
            pricing_refresh_interval: optional_duration(
                "pricing.refresh_interval",
                pricing.refresh_interval.as_deref(),
                defaults.pricing_refresh_interval,
            )?,
            pricing_max_staleness: optional_duration(
                "pricing.max_staleness",
                pricing.max_staleness.as_deref(),
                defaults.pricing_max_staleness,
            )?,
            isolated_vpc: pricing.isolated_vpc.unwrap_or(defaults.isolated_vpc),
        })
    }
}

/// Every configured duration drives a timer, so zero is rejected.
fn duration_field(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value)
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ConfigError::InvalidDuration {
            field,
            value: value.to_string(),
        })
}

fn optional_duration(
    field: &'static str,
    value: Option<&str>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    value.map_or(Ok(default), |v| duration_field(field, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FleetConfig::from_toml_str("").unwrap();
        assert_eq!(config.settings().unwrap(), Settings::default());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[provider]
region = "eu-central-1"
api_timeout = "30s"

[cache]
ttl = "2m"
cleanup_interval = "1m"

[unavailable_offerings]
ttl = "90s"

[pricing]
refresh_interval = "6h"
max_staleness = "12h"
isolated_vpc = true
"#;
        let settings = FleetConfig::from_toml_str(toml_str)
            .unwrap()
            .settings()
            .unwrap();
        assert_eq!(settings.region, "eu-central-1");
        assert_eq!(settings.api_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.cache_ttl, Duration::from_secs(120));
        assert_eq!(settings.cleanup_interval, Duration::from_secs(60));
        assert_eq!(settings.unavailable_ttl, Duration::from_secs(90));
        assert_eq!(settings.pricing_refresh_interval, Duration::from_secs(6 * 3600));
        assert_eq!(settings.pricing_max_staleness, Duration::from_secs(12 * 3600));
        assert!(settings.isolated_vpc);
    }

    #[test]
    fn invalid_duration_names_the_field() {
        let config = FleetConfig::from_toml_str("[cache]\nttl = \"forever\"\n").unwrap();
        match config.settings() {
            Err(ConfigError::InvalidDuration { field, value }) => {
                assert_eq!(field, "cache.ttl");
                assert_eq!(value, "forever");
            }
            other => panic!("expected InvalidDuration, got {other:?}"),
        }
    }

    #[test]
    fn zero_durations_are_rejected() {
        for (toml_str, expected) in [
            ("[cache]\ncleanup_interval = \"0s\"\n", "cache.cleanup_interval"),
            ("[unavailable_offerings]\nttl = \"0m\"\n", "unavailable_offerings.ttl"),
            ("[pricing]\nrefresh_interval = \"0\"\n", "pricing.refresh_interval"),
            ("[provider]\napi_timeout = \"0ms\"\n", "provider.api_timeout"),
        ] {
            let config = FleetConfig::from_toml_str(toml_str).unwrap();
            match config.settings() {
                Err(ConfigError::InvalidDuration { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected InvalidDuration for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            FleetConfig::from_toml_str("[cache"),
            Err(ConfigError::Parse(_))
        ));
    }
}
