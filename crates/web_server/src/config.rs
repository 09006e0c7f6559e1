use std::time::Duration;

use calendar_sync::CalendarSyncConfig;
use geo_query::{GeoQueryConfig, NominatimConfig};
use listing_search::DEFAULT_PROVIDER_TIMEOUT;
use postgres::database::DEFAULT_DATABASE_URL;

/// A partner inventory API to register with the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerEndpoint {
    /// Namespace name, the prefix of the partner's listing ids
    pub name: String,
    /// Base URL of the partner API
    pub base_url: String,
}

/// Server settings read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Address the HTTP server listens on
    pub bind_address: String,
    /// Calendar sync batching and schedule
    pub calendar: CalendarSyncConfig,
    /// Latency budget of every partner search
    pub partner_timeout: Duration,
    /// Partner providers, in result order
    pub partners: Vec<PartnerEndpoint>,
    /// Geocoder client settings
    pub geocoder: NominatimConfig,
    /// Location resolution defaults
    pub geo: GeoQueryConfig,
}

/// Custom error type for configuration loading
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    /// A variable is set but cannot be used
    #[error("Invalid value for {key}: {value}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

impl AppConfig {
    /// Reads the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; unset variables take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let calendar_defaults = CalendarSyncConfig::default();
        let geocoder_defaults = NominatimConfig::default();
        let geo_defaults = GeoQueryConfig::default();

        let batch_size: usize =
            parse_or(&lookup, "CALENDAR_BATCH_SIZE", calendar_defaults.batch_size)?;
        if batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CALENDAR_BATCH_SIZE",
                value: "0".to_string(),
            });
        }
        let refresh_secs: u64 = parse_or(
            &lookup,
            "CALENDAR_REFRESH_INTERVAL_SECS",
            calendar_defaults.refresh_interval.as_secs(),
        )?;
        let partner_timeout_ms: u64 = parse_or(
            &lookup,
            "PARTNER_TIMEOUT_MS",
            DEFAULT_PROVIDER_TIMEOUT.as_millis() as u64,
        )?;
        let default_radius: f64 =
            parse_or(&lookup, "DEFAULT_SEARCH_RADIUS", geo_defaults.default_radius)?;
        if !default_radius.is_finite() || default_radius <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_SEARCH_RADIUS",
                value: default_radius.to_string(),
            });
        }

        let partners = match lookup("PARTNER_PROVIDERS") {
            Some(raw) => parse_partners(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            calendar: CalendarSyncConfig {
                batch_size,
                refresh_interval: Duration::from_secs(refresh_secs),
            },
            partner_timeout: Duration::from_millis(partner_timeout_ms),
            partners,
            geocoder: NominatimConfig {
                base_url: lookup("GEOCODER_URL").unwrap_or(geocoder_defaults.base_url),
                user_agent: lookup("GEOCODER_USER_AGENT").unwrap_or(geocoder_defaults.user_agent),
                timeout: geocoder_defaults.timeout,
            },
            geo: GeoQueryConfig {
                default_radius,
                ..geo_defaults
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// Parses `name=url,name=url`; blank entries are ignored
fn parse_partners(raw: &str) -> Result<Vec<PartnerEndpoint>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
                Ok(PartnerEndpoint {
                    name: name.trim().to_string(),
                    base_url: url.trim().to_string(),
                })
            }
            _ => Err(ConfigError::Invalid {
                key: "PARTNER_PROVIDERS",
                value: entry.to_string(),
            }),
        })
        .collect()
}
