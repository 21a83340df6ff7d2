//! waypost.toml configuration parser.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a working single-host setup: discovery on :5000, gateway on :8080.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::parse_duration;

/// Errors raised while validating a parsed configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration for `{field}`: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("`{field}` must be greater than zero")]
    ZeroDuration { field: &'static str },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypostConfig {
    pub discovery: DiscoveryConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub port: u16,
    /// Time between health probe rounds (e.g., "10s").
    pub health_interval: String,
    /// Timeout per health probe (e.g., "5s").
    pub probe_timeout: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            health_interval: "10s".to_string(),
            probe_timeout: "5s".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn health_interval(&self) -> Result<Duration, ConfigError> {
        duration_field("discovery.health_interval", &self.health_interval)
    }

    pub fn probe_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field("discovery.probe_timeout", &self.probe_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    /// Base URL of the discovery service.
    pub discovery_url: String,
    /// Timeout for each call to the discovery service.
    pub discovery_timeout: String,
    /// Timeout for each forwarded upstream call.
    pub upstream_timeout: String,
    /// `/api/<resource>` → logical service name.
    pub routes: BTreeMap<String, String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            discovery_url: "http://localhost:5000".to_string(),
            discovery_timeout: "5s".to_string(),
            upstream_timeout: "30s".to_string(),
            routes: default_routes(),
        }
    }
}

impl GatewayConfig {
    pub fn discovery_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field("gateway.discovery_timeout", &self.discovery_timeout)
    }

    pub fn upstream_timeout(&self) -> Result<Duration, ConfigError> {
        duration_field("gateway.upstream_timeout", &self.upstream_timeout)
    }
}

fn default_routes() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("clientes".to_string(), "ApiCliente".to_string()),
        ("empresas".to_string(), "ApiEmpresa".to_string()),
    ])
}

fn duration_field(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let duration = parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })?;
    if duration.is_zero() {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(duration)
}

impl WaypostConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WaypostConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every duration field parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.discovery.health_interval()?;
        self.discovery.probe_timeout()?;
        self.gateway.discovery_timeout()?;
        self.gateway.upstream_timeout()?;
        Ok(())
    }
}
