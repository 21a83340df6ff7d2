//! Domain types for the service registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered service and its last known health.
///
/// Serialized with camelCase field names. On registration only `name` and
/// `url` are required; the health fields are overwritten by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    /// Logical service name, the registry key.
    pub name: String,
    /// Base URL the service is reachable at (e.g., "http://10.0.0.5:5001").
    pub url: String,
    #[serde(default = "default_healthy")]
    pub is_healthy: bool,
    #[serde(default = "Utc::now")]
    pub last_health_check: DateTime<Utc>,
}

fn default_healthy() -> bool {
    true
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            is_healthy: true,
            last_health_check: Utc::now(),
        }
    }

    /// URL of this service's health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_registration_body_with_only_name_and_url() {
        let info: ServiceInfo =
            serde_json::from_str(r#"{"name":"ApiCliente","url":"http://localhost:5001"}"#).unwrap();
        assert_eq!(info.name, "ApiCliente");
        assert_eq!(info.url, "http://localhost:5001");
        assert!(info.is_healthy);
    }

    #[test]
    fn serializes_camel_case() {
        let info = ServiceInfo::new("ApiEmpresa", "http://localhost:5002");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["name"], "ApiEmpresa");
        assert_eq!(json["isHealthy"], true);
        assert!(json["lastHealthCheck"].is_string());
    }

    #[test]
    fn health_url_strips_trailing_slash() {
        let info = ServiceInfo::new("a", "http://localhost:5001/");
        assert_eq!(info.health_url(), "http://localhost:5001/health");
    }
}
