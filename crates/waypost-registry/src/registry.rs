//! In-memory service registry.
//!
//! Every operation touches a single key and is atomic for that key. There
//! is no cross-key transaction: a caller iterating [`Registry::get_all`]
//! sees a snapshot that may already be stale.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::types::ServiceInfo;

/// Thread-safe registry of services keyed by logical name.
#[derive(Clone, Default)]
pub struct Registry {
    services: Arc<DashMap<String, ServiceInfo>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace the record for `info.name`.
    ///
    /// The stored record is always healthy with a fresh timestamp,
    /// whatever the caller sent.
    pub fn register(&self, mut info: ServiceInfo) {
        info.is_healthy = true;
        info.last_health_check = Utc::now();
        debug!(service = %info.name, url = %info.url, "service registered");
        self.services.insert(info.name.clone(), info);
    }

    /// Remove a service. Returns whether an entry was present.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.services.remove(name).is_some();
        debug!(service = name, removed, "service unregistered");
        removed
    }

    /// Look up a service, hiding it while it is unhealthy.
    pub fn get_service(&self, name: &str) -> Option<ServiceInfo> {
        self.services
            .get(name)
            .filter(|entry| entry.is_healthy)
            .map(|entry| entry.value().clone())
    }

    /// All services regardless of health.
    pub fn get_all(&self) -> Vec<ServiceInfo> {
        self.services
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Set the health flag of an existing record and refresh its timestamp.
    ///
    /// No-op if the service was unregistered in the meantime.
    pub fn update_health(&self, name: &str, is_healthy: bool) {
        if let Some(mut entry) = self.services.get_mut(name) {
            entry.is_healthy = is_healthy;
            entry.last_health_check = Utc::now();
        }
    }

    /// Like [`update_health`](Self::update_health), but only when the entry
    /// still points at `url`. Returns whether the entry was updated.
    pub fn update_health_if_url(&self, name: &str, url: &str, is_healthy: bool) -> bool {
        match self.services.get_mut(name) {
            Some(mut entry) if entry.url == url => {
                entry.is_healthy = is_healthy;
                entry.last_health_check = Utc::now();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
