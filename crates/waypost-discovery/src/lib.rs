//! waypost-discovery — the service directory over HTTP.
//!
//! Owns the [`Registry`] and the [`HealthMonitor`] and exposes the
//! registry through a small REST surface.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/register` | Register or replace a service |
//! | DELETE | `/unregister/{name}` | Remove a service (idempotent) |
//! | GET | `/service/{name}` | Resolve a healthy service, 404 otherwise |
//! | GET | `/services` | List all services, any health |
//! | GET | `/health` | Discovery self-check |

pub mod handlers;

use std::future::Future;

use axum::Router;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tracing::info;

use waypost_health::HealthMonitor;
use waypost_registry::Registry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct DiscoveryState {
    pub registry: Registry,
}

/// Build the discovery API router over `registry`.
pub fn build_router(registry: Registry) -> Router {
    let state = DiscoveryState { registry };

    Router::new()
        .route("/register", post(handlers::register))
        .route("/unregister/{name}", delete(handlers::unregister))
        .route("/service/{name}", get(handlers::get_service))
        .route("/services", get(handlers::list_services))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// The registry, its health monitor, and the HTTP surface in front of them.
pub struct DiscoveryService {
    registry: Registry,
    monitor: HealthMonitor,
}

impl DiscoveryService {
    pub fn new(registry: Registry, monitor: HealthMonitor) -> Self {
        Self { registry, monitor }
    }

    /// A service with a fresh registry and a default-timed monitor.
    pub fn with_defaults() -> Self {
        let registry = Registry::new();
        let monitor = HealthMonitor::new(registry.clone());
        Self::new(registry, monitor)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn router(&self) -> Router {
        build_router(self.registry.clone())
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// The health monitor is started before the first request is accepted
    /// and stopped after the server has drained.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let monitor = self.monitor.spawn();

        info!(addr = ?listener.local_addr().ok(), "discovery service listening");

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;

        monitor.stop().await;
        info!("discovery service stopped");
        result
    }
}
