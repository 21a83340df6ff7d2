//! waypost-gateway — stateless front door for the registered backends.
//!
//! For every proxied request the gateway:
//!
//! 1. probes discovery's `/health` (`503` "Service discovery unavailable" on failure),
//! 2. resolves the route's logical service via `GET /service/{name}`
//!    (`503` "{service} unavailable" on failure),
//! 3. replays method, path, query and body against the resolved URL
//!    (`503` "Error connecting to {service}" if no response arrives),
//! 4. relays the backend's status and body unchanged, 4xx/5xx included.
//!
//! Nothing is cached and nothing is retried. The only shared state is the
//! immutable configuration and a pooled HTTP client.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET/POST/PUT/DELETE | `/api/<resource>` | Forwarded to the resource's service |
//! | GET/POST/PUT/DELETE | `/api/<resource>/{id}` | Forwarded to the resource's service |
//! | GET | `/health` | Gateway self-check |

pub mod discovery;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod upstream;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::Extension;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub use discovery::DiscoveryClient;
pub use error::{ClientError, GatewayError, TransportError};
pub use routes::RouteTable;
pub use upstream::{HttpClient, UpstreamResponse, new_client};

use handlers::Upstream;

/// Default timeout for calls to the discovery service.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for forwarded requests.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state for gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub discovery: DiscoveryClient,
    pub http: HttpClient,
    pub upstream_timeout: Duration,
}

impl GatewayState {
    pub fn new(discovery_url: &str, discovery_timeout: Duration, upstream_timeout: Duration) -> Self {
        let http = new_client();
        Self {
            discovery: DiscoveryClient::new(discovery_url, http.clone(), discovery_timeout),
            http,
            upstream_timeout,
        }
    }
}

/// Build the gateway router: one pair of routes per resource in `routes`.
///
/// Resources not in the table fall through to axum's default 404.
pub fn build_router(state: GatewayState, routes: &RouteTable) -> Router {
    let mut router = Router::new().route("/health", get(handlers::health));

    for (resource, service) in routes.iter() {
        let methods = get(handlers::proxy)
            .post(handlers::proxy)
            .put(handlers::proxy)
            .delete(handlers::proxy)
            .layer(Extension(Upstream {
                service: Arc::from(service),
            }));

        router = router
            .route(&format!("/api/{resource}"), methods.clone())
            .route(&format!("/api/{resource}/{{id}}"), methods);
    }

    router.with_state(state)
}

/// A configured gateway ready to serve.
pub struct Gateway {
    state: GatewayState,
    routes: RouteTable,
}

impl Gateway {
    pub fn new(state: GatewayState, routes: RouteTable) -> Self {
        Self { state, routes }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.routes)
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            addr = ?listener.local_addr().ok(),
            discovery = %self.state.discovery.base_url(),
            routes = self.routes.len(),
            "gateway listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("gateway stopped");
        Ok(())
    }
}
