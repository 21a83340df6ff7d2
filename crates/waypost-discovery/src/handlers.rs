//! REST API handlers.
//!
//! Each handler maps one registry operation to a JSON response. None of
//! them can fail; the only non-200 answer is the 404 from `get_service`.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::info;

use waypost_registry::ServiceInfo;

use crate::DiscoveryState;

/// Name this service reports on `/health`.
pub const SERVICE_NAME: &str = "ServiceDiscovery";

/// `{ "message": ... }` body used by every mutating endpoint and the 404.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn message(msg: String) -> Json<MessageResponse> {
    Json(MessageResponse { message: msg })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// POST /register
pub async fn register(
    State(state): State<DiscoveryState>,
    Json(info): Json<ServiceInfo>,
) -> impl IntoResponse {
    let name = info.name.clone();
    info!(service = %name, url = %info.url, "register");
    state.registry.register(info);
    message(format!("Service {name} registered"))
}

/// DELETE /unregister/{name}
pub async fn unregister(
    State(state): State<DiscoveryState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let removed = state.registry.unregister(&name);
    info!(service = %name, removed, "unregister");
    message(format!("Service {name} unregistered"))
}

/// GET /service/{name}
pub async fn get_service(
    State(state): State<DiscoveryState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.registry.get_service(&name) {
        Some(info) => Json(info).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            message(format!("Service {name} not found or unavailable")),
        )
            .into_response(),
    }
}

/// GET /services
pub async fn list_services(State(state): State<DiscoveryState>) -> impl IntoResponse {
    Json(state.registry.get_all())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}
