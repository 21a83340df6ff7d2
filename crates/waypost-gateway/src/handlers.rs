//! Gateway request handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, warn};

use crate::GatewayState;
use crate::error::GatewayError;
use crate::upstream::{self, OutboundRequest, UpstreamResponse};

/// Name this gateway reports on `/health`.
pub const SERVICE_NAME: &str = "ApiGateway";

/// Logical service a route forwards to, attached per route.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub service: Arc<str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health — local self-check, never proxied.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

/// Any method on `/api/<resource>[/{id}]`.
pub async fn proxy(
    State(state): State<GatewayState>,
    Extension(upstream): Extension<Upstream>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match forward(&state, &upstream.service, method, &uri, &headers, body).await {
        Ok(resp) => resp.into_response(),
        Err(e) => {
            warn!(service = %upstream.service, path = %uri.path(), error = %e, "request not forwarded");
            e.into_response()
        }
    }
}

/// Check discovery, resolve `service`, and replay the request against it.
///
/// Whatever status the backend answers with comes back as `Ok`.
pub async fn forward(
    state: &GatewayState,
    service: &str,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse, GatewayError> {
    state.discovery.check_available().await?;
    let target = state.discovery.resolve(service).await?;

    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let url = upstream::join_url(&target.url, path);
    debug!(%service, %method, %url, "forwarding");

    let req = OutboundRequest {
        method,
        url,
        content_type: headers.get(CONTENT_TYPE).cloned(),
        body,
    };

    upstream::send(&state.http, req, state.upstream_timeout)
        .await
        .map_err(|source| GatewayError::UpstreamUnreachable {
            service: service.to_string(),
            source,
        })
}
