//! Error types for the gateway and its HTTP clients.
//!
//! A backend answering 4xx/5xx is not an error here: it arrives as an
//! [`UpstreamResponse`](crate::upstream::UpstreamResponse) and is relayed
//! unchanged. Only failures to get *any* answer end up in these enums.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A network call that produced no HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("reading response body failed: {0}")]
    Body(#[from] hyper::Error),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Failures the gateway turns into `503 {"error": ...}`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The discovery service's own health probe failed.
    #[error("Service discovery unavailable")]
    DiscoveryUnavailable,

    /// Discovery answered, but the service is unknown or unhealthy.
    #[error("{service} unavailable")]
    ServiceUnresolved { service: String },

    /// The resolved backend could not be reached.
    #[error("Error connecting to {service}")]
    UpstreamUnreachable {
        service: String,
        #[source]
        source: TransportError,
    },
}

#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors from the discovery client's management calls (register, list, ...).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("discovery answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failed_stage() {
        assert_eq!(
            GatewayError::DiscoveryUnavailable.to_string(),
            "Service discovery unavailable"
        );
        assert_eq!(
            GatewayError::ServiceUnresolved {
                service: "ApiCliente".to_string()
            }
            .to_string(),
            "ApiCliente unavailable"
        );
        let err = GatewayError::UpstreamUnreachable {
            service: "ApiEmpresa".to_string(),
            source: TransportError::Timeout(std::time::Duration::from_secs(1)),
        };
        assert_eq!(err.to_string(), "Error connecting to ApiEmpresa");
    }

    #[test]
    fn gateway_errors_are_503() {
        let resp = GatewayError::DiscoveryUnavailable.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
