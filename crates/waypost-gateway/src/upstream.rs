//! Outbound HTTP calls.
//!
//! [`send`] performs one request with a timeout and reports either the
//! complete response (any status) or a [`TransportError`]. Callers decide
//! what a status code means; this layer never does.

use std::time::Duration;

use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::error::TransportError;

/// Pooled HTTP/1 client shared by every request the gateway makes.
pub type HttpClient = Client<HttpConnector, Full<Bytes>>;

pub fn new_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build_http()
}

/// A response that made it back over the network, whatever its status.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let content_type = self
            .content_type
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        (self.status, [(CONTENT_TYPE, content_type)], self.body).into_response()
    }
}

/// An outbound request, built by the caller and executed by [`send`].
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            content_type: None,
            body: Bytes::new(),
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            ..Self::get(url)
        }
    }

    pub fn json(method: Method, url: impl Into<String>, body: Bytes) -> Self {
        Self {
            method,
            url: url.into(),
            content_type: Some(HeaderValue::from_static("application/json")),
            body,
        }
    }
}

/// Execute `req`, reading the whole response body, within `timeout`.
pub async fn send(
    client: &HttpClient,
    req: OutboundRequest,
    timeout: Duration,
) -> Result<UpstreamResponse, TransportError> {
    let uri = req.url.parse::<Uri>().map_err(|e| {
        TransportError::InvalidUrl {
            url: req.url.clone(),
            reason: e.to_string(),
        }
    })?;

    let mut builder = Request::builder().method(req.method).uri(uri);
    if let Some(content_type) = req.content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    let request = builder
        .body(Full::new(req.body))
        .map_err(|e| TransportError::InvalidUrl {
            url: req.url.clone(),
            reason: e.to_string(),
        })?;

    let exchange = async {
        let response = client.request(request).await?;
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.into_body().collect().await?.to_bytes();
        Ok::<_, TransportError>(UpstreamResponse {
            status,
            content_type,
            body,
        })
    };

    tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| TransportError::Timeout(timeout))?
}

/// Join a base URL and an absolute path without doubling the slash.
pub fn join_url(base: &str, path_and_query: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path_and_query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::{get, post};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(join_url("http://a:1/", "/api/x"), "http://a:1/api/x");
        assert_eq!(join_url("http://a:1", "/api/x?y=1"), "http://a:1/api/x?y=1");
    }

    #[tokio::test]
    async fn non_2xx_is_a_response_not_an_error() {
        let base = serve(Router::new().route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "nope") }),
        ))
        .await;

        let resp = send(
            &new_client(),
            OutboundRequest::get(join_url(&base, "/missing")),
            Duration::from_secs(2),
        )
        .await
        .unwrap();
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(&resp.body[..], b"nope");
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn body_and_content_type_are_sent() {
        let base = serve(Router::new().route(
            "/echo",
            post(|headers: http::HeaderMap, body: Bytes| async move {
                let ct = headers
                    .get(CONTENT_TYPE)
                    .map(|v| v.to_str().unwrap().to_string())
                    .unwrap_or_default();
                format!("{ct}|{}", String::from_utf8_lossy(&body))
            }),
        ))
        .await;

        let resp = send(
            &new_client(),
            OutboundRequest::json(Method::POST, join_url(&base, "/echo"), Bytes::from("{\"a\":1}")),
            Duration::from_secs(2),
        )
        .await
        .unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(&resp.body[..], b"application/json|{\"a\":1}");
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let err = send(
            &new_client(),
            OutboundRequest::get("http://127.0.0.1:1/health"),
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransportError::Request(_) | TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let base = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;

        let err = send(
            &new_client(),
            OutboundRequest::get(join_url(&base, "/slow")),
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_transport_error() {
        let err = send(
            &new_client(),
            OutboundRequest::get("not a url"),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }
}
