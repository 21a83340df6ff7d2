//! Client for the discovery service's REST API.
//!
//! The gateway uses [`DiscoveryClient::check_available`] and
//! [`DiscoveryClient::resolve`] on every request; nothing is cached between
//! calls. The management calls (`register`, `unregister`, `list`) back the
//! `waypostd` client subcommands and let backends register themselves.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use waypost_registry::ServiceInfo;

use crate::error::{ClientError, GatewayError, TransportError};
use crate::upstream::{self, HttpClient, OutboundRequest, UpstreamResponse};

/// Everything but RFC 3986 unreserved characters is escaped in a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Clone)]
pub struct DiscoveryClient {
    base_url: Arc<str>,
    http: HttpClient,
    timeout: Duration,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

impl DiscoveryClient {
    pub fn new(base_url: &str, http: HttpClient, timeout: Duration) -> Self {
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            http,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, req: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        upstream::send(&self.http, req, self.timeout).await
    }

    fn url(&self, path: &str) -> String {
        upstream::join_url(&self.base_url, path)
    }

    /// `{prefix}/{name}` with `name` escaped as a single path segment.
    fn named_url(&self, prefix: &str, name: &str) -> String {
        self.url(&format!("{prefix}/{}", utf8_percent_encode(name, SEGMENT)))
    }

    /// Probe discovery's own `/health`.
    pub async fn check_available(&self) -> Result<(), GatewayError> {
        match self.call(OutboundRequest::get(self.url("/health"))).await {
            Ok(resp) if resp.is_success() => Ok(()),
            Ok(resp) => {
                debug!(status = %resp.status, "discovery health non-2xx");
                Err(GatewayError::DiscoveryUnavailable)
            }
            Err(e) => {
                debug!(error = %e, "discovery health probe failed");
                Err(GatewayError::DiscoveryUnavailable)
            }
        }
    }

    /// Resolve a logical name to its currently healthy registration.
    ///
    /// Every failure mode after the liveness check (404, transport error,
    /// unreadable body) is reported as `ServiceUnresolved`.
    pub async fn resolve(&self, service: &str) -> Result<ServiceInfo, GatewayError> {
        let unresolved = || GatewayError::ServiceUnresolved {
            service: service.to_string(),
        };

        let resp = self
            .call(OutboundRequest::get(self.named_url("/service", service)))
            .await
            .map_err(|e| {
                debug!(%service, error = %e, "resolution request failed");
                unresolved()
            })?;

        if !resp.is_success() {
            debug!(%service, status = %resp.status, "service not resolved");
            return Err(unresolved());
        }

        serde_json::from_slice::<ServiceInfo>(&resp.body).map_err(|e| {
            debug!(%service, error = %e, "resolution body unreadable");
            unresolved()
        })
    }

    /// Register `name` at `url`. Returns discovery's confirmation message.
    pub async fn register(&self, name: &str, url: &str) -> Result<String, ClientError> {
        let body = serde_json::to_vec(&ServiceInfo::new(name, url))?;
        let resp = self
            .call(OutboundRequest::json(
                Method::POST,
                self.url("/register"),
                Bytes::from(body),
            ))
            .await?;
        Ok(expect_success::<MessageBody>(resp)?.message)
    }

    pub async fn unregister(&self, name: &str) -> Result<String, ClientError> {
        let resp = self
            .call(OutboundRequest::delete(self.named_url("/unregister", name)))
            .await?;
        Ok(expect_success::<MessageBody>(resp)?.message)
    }

    /// Every registered service, healthy or not.
    pub async fn list(&self) -> Result<Vec<ServiceInfo>, ClientError> {
        let resp = self.call(OutboundRequest::get(self.url("/services"))).await?;
        expect_success(resp)
    }
}

fn expect_success<T: DeserializeOwned>(resp: UpstreamResponse) -> Result<T, ClientError> {
    if !resp.is_success() {
        return Err(ClientError::Status {
            status: resp.status,
            body: String::from_utf8_lossy(&resp.body).into_owned(),
        });
    }
    Ok(serde_json::from_slice(&resp.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::new_client;
    use waypost_registry::Registry;

    async fn start_discovery(registry: Registry) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = waypost_discovery::build_router(registry);
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> DiscoveryClient {
        DiscoveryClient::new(base, new_client(), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn available_when_discovery_up() {
        let base = start_discovery(Registry::new()).await;
        assert!(client(&base).check_available().await.is_ok());
    }

    #[tokio::test]
    async fn unavailable_when_discovery_down() {
        let err = client("http://127.0.0.1:1").check_available().await.unwrap_err();
        assert!(matches!(err, GatewayError::DiscoveryUnavailable));
    }

    #[tokio::test]
    async fn resolve_registered_and_unknown() {
        let registry = Registry::new();
        registry.register(ServiceInfo::new("ApiCliente", "http://10.0.0.1:5001"));
        let base = start_discovery(registry.clone()).await;
        let client = client(&base);

        let info = client.resolve("ApiCliente").await.unwrap();
        assert_eq!(info.url, "http://10.0.0.1:5001");

        let err = client.resolve("ApiEmpresa").await.unwrap_err();
        assert_eq!(err.to_string(), "ApiEmpresa unavailable");

        registry.update_health("ApiCliente", false);
        assert!(client.resolve("ApiCliente").await.is_err());
    }

    #[tokio::test]
    async fn management_calls_roundtrip() {
        let base = start_discovery(Registry::new()).await;
        let client = client(&base);

        let msg = client.register("ApiEmpresa", "http://localhost:5002").await.unwrap();
        assert!(msg.contains("ApiEmpresa"));

        let services = client.list().await.unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "ApiEmpresa");

        client.unregister("ApiEmpresa").await.unwrap();
        assert!(client.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_with_reserved_characters_roundtrip() {
        let registry = Registry::new();
        let base = start_discovery(registry.clone()).await;
        let client = client(&base);

        for name in ["My Svc", "a/b", "ñandú?x=1#y"] {
            client.register(name, "http://localhost:5003").await.unwrap();
            assert_eq!(client.resolve(name).await.unwrap().name, name);
            assert!(registry.get_service(name).is_some());

            let msg = client.unregister(name).await.unwrap();
            assert!(msg.contains(name));
            assert!(registry.is_empty());
        }
    }

    #[tokio::test]
    async fn named_url_escapes_one_segment() {
        let client = client("http://discovery:5000/");
        assert_eq!(
            client.named_url("/service", "My Svc/v2"),
            "http://discovery:5000/service/My%20Svc%2Fv2"
        );
        assert_eq!(
            client.named_url("/unregister", "Api-Cliente_1.0~x"),
            "http://discovery:5000/unregister/Api-Cliente_1.0~x"
        );
    }

    #[tokio::test]
    async fn management_call_to_dead_discovery_is_transport_error() {
        let err = client("http://127.0.0.1:1").list().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
