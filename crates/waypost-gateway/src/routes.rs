//! Static route table: `/api/<resource>` → logical service name.

use std::collections::BTreeMap;

use waypost_core::GatewayConfig;

/// Maps the first path segment after `/api/` to the service that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl RouteTable {
    pub fn new(routes: BTreeMap<String, String>) -> Self {
        Self { routes }
    }

    pub fn service_for(&self, resource: &str) -> Option<&str> {
        self.routes.get(resource).map(String::as_str)
    }

    /// `(resource, service)` pairs in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(r, s)| (r.as_str(), s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    /// The routes of a default [`GatewayConfig`].
    fn default() -> Self {
        Self::new(GatewayConfig::default().routes)
    }
}

impl<R: Into<String>, S: Into<String>> FromIterator<(R, S)> for RouteTable {
    fn from_iter<I: IntoIterator<Item = (R, S)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(r, s)| (r.into(), s.into())).collect())
    }
}
