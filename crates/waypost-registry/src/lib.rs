//! waypost-registry — the authoritative service directory.
//!
//! Maps a logical service name to its current [`ServiceInfo`]. The
//! [`Registry`] is `Clone` + `Send` + `Sync` (backed by `Arc<DashMap>`) and
//! is shared between the HTTP handlers and the health monitor.
//!
//! # Entry lifecycle
//!
//! ```text
//! Absent ──register──▶ Healthy ◀──probe ok── Unhealthy
//!                        │  └───probe failed───▶ │
//!                        └──────unregister───────┴──▶ Absent
//! ```
//!
//! Registration always (re)starts an entry as `Healthy`, even if the
//! previous record for that name was unhealthy.

pub mod registry;
pub mod types;

pub use registry::Registry;
pub use types::ServiceInfo;
