//! waypost-health — liveness probing for registered services.
//!
//! A single background task wakes up on a fixed interval, snapshots the
//! registry, and probes each service's `GET <url>/health` one after
//! another. The outcome is written straight back to the registry:
//!
//! ```text
//! HealthMonitor (one task)
//!   └── every `interval`
//!       ├── Registry::get_all()       snapshot
//!       ├── http_probe(url/health)    sequential, per-probe timeout
//!       └── Registry::update_health() 2xx → healthy, anything else → unhealthy
//! ```
//!
//! There is no debounce: one failed probe hides a service from resolution,
//! one successful probe brings it back.

pub mod checker;
pub mod monitor;

pub use checker::{ProbeResult, http_probe};
pub use monitor::{HealthMonitor, MonitorHandle, RoundReport};
