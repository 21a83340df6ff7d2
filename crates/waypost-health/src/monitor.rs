//! Health monitor — background task that probes every registered service.
//!
//! One task, one ticker, one stop signal. Probes within a round run
//! strictly in sequence, so a hanging service delays the ones listed after
//! it by up to `probe_timeout` and can push back the next round. That is
//! acceptable for the handful of services a single discovery node tracks.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use waypost_registry::Registry;

use crate::checker::{ProbeResult, http_probe};

/// Default time between probe rounds.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Default timeout for a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest accepted interval; longer values are clamped so tick deadlines
/// cannot overflow `Instant`.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Outcome counts for one probe round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub probed: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    /// Results dropped because the service was re-registered or removed mid-probe.
    pub discarded: usize,
}

/// Periodically probes all registry members and records their health.
#[derive(Clone)]
pub struct HealthMonitor {
    registry: Registry,
    interval: Duration,
    probe_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            interval: DEFAULT_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Set the time between rounds.
    ///
    /// A zero interval is ignored (the previous value is kept); anything
    /// above [`MAX_INTERVAL`] is clamped.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!("ignoring zero health interval");
            return self;
        }
        self.interval = interval.min(MAX_INTERVAL);
        self
    }

    /// Set the per-probe timeout. Zero is ignored, like in [`with_interval`](Self::with_interval).
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            warn!("ignoring zero probe timeout");
            return self;
        }
        self.probe_timeout = timeout.min(MAX_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Probe every service currently in the registry, one at a time.
    pub async fn probe_round(&self) -> RoundReport {
        let services = self.registry.get_all();
        let mut report = RoundReport::default();

        debug!(count = services.len(), "health round starting");

        for service in services {
            let result = http_probe(&service.health_url(), self.probe_timeout).await;
            report.probed += 1;

            // Only apply the result to the registration that was probed.
            if !self
                .registry
                .update_health_if_url(&service.name, &service.url, result.is_healthy())
            {
                report.discarded += 1;
                debug!(service = %service.name, url = %service.url, "stale health result discarded");
                continue;
            }

            match result {
                ProbeResult::Healthy => {
                    report.healthy += 1;
                    info!(service = %service.name, "health check: healthy");
                }
                ProbeResult::Unhealthy => {
                    report.unhealthy += 1;
                    info!(service = %service.name, "health check: unhealthy");
                }
                ProbeResult::Failed => {
                    report.unhealthy += 1;
                    warn!(service = %service.name, url = %service.url, "health check failed");
                }
            }
        }

        debug!(
            probed = report.probed,
            healthy = report.healthy,
            unhealthy = report.unhealthy,
            discarded = report.discarded,
            "health round finished"
        );
        report
    }

    /// Run probe rounds until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// The first round starts one full interval after the call. A round in
    /// progress when shutdown arrives is abandoned between two registry
    /// updates; each update is atomic per service.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let start = Instant::now()
            .checked_add(self.interval)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.probe_timeout.as_millis() as u64,
            "health monitor started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.probe_round() => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                debug!("health round abandoned on shutdown");
                                break;
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("health monitor stopped");
    }

    /// Spawn [`run`](Self::run) on the runtime and return a handle to stop it.
    pub fn spawn(self) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });
        MonitorHandle {
            shutdown_tx,
            handle,
        }
    }
}

/// Handle to a spawned [`HealthMonitor`].
pub struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the monitor to stop and wait for the task to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "health monitor task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
