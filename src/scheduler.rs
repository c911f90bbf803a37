//! Monitor scheduler.
//!
//! Each pass takes a snapshot of the tracked domains, checks them in
//! fixed-size batches, hands every blocked domain to the remediation engine
//! and, when nothing was blocked, sends a rate-limited all-clear heartbeat.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::alerts::{AlertManager, AlertTypes};
use crate::checker::BlocklistChecker;
use crate::error::LinkShieldError;
use crate::remediation::Remediator;
use crate::signal::ShutdownToken;
use crate::state::SharedState;
use crate::utils::format_duration;

/// Split `domains` into order-preserving batches of at most `batch_size`.
///
/// A zero batch size is treated as one.
pub fn partition(domains: &[String], batch_size: usize) -> Vec<&[String]> {
    domains.chunks(batch_size.max(1)).collect()
}

/// Scheduler tuning
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub batch_size: usize,
    pub check_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            check_interval: Duration::from_secs(120),
            heartbeat_interval: Duration::from_secs(3600),
        }
    }
}

/// Summary of one pass over the domain list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Number of batches sent to the oracle
    pub batches: usize,
    /// Batches whose check failed
    pub failed_batches: usize,
    /// Blocked domains, in the order they were reported
    pub blocked: Vec<String>,
    /// Whether an all-clear heartbeat was sent
    pub heartbeat_sent: bool,
    /// The pass stopped early because shutdown was requested
    pub cancelled: bool,
}

/// Why the monitor loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    Cancelled,
    NoDomains,
}

/// Monitor scheduler
pub struct MonitorScheduler {
    state: Arc<SharedState>,
    checker: Arc<dyn BlocklistChecker>,
    remediator: Remediator,
    alerts: AlertManager,
    settings: MonitorSettings,
}

impl MonitorScheduler {
    pub fn new(
        state: Arc<SharedState>,
        checker: Arc<dyn BlocklistChecker>,
        remediator: Remediator,
        alerts: AlertManager,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            state,
            checker,
            remediator,
            alerts,
            settings,
        }
    }

    /// Run one pass over the domain list.
    ///
    /// Returns [`LinkShieldError::NoDomains`] when nothing is tracked.
    pub async fn tick(&self, token: &ShutdownToken) -> Result<TickReport, LinkShieldError> {
        let domains = self.state.snapshot_domains().await;
        if domains.is_empty() {
            return Err(LinkShieldError::NoDomains);
        }

        let mut report = TickReport::default();

        for batch in partition(&domains, self.settings.batch_size) {
            if token.is_cancelled() {
                report.cancelled = true;
                return Ok(report);
            }

            debug!("Processing batch: {:?}", batch);
            report.batches += 1;

            let Some(result) = token.run_until_cancelled(self.checker.check(batch)).await else {
                report.cancelled = true;
                return Ok(report);
            };

            let results = match result {
                Ok(results) => results,
                Err(e) => {
                    // Fail open: an unknown status never triggers an alert
                    warn!("Blocklist check failed for batch {:?}: {:#}", batch, e);
                    report.failed_batches += 1;
                    continue;
                }
            };

            for blocked in results.iter().filter(|r| r.is_blocked()) {
                info!("Domain blocked: {}", blocked.domain);
                report.blocked.push(blocked.domain.clone());
                if token.is_cancelled() {
                    report.cancelled = true;
                    return Ok(report);
                }
                self.remediator.remediate(&blocked.domain, token).await;
            }
        }

        if report.blocked.is_empty()
            && self
                .state
                .claim_heartbeat(self.settings.heartbeat_interval)
                .await
        {
            info!("All domains clear");
            report.heartbeat_sent = token
                .run_until_cancelled(self.alerts.emit(AlertTypes::all_clear(domains.len())))
                .await
                .is_some();
        }

        Ok(report)
    }

    /// Run passes until cancelled or the domain list is empty.
    pub async fn run(&self, token: &ShutdownToken) -> MonitorExit {
        info!(
            "Monitor started: batch size {}, check every {}, heartbeat every {}",
            self.settings.batch_size,
            format_duration(self.settings.check_interval),
            format_duration(self.settings.heartbeat_interval)
        );

        loop {
            if token.is_cancelled() {
                return MonitorExit::Cancelled;
            }

            match self.tick(token).await {
                Ok(report) => {
                    if report.cancelled {
                        return MonitorExit::Cancelled;
                    }
                    info!(
                        "Pass complete: {} batches, {} failed, {} blocked",
                        report.batches,
                        report.failed_batches,
                        report.blocked.len()
                    );
                }
                Err(LinkShieldError::NoDomains) => {
                    error!("Domain list is empty, add domains to monitor");
                    return MonitorExit::NoDomains;
                }
                Err(e) => {
                    error!("Monitor pass failed: {}", e);
                }
            }

            debug!(
                "Waiting {} before the next check",
                format_duration(self.settings.check_interval)
            );
            if !token.sleep(self.settings.check_interval).await {
                return MonitorExit::Cancelled;
            }
        }
    }
}
