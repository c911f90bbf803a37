//! Operator alerts sent over the notification channel.
//!
//! Every alert goes to the registered recipient only. Until someone has
//! registered, alerts are logged and dropped; delivery failures are logged and
//! never propagate to the caller.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::notifier::NotificationChannel;
use crate::state::SharedState;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "INFO",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Error => "ERROR",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            AlertLevel::Info => "✅",
            AlertLevel::Warning => "⚠️",
            AlertLevel::Error => "❌",
        }
    }
}

/// Render an alert as message text.
pub fn render(level: AlertLevel, title: &str, message: &str) -> String {
    if message.is_empty() {
        format!("{} {}", level.icon(), title)
    } else {
        format!("{} {}\n{}", level.icon(), title, message)
    }
}

/// Alert manager
#[derive(Clone)]
pub struct AlertManager {
    channel: Arc<dyn NotificationChannel>,
    state: Arc<SharedState>,
}

impl AlertManager {
    pub fn new(channel: Arc<dyn NotificationChannel>, state: Arc<SharedState>) -> Self {
        Self { channel, state }
    }

    /// Send an alert to the registered recipient
    pub async fn send(&self, level: AlertLevel, title: &str, message: &str) {
        match level {
            AlertLevel::Info => info!("[{}] {}", level.as_str(), title),
            AlertLevel::Warning => warn!("[{}] {}", level.as_str(), title),
            AlertLevel::Error => error!("[{}] {}", level.as_str(), title),
        }

        let Some(recipient) = self.state.recipient().await else {
            warn!("No recipient registered, alert dropped: {}", title);
            return;
        };

        let text = render(level, title, message);
        match self.channel.send(&recipient, &text).await {
            Ok(()) => debug!("Alert delivered to {}", recipient),
            Err(e) => error!("Failed to deliver alert to {}: {:#}", recipient, e),
        }
    }

    /// Send a prepared `(level, title, message)` alert
    pub async fn emit(&self, alert: (AlertLevel, String, String)) {
        let (level, title, message) = alert;
        self.send(level, &title, &message).await;
    }
}

/// Alert types for monitoring and remediation events
pub struct AlertTypes;

impl AlertTypes {
    /// The oracle reported a domain as blocked
    pub fn domain_blocked(domain: &str) -> (AlertLevel, String, String) {
        (
            AlertLevel::Warning,
            format!("Domain blocked: {}", domain),
            "Looking up a backup domain and rewriting short links.".to_string(),
        )
    }

    /// No backup mapping exists for a blocked domain
    pub fn no_backup(domain: &str) -> (AlertLevel, String, String) {
        (
            AlertLevel::Error,
            format!("No backup found for {}", domain),
            "Add an 'old domain : <blocked>, new domain : <backup>' record to the backup file."
                .to_string(),
        )
    }

    /// The backup mapping file could not be read
    pub fn backup_lookup_failed(domain: &str, error: &str) -> (AlertLevel, String, String) {
        (
            AlertLevel::Error,
            format!("Cannot read backup mapping for {}", domain),
            error.to_string(),
        )
    }

    /// Listing short links failed, remediation aborted
    pub fn link_listing_failed(domain: &str, error: &str) -> (AlertLevel, String, String) {
        (
            AlertLevel::Error,
            format!("Short link listing failed for {}", domain),
            format!("Remediation will be retried on the next check.\n{}", error),
        )
    }

    /// One short link was repointed
    pub fn link_patched(domain: &str, new_target: &str) -> (AlertLevel, String, String) {
        (
            AlertLevel::Info,
            format!("Short link updated for {}", domain),
            format!("New target: {}", new_target),
        )
    }

    /// One short link could not be repointed
    pub fn link_patch_failed(
        domain: &str,
        link_id: &str,
        error: &str,
    ) -> (AlertLevel, String, String) {
        (
            AlertLevel::Error,
            format!("Failed to update short link {} for {}", link_id, domain),
            error.to_string(),
        )
    }

    /// The tracked domain list now uses the backup domain
    pub fn domain_list_updated(old: &str, new: &str) -> (AlertLevel, String, String) {
        (
            AlertLevel::Info,
            "Domain list updated".to_string(),
            format!("'{}' has been replaced with '{}'.", old, new),
        )
    }

    /// Persisting the updated domain list failed after links were rewritten
    pub fn domain_list_persist_failed(
        old: &str,
        new: &str,
        error: &str,
    ) -> (AlertLevel, String, String) {
        (
            AlertLevel::Error,
            "Domain list could not be saved".to_string(),
            format!(
                "Short links now point at '{}' but the list still tracks '{}'.\n{}",
                new, old, error
            ),
        )
    }

    /// Periodic heartbeat when nothing is blocked
    pub fn all_clear(domain_count: usize) -> (AlertLevel, String, String) {
        (
            AlertLevel::Info,
            "All domains clear".to_string(),
            format!(
                "{} tracked domains checked, none blocked ({}).",
                domain_count,
                chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
            ),
        )
    }

    /// The monitor loop stopped
    pub fn monitor_halted(reason: &str) -> (AlertLevel, String, String) {
        (
            AlertLevel::Error,
            "Monitoring stopped".to_string(),
            format!(
                "{}\nCommands are still accepted; restart after fixing the domain list.",
                reason
            ),
        )
    }
}
