//! Remediation of a blocked domain.
//!
//! Steps, in order:
//! 1. alert that the domain is blocked
//! 2. resolve its backup domain (fresh read of the mapping file)
//! 3. list short links and keep those whose target contains the domain
//! 4. rewrite and patch each matching link independently
//! 5. if any patch succeeded, swap the domain for its backup in the tracked list
//!
//! Shutdown stops step 4 between links; whatever was patched is still
//! committed in step 5.
//!
//! A domain whose links were all patched no longer matches any link, so a
//! repeated call only re-alerts and leaves the list alone. When nothing could
//! be patched the list is left as is and the next monitor pass retries.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::alerts::{AlertLevel, AlertManager, AlertTypes};
use crate::links::{LinkRewriter, ShortLink};
use crate::signal::ShutdownToken;
use crate::state::{ReplaceOutcome, SharedState};

/// How a remediation attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// No backup mapping for the domain
    NoBackup,
    /// The mapping file could not be read
    BackupLookupFailed,
    /// Listing short links failed before anything was patched
    LinkListingFailed,
    /// Shutdown was requested before any link was patched
    Cancelled,
    /// No link could be patched; the domain list is unchanged
    NothingPatched { backup: String, failed: usize },
    /// At least one link was patched and the domain list now tracks the backup
    Remediated {
        backup: String,
        patched: usize,
        failed: usize,
    },
    /// Links were patched but the domain list was not (write failure or
    /// the domain had already been replaced)
    ListNotUpdated {
        backup: String,
        patched: usize,
        failed: usize,
    },
}

/// Links whose target mentions `domain` (case-sensitive substring match).
pub fn matching_links<'a>(links: &'a [ShortLink], domain: &str) -> Vec<&'a ShortLink> {
    links.iter().filter(|l| l.target.contains(domain)).collect()
}

/// Target with every occurrence of `domain` replaced by `backup`.
pub fn rewrite_target(target: &str, domain: &str, backup: &str) -> String {
    target.replace(domain, backup)
}

/// Remediation engine
#[derive(Clone)]
pub struct Remediator {
    state: Arc<SharedState>,
    links: Arc<dyn LinkRewriter>,
    alerts: AlertManager,
    description: String,
}

impl Remediator {
    pub fn new(
        state: Arc<SharedState>,
        links: Arc<dyn LinkRewriter>,
        alerts: AlertManager,
        description: impl Into<String>,
    ) -> Self {
        Self {
            state,
            links,
            alerts,
            description: description.into(),
        }
    }

    async fn alert(&self, token: &ShutdownToken, alert: (AlertLevel, String, String)) {
        if token.run_until_cancelled(self.alerts.emit(alert)).await.is_none() {
            debug!("Shutdown requested, alert not delivered");
        }
    }

    /// Remediate one blocked domain.
    ///
    /// Once `token` is cancelled no further link is patched. Links already
    /// patched are still committed to the domain list.
    pub async fn remediate(&self, domain: &str, token: &ShutdownToken) -> RemediationOutcome {
        // Alert before any repair attempt
        self.alert(token, AlertTypes::domain_blocked(domain)).await;

        let backup = match self.state.backups().lookup(domain) {
            Ok(Some(backup)) if backup != domain => backup,
            Ok(_) => {
                warn!("No backup mapping for {}", domain);
                self.alert(token, AlertTypes::no_backup(domain)).await;
                return RemediationOutcome::NoBackup;
            }
            Err(e) => {
                self.alert(
                    token,
                    AlertTypes::backup_lookup_failed(domain, &format!("{:#}", e)),
                )
                .await;
                return RemediationOutcome::BackupLookupFailed;
            }
        };

        info!("Remediating {} -> {}", domain, backup);

        let all_links = match token.run_until_cancelled(self.links.list_links()).await {
            None => return RemediationOutcome::Cancelled,
            Some(Ok(links)) => links,
            Some(Err(e)) => {
                self.alert(
                    token,
                    AlertTypes::link_listing_failed(domain, &format!("{:#}", e)),
                )
                .await;
                return RemediationOutcome::LinkListingFailed;
            }
        };

        let matches = matching_links(&all_links, domain);
        debug!(
            "{} of {} short links point at {}",
            matches.len(),
            all_links.len(),
            domain
        );

        let mut patched = 0;
        let mut failed = 0;
        for (i, link) in matches.iter().enumerate() {
            if token.is_cancelled() {
                warn!(
                    "Shutdown requested, {} links for {} left unpatched",
                    matches.len() - i,
                    domain
                );
                break;
            }

            let new_target = rewrite_target(&link.target, domain, &backup);
            match self
                .links
                .patch_link(&link.id, &new_target, &self.description)
                .await
            {
                Ok(()) => {
                    patched += 1;
                    info!("Updated link {}: {} -> {}", link.id, link.target, new_target);
                    self.alert(token, AlertTypes::link_patched(domain, &new_target))
                        .await;
                }
                Err(e) => {
                    failed += 1;
                    self.alert(
                        token,
                        AlertTypes::link_patch_failed(domain, &link.id, &format!("{:#}", e)),
                    )
                    .await;
                }
            }
        }

        if patched == 0 {
            if token.is_cancelled() {
                return RemediationOutcome::Cancelled;
            }
            debug!("No link patched for {}, domain list unchanged", domain);
            return RemediationOutcome::NothingPatched { backup, failed };
        }

        // Links are not rolled back if this fails
        match self.state.replace_domain(domain, &backup).await {
            Ok(ReplaceOutcome::Replaced) => {
                self.alert(token, AlertTypes::domain_list_updated(domain, &backup))
                    .await;
                RemediationOutcome::Remediated {
                    backup,
                    patched,
                    failed,
                }
            }
            Ok(ReplaceOutcome::NotFound) => {
                warn!(
                    "{} is no longer tracked, domain list left unchanged",
                    domain
                );
                RemediationOutcome::ListNotUpdated {
                    backup,
                    patched,
                    failed,
                }
            }
            Err(e) => {
                self.alert(
                    token,
                    AlertTypes::domain_list_persist_failed(domain, &backup, &format!("{:#}", e)),
                )
                .await;
                RemediationOutcome::ListNotUpdated {
                    backup,
                    patched,
                    failed,
                }
            }
        }
    }
}
