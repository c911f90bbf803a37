//! Shared orchestrator state.
//!
//! The tracked domain list, the registered recipient and the heartbeat timer
//! live behind one mutex. Every mutation persists to disk while the lock is
//! held, and the in-memory value is only updated after the write succeeded.

use anyhow::Result;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

use crate::store::{replace_domain, BackupMappingStore, DomainListStore, RecipientStore};

/// Outcome of a domain replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The old domain was tracked and has been replaced
    Replaced,
    /// The old domain is not in the list; nothing was written
    NotFound,
}

struct Inner {
    domains: Vec<String>,
    recipient: Option<String>,
    last_heartbeat: Option<Instant>,
}

/// State shared by the monitor scheduler and the command interpreter
pub struct SharedState {
    inner: Mutex<Inner>,
    domain_store: DomainListStore,
    recipient_store: RecipientStore,
    backups: BackupMappingStore,
}

impl SharedState {
    /// Load the domain list and recipient from their stores.
    pub fn load(
        domain_store: DomainListStore,
        recipient_store: RecipientStore,
        backups: BackupMappingStore,
    ) -> Result<Self> {
        let domains = domain_store.load()?;
        let recipient = recipient_store.load()?;

        info!(
            "Loaded {} tracked domains from {:?}",
            domains.len(),
            domain_store.path()
        );
        if recipient.is_none() {
            info!("No recipient registered yet, alerts are dropped until /register");
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                domains,
                recipient,
                last_heartbeat: None,
            }),
            domain_store,
            recipient_store,
            backups,
        })
    }

    /// Consistent copy of the tracked domains.
    pub async fn snapshot_domains(&self) -> Vec<String> {
        self.inner.lock().await.domains.clone()
    }

    pub async fn recipient(&self) -> Option<String> {
        self.inner.lock().await.recipient.clone()
    }

    pub fn backups(&self) -> &BackupMappingStore {
        &self.backups
    }

    /// Replace every occurrence of `old` with `new` and persist the list.
    ///
    /// When `old` is absent the file is not touched. When the write fails the
    /// in-memory list keeps its previous value.
    pub async fn replace_domain(&self, old: &str, new: &str) -> Result<ReplaceOutcome> {
        let mut inner = self.inner.lock().await;

        let Some(updated) = replace_domain(&inner.domains, old, new) else {
            return Ok(ReplaceOutcome::NotFound);
        };

        self.domain_store.save(&updated)?;
        inner.domains = updated;

        info!("Replaced tracked domain {} with {}", old, new);
        Ok(ReplaceOutcome::Replaced)
    }

    /// Persist `recipient` as the single alert target.
    pub async fn register_recipient(&self, recipient: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;

        self.recipient_store.save(recipient)?;
        inner.recipient = Some(recipient.to_string());

        info!("Registered recipient {}", recipient);
        Ok(())
    }

    /// Claim the heartbeat slot if `interval` elapsed since the last one.
    ///
    /// Returns `true` and resets the timer when a heartbeat is due. The first
    /// call after startup is always due.
    pub async fn claim_heartbeat(&self, interval: Duration) -> bool {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let due = match inner.last_heartbeat {
            Some(last) => now.duration_since(last) > interval,
            None => true,
        };
        if due {
            inner.last_heartbeat = Some(now);
        }
        due
    }
}
