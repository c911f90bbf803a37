//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use linkshield::checker::{BlocklistChecker, CheckResult, CheckStatus};
use linkshield::links::{LinkRewriter, ShortLink};
use linkshield::notifier::{InboundMessage, NotificationChannel};
use linkshield::state::SharedState;
use linkshield::store::{BackupMappingStore, DomainListStore, RecipientStore};

/// Oracle reporting a fixed set of domains as blocked
#[derive(Default)]
pub struct FakeChecker {
    pub blocked: Mutex<HashSet<String>>,
    pub batches: Mutex<Vec<Vec<String>>>,
}

impl FakeChecker {
    pub fn blocking(domains: &[&str]) -> Self {
        Self {
            blocked: Mutex::new(domains.iter().map(|d| d.to_string()).collect()),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn unblock(&self, domain: &str) {
        self.blocked.lock().unwrap().remove(domain);
    }
}

#[async_trait]
impl BlocklistChecker for FakeChecker {
    async fn check(&self, domains: &[String]) -> Result<Vec<CheckResult>> {
        self.batches.lock().unwrap().push(domains.to_vec());
        let blocked = self.blocked.lock().unwrap();
        Ok(domains
            .iter()
            .map(|d| {
                let status = if blocked.contains(d) {
                    CheckStatus::Blocked
                } else {
                    CheckStatus::Clear
                };
                CheckResult::new(d.clone(), status)
            })
            .collect())
    }
}

/// Short-link provider keeping links in memory
#[derive(Default)]
pub struct FakeLinks {
    pub links: Mutex<Vec<ShortLink>>,
    pub patches: Mutex<Vec<(String, String, String)>>,
    pub failing_ids: Mutex<HashSet<String>>,
    pub patch_delay: Option<Duration>,
}

impl FakeLinks {
    pub fn with_targets(targets: &[(&str, &str)]) -> Self {
        let links = targets
            .iter()
            .map(|(id, target)| ShortLink {
                id: id.to_string(),
                target: target.to_string(),
                description: None,
            })
            .collect();
        Self {
            links: Mutex::new(links),
            ..Default::default()
        }
    }

    pub fn fail_patch(&self, id: &str) {
        self.failing_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn target_of(&self, id: &str) -> Option<String> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.target.clone())
    }
}

#[async_trait]
impl LinkRewriter for FakeLinks {
    async fn list_links(&self) -> Result<Vec<ShortLink>> {
        Ok(self.links.lock().unwrap().clone())
    }

    async fn patch_link(&self, id: &str, target: &str, description: &str) -> Result<()> {
        if let Some(delay) = self.patch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_ids.lock().unwrap().contains(id) {
            anyhow::bail!("HTTP 500 for link {}", id);
        }
        self.patches
            .lock()
            .unwrap()
            .push((id.to_string(), target.to_string(), description.to_string()));
        let mut links = self.links.lock().unwrap();
        if let Some(link) = links.iter_mut().find(|l| l.id == id) {
            link.target = target.to_string();
            link.description = Some(description.to_string());
        }
        Ok(())
    }
}

/// Chat transport recording outbound messages and replaying queued updates
#[derive(Default)]
pub struct FakeChannel {
    pub sent: Mutex<Vec<(String, String)>>,
    pub inbound: Mutex<VecDeque<Vec<InboundMessage>>>,
    pub offsets: Mutex<Vec<Option<i64>>>,
}

impl FakeChannel {
    pub fn queue(&self, messages: Vec<InboundMessage>) {
        self.inbound.lock().unwrap().push_back(messages);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_containing(&self, needle: &str) -> Vec<(String, String)> {
        self.sent()
            .into_iter()
            .filter(|(_, text)| text.contains(needle))
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for FakeChannel {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }

    async fn poll_inbound(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>> {
        self.offsets.lock().unwrap().push(offset);
        Ok(self.inbound.lock().unwrap().pop_front().unwrap_or_default())
    }
}

pub fn text_message(update_id: i64, sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        update_id,
        sender: Some(sender.to_string()),
        text: Some(text.to_string()),
    }
}

/// State files in a temporary directory
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(list: &str, backups: &str, recipient: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("list.txt"), list).unwrap();
        std::fs::write(dir.path().join("target-backup.txt"), backups).unwrap();
        if let Some(r) = recipient {
            std::fs::write(dir.path().join("recipient.txt"), r).unwrap();
        }
        Self { dir }
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    pub fn read(&self, name: &str) -> String {
        read_file(&self.path(name))
    }

    pub fn state(&self) -> Arc<SharedState> {
        Arc::new(
            SharedState::load(
                DomainListStore::new(self.path("list.txt")),
                RecipientStore::new(self.path("recipient.txt")),
                BackupMappingStore::new(self.path("target-backup.txt")),
            )
            .unwrap(),
        )
    }
}

pub fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
