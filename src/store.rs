//! Text-file persistence for tracked domains, backup mappings and the
//! registered recipient.
//!
//! File formats:
//! - domain list: one domain per line, each line terminated by `\n`
//! - backup mapping: `old domain : <a>, new domain : <b>` per line, `#` comments allowed
//! - recipient: a single identifier

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fs_abstraction::{FileSystem, RealFileSystem};

const OLD_DOMAIN_KEY: &str = "old domain";
const NEW_DOMAIN_KEY: &str = "new domain";

/// Parse a domain list file, dropping blank lines and repeated entries.
pub fn parse_domain_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut domains = Vec::new();
    for line in content.lines() {
        let domain = line.trim();
        if domain.is_empty() {
            continue;
        }
        if seen.insert(domain.to_string()) {
            domains.push(domain.to_string());
        } else {
            warn!("Ignoring duplicate domain entry: {}", domain);
        }
    }
    domains
}

/// Render a domain list in its canonical on-disk form.
pub fn render_domain_list(domains: &[String]) -> String {
    let mut out = String::new();
    for domain in domains {
        out.push_str(domain);
        out.push('\n');
    }
    out
}

/// Replace every entry equal to `old` with `new`.
///
/// Returns `None` when `old` is not tracked. If `new` was already tracked the
/// first occurrence is kept so the list stays duplicate-free.
pub fn replace_domain(domains: &[String], old: &str, new: &str) -> Option<Vec<String>> {
    if !domains.iter().any(|d| d == old) {
        return None;
    }

    let mut seen = HashSet::new();
    let replaced = domains
        .iter()
        .map(|d| if d == old { new.to_string() } else { d.clone() })
        .filter(|d| seen.insert(d.clone()))
        .collect();
    Some(replaced)
}

/// Persistent ordered list of tracked domains
#[derive(Clone)]
pub struct DomainListStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl DomainListStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(path, Arc::new(RealFileSystem))
    }

    pub fn with_fs(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the list. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<String>> {
        match self.fs.read_to_string(&self.path) {
            Ok(content) => Ok(parse_domain_list(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Domain list {:?} not found, starting empty", self.path);
                Ok(Vec::new())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read domain list: {:?}", self.path))
            }
        }
    }

    /// Replace the whole file with `domains`.
    pub fn save(&self, domains: &[String]) -> Result<()> {
        self.fs
            .write_atomic(&self.path, render_domain_list(domains).as_bytes())
            .with_context(|| format!("Failed to write domain list: {:?}", self.path))
    }
}

/// Read-only mapping from a domain to its backup.
///
/// The file is re-read on every lookup so operators can edit it while the
/// process runs.
#[derive(Clone)]
pub struct BackupMappingStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl BackupMappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(path, Arc::new(RealFileSystem))
    }

    pub fn with_fs(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// Find the backup for `domain`. The first matching record wins.
    pub fn lookup(&self, domain: &str) -> Result<Option<String>> {
        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Backup mapping {:?} not found", self.path);
                return Ok(None);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read backup mapping: {:?}", self.path))
            }
        };

        Ok(content
            .lines()
            .filter_map(parse_backup_record)
            .find(|(old, _)| old == domain)
            .map(|(_, new)| new))
    }
}

/// Parse one `old domain : a, new domain : b` record.
///
/// Field order does not matter; unknown fields are ignored.
pub fn parse_backup_record(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut old = None;
    let mut new = None;
    for field in line.split(',') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            OLD_DOMAIN_KEY => old = Some(value.to_string()),
            NEW_DOMAIN_KEY => new = Some(value.to_string()),
            _ => {}
        }
    }

    Some((old?, new?))
}

/// Persistence for the single registered recipient
#[derive(Clone)]
pub struct RecipientStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl RecipientStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(path, Arc::new(RealFileSystem))
    }

    pub fn with_fs(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// Load the recipient, `None` when nobody registered yet.
    pub fn load(&self) -> Result<Option<String>> {
        match self.fs.read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read recipient file: {:?}", self.path))
            }
        }
    }

    pub fn save(&self, recipient: &str) -> Result<()> {
        self.fs
            .write_atomic(&self.path, recipient.as_bytes())
            .with_context(|| format!("Failed to write recipient file: {:?}", self.path))
    }
}
