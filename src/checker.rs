//! Blocklist oracle client.
//!
//! The oracle takes a batch of domains and reports a status per domain. The
//! HTTP implementation posts the batch as a newline-separated `name` form
//! field and reads `{"values": [{"Domain": .., "Status": ..}]}` back.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::config::CheckerConfig;
use crate::error::LinkShieldError;

/// Blocklist status of one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Clear,
    Blocked,
}

/// Status reported for one domain of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub domain: String,
    pub status: CheckStatus,
}

impl CheckResult {
    pub fn new(domain: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            domain: domain.into(),
            status,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == CheckStatus::Blocked
    }
}

/// Trait for blocklist oracles
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlocklistChecker: Send + Sync {
    /// Check a batch of domains, returning a status per domain
    async fn check(&self, domains: &[String]) -> Result<Vec<CheckResult>>;
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    values: Vec<CheckRecord>,
}

#[derive(Debug, Deserialize)]
struct CheckRecord {
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "Status")]
    status: String,
}

/// Parse an oracle response body.
pub fn parse_check_response(body: &str, blocked_status: &str) -> Result<Vec<CheckResult>> {
    let response: CheckResponse = serde_json::from_str(body)
        .map_err(|e| LinkShieldError::Parse(format!("oracle response: {}", e)))?;

    Ok(response
        .values
        .into_iter()
        .map(|record| {
            let status = if record.status.trim() == blocked_status {
                CheckStatus::Blocked
            } else {
                CheckStatus::Clear
            };
            CheckResult::new(record.domain.trim(), status)
        })
        .collect())
}

/// HTTP client for the blocklist oracle
pub struct HttpChecker {
    client: Client,
    url: String,
    blocked_status: String,
}

impl HttpChecker {
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("linkshield/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for blocklist checks")?;

        Ok(Self {
            client,
            url: config.url.clone(),
            blocked_status: config.blocked_status.clone(),
        })
    }
}

#[async_trait]
impl BlocklistChecker for HttpChecker {
    async fn check(&self, domains: &[String]) -> Result<Vec<CheckResult>> {
        debug!("Checking batch: {:?}", domains);

        let names = domains.join("\n");
        let response = self
            .client
            .post(&self.url)
            .form(&[("name", names.as_str())])
            .send()
            .await
            .context("Failed to reach blocklist oracle")?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkShieldError::Network(format!("oracle returned {}", status)).into());
        }

        let body = response
            .text()
            .await
            .context("Failed to read oracle response body")?;

        parse_check_response(&body, &self.blocked_status)
    }
}
