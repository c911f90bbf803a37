//! Short-link provider client (Kutt v2 API).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::config::LinksConfig;
use crate::error::LinkShieldError;

/// A short link as stored by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShortLink {
    pub id: String,
    pub target: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Trait for short-link providers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LinkRewriter: Send + Sync {
    /// List every short link owned by the account
    async fn list_links(&self) -> Result<Vec<ShortLink>>;

    /// Point link `id` at `target`
    async fn patch_link(&self, id: &str, target: &str, description: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct LinkPage {
    #[serde(default)]
    data: Vec<ShortLink>,
    #[serde(default)]
    total: Option<usize>,
}

#[derive(Serialize)]
struct PatchPayload<'a> {
    target: &'a str,
    description: &'a str,
}

/// Decide whether another page must be requested.
fn has_more(fetched: usize, page_len: usize, page_size: usize, total: Option<usize>) -> bool {
    if page_len == 0 {
        return false;
    }
    match total {
        Some(total) => fetched < total,
        None => page_len >= page_size,
    }
}

/// HTTP client for a Kutt instance
pub struct KuttClient {
    client: Client,
    base_url: String,
    api_key: crate::config::SecureString,
    page_size: usize,
}

impl KuttClient {
    pub fn new(config: &LinksConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("linkshield/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for short links")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.get_api_key(),
            page_size: config.page_size,
        })
    }

    async fn fetch_page(&self, skip: usize) -> Result<LinkPage> {
        let url = format!("{}/api/v2/links", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-API-Key", self.api_key.as_str())
            .query(&[("limit", self.page_size), ("skip", skip)])
            .send()
            .await
            .context("Failed to list short links")?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                LinkShieldError::Network(format!("link listing returned {}", status)).into(),
            );
        }

        response
            .json::<LinkPage>()
            .await
            .context("Failed to parse short link listing")
    }
}

#[async_trait]
impl LinkRewriter for KuttClient {
    async fn list_links(&self) -> Result<Vec<ShortLink>> {
        let mut links = Vec::new();
        loop {
            let page = self.fetch_page(links.len()).await?;
            let page_len = page.data.len();
            links.extend(page.data);
            debug!("Fetched {} links ({} so far)", page_len, links.len());

            if !has_more(links.len(), page_len, self.page_size, page.total) {
                break;
            }
        }
        Ok(links)
    }

    async fn patch_link(&self, id: &str, target: &str, description: &str) -> Result<()> {
        let url = format!("{}/api/v2/links/{}", self.base_url, id);
        let response = self
            .client
            .patch(&url)
            .header("X-API-Key", self.api_key.as_str())
            .json(&PatchPayload {
                target,
                description,
            })
            .send()
            .await
            .with_context(|| format!("Failed to patch short link {}", id))?;

        let status = response.status();
        if !status.is_success() {
            // Don't log response body as it may contain sensitive info
            return Err(LinkShieldError::Network(format!(
                "patching link {} returned {}",
                id, status
            ))
            .into());
        }
        Ok(())
    }
}
