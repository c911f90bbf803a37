//! Notification channel (Telegram Bot API).
//!
//! Outbound messages go to a chat id; inbound messages are long-polled with
//! `getUpdates` and an offset cursor so nothing is delivered twice.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::{SecureString, TelegramConfig};
use crate::error::LinkShieldError;
use crate::utils::truncate_utf16;

/// Longest text the Bot API accepts in one message
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Cut `text` to the transport limit, which counts UTF-16 code units.
pub fn fit_message(text: &str) -> String {
    truncate_utf16(text, MAX_MESSAGE_LEN)
}

/// Extra client-side slack on top of the server-side long-poll window
const POLL_SLACK_SECS: u64 = 10;

/// One inbound update
///
/// `sender` and `text` are `None` when the update is not a text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub update_id: i64,
    pub sender: Option<String>,
    pub text: Option<String>,
}

/// Trait for notification transports
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Send `text` to `recipient`
    async fn send(&self, recipient: &str, text: &str) -> Result<()>;

    /// Fetch updates at or after `offset`, waiting server-side for new ones
    async fn poll_inbound(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>>;
}

/// Extract inbound messages from a `getUpdates` body.
///
/// Updates without an `update_id` are dropped. Anything else that does not
/// look like a text message keeps its id so the cursor still advances.
pub fn parse_updates(body: &Value) -> Vec<InboundMessage> {
    let Some(results) = body.get("result").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|update| {
            let update_id = update.get("update_id")?.as_i64()?;
            let message = update.get("message");
            let sender = message
                .and_then(|m| m.get("chat"))
                .and_then(|c| c.get("id"))
                .and_then(id_to_string);
            let text = message
                .and_then(|m| m.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(InboundMessage {
                update_id,
                sender,
                text,
            })
        })
        .collect()
}

fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Telegram Bot API client
pub struct TelegramChannel {
    client: Client,
    api_url: String,
    token: SecureString,
    poll_timeout_secs: u64,
    request_timeout: Duration,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig, request_timeout: Duration) -> Result<Self> {
        let token = config.get_token();
        if token.is_empty() {
            return Err(LinkShieldError::Config(
                "telegram token is not set (telegram.token or LINKSHIELD_TELEGRAM_TOKEN)"
                    .to_string(),
            )
            .into());
        }

        // Timeouts are set per request: long polls need a wider window
        let client = Client::builder()
            .user_agent(format!("linkshield/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for Telegram")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            poll_timeout_secs: config.poll_timeout_secs,
            request_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token.as_str(), method)
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        let text = fit_message(text);
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.request_timeout)
            .json(&SendMessage {
                chat_id: recipient,
                text: &text,
            })
            .send()
            .await
            // reqwest errors include the URL, which carries the token
            .map_err(|e| LinkShieldError::Network(format!("sendMessage: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Telegram sendMessage failed with status: {}", status);
            return Err(LinkShieldError::Network(format!("sendMessage returned {}", status)).into());
        }

        debug!("Message sent to {}", recipient);
        Ok(())
    }

    async fn poll_inbound(&self, offset: Option<i64>) -> Result<Vec<InboundMessage>> {
        let mut query = vec![("timeout", self.poll_timeout_secs.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(self.poll_timeout_secs + POLL_SLACK_SECS))
            .query(&query)
            .send()
            .await
            .map_err(|e| LinkShieldError::Network(format!("getUpdates: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkShieldError::Network(format!("getUpdates returned {}", status)).into());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LinkShieldError::Parse(format!("getUpdates: {}", e.without_url())))?;

        Ok(parse_updates(&body))
    }
}
