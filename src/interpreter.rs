//! Operator command interpreter.
//!
//! Commands arrive as chat messages:
//! - `/register` stores the sender as the alert recipient
//! - `/replace <old> <new>` swaps a tracked domain
//! - `/list` shows the tracked domains
//!
//! The leading `/` and a `@botname` suffix are optional. Every other message
//! is ignored without a reply.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::notifier::{InboundMessage, NotificationChannel};
use crate::signal::ShutdownToken;
use crate::state::{ReplaceOutcome, SharedState};
use crate::validation::is_valid_domain;

const REPLACE_USAGE: &str = "❌ Wrong format. Use: /replace <old_domain> <new_domain>";

/// A recognized operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register,
    Replace { old: String, new: String },
    /// `replace` with the wrong number of arguments
    ReplaceUsage,
    List,
}

/// Parse a message into a command, `None` for anything unrecognized.
pub fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    let name = head.strip_prefix('/').unwrap_or(head);
    let name = name.split('@').next().unwrap_or(name);
    let args: Vec<&str> = parts.collect();

    match name {
        "register" => Some(Command::Register),
        "list" => Some(Command::List),
        "replace" => match args.as_slice() {
            [old, new] => Some(Command::Replace {
                old: old.to_string(),
                new: new.to_string(),
            }),
            _ => Some(Command::ReplaceUsage),
        },
        _ => None,
    }
}

/// Command interpreter
pub struct CommandInterpreter {
    state: Arc<SharedState>,
    channel: Arc<dyn NotificationChannel>,
    poll_interval: Duration,
}

impl CommandInterpreter {
    pub fn new(
        state: Arc<SharedState>,
        channel: Arc<dyn NotificationChannel>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            state,
            channel,
            poll_interval,
        }
    }

    /// Execute `command` on behalf of `sender` and build the reply.
    pub async fn execute(&self, sender: &str, command: Command) -> String {
        match command {
            Command::Register => match self.state.register_recipient(sender).await {
                Ok(()) => format!(
                    "✅ Chat ID saved: {}\nAlerts will be delivered to this chat.",
                    sender
                ),
                Err(e) => {
                    error!("Failed to register recipient {}: {:#}", sender, e);
                    "❌ Could not save the chat ID, check the server logs.".to_string()
                }
            },
            Command::Replace { old, new } => {
                if !is_valid_domain(&old) || !is_valid_domain(&new) {
                    return "❌ Invalid domain. Use letters, digits, '.' and '-' only.".to_string();
                }
                match self.state.replace_domain(&old, &new).await {
                    Ok(ReplaceOutcome::Replaced) => {
                        format!("✅ Domain '{}' has been replaced with '{}'.", old, new)
                    }
                    Ok(ReplaceOutcome::NotFound) => {
                        format!("❌ Domain '{}' not found in the domain list.", old)
                    }
                    Err(e) => {
                        error!("Failed to replace {} with {}: {:#}", old, new, e);
                        "❌ Could not save the domain list, check the server logs.".to_string()
                    }
                }
            }
            Command::ReplaceUsage => REPLACE_USAGE.to_string(),
            Command::List => {
                let domains = self.state.snapshot_domains().await;
                if domains.is_empty() {
                    "📂 The domain list is empty.".to_string()
                } else {
                    format!("📄 Tracked domains:\n{}", domains.join("\n"))
                }
            }
        }
    }

    /// Handle one inbound message, replying to its sender.
    ///
    /// Returns the reply text, `None` when the message was ignored.
    pub async fn handle(&self, message: &InboundMessage) -> Option<String> {
        let (Some(sender), Some(text)) = (&message.sender, &message.text) else {
            debug!("Ignoring non-text update {}", message.update_id);
            return None;
        };

        let command = parse_command(text)?;
        info!("Command from {}: {:?}", sender, command);

        let reply = self.execute(sender, command).await;
        if let Err(e) = self.channel.send(sender, &reply).await {
            warn!("Failed to reply to {}: {:#}", sender, e);
        }
        Some(reply)
    }

    /// Poll for commands until cancelled.
    pub async fn run(&self, token: &ShutdownToken) {
        info!("Command interpreter started");
        let mut offset: Option<i64> = None;

        loop {
            let Some(polled) = token
                .run_until_cancelled(self.channel.poll_inbound(offset))
                .await
            else {
                break;
            };

            match polled {
                Ok(messages) => {
                    for message in &messages {
                        // A cancelled handler has either committed its change or not started it
                        if token.run_until_cancelled(self.handle(message)).await.is_none() {
                            break;
                        }
                        offset = Some(message.update_id + 1);
                    }
                }
                Err(e) => warn!("Polling for commands failed: {:#}", e),
            }

            if !token.sleep(self.poll_interval).await {
                break;
            }
        }

        info!("Command interpreter stopped");
    }
}
