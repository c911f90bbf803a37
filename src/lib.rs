//! # linkshield - Blocked-Domain Monitor and Short-Link Failover
//!
//! Periodically checks a list of domains against a blocklist oracle. When a
//! domain is reported blocked, every short link pointing at it is repointed to
//! a pre-registered backup domain, the tracked list is updated and the
//! operator is alerted. Operators manage the service through chat commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       linkshield                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: run, check, list, init, version            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Orchestrator (tokio)                                       │
//! │    ├── MonitorScheduler: batches, heartbeat                 │
//! │    └── CommandInterpreter: /register /replace /list         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SharedState (tokio::sync::Mutex)                           │
//! │    └── Stores: domain list, recipient, backup mappings      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Remediator                                                 │
//! │    └── backup lookup, link rewrite, list update, alerts     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Collaborators (reqwest + rustls)                           │
//! │    ├── BlocklistChecker (oracle)                            │
//! │    ├── LinkRewriter (Kutt API)                              │
//! │    └── NotificationChannel (Telegram Bot API)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use linkshield::config::Config;
//! use linkshield::runtime::{load_state, Collaborators, Orchestrator};
//! use linkshield::signal::ShutdownToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let state = Arc::new(load_state(&config)?);
//!     let collaborators = Collaborators::from_config(&config)?;
//!     let orchestrator = Orchestrator::from_config(&config, state, collaborators)?;
//!
//!     let token = ShutdownToken::new();
//!     orchestrator.run(&token).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`alerts`] - Operator alerts over the notification channel
//! - [`checker`] - Blocklist oracle client
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`interpreter`] - Chat command interpreter
//! - [`links`] - Short-link provider client
//! - [`lock`] - File locking for concurrent execution prevention
//! - [`notifier`] - Chat transport (send and poll)
//! - [`remediation`] - Blocked-domain remediation engine
//! - [`runtime`] - Orchestrator wiring
//! - [`scheduler`] - Batched monitor loop and heartbeat
//! - [`signal`] - Graceful shutdown signal handling
//! - [`state`] - State shared between the loops
//! - [`store`] - Domain list, recipient and backup mapping files
//! - [`utils`] - Common utility functions (formatting, truncation)

pub mod alerts;
pub mod checker;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs_abstraction;
pub mod interpreter;
pub mod links;
pub mod lock;
pub mod notifier;
pub mod remediation;
pub mod runtime;
pub mod scheduler;
pub mod signal;
pub mod state;
pub mod store;
pub mod utils;
pub mod validation;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::LinkShieldError;
