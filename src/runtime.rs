//! Orchestrator wiring the monitor and the command interpreter together.
//!
//! Both loops share one [`SharedState`] and one [`ShutdownToken`]. The
//! monitor stops on its own when the domain list is empty; the interpreter
//! keeps serving commands until shutdown is requested.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::alerts::{AlertManager, AlertTypes};
use crate::checker::{BlocklistChecker, HttpChecker};
use crate::config::Config;
use crate::interpreter::CommandInterpreter;
use crate::links::{KuttClient, LinkRewriter};
use crate::notifier::{NotificationChannel, TelegramChannel};
use crate::remediation::Remediator;
use crate::scheduler::{MonitorExit, MonitorScheduler, MonitorSettings};
use crate::signal::ShutdownToken;
use crate::state::SharedState;
use crate::store::{BackupMappingStore, DomainListStore, RecipientStore};

/// External services the orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub checker: Arc<dyn BlocklistChecker>,
    pub links: Arc<dyn LinkRewriter>,
    pub channel: Arc<dyn NotificationChannel>,
}

impl Collaborators {
    /// Build HTTP clients for every service from the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            checker: Arc::new(HttpChecker::new(&config.checker)?),
            links: Arc::new(KuttClient::new(&config.links, config.request_timeout())?),
            channel: Arc::new(TelegramChannel::new(
                &config.telegram,
                config.request_timeout(),
            )?),
        })
    }
}

/// Load the shared state from the configured paths
pub fn load_state(config: &Config) -> Result<SharedState> {
    SharedState::load(
        DomainListStore::new(&config.paths.domains),
        RecipientStore::new(&config.paths.recipient),
        BackupMappingStore::new(&config.paths.backups),
    )
    .context("Failed to load persisted state")
}

/// Runs the monitor and the command interpreter concurrently
pub struct Orchestrator {
    scheduler: MonitorScheduler,
    interpreter: CommandInterpreter,
    alerts: AlertManager,
}

impl Orchestrator {
    pub fn new(
        state: Arc<SharedState>,
        collaborators: Collaborators,
        settings: MonitorSettings,
        link_description: &str,
        poll_interval: Duration,
    ) -> Self {
        let alerts = AlertManager::new(collaborators.channel.clone(), state.clone());
        let remediator = Remediator::new(
            state.clone(),
            collaborators.links,
            alerts.clone(),
            link_description,
        );
        let scheduler = MonitorScheduler::new(
            state.clone(),
            collaborators.checker,
            remediator,
            alerts.clone(),
            settings,
        );
        let interpreter = CommandInterpreter::new(state, collaborators.channel, poll_interval);

        Self {
            scheduler,
            interpreter,
            alerts,
        }
    }

    /// Build an orchestrator from the configuration
    pub fn from_config(
        config: &Config,
        state: Arc<SharedState>,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let settings = MonitorSettings {
            batch_size: config.monitor.batch_size,
            check_interval: config.monitor.check_interval()?,
            heartbeat_interval: config.monitor.heartbeat_interval()?,
        };

        Ok(Self::new(
            state,
            collaborators,
            settings,
            &config.links.description,
            Duration::from_millis(config.telegram.poll_interval_ms),
        ))
    }

    /// Run both loops until `token` is cancelled.
    pub async fn run(&self, token: &ShutdownToken) {
        let monitor = async {
            if self.scheduler.run(token).await == MonitorExit::NoDomains {
                let halted = AlertTypes::monitor_halted("The domain list is empty.");
                token.run_until_cancelled(self.alerts.emit(halted)).await;
            }
        };

        tokio::join!(monitor, self.interpreter.run(token));
        info!("Orchestrator stopped");
    }
}
