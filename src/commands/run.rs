//! Run command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::lock::LockGuard;
use crate::runtime::{load_state, Collaborators, Orchestrator};
use crate::signal::{ShutdownGuard, ShutdownToken};

/// Run the orchestrator until SIGINT or SIGTERM
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let _lock = LockGuard::acquire(&config.paths.lock)?;

    let token = ShutdownToken::new();
    let _guard = ShutdownGuard::new(token.clone());

    let state = Arc::new(load_state(&config)?);
    let collaborators = Collaborators::from_config(&config)?;
    let orchestrator = Orchestrator::from_config(&config, state, collaborators)?;

    info!("linkshield {} started", env!("CARGO_PKG_VERSION"));
    orchestrator.run(&token).await;

    Ok(())
}
