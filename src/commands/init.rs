//! Init command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Write a default configuration file
pub async fn run(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {:?} (use --force to overwrite)",
            config_path
        );
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Config::default().save(config_path)?;
    info!("Default configuration written to {:?}", config_path);
    println!(
        "Set telegram.token and links.api_key (or LINKSHIELD_TELEGRAM_TOKEN / \
         LINKSHIELD_LINKS_API_KEY) before 'linkshield run'."
    );

    Ok(())
}
