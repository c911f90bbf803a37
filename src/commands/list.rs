//! List command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::store::DomainListStore;

/// Print the tracked domains
pub async fn run(config_path: &Path) -> Result<()> {
    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    let domains = DomainListStore::new(&config.paths.domains).load()?;

    if domains.is_empty() {
        println!("No domains tracked in {:?}", config.paths.domains);
        return Ok(());
    }

    for domain in &domains {
        println!("{}", domain);
    }
    println!();
    println!("{} tracked domains", domains.len());

    Ok(())
}
