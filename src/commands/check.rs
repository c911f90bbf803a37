//! Check command implementation.

use anyhow::Result;
use std::path::Path;

use crate::checker::{BlocklistChecker, HttpChecker};
use crate::config::Config;
use crate::scheduler::partition;
use crate::validation::validate_domain;

/// Query the blocklist oracle once, without remediation
pub async fn run(domains: &[String], config_path: &Path) -> Result<()> {
    let domains = domains
        .iter()
        .map(|d| validate_domain(d))
        .collect::<Result<Vec<_>, _>>()?;

    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    let checker = HttpChecker::new(&config.checker)?;

    println!();
    for batch in partition(&domains, config.monitor.batch_size) {
        for result in checker.check(batch).await? {
            if result.is_blocked() {
                println!("{} is BLOCKED", result.domain);
            } else {
                println!("{} is NOT blocked", result.domain);
            }
        }
    }
    println!();

    Ok(())
}
