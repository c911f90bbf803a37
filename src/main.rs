//! linkshield - blocked-domain monitor and short-link failover
//!
//! Watches a list of domains against a blocklist, repoints short links to a
//! backup domain when one gets blocked, and takes operator commands over chat.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use linkshield::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run => linkshield::commands::run::run(&cli.config).await,
        Commands::Check { domains } => {
            linkshield::commands::check::run(&domains, &cli.config).await
        }
        Commands::List => linkshield::commands::list::run(&cli.config).await,
        Commands::Init { force } => linkshield::commands::init::run(&cli.config, force).await,
        Commands::Version => {
            println!("linkshield {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
