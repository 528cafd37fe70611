//! Opguard CLI
//!
//! A command-line tool for assessing, checkpointing and rolling back file
//! operations requested by automated agents.

use clap::Parser;
use opguard::cli::{
    args::{Cli, Commands},
    commands::{assess, checkpoint, init, list, restore},
};
use opguard::models::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = config::load_config();

    // Run the appropriate command
    match cli.command {
        Commands::Assess { operation_file } => {
            assess::assess(&operation_file, config).await?;
        }

        Commands::Checkpoint { label, paths } => {
            checkpoint::checkpoint(&label, &paths, config).await?;
        }

        Commands::Restore {
            checkpoint_id,
            dry_run,
            force,
        } => {
            restore::restore(&checkpoint_id, dry_run, force, config).await?;
        }

        Commands::List => {
            list::list(config).await?;
        }

        Commands::Gc => {
            list::gc(config).await?;
        }

        Commands::Init => {
            init::init()?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("opguard=debug")
    } else {
        EnvFilter::new("opguard=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
