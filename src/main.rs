//! Laser Predictor - Main Entry Point
//!
//! Fits the treatment model on first use and answers predictions from the
//! command line or an interactive prompt.

use clap::Parser;
use laser_predictor::cli::{cmd_info, cmd_interactive, cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "laser_predictor=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Some(Commands::Predict(ref args)) => {
            cmd_predict(&config, args)?;
        }
        Some(Commands::Train { top }) => {
            cmd_train(&config, top)?;
        }
        Some(Commands::Info) => {
            cmd_info(&config)?;
        }
        Some(Commands::Interactive) | None => {
            cmd_interactive(&config)?;
        }
    }

    Ok(())
}
