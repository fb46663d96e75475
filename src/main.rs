//! Dongle link watcher CLI
//!
//! Watches a wireless keyboard dongle and switches the host keyboard layout
//! when the keyboard links up or drops out.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use dongle_watcher::WatcherConfig;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config
    let config_path = cli.config.unwrap_or_else(WatcherConfig::default_path);
    info!("Loading config from {:?}", config_path);
    let config = WatcherConfig::load(&config_path)?;

    match cli.command {
        None | Some(Commands::Watch) => commands::watch::run(&config),
        Some(Commands::List) => commands::utility::list(&config),
        Some(Commands::Effects) => commands::led::effects(),
        Some(Commands::Encode(args)) => commands::led::encode(&args),
        Some(Commands::SetLed(args)) => commands::led::set_led(&config, &args),
        Some(Commands::Probe) => commands::utility::probe(&config),
        Some(Commands::Config { save }) => {
            commands::utility::show_config(&config, &config_path, save)
        }
    }
}
