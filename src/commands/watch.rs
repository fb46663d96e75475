//! Long-running watch mode.

use super::{open_discovery, setup_interrupt_handler, CommandResult};
use dongle_watcher::{switcher_for, Supervisor, WatcherConfig};
use tracing::info;

/// Supervise the dongle until Ctrl+C
pub fn run(config: &WatcherConfig) -> CommandResult {
    let discovery = open_discovery(config)?;
    let switcher = switcher_for(&config.layout)?;
    info!(
        "Layouts: linked={} unlinked={} via {:?} switcher",
        config.layout.primary, config.layout.fallback, config.layout.switcher
    );

    let running = setup_interrupt_handler();
    let mut supervisor = Supervisor::from_config(config, discovery, switcher);
    supervisor.run(&running);
    Ok(())
}
