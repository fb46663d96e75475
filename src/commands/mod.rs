//! Command handlers for the CLI application.
//!
//! - `watch`: the long-running layout watcher
//! - `led`: lighting commands (effects, encode, set-led)
//! - `utility`: list, probe, config

pub mod led;
pub mod utility;
pub mod watch;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use dongle_transport::{discovery_for, DeviceDiscovery};
use dongle_watcher::WatcherConfig;
use tracing::{info, warn};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Setup Ctrl+C handler and return the running flag
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Interrupted, shutting down");
        running_clone.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    running
}

/// Create the discovery backend from the config. Failure here is fatal.
pub fn open_discovery(config: &WatcherConfig) -> anyhow::Result<Box<dyn DeviceDiscovery>> {
    discovery_for(config.device.backend, config.device.ids(), config.device.usb)
        .with_context(|| format!("Failed to initialize {} backend", config.device.backend))
}
