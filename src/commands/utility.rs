//! Utility command handlers.

use std::path::Path;

use super::{open_discovery, CommandResult};
use dongle_transport::DeviceDiscovery;
use dongle_watcher::layout::LogSwitcher;
use dongle_watcher::{Supervisor, WatcherConfig};

/// List attached dongles
pub fn list(config: &WatcherConfig) -> CommandResult {
    let mut discovery = open_discovery(config)?;
    let devices = discovery.list_devices()?;
    if devices.is_empty() {
        println!(
            "No dongle {:04X}:{:04X} found",
            config.device.vendor_id, config.device.product_id
        );
        return Ok(());
    }
    for device in devices {
        let info = &device.info;
        println!(
            "  VID={:04x} PID={:04x} backend={} product={} serial={} path={}",
            info.vid,
            info.pid,
            info.transport_type,
            info.product_name.as_deref().unwrap_or("-"),
            info.serial.as_deref().unwrap_or("-"),
            info.device_path,
        );
    }
    Ok(())
}

/// Open once, probe, print the resolved link state. The layout is not changed.
pub fn probe(config: &WatcherConfig) -> CommandResult {
    let discovery = open_discovery(config)?;
    let mut supervisor = Supervisor::from_config(config, discovery, Box::new(LogSwitcher));
    let state = supervisor.connect()?;
    supervisor.close();
    println!("Link: {state}");
    Ok(())
}

/// Print (and optionally save) the effective configuration
pub fn show_config(config: &WatcherConfig, path: &Path, save: bool) -> CommandResult {
    print!("{}", config.to_toml()?);
    if save {
        config.save(path)?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}
