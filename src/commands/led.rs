//! Lighting command handlers.

use super::{open_discovery, CommandResult};
use crate::cli::LedArgs;
use dongle_transport::{encode_lighting_packet, Capabilities, Effect, LightingConfiguration};
use dongle_watcher::layout::LogSwitcher;
use dongle_watcher::{Supervisor, WatcherConfig};
use tracing::warn;

/// Build a configuration from CLI flags; unset flags keep their defaults
pub fn configuration(args: &LedArgs) -> LightingConfiguration {
    let mut config = LightingConfiguration::new(args.effect);
    let fields = [
        (args.red, Capabilities::RED, "red"),
        (args.green, Capabilities::GREEN, "green"),
        (args.blue, Capabilities::BLUE, "blue"),
        (args.colorful, Capabilities::COLORFUL, "colorful"),
        (args.brightness, Capabilities::BRIGHTNESS, "brightness"),
        (args.speed, Capabilities::SPEED, "speed"),
        (args.direction, Capabilities::DIRECTION, "direction"),
    ];
    for (value, flag, name) in fields {
        if value.is_some() && !config.available().contains(flag) {
            warn!("{} ignores {name}; the default is sent instead", args.effect);
        }
    }

    if let Some(v) = args.red {
        config.set_red(v);
    }
    if let Some(v) = args.green {
        config.set_green(v);
    }
    if let Some(v) = args.blue {
        config.set_blue(v);
    }
    if let Some(v) = args.colorful {
        config.set_colorful(v);
    }
    if let Some(v) = args.brightness {
        config.set_brightness(v);
    }
    if let Some(v) = args.speed {
        config.set_speed(v);
    }
    if let Some(v) = args.direction {
        config.set_direction(v);
    }
    config
}

/// Print the effect table
pub fn effects() -> CommandResult {
    println!("{:<6} {:<12} Fields", "Code", "Effect");
    for effect in Effect::ALL {
        println!(
            "0x{:02X}   {:<12} {}",
            effect.code(),
            effect.name(),
            effect.capabilities()
        );
    }
    Ok(())
}

/// Print the encoded packet
pub fn encode(args: &LedArgs) -> CommandResult {
    let packet = encode_lighting_packet(&configuration(args));
    println!("{}", packet.to_hex());
    Ok(())
}

/// Connect to the dongle and send a lighting packet
pub fn set_led(config: &WatcherConfig, args: &LedArgs) -> CommandResult {
    let lighting = configuration(args);

    let discovery = open_discovery(config)?;
    let mut supervisor = Supervisor::from_config(config, discovery, Box::new(LogSwitcher));
    supervisor.connect()?;
    let result = supervisor.send_lighting(&lighting);
    supervisor.close();
    let packet = result?;

    println!("Sent {} ({})", lighting.effect(), packet.to_hex());
    Ok(())
}
