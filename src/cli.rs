// CLI definitions using clap

use clap::{Args, Parser, Subcommand};
use dongle_transport::Effect;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dongle-watcher")]
#[command(author, version, about = "Switch keyboard layout when a wireless keyboard links to its dongle")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/dongle-watcher/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the dongle and switch layouts until interrupted (default)
    #[command(visible_alias = "w")]
    Watch,

    /// List attached dongles
    #[command(visible_alias = "ls")]
    List,

    /// Show lighting effects and the fields each one honours
    #[command(visible_aliases = ["modes", "e"])]
    Effects,

    /// Print the lighting packet for an effect without touching a device
    Encode(LedArgs),

    /// Send a lighting effect to the dongle
    #[command(visible_alias = "sl")]
    SetLed(LedArgs),

    /// Open the dongle once, run the liveness probe and report the link state
    Probe,

    /// Print the effective configuration as TOML
    Config {
        /// Write it to the config path as well
        #[arg(long)]
        save: bool,
    },
}

/// Lighting parameters; out-of-range values are clamped
#[derive(Args, Debug, Clone)]
pub struct LedArgs {
    /// Effect name (e.g. 'static', 'breath', 'ripples') or code (0-19, 0x00-0x13)
    pub effect: Effect,
    /// Red component (0-255)
    #[arg(short, long)]
    pub red: Option<u8>,
    /// Green component (0-255)
    #[arg(short, long)]
    pub green: Option<u8>,
    /// Blue component (0-255)
    #[arg(short, long)]
    pub blue: Option<u8>,
    /// Colorful flag (0-1)
    #[arg(long)]
    pub colorful: Option<u8>,
    /// Brightness (1-5)
    #[arg(long)]
    pub brightness: Option<u8>,
    /// Speed (1-5)
    #[arg(short, long)]
    pub speed: Option<u8>,
    /// Direction (0-3)
    #[arg(short, long)]
    pub direction: Option<u8>,
}
