//! Watcher error types

use dongle_transport::TransportError;
use thiserror::Error;

/// Errors from the watcher
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Config file could not be read or written
    #[error("Config I/O error on {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("Config serialization failed: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Config parsed but holds an unusable value
    #[error("Invalid config value: {0}")]
    InvalidConfig(String),

    /// The OS refused or failed a layout change
    #[error("Layout switch to {layout} failed: {reason}")]
    LayoutSwitch { layout: String, reason: String },

    /// No dongle attached
    #[error("Device not found")]
    NotFound,
}
