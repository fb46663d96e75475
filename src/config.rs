//! Configuration for the watcher
//!
//! Stored as TOML. Every field has a default, so a missing file or a partial
//! file both work.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dongle_transport::device_registry::{PAGE_COMMAND, PAGE_STATUS, PRODUCT_ID, VENDOR_ID};
use dongle_transport::lighting::range;
use dongle_transport::{DeviceIds, RipplePreset, TransportType, UsbEndpoints};
use serde::{Deserialize, Serialize};

use crate::error::WatcherError;

/// Placeholder substituted into the layout command template
pub const LAYOUT_PLACEHOLDER: &str = "{layout}";

/// Which dongle to look for and how to talk to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub command_usage_page: u16,
    pub status_usage_page: u16,
    /// `hid` or `usb` (the latter needs the `libusb` feature)
    pub backend: TransportType,
    /// Interface/endpoint numbers for the `usb` backend
    pub usb: UsbEndpoints,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
            command_usage_page: PAGE_COMMAND,
            status_usage_page: PAGE_STATUS,
            backend: TransportType::Hid,
            usb: UsbEndpoints::default(),
        }
    }
}

impl DeviceConfig {
    pub fn ids(&self) -> DeviceIds {
        DeviceIds {
            vid: self.vendor_id,
            pid: self.product_id,
            command_usage_page: self.command_usage_page,
            status_usage_page: self.status_usage_page,
        }
    }
}

/// Supervisor timing, all in milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause between failed discovery/open attempts
    pub backoff_ms: u64,
    /// Ping attempts before giving up on a reply
    pub probe_attempts: u32,
    /// Pause after the wake-up packet
    pub probe_settle_ms: u64,
    pub probe_command_timeout_ms: u32,
    pub probe_status_timeout_ms: u32,
    pub status_poll_timeout_ms: u32,
    pub command_drain_timeout_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            backoff_ms: 2000,
            probe_attempts: 10,
            probe_settle_ms: 50,
            probe_command_timeout_ms: 100,
            probe_status_timeout_ms: 50,
            status_poll_timeout_ms: 1000,
            command_drain_timeout_ms: 1,
        }
    }
}

impl TimingConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn probe_settle(&self) -> Duration {
        Duration::from_millis(self.probe_settle_ms)
    }
}

/// How layout changes reach the OS
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SwitcherKind {
    /// Only log the change
    #[default]
    Log,
    /// Run an external command
    Command,
    /// Win32 keyboard layout APIs
    Windows,
}

/// Layout identifiers and the switching mechanism
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Layout while the keyboard is linked (hex language id)
    pub primary: String,
    /// Layout while the keyboard is away
    pub fallback: String,
    pub switcher: SwitcherKind,
    /// argv for the `command` switcher; `{layout}` is replaced by the id
    pub command: Vec<String>,
    /// The command is killed if it runs longer than this
    pub command_timeout_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            primary: "0409".to_string(),
            fallback: "0816".to_string(),
            switcher: SwitcherKind::Log,
            command: Vec::new(),
            command_timeout_ms: 5000,
        }
    }
}

impl LayoutConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// Wake-up lighting preset sent before every probe
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RippleConfig {
    pub colorful: u8,
    pub brightness: u8,
    pub speed: u8,
}

impl Default for RippleConfig {
    fn default() -> Self {
        let preset = RipplePreset::default();
        Self {
            colorful: preset.colorful,
            brightness: preset.brightness,
            speed: preset.speed,
        }
    }
}

impl RippleConfig {
    pub fn preset(&self) -> RipplePreset {
        RipplePreset {
            colorful: self.colorful,
            brightness: self.brightness,
            speed: self.speed,
        }
    }
}

/// Complete watcher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherConfig {
    pub device: DeviceConfig,
    pub timing: TimingConfig,
    pub layout: LayoutConfig,
    pub ripple: RippleConfig,
}

impl WatcherConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dongle-watcher")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> Result<Self, WatcherError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| WatcherError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, WatcherError> {
        let mut config: WatcherConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<(), WatcherError> {
        let io_err = |source| WatcherError::ConfigIo {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(io_err)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, WatcherError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject unusable values and clamp the ripple preset into range
    pub fn validate(&mut self) -> Result<(), WatcherError> {
        if self.timing.probe_attempts == 0 {
            return Err(WatcherError::InvalidConfig(
                "timing.probe_attempts must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("layout.primary", &self.layout.primary),
            ("layout.fallback", &self.layout.fallback),
        ] {
            if value.trim().is_empty() {
                return Err(WatcherError::InvalidConfig(format!("{name} is empty")));
            }
        }
        if self.layout.command_timeout_ms == 0 {
            return Err(WatcherError::InvalidConfig(
                "layout.command_timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.layout.switcher == SwitcherKind::Command && self.layout.command.is_empty() {
            return Err(WatcherError::InvalidConfig(
                "layout.command is required when layout.switcher = \"command\"".to_string(),
            ));
        }

        let ripple = &mut self.ripple;
        ripple.colorful = ripple.colorful.clamp(range::MIN_COLORFUL, range::MAX_COLORFUL);
        ripple.brightness = ripple
            .brightness
            .clamp(range::MIN_BRIGHTNESS, range::MAX_BRIGHTNESS);
        ripple.speed = ripple.speed.clamp(range::MIN_SPEED, range::MAX_SPEED);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let toml_str = WatcherConfig::default().to_toml().unwrap();
        assert!(toml_str.contains("[device]"));
        assert!(toml_str.contains("backend = \"hid\""));
        assert!(toml_str.contains("primary = \"0409\""));
        assert!(toml_str.contains("fallback = \"0816\""));
        assert!(toml_str.contains("switcher = \"log\""));
    }

    #[test]
    fn test_roundtrip() {
        let config = WatcherConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = WatcherConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = WatcherConfig::from_toml("").unwrap();
        assert_eq!(config, WatcherConfig::default());
        assert_eq!(config.timing.backoff_ms, 2000);
        assert_eq!(config.timing.probe_attempts, 10);
        assert_eq!(config.device.ids(), DeviceIds::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = WatcherConfig::from_toml(
            r#"
            [timing]
            backoff_ms = 500

            [layout]
            switcher = "command"
            command = ["setxkbmap", "{layout}"]

            [device.usb]
            status_in_endpoint = 0x82
            "#,
        )
        .unwrap();
        assert_eq!(config.timing.backoff_ms, 500);
        assert_eq!(config.timing.status_poll_timeout_ms, 1000);
        assert_eq!(config.layout.switcher, SwitcherKind::Command);
        assert_eq!(config.layout.primary, "0409");
        assert_eq!(config.device.usb.status_in_endpoint, 0x82);
        assert_eq!(config.device.usb.command_out_endpoint, 0x03);
    }

    #[test]
    fn test_zero_probe_attempts_rejected() {
        let err = WatcherConfig::from_toml("[timing]\nprobe_attempts = 0\n").unwrap_err();
        assert!(matches!(err, WatcherError::InvalidConfig(_)));
    }

    #[test]
    fn test_command_timeout() {
        let config = WatcherConfig::from_toml("").unwrap();
        assert_eq!(config.layout.command_timeout(), Duration::from_millis(5000));

        let err = WatcherConfig::from_toml("[layout]\ncommand_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(err, WatcherError::InvalidConfig(_)));
    }

    #[test]
    fn test_command_switcher_needs_command() {
        let err = WatcherConfig::from_toml("[layout]\nswitcher = \"command\"\n").unwrap_err();
        assert!(matches!(err, WatcherError::InvalidConfig(_)));
    }

    #[test]
    fn test_ripple_clamped() {
        let config =
            WatcherConfig::from_toml("[ripple]\ncolorful = 7\nbrightness = 0\nspeed = 9\n")
                .unwrap();
        assert_eq!(config.ripple.colorful, 1);
        assert_eq!(config.ripple.brightness, 1);
        assert_eq!(config.ripple.speed, 5);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = WatcherConfig::from_toml("[device]\nbackend = \"serial\"\n").unwrap_err();
        assert!(matches!(err, WatcherError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("dongle-watcher-test-missing/none.toml");
        let config = WatcherConfig::load(&path).unwrap();
        assert_eq!(config, WatcherConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("dongle-watcher-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let mut config = WatcherConfig::default();
        config.layout.fallback = "0407".to_string();
        config.save(&path).unwrap();
        let loaded = WatcherConfig::load(&path).unwrap();
        assert_eq!(loaded.layout.fallback, "0407");
        std::fs::remove_dir_all(&dir).ok();
    }
}
