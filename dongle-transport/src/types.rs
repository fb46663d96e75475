//! Common types for transport layer

use std::ffi::CString;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport backend identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// hidapi, one handle per HID interface
    #[default]
    Hid,
    /// libusb interrupt transfers on claimed interfaces
    Usb,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportType::Hid => f.write_str("hid"),
            TransportType::Usb => f.write_str("usb"),
        }
    }
}

/// One of the two logical I/O paths to the dongle.
///
/// The same leading bytes mean different things on different channels, so a
/// buffer is only meaningful together with the channel it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Command/ping-pong interface (usage page 0xFF60)
    Command,
    /// Link status reports (usage page 0xFFFF)
    Status,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Command => "command",
            Channel::Status => "status",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device identification information
#[derive(Debug, Clone)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// Transport backend
    pub transport_type: TransportType,
    /// Human-readable location (HID path of the command interface, or bus:address)
    pub device_path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

/// Backend-specific handles needed to open a discovered device
#[derive(Debug, Clone)]
pub enum DeviceEndpoints {
    /// Two hidraw nodes, one per usage page
    Hid {
        command_path: CString,
        status_path: CString,
    },
    /// A single USB device addressed by bus position
    Usb { bus: u8, address: u8 },
}

/// Discovered device that can be opened
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Device information
    pub info: TransportDeviceInfo,
    /// How to reach both channels
    pub endpoints: DeviceEndpoints,
}

/// Interface and endpoint numbers for the libusb backend.
///
/// The HID backend locates channels by usage page instead and ignores these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsbEndpoints {
    pub command_interface: u8,
    pub status_interface: u8,
    pub command_out_endpoint: u8,
    pub command_in_endpoint: u8,
    pub status_in_endpoint: u8,
}

impl Default for UsbEndpoints {
    fn default() -> Self {
        Self {
            command_interface: 1,
            status_interface: 2,
            command_out_endpoint: 0x03,
            command_in_endpoint: 0x83,
            status_in_endpoint: 0x84,
        }
    }
}
