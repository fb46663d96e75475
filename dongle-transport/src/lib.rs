//! Transport abstraction and packet codec for the 0C45:FDFD keyboard dongle
//!
//! The dongle exposes two logical channels:
//!
//! - Command (usage page 0xFF60): lighting commands, pings and their replies
//! - Status (usage page 0xFFFF): link up/down notifications
//!
//! Backends:
//!
//! - hidapi (default), one handle per interface
//! - libusb (`libusb` feature), interrupt transfers on claimed interfaces

pub mod device_registry;
pub mod error;
pub mod event_parser;
pub mod lighting;
pub mod protocol;
pub mod types;

mod discovery;
mod hid;
#[cfg(feature = "libusb")]
mod usb;

pub use device_registry::{DeviceIds, PRODUCT_ID, VENDOR_ID};
pub use error::TransportError;
pub use event_parser::{classify_inbound, InboundEvent, LinkSignal};
pub use lighting::{Capabilities, Effect, LightingConfiguration, RipplePreset};
pub use protocol::{encode_lighting_packet, ripple_packet, Packet, PACKET_SIZE};
pub use types::{
    Channel, DeviceEndpoints, DiscoveredDevice, TransportDeviceInfo, TransportType, UsbEndpoints,
};

pub use discovery::{discovery_for, DeviceDiscovery, HidDiscovery};
pub use hid::HidTransport;
#[cfg(feature = "libusb")]
pub use usb::{UsbDiscovery, UsbTransport};

/// An open connection to the dongle
///
/// Reads never block longer than the given timeout. A timeout is not an
/// error: it yields `Ok(0)`. Any `Err` means the device is gone or unusable.
pub trait Transport {
    /// Write a full packet (report id included) to a channel
    ///
    /// Returns the number of packet bytes accepted, counting the report id
    /// even when the backend does not put it on the wire.
    fn write(&mut self, channel: Channel, data: &[u8]) -> Result<usize, TransportError>;

    /// Read one report from a channel into `buf`
    ///
    /// # Returns
    /// Number of bytes read, `0` on timeout
    fn read(
        &mut self,
        channel: Channel,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, TransportError>;

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Release every handle. Calling it twice is harmless.
    fn close(&mut self);

    /// Write a packet to the command channel, rejecting short writes
    fn send_packet(&mut self, packet: &Packet) -> Result<(), TransportError> {
        let expected = packet.as_bytes().len();
        let written = self.write(Channel::Command, packet.as_bytes())?;
        if written < expected {
            return Err(TransportError::ShortWrite { written, expected });
        }
        Ok(())
    }
}
