//! hidapi transport: one handle per interface

use hidapi::HidDevice;
use tracing::debug;

use crate::error::TransportError;
use crate::types::{Channel, TransportDeviceInfo};
use crate::Transport;

/// HID transport holding the command and status interfaces
///
/// Writes go out with the report id in byte 0, as hidapi expects.
pub struct HidTransport {
    command: Option<HidDevice>,
    status: Option<HidDevice>,
    info: TransportDeviceInfo,
}

impl HidTransport {
    pub fn new(command: HidDevice, status: HidDevice, info: TransportDeviceInfo) -> Self {
        Self {
            command: Some(command),
            status: Some(status),
            info,
        }
    }

    fn handle(&self, channel: Channel) -> Result<&HidDevice, TransportError> {
        let device = match channel {
            Channel::Command => self.command.as_ref(),
            Channel::Status => self.status.as_ref(),
        };
        device.ok_or(TransportError::Disconnected)
    }
}

impl Transport for HidTransport {
    fn write(&mut self, channel: Channel, data: &[u8]) -> Result<usize, TransportError> {
        let written = self.handle(channel)?.write(data)?;
        debug!("{} <- {:02X?}", channel, data);
        Ok(written)
    }

    fn read(
        &mut self,
        channel: Channel,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, TransportError> {
        let timeout = i32::try_from(timeout_ms).unwrap_or(i32::MAX);
        let len = self.handle(channel)?.read_timeout(buf, timeout)?;
        if len > 0 {
            debug!("{} -> {:02X?}", channel, &buf[..len]);
        }
        Ok(len)
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(&mut self) {
        if self.command.take().is_some() | self.status.take().is_some() {
            debug!("Closed HID handles for {}", self.info.device_path);
        }
    }
}

impl Drop for HidTransport {
    fn drop(&mut self) {
        self.close();
    }
}
