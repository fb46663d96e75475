//! libusb transport: interrupt transfers on directly claimed interfaces
//!
//! Used where hidapi cannot tell the two interfaces apart by usage page.
//! Interface and endpoint numbers come from [`UsbEndpoints`].

use std::time::Duration;

use rusb::{Context, DeviceHandle, UsbContext};
use tracing::{debug, info, warn};

use crate::device_registry::DeviceIds;
use crate::error::TransportError;
use crate::protocol::REPORT_ID;
use crate::types::{
    Channel, DeviceEndpoints, DiscoveredDevice, TransportDeviceInfo, TransportType, UsbEndpoints,
};
use crate::{DeviceDiscovery, Transport};

/// Upper bound for a single interrupt OUT transfer
const WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// libusb discovery by VID/PID
pub struct UsbDiscovery {
    context: Context,
    ids: DeviceIds,
    endpoints: UsbEndpoints,
}

impl UsbDiscovery {
    pub fn new(ids: DeviceIds, endpoints: UsbEndpoints) -> Result<Self, TransportError> {
        let context = Context::new()?;
        Ok(Self {
            context,
            ids,
            endpoints,
        })
    }
}

impl DeviceDiscovery for UsbDiscovery {
    fn list_devices(&mut self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        let mut devices = Vec::new();
        for device in self.context.devices()?.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            if !self.ids.matches(desc.vendor_id(), desc.product_id()) {
                continue;
            }

            let bus = device.bus_number();
            let address = device.address();
            debug!("Found dongle at bus {bus:03} address {address:03}");
            devices.push(DiscoveredDevice {
                info: TransportDeviceInfo {
                    vid: desc.vendor_id(),
                    pid: desc.product_id(),
                    transport_type: TransportType::Usb,
                    device_path: format!("{bus:03}:{address:03}"),
                    serial: None,
                    product_name: None,
                },
                endpoints: DeviceEndpoints::Usb { bus, address },
            });
        }
        Ok(devices)
    }

    fn open_device(
        &mut self,
        device: &DiscoveredDevice,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let DeviceEndpoints::Usb { bus, address } = device.endpoints else {
            return Err(TransportError::Internal(format!(
                "{} is not a USB device",
                device.info.device_path
            )));
        };

        let usb_device = self
            .context
            .devices()?
            .iter()
            .find(|d| d.bus_number() == bus && d.address() == address)
            .ok_or_else(|| TransportError::DeviceNotFound(device.info.device_path.clone()))?;

        let mut handle = usb_device.open()?;
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) | Err(rusb::Error::NotSupported) => {}
            Err(e) => return Err(e.into()),
        }

        let mut transport = UsbTransport {
            handle: None,
            claimed: Vec::new(),
            endpoints: self.endpoints,
            info: device.info.clone(),
        };
        for interface in [
            self.endpoints.command_interface,
            self.endpoints.status_interface,
        ] {
            if transport.claimed.contains(&interface) {
                continue;
            }
            if let Err(e) = handle.claim_interface(interface) {
                transport.release(&mut handle);
                return Err(e.into());
            }
            transport.claimed.push(interface);
        }
        transport.handle = Some(handle);

        info!(
            "Opened {:04X}:{:04X} at {}",
            device.info.vid, device.info.pid, device.info.device_path
        );
        Ok(Box::new(transport))
    }
}

/// Transport over one libusb handle with both interfaces claimed
pub struct UsbTransport {
    handle: Option<DeviceHandle<Context>>,
    claimed: Vec<u8>,
    endpoints: UsbEndpoints,
    info: TransportDeviceInfo,
}

impl UsbTransport {
    fn release(&mut self, handle: &mut DeviceHandle<Context>) {
        for interface in self.claimed.drain(..) {
            if let Err(e) = handle.release_interface(interface) {
                warn!("Failed to release interface {interface}: {e}");
            }
        }
    }

    fn handle(&self) -> Result<&DeviceHandle<Context>, TransportError> {
        self.handle.as_ref().ok_or(TransportError::Disconnected)
    }
}

impl Transport for UsbTransport {
    fn write(&mut self, channel: Channel, data: &[u8]) -> Result<usize, TransportError> {
        if channel != Channel::Command {
            return Err(TransportError::Internal(format!(
                "{channel} channel has no OUT endpoint"
            )));
        }
        // The report id never goes on the wire for raw interrupt transfers
        let (payload, prefix) = match data.split_first() {
            Some((&REPORT_ID, rest)) => (rest, 1),
            _ => (data, 0),
        };
        let written =
            self.handle()?
                .write_interrupt(self.endpoints.command_out_endpoint, payload, WRITE_TIMEOUT)?;
        debug!("{} <- {:02X?}", channel, payload);
        Ok(written + prefix)
    }

    fn read(
        &mut self,
        channel: Channel,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, TransportError> {
        let endpoint = match channel {
            Channel::Command => self.endpoints.command_in_endpoint,
            Channel::Status => self.endpoints.status_in_endpoint,
        };
        // libusb treats a zero timeout as "wait forever"
        let timeout = Duration::from_millis(u64::from(timeout_ms.max(1)));
        match self.handle()?.read_interrupt(endpoint, buf, timeout) {
            Ok(len) => {
                if len > 0 {
                    debug!("{} -> {:02X?}", channel, &buf[..len]);
                }
                Ok(len)
            }
            Err(rusb::Error::Timeout) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            self.release(&mut handle);
            debug!("Closed USB handle for {}", self.info.device_path);
        }
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.close();
    }
}
