//! Device discovery for the dongle

use hidapi::HidApi;
use tracing::{debug, info};

use crate::device_registry::DeviceIds;
use crate::error::TransportError;
use crate::hid::HidTransport;
use crate::types::{
    DeviceEndpoints, DiscoveredDevice, TransportDeviceInfo, TransportType, UsbEndpoints,
};
use crate::Transport;

/// Device discovery abstraction
pub trait DeviceDiscovery {
    /// List currently attached dongles
    fn list_devices(&mut self) -> Result<Vec<DiscoveredDevice>, TransportError>;

    /// First attached dongle, if any
    fn find_device(&mut self) -> Result<Option<DiscoveredDevice>, TransportError> {
        Ok(self.list_devices()?.into_iter().next())
    }

    /// Open both channels of a discovered dongle
    ///
    /// On failure nothing stays open.
    fn open_device(
        &mut self,
        device: &DiscoveredDevice,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

/// Build the discovery backend named in the configuration
pub fn discovery_for(
    backend: TransportType,
    ids: DeviceIds,
    usb: UsbEndpoints,
) -> Result<Box<dyn DeviceDiscovery>, TransportError> {
    match backend {
        TransportType::Hid => Ok(Box::new(HidDiscovery::new(ids)?)),
        #[cfg(feature = "libusb")]
        TransportType::Usb => Ok(Box::new(crate::usb::UsbDiscovery::new(ids, usb)?)),
        #[cfg(not(feature = "libusb"))]
        TransportType::Usb => {
            let _ = usb;
            Err(TransportError::Internal(
                "usb backend requires the `libusb` feature".to_string(),
            ))
        }
    }
}

/// hidapi discovery: pairs the command and status interfaces by usage page
pub struct HidDiscovery {
    api: HidApi,
    ids: DeviceIds,
}

impl HidDiscovery {
    /// Create the hidapi context. Failing here is not retried.
    pub fn new(ids: DeviceIds) -> Result<Self, TransportError> {
        let api = HidApi::new()?;
        Ok(Self { api, ids })
    }

    fn find_interface(&self, usage_page: u16) -> Option<&hidapi::DeviceInfo> {
        self.api.device_list().find(|d| {
            self.ids.matches(d.vendor_id(), d.product_id()) && d.usage_page() == usage_page
        })
    }
}

impl DeviceDiscovery for HidDiscovery {
    fn list_devices(&mut self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        self.api.refresh_devices()?;

        let Some(command) = self.find_interface(self.ids.command_usage_page) else {
            debug!(
                "No {:04X}:{:04X} interface on usage page {:04X}",
                self.ids.vid, self.ids.pid, self.ids.command_usage_page
            );
            return Ok(Vec::new());
        };
        let Some(status) = self.find_interface(self.ids.status_usage_page) else {
            debug!(
                "No {:04X}:{:04X} interface on usage page {:04X}",
                self.ids.vid, self.ids.pid, self.ids.status_usage_page
            );
            return Ok(Vec::new());
        };

        let device = DiscoveredDevice {
            info: TransportDeviceInfo {
                vid: command.vendor_id(),
                pid: command.product_id(),
                transport_type: TransportType::Hid,
                device_path: command.path().to_string_lossy().to_string(),
                serial: command.serial_number().map(|s| s.to_string()),
                product_name: command.product_string().map(|s| s.to_string()),
            },
            endpoints: DeviceEndpoints::Hid {
                command_path: command.path().to_owned(),
                status_path: status.path().to_owned(),
            },
        };

        debug!(
            "Found dongle: command={} status={}",
            device.info.device_path,
            status.path().to_string_lossy()
        );
        Ok(vec![device])
    }

    fn open_device(
        &mut self,
        device: &DiscoveredDevice,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let DeviceEndpoints::Hid {
            command_path,
            status_path,
        } = &device.endpoints
        else {
            return Err(TransportError::Internal(format!(
                "{} is not a HID device",
                device.info.device_path
            )));
        };

        // If the second open fails the first handle is dropped with it
        let command = self.api.open_path(command_path)?;
        let status = self.api.open_path(status_path)?;

        info!(
            "Opened {:04X}:{:04X} ({})",
            device.info.vid,
            device.info.pid,
            device.info.product_name.as_deref().unwrap_or("unknown")
        );
        Ok(Box::new(HidTransport::new(command, status, device.info.clone())))
    }
}
