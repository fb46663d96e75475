//! Device registry - VID/PID and HID usage pages of the supported dongle

/// Dongle vendor ID
pub const VENDOR_ID: u16 = 0x0C45;

/// Dongle product ID
pub const PRODUCT_ID: u16 = 0xFDFD;

/// Usage page of the command/ping interface
pub const PAGE_COMMAND: u16 = 0xFF60;

/// Usage page of the link status interface
pub const PAGE_STATUS: u16 = 0xFFFF;

/// Identity used to match the dongle and tell its two interfaces apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIds {
    pub vid: u16,
    pub pid: u16,
    pub command_usage_page: u16,
    pub status_usage_page: u16,
}

impl Default for DeviceIds {
    fn default() -> Self {
        Self {
            vid: VENDOR_ID,
            pid: PRODUCT_ID,
            command_usage_page: PAGE_COMMAND,
            status_usage_page: PAGE_STATUS,
        }
    }
}

impl DeviceIds {
    /// Check if a VID/PID pair is the dongle
    #[inline]
    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        self.vid == vid && self.pid == pid
    }
}
