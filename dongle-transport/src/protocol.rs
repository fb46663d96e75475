//! Wire protocol: 33-byte packet layout, checksum and packet builders
//!
//! Every packet, inbound or outbound, travels in the same 33-byte envelope.
//! Byte 0 is the HID report id; whether it reaches the wire is decided by the
//! transport (hidapi wants it, raw interrupt transfers strip it).
//!
//! ```text
//! offset  0     report id (0x00)
//!         1-3   header 05 10 00
//!         4     effect code
//!         5-7   red green blue
//!         12    colorful
//!         13    brightness
//!         14    speed
//!         15    direction
//!         18-19 markers AA 55
//!         32    XOR of bytes 1..=31
//! ```

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::lighting::{Capabilities, LightingConfiguration, RipplePreset};

/// Size of every packet, report id included
pub const PACKET_SIZE: usize = 33;

/// Read buffer size (the interfaces report up to 64 bytes)
pub const READ_BUFFER_SIZE: usize = 64;

/// Report id prepended to every outbound packet
pub const REPORT_ID: u8 = 0x00;

/// Byte offsets inside the 33-byte envelope
pub mod offset {
    pub const REPORT_ID: usize = 0;
    pub const HEADER_1: usize = 1;
    pub const HEADER_2: usize = 2;
    pub const HEADER_3: usize = 3;
    pub const EFFECT: usize = 4;
    pub const RED: usize = 5;
    pub const GREEN: usize = 6;
    pub const BLUE: usize = 7;
    pub const COLORFUL: usize = 12;
    pub const BRIGHTNESS: usize = 13;
    pub const SPEED: usize = 14;
    pub const DIRECTION: usize = 15;
    pub const MARKER_0: usize = 18;
    pub const MARKER_1: usize = 19;
    pub const CHECKSUM: usize = 32;
}

/// Fixed bytes of lighting packets
pub mod lighting_header {
    pub const HEADER_1: u8 = 0x05;
    pub const HEADER_2: u8 = 0x10;
    pub const HEADER_3: u8 = 0x00;
    pub const MARKER_0: u8 = 0xAA;
    pub const MARKER_1: u8 = 0x55;
}

/// Values emitted for fields the effect does not honour
pub mod defaults {
    pub const RED: u8 = 0xFF;
    pub const GREEN: u8 = 0xFF;
    pub const BLUE: u8 = 0xFF;
    pub const COLORFUL: u8 = 0x01;
    pub const BRIGHTNESS: u8 = 0x05;
    pub const SPEED: u8 = 0x03;
    pub const DIRECTION: u8 = 0x00;
}

/// Command signatures (bytes 1.. of control packets)
pub mod cmd {
    /// Init command
    pub const INIT: [u8; 1] = [0x02];
    /// Ping; the dongle answers with the same two bytes on the command channel
    pub const PING: [u8; 2] = [0x20, 0x01];
}

/// XOR of bytes 1..=31
pub const fn xor_checksum(bytes: &[u8; PACKET_SIZE]) -> u8 {
    let mut acc = 0u8;
    let mut i = offset::HEADER_1;
    while i < offset::CHECKSUM {
        acc ^= bytes[i];
        i += 1;
    }
    acc
}

/// An immutable 33-byte packet with a valid trailing checksum
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet([u8; PACKET_SIZE]);

impl Packet {
    /// Stamp the report id and checksum onto a body
    const fn seal(mut bytes: [u8; PACKET_SIZE]) -> Self {
        bytes[offset::REPORT_ID] = REPORT_ID;
        bytes[offset::CHECKSUM] = xor_checksum(&bytes);
        Self(bytes)
    }

    /// Control packet: `signature` at offset 1, zero padding, checksum
    const fn control(signature: &[u8]) -> Self {
        let mut bytes = [0u8; PACKET_SIZE];
        let mut i = 0;
        while i < signature.len() && i + 1 < offset::CHECKSUM {
            bytes[i + 1] = signature[i];
            i += 1;
        }
        Self::seal(bytes)
    }

    /// Full packet including the report id
    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }

    /// Packet without the leading report id (for raw interrupt writes)
    pub fn without_report_id(&self) -> &[u8] {
        &self.0[offset::HEADER_1..]
    }

    pub fn checksum(&self) -> u8 {
        self.0[offset::CHECKSUM]
    }

    /// Check a buffer's trailing byte against the XOR of bytes 1..=31
    pub fn verify(bytes: &[u8; PACKET_SIZE]) -> bool {
        bytes[offset::CHECKSUM] == xor_checksum(bytes)
    }

    /// Space-separated hex dump
    pub fn to_hex(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet[{}]", self.to_hex())
    }
}

/// Init packet (`02`, checksum `02`)
///
/// Some firmware expects this instead of a lighting packet as the wake-up
/// before pinging; pass it as the supervisor's greeting for those.
pub const INIT: Packet = Packet::control(&cmd::INIT);

/// Liveness ping (`20 01`, checksum `21`)
pub const PING: Packet = Packet::control(&cmd::PING);

/// Lighting command layout.
///
/// Byte 32 (`checksum`) is a placeholder overwritten when the packet is sealed.
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct LightingReport {
    report_id: u8,
    header: [u8; 3],
    effect: u8,
    red: u8,
    green: u8,
    blue: u8,
    _pad0: [u8; 4],
    colorful: u8,
    brightness: u8,
    speed: u8,
    direction: u8,
    _pad1: [u8; 2],
    markers: [u8; 2],
    _reserved: [u8; 12],
    checksum: u8,
}

const _: () = assert!(std::mem::size_of::<LightingReport>() == PACKET_SIZE);

/// Encode a lighting configuration.
///
/// Fields the effect does not honour are replaced by `defaults`, whatever
/// value the configuration carries.
pub fn encode_lighting_packet(config: &LightingConfiguration) -> Packet {
    let available = config.available();
    let pick = |flag: Capabilities, value: u8, default: u8| {
        if available.contains(flag) {
            value
        } else {
            default
        }
    };

    let report = LightingReport {
        report_id: REPORT_ID,
        header: [
            lighting_header::HEADER_1,
            lighting_header::HEADER_2,
            lighting_header::HEADER_3,
        ],
        effect: config.effect().code(),
        red: pick(Capabilities::RED, config.red(), defaults::RED),
        green: pick(Capabilities::GREEN, config.green(), defaults::GREEN),
        blue: pick(Capabilities::BLUE, config.blue(), defaults::BLUE),
        _pad0: [0; 4],
        colorful: pick(Capabilities::COLORFUL, config.colorful(), defaults::COLORFUL),
        brightness: pick(
            Capabilities::BRIGHTNESS,
            config.brightness(),
            defaults::BRIGHTNESS,
        ),
        speed: pick(Capabilities::SPEED, config.speed(), defaults::SPEED),
        direction: pick(
            Capabilities::DIRECTION,
            config.direction(),
            defaults::DIRECTION,
        ),
        _pad1: [0; 2],
        markers: [lighting_header::MARKER_0, lighting_header::MARKER_1],
        _reserved: [0; 12],
        checksum: 0,
    };

    let mut bytes = [0u8; PACKET_SIZE];
    bytes.copy_from_slice(report.as_bytes());
    Packet::seal(bytes)
}

/// Ripple preset packet used to wake the dongle before probing
pub fn ripple_packet(preset: RipplePreset) -> Packet {
    encode_lighting_packet(&preset.to_configuration())
}
