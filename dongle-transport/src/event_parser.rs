//! Classification of inbound reports
//!
//! The dongle reports on two interfaces. The status interface carries link
//! notifications, the command interface carries ping replies. Both use short
//! byte signatures at the start of the buffer, so classification always needs
//! to know which channel a buffer came from.

use tracing::trace;

use crate::types::Channel;

/// Leading byte signatures
pub mod signature {
    /// Link status report on the status channel: `05 A6 ?? <code>`
    pub const STATUS: [u8; 2] = [0x05, 0xA6];
    /// Ping reply on the command channel
    pub const PONG: [u8; 2] = [0x20, 0x01];
}

/// Link status codes (byte 3 of a status report)
pub mod link_code {
    pub const UP: u8 = 0x01;
    pub const DOWN: u8 = 0x02;
}

/// Buffers shorter than this are never meaningful
pub const MIN_INBOUND_LEN: usize = 4;

/// Offset of the link code inside a status report
const STATUS_CODE_OFFSET: usize = 3;

/// Meaning of one inbound buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundEvent {
    /// Too short, unknown signature, or read from the wrong channel
    Ignore,
    /// Link status report with its raw state code
    StatusEvent(u8),
    /// Answer to a ping
    LivenessReply,
}

/// Decoded link status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSignal {
    Up,
    Down,
}

impl LinkSignal {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            link_code::UP => Some(LinkSignal::Up),
            link_code::DOWN => Some(LinkSignal::Down),
            _ => None,
        }
    }
}

/// Classify a buffer read from `channel`
pub fn classify_inbound(buffer: &[u8], channel: Channel) -> InboundEvent {
    if buffer.len() < MIN_INBOUND_LEN {
        trace!("Ignoring {}-byte {} report", buffer.len(), channel);
        return InboundEvent::Ignore;
    }

    let event = match channel {
        Channel::Status if buffer.starts_with(&signature::STATUS) => {
            InboundEvent::StatusEvent(buffer[STATUS_CODE_OFFSET])
        }
        Channel::Command if buffer.starts_with(&signature::PONG) => InboundEvent::LivenessReply,
        _ => InboundEvent::Ignore,
    };

    if event == InboundEvent::Ignore {
        trace!("Ignoring {} report {:02X?}", channel, &buffer[..MIN_INBOUND_LEN]);
    }
    event
}
