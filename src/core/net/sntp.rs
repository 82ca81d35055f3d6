//! SNTP client packets (RFC 4330).

use core::fmt;

pub const NTP_PACKET_LEN: usize = 48;

/// Seconds between 1900-01-01 and 1970-01-01.
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// LI = 0, VN = 3, Mode = 3 (client).
const CLIENT_HEADER: u8 = 0x1B;
const MODE_SERVER: u8 = 4;
const TRANSMIT_TIMESTAMP: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SntpError {
    ShortPacket,
    /// The reply was not sent by a server
    NotServer,
    /// Kiss-of-death or unsynchronized server
    Unsynchronized,
    BeforeUnixEpoch,
}

impl fmt::Display for SntpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SntpError::ShortPacket => "short packet",
            SntpError::NotServer => "reply is not from a server",
            SntpError::Unsynchronized => "server is not synchronized",
            SntpError::BeforeUnixEpoch => "timestamp before the unix epoch",
        })
    }
}

pub fn build_request() -> [u8; NTP_PACKET_LEN] {
    let mut packet = [0u8; NTP_PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Extract the server transmit time as Unix seconds.
pub fn parse_response(packet: &[u8]) -> Result<u64, SntpError> {
    if packet.len() < NTP_PACKET_LEN {
        return Err(SntpError::ShortPacket);
    }
    if packet[0] & 0x07 != MODE_SERVER {
        return Err(SntpError::NotServer);
    }
    if packet[1] == 0 {
        return Err(SntpError::Unsynchronized);
    }

    let mut seconds = [0u8; 4];
    seconds.copy_from_slice(&packet[TRANSMIT_TIMESTAMP..TRANSMIT_TIMESTAMP + 4]);
    u64::from(u32::from_be_bytes(seconds))
        .checked_sub(NTP_UNIX_OFFSET)
        .ok_or(SntpError::BeforeUnixEpoch)
}
