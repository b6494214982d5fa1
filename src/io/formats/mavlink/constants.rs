// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MAVLink framing constants.

/// MAVLink 1 frame start marker.
pub const MAVLINK_V1_STX: u8 = 0xFE;
/// MAVLink 2 frame start marker.
pub const MAVLINK_V2_STX: u8 = 0xFD;

/// MAVLink 1 header: STX, len, seq, sysid, compid, msgid.
pub const V1_HEADER_LEN: usize = 6;
/// MAVLink 2 header: STX, len, incompat, compat, seq, sysid, compid, msgid[3].
pub const V2_HEADER_LEN: usize = 10;
/// Trailing checksum bytes.
pub const CHECKSUM_LEN: usize = 2;
/// Signature block appended when the signed flag is set.
pub const SIGNATURE_LEN: usize = 13;
/// `incompat_flags` bit marking a signed frame.
pub const IFLAG_SIGNED: u8 = 0x01;

/// Tlog per-frame timestamp prefix (big-endian µs since Unix epoch).
pub const TLOG_TIMESTAMP_LEN: usize = 8;

/// Protocol version of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MavlinkVersion {
    /// MAVLink 1
    V1,
    /// MAVLink 2
    V2,
}

impl MavlinkVersion {
    /// Version for a start marker byte.
    pub fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            MAVLINK_V1_STX => Some(MavlinkVersion::V1),
            MAVLINK_V2_STX => Some(MavlinkVersion::V2),
            _ => None,
        }
    }

    /// Start marker byte.
    pub fn marker(self) -> u8 {
        match self {
            MavlinkVersion::V1 => MAVLINK_V1_STX,
            MavlinkVersion::V2 => MAVLINK_V2_STX,
        }
    }

    /// Header length including the marker.
    pub const fn header_len(self) -> usize {
        match self {
            MavlinkVersion::V1 => V1_HEADER_LEN,
            MavlinkVersion::V2 => V2_HEADER_LEN,
        }
    }
}

/// Check if a byte is a frame start marker.
#[inline]
pub fn is_marker(byte: u8) -> bool {
    byte == MAVLINK_V1_STX || byte == MAVLINK_V2_STX
}
