// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CRC-16/MCRF4XX ("X.25" in MAVLink terminology).
//!
//! MAVLink checksums cover every frame byte after the start marker up to the
//! end of the payload, followed by the message's CRC extra seed byte.

/// Initial accumulator value.
pub const X25_INIT: u16 = 0xFFFF;

/// Running X.25 checksum.
#[derive(Debug, Clone, Copy)]
pub struct X25 {
    crc: u16,
}

impl Default for X25 {
    fn default() -> Self {
        Self::new()
    }
}

impl X25 {
    /// Start a new checksum.
    pub fn new() -> Self {
        Self { crc: X25_INIT }
    }

    /// Accumulate one byte.
    #[inline]
    pub fn update_byte(&mut self, byte: u8) {
        let mut tmp = byte ^ (self.crc & 0xFF) as u8;
        tmp ^= tmp << 4;
        let tmp = tmp as u16;
        self.crc = (self.crc >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4);
    }

    /// Accumulate a byte slice.
    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.update_byte(b);
        }
    }

    /// Current checksum value.
    pub fn finish(&self) -> u16 {
        self.crc
    }
}

/// Checksum of a frame body (header without start marker, plus payload)
/// seeded with the message's CRC extra byte.
pub fn frame_checksum(body: &[u8], crc_extra: u8) -> u16 {
    let mut crc = X25::new();
    crc.update(body);
    crc.update_byte(crc_extra);
    crc.finish()
}
