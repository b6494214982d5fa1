// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MAVLink frame writer.
//!
//! Produces byte-exact v1/v2 frames, optionally tlog-framed. MAVLink 2
//! payloads are zero-truncated the way flight stacks send them.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::core::FieldValue;
use crate::io::metadata::MavlinkFraming;
use crate::{DecodeError, Result};

use super::constants::{MavlinkVersion, IFLAG_SIGNED, SIGNATURE_LEN};
use super::crc::frame_checksum;
use super::dictionary::MavlinkDictionary;

/// In-memory MAVLink stream builder.
pub struct MavlinkWriter {
    version: MavlinkVersion,
    framing: MavlinkFraming,
    signed: bool,
    sequence: u8,
    last_timestamp: u64,
    buffer: Vec<u8>,
}

impl MavlinkWriter {
    /// Create a writer for one protocol version and framing.
    pub fn new(version: MavlinkVersion, framing: MavlinkFraming) -> Self {
        Self {
            version,
            framing,
            signed: false,
            sequence: 0,
            last_timestamp: 0,
            buffer: Vec::new(),
        }
    }

    /// Mark MAVLink 2 frames as signed and append a (zeroed) signature block.
    pub fn with_signature(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Encode a dictionary message's payload at full length.
    pub fn encode_payload(message_id: u32, values: &[FieldValue]) -> Result<Vec<u8>> {
        let entry = MavlinkDictionary::builtin()
            .get(MavlinkVersion::V2, message_id)
            .ok_or(DecodeError::UnknownMessageType { id: message_id })?;
        let mut payload = Vec::with_capacity(entry.payload_len());
        entry.layout.encode(values, &mut payload)?;
        Ok(payload)
    }

    /// Append one dictionary message.
    ///
    /// `timestamp_us` is the tlog prefix (µs since Unix epoch); it is ignored
    /// for raw framing and defaults to the previous frame's timestamp.
    pub fn write_message(
        &mut self,
        system: u8,
        component: u8,
        message_id: u32,
        values: &[FieldValue],
        timestamp_us: Option<u64>,
    ) -> Result<()> {
        let entry = MavlinkDictionary::builtin()
            .get(self.version, message_id)
            .ok_or(DecodeError::UnknownMessageType { id: message_id })?;
        let crc_extra = entry.crc_extra;
        let payload = Self::encode_payload(message_id, values)?;
        if let Some(ts) = timestamp_us {
            self.last_timestamp = ts;
        }
        self.write_raw_frame(system, component, message_id, &payload, crc_extra)
    }

    /// Append a frame with an arbitrary payload and CRC extra byte.
    pub fn write_raw_frame(
        &mut self,
        system: u8,
        component: u8,
        message_id: u32,
        payload: &[u8],
        crc_extra: u8,
    ) -> Result<()> {
        let mut payload = payload;
        if self.version == MavlinkVersion::V2 {
            while payload.len() > 1 && payload[payload.len() - 1] == 0 {
                payload = &payload[..payload.len() - 1];
            }
        }
        let len = u8::try_from(payload.len()).map_err(|_| {
            DecodeError::invalid_layout(message_id.to_string(), "payload longer than 255 bytes")
        })?;

        if self.framing == MavlinkFraming::Tlog {
            self.buffer.write_u64::<BigEndian>(self.last_timestamp)?;
        }

        let start = self.buffer.len();
        self.buffer.push(self.version.marker());
        self.buffer.push(len);
        match self.version {
            MavlinkVersion::V1 => {
                let id = u8::try_from(message_id)
                    .map_err(|_| DecodeError::UnknownMessageType { id: message_id })?;
                self.buffer
                    .extend_from_slice(&[self.sequence, system, component, id]);
            }
            MavlinkVersion::V2 => {
                let incompat = if self.signed { IFLAG_SIGNED } else { 0 };
                self.buffer
                    .extend_from_slice(&[incompat, 0, self.sequence, system, component]);
                self.buffer.write_u24::<LittleEndian>(message_id)?;
            }
        }
        self.buffer.extend_from_slice(payload);

        let checksum = frame_checksum(&self.buffer[start + 1..], crc_extra);
        self.buffer.write_u16::<LittleEndian>(checksum)?;
        if self.signed && self.version == MavlinkVersion::V2 {
            self.buffer.resize(self.buffer.len() + SIGNATURE_LEN, 0);
        }

        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Borrow the stream.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Finish and return the stream.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}
