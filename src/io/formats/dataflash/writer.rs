// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dataflash log writer.
//!
//! Writes `FMT` records and data records byte for byte the way the decoder
//! reads them, so decoding a log and re-writing its messages reproduces the
//! original bytes.

use std::collections::HashMap;

use crate::core::{DecodedMessage, FieldLayout, FieldValue};
use crate::{DecodeError, Result};

use super::constants::{FMT_TYPE, RECORD_MARKER};
use super::layout::FormatDefinition;

/// In-memory dataflash log builder.
pub struct DataflashWriter {
    buffer: Vec<u8>,
    fmt: FieldLayout,
    layouts: HashMap<u8, FieldLayout>,
}

impl Default for DataflashWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DataflashWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        let fmt = FormatDefinition::fmt()
            .to_layout()
            .unwrap_or_else(|_| FieldLayout::new(FMT_TYPE as u32, "FMT", Vec::new()));
        Self {
            buffer: Vec::new(),
            fmt,
            layouts: HashMap::new(),
        }
    }

    /// Create a writer whose log opens with the `FMT` record describing `FMT`,
    /// as flight controllers write it.
    pub fn with_header() -> Result<Self> {
        let mut writer = Self::new();
        writer.write_format(&FormatDefinition::fmt())?;
        Ok(writer)
    }

    /// Write an `FMT` record and register its layout for later records.
    pub fn write_format(&mut self, def: &FormatDefinition) -> Result<()> {
        let layout = def.to_layout()?;
        self.write_format_unchecked(def)?;
        if def.type_id != FMT_TYPE {
            self.layouts.insert(def.type_id, layout);
        }
        Ok(())
    }

    /// Write an `FMT` record without validating or registering it.
    pub fn write_format_unchecked(&mut self, def: &FormatDefinition) -> Result<()> {
        let payload = encode(&self.fmt, &def.to_values())?;
        self.push_record(FMT_TYPE, &payload);
        Ok(())
    }

    /// Encode a record payload for a registered type.
    pub fn encode_payload(&self, type_id: u8, values: &[FieldValue]) -> Result<Vec<u8>> {
        let layout = self
            .layouts
            .get(&type_id)
            .ok_or(DecodeError::MissingLayout {
                id: type_id,
                offset: self.buffer.len(),
            })?;
        encode(layout, values)
    }

    /// Write one data record of a registered type.
    pub fn write_record(&mut self, type_id: u8, values: &[FieldValue]) -> Result<()> {
        let payload = self.encode_payload(type_id, values)?;
        self.push_record(type_id, &payload);
        Ok(())
    }

    /// Re-encode a decoded message with the layout it was decoded with.
    pub fn write_message(&mut self, message: &DecodedMessage) -> Result<()> {
        let type_id = u8::try_from(message.layout.id)
            .map_err(|_| DecodeError::invalid_layout(&message.layout.name, "type id above 255"))?;
        let payload = encode(&message.layout, &message.values)?;
        self.push_record(type_id, &payload);
        Ok(())
    }

    /// Append raw bytes (for building damaged logs).
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn push_record(&mut self, type_id: u8, payload: &[u8]) {
        self.buffer.extend_from_slice(&RECORD_MARKER);
        self.buffer.push(type_id);
        self.buffer.extend_from_slice(payload);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Borrow the log.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Finish and return the log.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

fn encode(layout: &FieldLayout, values: &[FieldValue]) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(layout.payload_size());
    layout.encode(values, &mut payload)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::dataflash::constants::{FMT_RECORD_LEN, LOG_SIGNATURE};

    #[test]
    fn test_header_signature() {
        let writer = DataflashWriter::with_header().unwrap();
        assert_eq!(writer.len(), FMT_RECORD_LEN);
        assert_eq!(&writer.as_bytes()[..4], &LOG_SIGNATURE);
    }

    #[test]
    fn test_unregistered_type_rejected() {
        let mut writer = DataflashWriter::new();
        assert!(matches!(
            writer.write_record(3, &[FieldValue::UInt8(1)]),
            Err(DecodeError::MissingLayout { id: 3, .. })
        ));
    }

    #[test]
    fn test_record_bytes() {
        let mut writer = DataflashWriter::new();
        writer
            .write_format(&FormatDefinition::new(1, "ALT", "f", &["alt"]).unwrap())
            .unwrap();
        let start = writer.len();
        writer
            .write_record(1, &[FieldValue::Float32(10.0)])
            .unwrap();
        assert_eq!(
            &writer.as_bytes()[start..],
            &[0xA3, 0x95, 1, 0x00, 0x00, 0x20, 0x41]
        );
    }
}
