// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Runtime message layouts.
//!
//! A [`FieldLayout`] is the ordered, packed, little-endian shape of one
//! message type. Dataflash logs build layouts at decode time from `FMT`
//! records; MAVLink layouts come from the compiled-in dictionary. Both share
//! the payload codec implemented here.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::core::value::{FieldValue, PrimitiveType};
use crate::encoding::ByteCursor;
use crate::{DecodeError, Result};

/// Unit of a timestamp-carrying field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Microseconds
    Micros,
    /// Milliseconds
    Millis,
}

impl TimeUnit {
    /// Convert a raw field value in this unit to microseconds.
    pub fn to_micros(self, raw: u64) -> u64 {
        match self {
            TimeUnit::Micros => raw,
            TimeUnit::Millis => raw.saturating_mul(1_000),
        }
    }
}

/// What a field means to the indexer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRole {
    /// Plain data; numeric values become channel samples
    Value,
    /// The record's own timestamp; feeds the clock instead of a channel
    Timestamp(TimeUnit),
    /// Instance discriminator for multi-instance message types
    Instance,
    /// Describes the log itself (format definitions); never charted
    Metadata,
}

/// One field of a message layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Element type
    pub primitive: PrimitiveType,
    /// Element count (1 for scalars, N for `char[N]` and numeric arrays)
    pub count: usize,
    /// Multiplier applied when the value enters a channel
    pub scale: f64,
    /// Role of the field
    pub role: FieldRole,
}

impl FieldDef {
    /// Create a scalar field.
    pub fn scalar(name: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            primitive,
            count: 1,
            scale: 1.0,
            role: FieldRole::Value,
        }
    }

    /// Create a fixed-width character field.
    pub fn chars(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            primitive: PrimitiveType::Char,
            count: length,
            scale: 1.0,
            role: FieldRole::Value,
        }
    }

    /// Create a fixed-length numeric array field.
    pub fn array(name: impl Into<String>, primitive: PrimitiveType, count: usize) -> Self {
        Self {
            name: name.into(),
            primitive,
            count,
            scale: 1.0,
            role: FieldRole::Value,
        }
    }

    /// Set the channel scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.role = role;
        self
    }

    /// Width of the field on the wire.
    pub fn width(&self) -> usize {
        self.primitive.size() * self.count
    }

    /// Whether this field yields a channel.
    pub fn is_channel(&self) -> bool {
        self.role == FieldRole::Value && self.count == 1 && self.primitive != PrimitiveType::Char
    }
}

/// Ordered field layout of one message type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    /// Numeric type id within its log format
    pub id: u32,
    /// Message type name
    pub name: String,
    /// Fields in wire order
    pub fields: Vec<FieldDef>,
}

impl FieldLayout {
    /// Create a layout.
    pub fn new(id: u32, name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            id,
            name: name.into(),
            fields,
        }
    }

    /// Total payload size in bytes.
    pub fn payload_size(&self) -> usize {
        self.fields.iter().map(FieldDef::width).sum()
    }

    /// Index of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Index of the first timestamp field.
    pub fn timestamp_field(&self) -> Option<(usize, TimeUnit)> {
        self.fields.iter().enumerate().find_map(|(i, f)| match f.role {
            FieldRole::Timestamp(unit) => Some((i, unit)),
            _ => None,
        })
    }

    /// Index of the instance field.
    pub fn instance_field(&self) -> Option<usize> {
        self.fields.iter().position(|f| f.role == FieldRole::Instance)
    }

    /// Check that the layout can describe a decodable record.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(DecodeError::invalid_layout(&self.name, "no fields"));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.count == 0 {
                return Err(DecodeError::invalid_layout(
                    &self.name,
                    format!("field '{}' has zero width", field.name),
                ));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(DecodeError::invalid_layout(
                    &self.name,
                    format!("duplicate field '{}'", field.name),
                ));
            }
        }
        Ok(())
    }

    /// Decode one payload from the cursor.
    pub fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<Vec<FieldValue>> {
        let mark = cursor.snapshot();
        let result = self
            .fields
            .iter()
            .map(|field| decode_field(field, cursor))
            .collect::<Result<Vec<_>>>();
        if result.is_err() {
            cursor.restore(mark);
        }
        result
    }

    /// Encode values into a payload, appending to `out`.
    ///
    /// Character fields shorter than their width are NUL padded.
    pub fn encode(&self, values: &[FieldValue], out: &mut Vec<u8>) -> Result<()> {
        if values.len() != self.fields.len() {
            return Err(DecodeError::invalid_layout(
                &self.name,
                format!(
                    "expected {} values, got {}",
                    self.fields.len(),
                    values.len()
                ),
            ));
        }
        for (field, value) in self.fields.iter().zip(values) {
            encode_field(&self.name, field, value, out)?;
        }
        Ok(())
    }
}

fn decode_scalar(primitive: PrimitiveType, cursor: &mut ByteCursor<'_>) -> Result<FieldValue> {
    Ok(match primitive {
        PrimitiveType::Int8 => FieldValue::Int8(cursor.read_i8()?),
        PrimitiveType::UInt8 | PrimitiveType::Char => FieldValue::UInt8(cursor.read_u8()?),
        PrimitiveType::Int16 => FieldValue::Int16(cursor.read_i16::<LittleEndian>()?),
        PrimitiveType::UInt16 => FieldValue::UInt16(cursor.read_u16::<LittleEndian>()?),
        PrimitiveType::Int32 => FieldValue::Int32(cursor.read_i32::<LittleEndian>()?),
        PrimitiveType::UInt32 => FieldValue::UInt32(cursor.read_u32::<LittleEndian>()?),
        PrimitiveType::Int64 => FieldValue::Int64(cursor.read_i64::<LittleEndian>()?),
        PrimitiveType::UInt64 => FieldValue::UInt64(cursor.read_u64::<LittleEndian>()?),
        PrimitiveType::Float16 => FieldValue::Float16(cursor.read_u16::<LittleEndian>()?),
        PrimitiveType::Float32 => FieldValue::Float32(cursor.read_f32::<LittleEndian>()?),
        PrimitiveType::Float64 => FieldValue::Float64(cursor.read_f64::<LittleEndian>()?),
    })
}

fn decode_field(field: &FieldDef, cursor: &mut ByteCursor<'_>) -> Result<FieldValue> {
    if field.primitive == PrimitiveType::Char {
        return Ok(FieldValue::Chars(cursor.read_chars(field.count)?));
    }
    if field.count == 1 {
        return decode_scalar(field.primitive, cursor);
    }
    let items = match field.primitive {
        PrimitiveType::Int16 => cursor
            .read_i16_array::<LittleEndian>(field.count)?
            .into_iter()
            .map(FieldValue::Int16)
            .collect(),
        PrimitiveType::Float32 => cursor
            .read_f32_array::<LittleEndian>(field.count)?
            .into_iter()
            .map(FieldValue::Float32)
            .collect(),
        other => {
            cursor.peek_bytes(field.width())?;
            (0..field.count)
                .map(|_| decode_scalar(other, cursor))
                .collect::<Result<Vec<_>>>()?
        }
    };
    Ok(FieldValue::Array(items))
}

fn encode_scalar(layout: &str, field: &FieldDef, value: &FieldValue, out: &mut Vec<u8>) -> Result<()> {
    match (field.primitive, value) {
        (PrimitiveType::Int8, FieldValue::Int8(v)) => out.write_i8(*v)?,
        (PrimitiveType::UInt8, FieldValue::UInt8(v)) => out.write_u8(*v)?,
        (PrimitiveType::Int16, FieldValue::Int16(v)) => out.write_i16::<LittleEndian>(*v)?,
        (PrimitiveType::UInt16, FieldValue::UInt16(v)) => out.write_u16::<LittleEndian>(*v)?,
        (PrimitiveType::Int32, FieldValue::Int32(v)) => out.write_i32::<LittleEndian>(*v)?,
        (PrimitiveType::UInt32, FieldValue::UInt32(v)) => out.write_u32::<LittleEndian>(*v)?,
        (PrimitiveType::Int64, FieldValue::Int64(v)) => out.write_i64::<LittleEndian>(*v)?,
        (PrimitiveType::UInt64, FieldValue::UInt64(v)) => out.write_u64::<LittleEndian>(*v)?,
        (PrimitiveType::Float16, FieldValue::Float16(v)) => out.write_u16::<LittleEndian>(*v)?,
        (PrimitiveType::Float32, FieldValue::Float32(v)) => out.write_f32::<LittleEndian>(*v)?,
        (PrimitiveType::Float64, FieldValue::Float64(v)) => out.write_f64::<LittleEndian>(*v)?,
        (expected, got) => {
            return Err(DecodeError::invalid_layout(
                layout,
                format!(
                    "field '{}' expects {expected}, got {:?}",
                    field.name,
                    got.primitive()
                ),
            ))
        }
    }
    Ok(())
}

fn encode_field(layout: &str, field: &FieldDef, value: &FieldValue, out: &mut Vec<u8>) -> Result<()> {
    match value {
        FieldValue::Chars(bytes) if field.primitive == PrimitiveType::Char => {
            if bytes.len() > field.count {
                return Err(DecodeError::invalid_layout(
                    layout,
                    format!("field '{}' longer than {} bytes", field.name, field.count),
                ));
            }
            out.extend_from_slice(bytes);
            out.resize(out.len() + field.count - bytes.len(), 0);
            Ok(())
        }
        FieldValue::Array(items) if field.count > 1 && items.len() == field.count => {
            for item in items {
                encode_scalar(layout, field, item, out)?;
            }
            Ok(())
        }
        scalar if field.count == 1 => encode_scalar(layout, field, scalar, out),
        _ => Err(DecodeError::invalid_layout(
            layout,
            format!("value shape does not match field '{}'", field.name),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attitude() -> FieldLayout {
        FieldLayout::new(
            3,
            "ATT",
            vec![
                FieldDef::scalar("TimeUS", PrimitiveType::UInt64)
                    .with_role(FieldRole::Timestamp(TimeUnit::Micros)),
                FieldDef::scalar("Roll", PrimitiveType::Int16).with_scale(0.01),
                FieldDef::scalar("Yaw", PrimitiveType::Float32),
                FieldDef::chars("Src", 4),
            ],
        )
    }

    #[test]
    fn test_payload_size() {
        assert_eq!(attitude().payload_size(), 8 + 2 + 4 + 4);
    }

    #[test]
    fn test_encode_then_decode_preserves_bytes() {
        let layout = attitude();
        let values = vec![
            FieldValue::UInt64(1_000_000),
            FieldValue::Int16(-1234),
            FieldValue::Float32(270.5),
            FieldValue::Chars(b"EKF".to_vec()),
        ];
        let mut payload = Vec::new();
        layout.encode(&values, &mut payload).unwrap();
        assert_eq!(payload.len(), layout.payload_size());
        assert_eq!(&payload[14..], b"EKF\0");

        let mut cursor = ByteCursor::new(&payload);
        let decoded = layout.decode(&mut cursor).unwrap();
        assert_eq!(decoded, values);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_decode_short_payload_restores_position() {
        let layout = attitude();
        let payload = [0u8; 10];
        let mut cursor = ByteCursor::new(&payload);
        assert!(layout.decode(&mut cursor).is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_array_field() {
        let layout = FieldLayout::new(
            9,
            "ISBD",
            vec![FieldDef::array("Samples", PrimitiveType::Int16, 3)],
        );
        let values = vec![FieldValue::Array(vec![
            FieldValue::Int16(1),
            FieldValue::Int16(2),
            FieldValue::Int16(3),
        ])];
        let mut payload = Vec::new();
        layout.encode(&values, &mut payload).unwrap();
        assert_eq!(payload, vec![1, 0, 2, 0, 3, 0]);
        let decoded = layout.decode(&mut ByteCursor::new(&payload)).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_encode_type_mismatch() {
        let layout = attitude();
        let values = vec![
            FieldValue::Int32(1),
            FieldValue::Int16(0),
            FieldValue::Float32(0.0),
            FieldValue::Chars(Vec::new()),
        ];
        assert!(matches!(
            layout.encode(&values, &mut Vec::new()),
            Err(DecodeError::InvalidLayout { .. })
        ));
    }

    #[test]
    fn test_roles() {
        let layout = attitude();
        assert_eq!(layout.timestamp_field(), Some((0, TimeUnit::Micros)));
        assert_eq!(layout.instance_field(), None);
        assert!(!layout.fields[0].is_channel());
        assert!(layout.fields[1].is_channel());
        assert!(!layout.fields[3].is_channel());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let layout = FieldLayout::new(
            1,
            "DUP",
            vec![
                FieldDef::scalar("A", PrimitiveType::UInt8),
                FieldDef::scalar("A", PrimitiveType::UInt8),
            ],
        );
        assert!(layout.validate().is_err());
        assert!(attitude().validate().is_ok());
    }

    #[test]
    fn test_time_unit() {
        assert_eq!(TimeUnit::Millis.to_micros(250), 250_000);
        assert_eq!(TimeUnit::Micros.to_micros(250), 250);
    }
}
