// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! `FMT` records and the type codes they use.
//!
//! Each `FMT` record declares one message type: its id, total record length,
//! a four-character name, a format string with one type code per column, and
//! a comma-separated column list.

use crate::core::{FieldDef, FieldLayout, FieldRole, FieldValue, PrimitiveType, TimeUnit};
use crate::{DecodeError, Result};

use super::constants::{
    FMT_COLUMNS_LEN, FMT_FORMAT_LEN, FMT_NAME_LEN, FMT_RECORD_LEN, FMT_TYPE, INSTANCE_COLUMNS,
    RECORD_HEADER_LEN, TIME_MS_COLUMN, TIME_US_COLUMN,
};

/// Elements in an `a` (int16 array) column.
const INT16_ARRAY_LEN: usize = 32;

/// Build the field for one format code.
///
/// Returns `None` for an unknown code.
pub fn field_for_code(code: char, name: &str) -> Option<FieldDef> {
    use PrimitiveType::*;

    let def = match code {
        'a' => FieldDef::array(name, Int16, INT16_ARRAY_LEN),
        'b' => FieldDef::scalar(name, Int8),
        'B' | 'M' => FieldDef::scalar(name, UInt8),
        'h' => FieldDef::scalar(name, Int16),
        'H' => FieldDef::scalar(name, UInt16),
        'i' => FieldDef::scalar(name, Int32),
        'I' => FieldDef::scalar(name, UInt32),
        'q' => FieldDef::scalar(name, Int64),
        'Q' => FieldDef::scalar(name, UInt64),
        'f' => FieldDef::scalar(name, Float32),
        'd' => FieldDef::scalar(name, Float64),
        'g' => FieldDef::scalar(name, Float16),
        'n' => FieldDef::chars(name, 4),
        'N' => FieldDef::chars(name, 16),
        'Z' => FieldDef::chars(name, 64),
        'c' => FieldDef::scalar(name, Int16).with_scale(0.01),
        'C' => FieldDef::scalar(name, UInt16).with_scale(0.01),
        'e' => FieldDef::scalar(name, Int32).with_scale(0.01),
        'E' => FieldDef::scalar(name, UInt32).with_scale(0.01),
        'L' => FieldDef::scalar(name, Int32).with_scale(1e-7),
        _ => return None,
    };
    Some(def)
}

/// Role a column plays, derived from its name and type.
fn role_for(def: &FieldDef) -> FieldRole {
    let integral = def.count == 1
        && !matches!(
            def.primitive,
            PrimitiveType::Char
                | PrimitiveType::Float16
                | PrimitiveType::Float32
                | PrimitiveType::Float64
        );
    if !integral {
        return FieldRole::Value;
    }
    match def.name.as_str() {
        TIME_US_COLUMN => FieldRole::Timestamp(TimeUnit::Micros),
        TIME_MS_COLUMN => FieldRole::Timestamp(TimeUnit::Millis),
        name if INSTANCE_COLUMNS.contains(&name) => FieldRole::Instance,
        _ => FieldRole::Value,
    }
}

/// Decoded contents of one `FMT` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDefinition {
    /// Message type id being defined
    pub type_id: u8,
    /// Declared record length including the 3-byte header
    pub length: u8,
    /// Message type name
    pub name: String,
    /// One type code per column
    pub format: String,
    /// Column names
    pub columns: Vec<String>,
}

impl FormatDefinition {
    /// Create a definition, computing the record length from the format.
    pub fn new(type_id: u8, name: &str, format: &str, columns: &[&str]) -> Result<Self> {
        let payload: usize = format
            .chars()
            .map(|c| {
                field_for_code(c, "")
                    .map(|f| f.width())
                    .ok_or_else(|| DecodeError::invalid_layout(name, format!("unknown type code '{c}'")))
            })
            .sum::<Result<usize>>()?;
        let length = u8::try_from(payload + RECORD_HEADER_LEN)
            .map_err(|_| DecodeError::invalid_layout(name, "record longer than 255 bytes"))?;
        Ok(Self {
            type_id,
            length,
            name: name.to_string(),
            format: format.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Definition of `FMT` itself.
    pub fn fmt() -> Self {
        Self {
            type_id: FMT_TYPE,
            length: FMT_RECORD_LEN as u8,
            name: "FMT".to_string(),
            format: "BBnNZ".to_string(),
            columns: ["Type", "Length", "Name", "Format", "Columns"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }

    /// Parse the values of a decoded `FMT` record.
    pub fn from_values(values: &[FieldValue]) -> Result<Self> {
        let bad = || DecodeError::invalid_layout("FMT", "malformed format record");
        let [type_id, length, name, format, columns] = values else {
            return Err(bad());
        };
        let (FieldValue::UInt8(type_id), FieldValue::UInt8(length)) = (type_id, length) else {
            return Err(bad());
        };
        let text = |v: &FieldValue| {
            v.as_text()
                .map(|s| s.split('\0').next().unwrap_or_default().to_string())
                .ok_or_else(bad)
        };
        let columns = text(columns)?;
        Ok(Self {
            type_id: *type_id,
            length: *length,
            name: text(name)?,
            format: text(format)?,
            columns: if columns.is_empty() {
                Vec::new()
            } else {
                columns.split(',').map(str::to_string).collect()
            },
        })
    }

    /// Values of the `FMT` record that declares this definition.
    pub fn to_values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::UInt8(self.type_id),
            FieldValue::UInt8(self.length),
            FieldValue::Chars(truncated(&self.name, FMT_NAME_LEN)),
            FieldValue::Chars(truncated(&self.format, FMT_FORMAT_LEN)),
            FieldValue::Chars(truncated(&self.columns.join(","), FMT_COLUMNS_LEN)),
        ]
    }

    /// Build the runtime layout, checking the definition is self-consistent.
    ///
    /// The layout of `FMT` itself marks every column as metadata.
    pub fn to_layout(&self) -> Result<FieldLayout> {
        let codes: Vec<char> = self.format.chars().collect();
        if codes.len() != self.columns.len() {
            return Err(DecodeError::invalid_layout(
                &self.name,
                format!(
                    "{} type codes for {} columns",
                    codes.len(),
                    self.columns.len()
                ),
            ));
        }

        let fields = codes
            .iter()
            .zip(&self.columns)
            .map(|(&code, column)| {
                let def = field_for_code(code, column).ok_or_else(|| {
                    DecodeError::invalid_layout(&self.name, format!("unknown type code '{code}'"))
                })?;
                let role = if self.type_id == FMT_TYPE {
                    FieldRole::Metadata
                } else {
                    role_for(&def)
                };
                Ok(def.with_role(role))
            })
            .collect::<Result<Vec<_>>>()?;

        let layout = FieldLayout::new(self.type_id as u32, self.name.clone(), fields);
        layout.validate()?;

        let expected = layout.payload_size() + RECORD_HEADER_LEN;
        if expected != self.length as usize {
            return Err(DecodeError::invalid_layout(
                &self.name,
                format!(
                    "declared length {} but format needs {expected}",
                    self.length
                ),
            ));
        }
        Ok(layout)
    }
}

fn truncated(text: &str, width: usize) -> Vec<u8> {
    let bytes = text.as_bytes();
    bytes[..bytes.len().min(width)].to_vec()
}
