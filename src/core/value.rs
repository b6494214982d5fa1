// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Field value type system.
//!
//! Both log formats pack little-endian fixed-width scalars, so a single value
//! enum covers every field either decoder produces. Values keep their wire
//! representation (scaled integers stay integers, half floats keep their raw
//! bits) so that a decoded record can be re-encoded byte for byte.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    // Signed integers
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),

    // Unsigned integers
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),

    // Floating point
    /// IEEE 754 half precision, raw bits
    Float16(u16),
    Float32(f32),
    Float64(f64),

    /// Fixed-width character array with trailing NUL padding removed
    Chars(Vec<u8>),

    /// Fixed-length numeric array
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Check if this value is a numeric scalar.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldValue::Chars(_) | FieldValue::Array(_))
    }

    /// Check if this value is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            FieldValue::Float16(_) | FieldValue::Float32(_) | FieldValue::Float64(_)
        )
    }

    /// Try to convert this value to f64 (for numeric scalars only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int8(v) => Some(*v as f64),
            FieldValue::Int16(v) => Some(*v as f64),
            FieldValue::Int32(v) => Some(*v as f64),
            FieldValue::Int64(v) => Some(*v as f64),
            FieldValue::UInt8(v) => Some(*v as f64),
            FieldValue::UInt16(v) => Some(*v as f64),
            FieldValue::UInt32(v) => Some(*v as f64),
            FieldValue::UInt64(v) => Some(*v as f64),
            FieldValue::Float16(bits) => Some(f16_bits_to_f32(*bits) as f64),
            FieldValue::Float32(v) => Some(*v as f64),
            FieldValue::Float64(v) => Some(*v),
            FieldValue::Chars(_) | FieldValue::Array(_) => None,
        }
    }

    /// Try to convert this value to u64 (for non-negative integers only).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt8(v) => Some(*v as u64),
            FieldValue::UInt16(v) => Some(*v as u64),
            FieldValue::UInt32(v) => Some(*v as u64),
            FieldValue::UInt64(v) => Some(*v),
            FieldValue::Int8(v) => u64::try_from(*v).ok(),
            FieldValue::Int16(v) => u64::try_from(*v).ok(),
            FieldValue::Int32(v) => u64::try_from(*v).ok(),
            FieldValue::Int64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Lossy text view of a character array.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Chars(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// The primitive type this value was decoded from.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        Some(match self {
            FieldValue::Int8(_) => PrimitiveType::Int8,
            FieldValue::Int16(_) => PrimitiveType::Int16,
            FieldValue::Int32(_) => PrimitiveType::Int32,
            FieldValue::Int64(_) => PrimitiveType::Int64,
            FieldValue::UInt8(_) => PrimitiveType::UInt8,
            FieldValue::UInt16(_) => PrimitiveType::UInt16,
            FieldValue::UInt32(_) => PrimitiveType::UInt32,
            FieldValue::UInt64(_) => PrimitiveType::UInt64,
            FieldValue::Float16(_) => PrimitiveType::Float16,
            FieldValue::Float32(_) => PrimitiveType::Float32,
            FieldValue::Float64(_) => PrimitiveType::Float64,
            FieldValue::Chars(_) => PrimitiveType::Char,
            FieldValue::Array(items) => return items.first().and_then(|v| v.primitive()),
        })
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Chars(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            FieldValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            other => match other.as_f64() {
                Some(v) => write!(f, "{v}"),
                None => Ok(()),
            },
        }
    }
}

/// Primitive wire types shared by both log formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 16-bit float
    Float16,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// Single character (only meaningful inside a fixed-width array)
    Char,
}

impl PrimitiveType {
    /// Size in bytes of one element.
    pub const fn size(self) -> usize {
        match self {
            PrimitiveType::Int8 | PrimitiveType::UInt8 | PrimitiveType::Char => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 | PrimitiveType::Float16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
        }
    }

    /// Parse a primitive type from its display name.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "int8" => Some(PrimitiveType::Int8),
            "int16" => Some(PrimitiveType::Int16),
            "int32" => Some(PrimitiveType::Int32),
            "int64" => Some(PrimitiveType::Int64),
            "uint8" => Some(PrimitiveType::UInt8),
            "uint16" => Some(PrimitiveType::UInt16),
            "uint32" => Some(PrimitiveType::UInt32),
            "uint64" => Some(PrimitiveType::UInt64),
            "float16" => Some(PrimitiveType::Float16),
            "float32" => Some(PrimitiveType::Float32),
            "float64" => Some(PrimitiveType::Float64),
            "char" => Some(PrimitiveType::Char),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float16 => "float16",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::Char => "char",
        };
        write!(f, "{name}")
    }
}

/// Widen IEEE 754 half-precision bits to f32.
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = ((bits >> 15) & 0x1) as u32;
    let exponent = ((bits >> 10) & 0x1f) as u32;
    let mantissa = (bits & 0x3ff) as u32;

    let out = match (exponent, mantissa) {
        (0, 0) => sign << 31,
        (0, _) => {
            // Subnormal: renormalize into the f32 exponent range
            let mut e: i32 = -14;
            let mut m = mantissa;
            while m & 0x400 == 0 {
                m <<= 1;
                e -= 1;
            }
            let m = m & 0x3ff;
            (sign << 31) | (((e + 127) as u32) << 23) | (m << 13)
        }
        (0x1f, 0) => (sign << 31) | 0x7f80_0000,
        (0x1f, _) => (sign << 31) | 0x7fc0_0000 | (mantissa << 13),
        _ => (sign << 31) | ((exponent + 127 - 15) << 23) | (mantissa << 13),
    };
    f32::from_bits(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_classification() {
        assert!(FieldValue::Int16(-3).is_numeric());
        assert!(FieldValue::Float32(1.5).is_float());
        assert!(!FieldValue::Chars(b"ABC".to_vec()).is_numeric());
        assert!(!FieldValue::Array(vec![FieldValue::Int16(1)]).is_numeric());
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(FieldValue::Int32(-42).as_f64(), Some(-42.0));
        assert_eq!(FieldValue::UInt64(7).as_f64(), Some(7.0));
        assert_eq!(FieldValue::Float32(2.5).as_f64(), Some(2.5));
        assert_eq!(FieldValue::Chars(b"x".to_vec()).as_f64(), None);
    }

    #[test]
    fn test_as_u64_rejects_negative() {
        assert_eq!(FieldValue::Int8(-1).as_u64(), None);
        assert_eq!(FieldValue::Int32(12).as_u64(), Some(12));
        assert_eq!(FieldValue::UInt32(12).as_u64(), Some(12));
    }

    #[test]
    fn test_half_float_conversion() {
        assert_eq!(f16_bits_to_f32(0x3c00), 1.0);
        assert_eq!(f16_bits_to_f32(0xc000), -2.0);
        assert_eq!(f16_bits_to_f32(0x3800), 0.5);
        assert_eq!(f16_bits_to_f32(0x0000), 0.0);
        assert!(f16_bits_to_f32(0x7c00).is_infinite());
        assert!(f16_bits_to_f32(0x7e00).is_nan());
        // Smallest subnormal: 2^-24
        assert_eq!(f16_bits_to_f32(0x0001), 2f32.powi(-24));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Chars(b"Stabilize".to_vec()).to_string(), "Stabilize");
        assert_eq!(
            FieldValue::Array(vec![FieldValue::Int16(1), FieldValue::Int16(-2)]).to_string(),
            "[1, -2]"
        );
        assert_eq!(FieldValue::UInt8(5).to_string(), "5");
    }

    #[test]
    fn test_primitive_round_trip_names() {
        for ty in [
            PrimitiveType::Int8,
            PrimitiveType::UInt16,
            PrimitiveType::Float16,
            PrimitiveType::Float64,
            PrimitiveType::Char,
        ] {
            assert_eq!(PrimitiveType::try_from_str(&ty.to_string()), Some(ty));
        }
    }
}
