// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bounds-checked byte cursor over a raw log buffer.
//!
//! Every decoder reads through this cursor. A read either succeeds and
//! advances the position, or fails with [`DecodeError::OutOfBounds`] and
//! leaves the position untouched. Byte order is chosen per read through the
//! [`byteorder::ByteOrder`] type parameter.
//!
//! # Example
//!
//! ```
//! use byteorder::{BigEndian, LittleEndian};
//! use flightcodec::encoding::ByteCursor;
//!
//! let data = [0x2A, 0x00, 0x00, 0x01];
//! let mut cursor = ByteCursor::new(&data);
//! assert_eq!(cursor.read_u16::<LittleEndian>().unwrap(), 42);
//! assert_eq!(cursor.read_u16::<BigEndian>().unwrap(), 1);
//! assert!(cursor.read_u8().is_err());
//! ```

use byteorder::ByteOrder;

use crate::{DecodeError, Result};

/// Saved cursor position for speculative lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorMark(usize);

/// Bounds-checked reader with an explicit read position.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a cursor positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut cursor = Self::new(data);
        cursor.seek_absolute(offset)?;
        Ok(cursor)
    }

    /// Current read position.
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left after the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Check if at end of buffer.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// The whole underlying buffer.
    #[inline]
    pub fn buffer(&self) -> &'a [u8] {
        self.data
    }

    /// Save the current position.
    #[inline]
    pub fn snapshot(&self) -> CursorMark {
        CursorMark(self.offset)
    }

    /// Return to a saved position.
    #[inline]
    pub fn restore(&mut self, mark: CursorMark) {
        self.offset = mark.0;
    }

    #[inline]
    fn ensure(&self, count: usize) -> Result<()> {
        if count > self.remaining() {
            return Err(DecodeError::out_of_bounds(
                count,
                self.remaining(),
                self.offset,
            ));
        }
        Ok(())
    }

    /// Move to an absolute offset. Seeking to the end of the buffer is allowed.
    pub fn seek_absolute(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(DecodeError::out_of_bounds(
                offset - self.offset.min(offset),
                self.remaining(),
                self.offset,
            ));
        }
        self.offset = offset;
        Ok(())
    }

    /// Advance by `count` bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.offset += count;
        Ok(())
    }

    /// Look at the next `count` bytes without consuming them.
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        Ok(&self.data[self.offset..self.offset + count])
    }

    /// Read a byte slice.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.offset += count;
        Ok(bytes)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a u16 value.
    pub fn read_u16<B: ByteOrder>(&mut self) -> Result<u16> {
        Ok(B::read_u16(self.read_bytes(2)?))
    }

    /// Read an i16 value.
    pub fn read_i16<B: ByteOrder>(&mut self) -> Result<i16> {
        Ok(B::read_i16(self.read_bytes(2)?))
    }

    /// Read a u24 value (MAVLink v2 message ids).
    pub fn read_u24<B: ByteOrder>(&mut self) -> Result<u32> {
        Ok(B::read_u24(self.read_bytes(3)?))
    }

    /// Read a u32 value.
    pub fn read_u32<B: ByteOrder>(&mut self) -> Result<u32> {
        Ok(B::read_u32(self.read_bytes(4)?))
    }

    /// Read an i32 value.
    pub fn read_i32<B: ByteOrder>(&mut self) -> Result<i32> {
        Ok(B::read_i32(self.read_bytes(4)?))
    }

    /// Read a u64 value.
    pub fn read_u64<B: ByteOrder>(&mut self) -> Result<u64> {
        Ok(B::read_u64(self.read_bytes(8)?))
    }

    /// Read an i64 value.
    pub fn read_i64<B: ByteOrder>(&mut self) -> Result<i64> {
        Ok(B::read_i64(self.read_bytes(8)?))
    }

    /// Read an f32 value.
    pub fn read_f32<B: ByteOrder>(&mut self) -> Result<f32> {
        Ok(B::read_f32(self.read_bytes(4)?))
    }

    /// Read an f64 value.
    pub fn read_f64<B: ByteOrder>(&mut self) -> Result<f64> {
        Ok(B::read_f64(self.read_bytes(8)?))
    }

    /// Read `count` i16 values.
    pub fn read_i16_array<B: ByteOrder>(&mut self, count: usize) -> Result<Vec<i16>> {
        let bytes = self.peek_bytes(count.saturating_mul(2))?;
        let mut out = vec![0i16; count];
        B::read_i16_into(bytes, &mut out);
        self.offset += count * 2;
        Ok(out)
    }

    /// Read `count` f32 values.
    pub fn read_f32_array<B: ByteOrder>(&mut self, count: usize) -> Result<Vec<f32>> {
        let bytes = self.peek_bytes(count.saturating_mul(4))?;
        let mut out = vec![0f32; count];
        B::read_f32_into(bytes, &mut out);
        self.offset += count * 4;
        Ok(out)
    }

    /// Read a fixed-width character field, dropping trailing NUL padding.
    pub fn read_chars(&mut self, length: usize) -> Result<Vec<u8>> {
        let bytes = self.read_bytes(length)?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Ok(bytes[..end].to_vec())
    }

    /// Read a fixed-width text field, stopping at the first NUL.
    pub fn read_string(&mut self, length: usize) -> Result<String> {
        let bytes = self.read_bytes(length)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}
