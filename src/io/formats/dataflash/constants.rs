// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dataflash format constants.

/// Two-byte record header that precedes every record.
pub const HEAD_BYTE1: u8 = 0xA3;
/// Second header byte.
pub const HEAD_BYTE2: u8 = 0x95;
/// Record header as a slice.
pub const RECORD_MARKER: [u8; 2] = [HEAD_BYTE1, HEAD_BYTE2];
/// Header length: two marker bytes plus the message type id.
pub const RECORD_HEADER_LEN: usize = 3;

/// Message type id of format definition records.
pub const FMT_TYPE: u8 = 128;
/// Total length of an `FMT` record including its header.
pub const FMT_RECORD_LEN: usize = 89;
/// `FMT` type name field width.
pub const FMT_NAME_LEN: usize = 4;
/// `FMT` format string field width.
pub const FMT_FORMAT_LEN: usize = 16;
/// `FMT` column list field width.
pub const FMT_COLUMNS_LEN: usize = 64;

/// A log always opens with the `FMT` record describing `FMT` itself.
pub const LOG_SIGNATURE: [u8; 4] = [HEAD_BYTE1, HEAD_BYTE2, FMT_TYPE, FMT_TYPE];

/// Microsecond timestamp column.
pub const TIME_US_COLUMN: &str = "TimeUS";
/// Millisecond timestamp column used by older logs.
pub const TIME_MS_COLUMN: &str = "TimeMS";
/// Instance discriminator columns.
pub const INSTANCE_COLUMNS: [&str; 2] = ["I", "Instance"];

/// Message carrying GPS week / time-of-week.
pub const GPS_MESSAGE: &str = "GPS";
/// GPS week column.
pub const GPS_WEEK_COLUMN: &str = "GWk";
/// GPS milliseconds-of-week column.
pub const GPS_MS_COLUMN: &str = "GMS";

/// Check whether a record header starts at `pos`.
#[inline]
pub fn is_record_start(data: &[u8], pos: usize) -> bool {
    data.get(pos..pos + 2) == Some(&RECORD_MARKER[..])
}
