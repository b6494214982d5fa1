// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format detection from leading bytes.
//!
//! The detector walks the first `detect_window` bytes looking for the first
//! offset where a complete, well-formed record of a known format starts:
//!
//! - **Dataflash**: a record marker followed by the `FMT` type id, whose
//!   89-byte record is followed by another marker (or the end of the buffer)
//! - **MAVLink tlog**: a plausible big-endian Unix timestamp followed by a
//!   frame that verifies
//! - **MAVLink raw**: a frame that verifies
//!
//! A frame "verifies" when its id is in the dictionary and its checksum
//! matches, or when its id is unknown but another frame (or the end of the
//! buffer) follows it. Leading junk before the first record is tolerated.
//! Nothing is guessed: when no candidate verifies the buffer is rejected.
//!
//! # Example
//!
//! ```
//! use flightcodec::io::detection::FormatDetector;
//!
//! let detector = FormatDetector::new(4096);
//! assert!(detector.detect(b"not a flight log").is_err());
//! ```

use byteorder::BigEndian;
use tracing::debug;

use crate::encoding::ByteCursor;
use crate::{DecodeError, Result};

use super::formats::dataflash::constants::{is_record_start, FMT_RECORD_LEN, FMT_TYPE};
use super::formats::mavlink::constants::{is_marker, TLOG_TIMESTAMP_LEN};
use super::formats::mavlink::{Frame, MavlinkDictionary};
use super::metadata::{LogFormat, MavlinkFraming};

/// 2000-01-01T00:00:00Z in µs since the Unix epoch.
const TLOG_MIN_TIMESTAMP_US: u64 = 946_684_800_000_000;
/// 2100-01-01T00:00:00Z in µs since the Unix epoch.
const TLOG_MAX_TIMESTAMP_US: u64 = 4_102_444_800_000_000;

/// Outcome of a successful detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Detected format
    pub format: LogFormat,
    /// Offset of the first record
    pub start: usize,
}

/// Leading-bytes format detector.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    window: usize,
    dictionary: &'static MavlinkDictionary,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl FormatDetector {
    /// Create a detector inspecting at most `window` leading bytes.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            dictionary: MavlinkDictionary::builtin(),
        }
    }

    /// Detect the format of `data`.
    ///
    /// Fails with `UnrecognizedFormat` when no record start is found within
    /// the window.
    pub fn detect(&self, data: &[u8]) -> Result<Detection> {
        let limit = data.len().min(self.window);
        let mut cursor = ByteCursor::new(data);
        for offset in 0..limit {
            cursor.seek_absolute(offset)?;
            if let Some(format) = self.probe(&mut cursor) {
                debug_assert_eq!(cursor.position(), offset);
                debug!(%format, start = offset, "format detected");
                return Ok(Detection {
                    format,
                    start: offset,
                });
            }
        }
        debug!(inspected = limit, "no recognizable log header");
        Err(DecodeError::UnrecognizedFormat { inspected: limit })
    }

    /// Try every format at the cursor position. The position is restored
    /// before returning.
    fn probe(&self, cursor: &mut ByteCursor<'_>) -> Option<LogFormat> {
        let data = cursor.buffer();
        let offset = cursor.position();

        if is_dataflash_header(data, offset) {
            return Some(LogFormat::Dataflash);
        }

        let mark = cursor.snapshot();
        let timestamp = cursor.read_u64::<BigEndian>().ok();
        cursor.restore(mark);
        if let Some(ts) = timestamp {
            if (TLOG_MIN_TIMESTAMP_US..TLOG_MAX_TIMESTAMP_US).contains(&ts)
                && self.frame_verifies(data, offset + TLOG_TIMESTAMP_LEN, TLOG_TIMESTAMP_LEN)
            {
                return Some(LogFormat::Mavlink(MavlinkFraming::Tlog));
            }
        }

        if self.frame_verifies(data, offset, 0) {
            return Some(LogFormat::Mavlink(MavlinkFraming::Raw));
        }
        None
    }

    /// Check the frame at `offset`. `prefix` is the per-record prefix length
    /// used to locate the following frame.
    fn frame_verifies(&self, data: &[u8], offset: usize, prefix: usize) -> bool {
        if !data.get(offset).copied().is_some_and(is_marker) {
            return false;
        }
        let Ok(frame) = Frame::parse(data, offset) else {
            return false;
        };
        match self.dictionary.get(frame.version, frame.message_id) {
            Some(entry) => frame.verify(entry.crc_extra).is_ok(),
            None => {
                let next = offset + frame.len;
                next == data.len() || data.get(next + prefix).copied().is_some_and(is_marker)
            }
        }
    }
}

/// Whether a dataflash `FMT` record starts at `offset` and is followed by
/// another record or the end of the buffer.
fn is_dataflash_header(data: &[u8], offset: usize) -> bool {
    if !is_record_start(data, offset) || data.get(offset + 2) != Some(&FMT_TYPE) {
        return false;
    }
    let next = offset + FMT_RECORD_LEN;
    next == data.len() || is_record_start(data, next)
}

/// Detect with the default window.
pub fn detect_format(data: &[u8]) -> Result<Detection> {
    FormatDetector::default().detect(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;
    use crate::io::formats::dataflash::{DataflashWriter, FormatDefinition};
    use crate::io::formats::mavlink::{MavlinkVersion, MavlinkWriter};

    fn heartbeat() -> Vec<FieldValue> {
        vec![
            FieldValue::UInt32(0),
            FieldValue::UInt8(1),
            FieldValue::UInt8(3),
            FieldValue::UInt8(0),
            FieldValue::UInt8(4),
            FieldValue::UInt8(3),
        ]
    }

    #[test]
    fn test_dataflash_with_header() {
        let mut writer = DataflashWriter::with_header().unwrap();
        writer
            .write_format(&FormatDefinition::new(1, "ALT", "f", &["alt"]).unwrap())
            .unwrap();
        let detection = detect_format(writer.as_bytes()).unwrap();
        assert_eq!(detection.format, LogFormat::Dataflash);
        assert_eq!(detection.start, 0);
    }

    #[test]
    fn test_dataflash_after_junk() {
        let mut writer = DataflashWriter::new();
        writer.write_raw(&[0x00, 0x13, 0x37]);
        writer
            .write_format(&FormatDefinition::new(1, "ALT", "f", &["alt"]).unwrap())
            .unwrap();
        let detection = detect_format(writer.as_bytes()).unwrap();
        assert_eq!(detection.start, 3);
    }

    #[test]
    fn test_raw_mavlink() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V2, MavlinkFraming::Raw);
        writer.write_message(1, 1, 0, &heartbeat(), None).unwrap();
        let detection = detect_format(writer.as_bytes()).unwrap();
        assert_eq!(detection.format, LogFormat::Mavlink(MavlinkFraming::Raw));
    }

    #[test]
    fn test_tlog() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V1, MavlinkFraming::Tlog);
        writer
            .write_message(1, 1, 0, &heartbeat(), Some(1_700_000_000_000_000))
            .unwrap();
        writer.write_message(1, 1, 0, &heartbeat(), None).unwrap();
        let detection = detect_format(writer.as_bytes()).unwrap();
        assert_eq!(detection.format, LogFormat::Mavlink(MavlinkFraming::Tlog));
        assert_eq!(detection.start, 0);
    }

    #[test]
    fn test_bad_checksum_not_detected() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V1, MavlinkFraming::Raw);
        writer.write_message(1, 1, 0, &heartbeat(), None).unwrap();
        let mut bytes = writer.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            detect_format(&bytes),
            Err(DecodeError::UnrecognizedFormat { .. })
        ));
    }

    #[test]
    fn test_window_bounds_search() {
        let mut bytes = vec![0u8; 64];
        let mut writer = MavlinkWriter::new(MavlinkVersion::V1, MavlinkFraming::Raw);
        writer.write_message(1, 1, 0, &heartbeat(), None).unwrap();
        bytes.extend_from_slice(writer.as_bytes());

        assert!(FormatDetector::new(32).detect(&bytes).is_err());
        let detection = FormatDetector::new(128).detect(&bytes).unwrap();
        assert_eq!(detection.start, 64);
    }

    #[test]
    fn test_empty_buffer() {
        assert!(matches!(
            detect_format(&[]),
            Err(DecodeError::UnrecognizedFormat { inspected: 0 })
        ));
    }
}
