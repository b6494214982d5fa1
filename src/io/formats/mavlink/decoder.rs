// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MAVLink frame decoder.
//!
//! Handles MAVLink 1 and 2 frames, either bare or tlog-framed. Frames that
//! fail their checksum are dropped and decoding resumes at the next byte.
//! Frames with an id missing from the dictionary are skipped whole when the
//! bytes after them look like another frame, otherwise treated as noise.

use std::borrow::Cow;

use byteorder::{BigEndian, LittleEndian};
use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::core::{DecodedMessage, InstanceKey};
use crate::encoding::ByteCursor;
use crate::io::formats::resync::{scan_forward, Resync};
use crate::io::metadata::{LogFormat, MavlinkFraming};
use crate::io::traits::MessageDecoder;
use crate::io::warnings::{GapReason, WarningLog};
use crate::{DecodeError, Result, SessionConfig};

use super::constants::{
    is_marker, MavlinkVersion, CHECKSUM_LEN, IFLAG_SIGNED, SIGNATURE_LEN, TLOG_TIMESTAMP_LEN,
};
use super::crc::frame_checksum;
use super::dictionary::MavlinkDictionary;

/// One parsed frame, borrowed from the buffer.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Protocol version
    pub version: MavlinkVersion,
    /// Packet sequence number
    pub sequence: u8,
    /// Sender system id
    pub system: u8,
    /// Sender component id
    pub component: u8,
    /// Message id
    pub message_id: u32,
    /// Payload as carried (possibly zero-truncated)
    pub payload: &'a [u8],
    /// Checksum carried by the frame
    pub checksum: u16,
    /// Header and payload without the start marker
    pub body: &'a [u8],
    /// Offset of the start marker
    pub offset: usize,
    /// Total frame length including checksum and signature
    pub len: usize,
}

impl<'a> Frame<'a> {
    /// Parse the frame whose start marker is at `offset`.
    ///
    /// Fails with `CorruptSync` when there is no marker and `OutOfBounds`
    /// when the frame runs past the end of the buffer.
    pub fn parse(data: &'a [u8], offset: usize) -> Result<Self> {
        let mut cursor = ByteCursor::at(data, offset)?;
        let version = MavlinkVersion::from_marker(cursor.read_u8()?)
            .ok_or(DecodeError::CorruptSync { offset })?;
        let payload_len = cursor.read_u8()? as usize;

        let (incompat, sequence, system, component, message_id) = match version {
            MavlinkVersion::V1 => {
                let seq = cursor.read_u8()?;
                let sys = cursor.read_u8()?;
                let comp = cursor.read_u8()?;
                (0, seq, sys, comp, cursor.read_u8()? as u32)
            }
            MavlinkVersion::V2 => {
                let incompat = cursor.read_u8()?;
                let _compat = cursor.read_u8()?;
                let seq = cursor.read_u8()?;
                let sys = cursor.read_u8()?;
                let comp = cursor.read_u8()?;
                (incompat, seq, sys, comp, cursor.read_u24::<LittleEndian>()?)
            }
        };

        let header_end = offset + version.header_len();
        debug_assert_eq!(cursor.position(), header_end);
        let payload = cursor.read_bytes(payload_len)?;
        let checksum = cursor.read_u16::<LittleEndian>()?;
        if incompat & IFLAG_SIGNED != 0 {
            cursor.skip(SIGNATURE_LEN)?;
        }

        Ok(Self {
            version,
            sequence,
            system,
            component,
            message_id,
            payload,
            checksum,
            body: &data[offset + 1..header_end + payload_len],
            offset,
            len: cursor.position() - offset,
        })
    }

    /// Verify the checksum with the message's CRC extra byte.
    pub fn verify(&self, crc_extra: u8) -> Result<()> {
        let actual = frame_checksum(self.body, crc_extra);
        if actual != self.checksum {
            return Err(DecodeError::ChecksumFailure {
                offset: self.offset,
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }
}

/// Minimum bytes of a complete frame of either version.
const MIN_FRAME_LEN: usize = MavlinkVersion::V1.header_len() + CHECKSUM_LEN;

/// Decoder over a MAVLink byte stream.
pub struct MavlinkDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    framing: MavlinkFraming,
    dictionary: &'a MavlinkDictionary,
    max_resync_scan: usize,
    warnings: WarningLog,
    /// First tlog timestamp (µs since Unix epoch)
    tlog_origin: Option<u64>,
    /// Latest boot-relative time seen in a raw stream
    clock_us: u64,
    done: bool,
}

impl<'a> MavlinkDecoder<'a> {
    /// Create a decoder starting at `start`, using the built-in dictionary.
    pub fn new(data: &'a [u8], start: usize, framing: MavlinkFraming, config: &SessionConfig) -> Self {
        Self::with_dictionary(data, start, framing, MavlinkDictionary::builtin(), config)
    }

    /// Create a decoder with a custom dictionary.
    pub fn with_dictionary(
        data: &'a [u8],
        start: usize,
        framing: MavlinkFraming,
        dictionary: &'a MavlinkDictionary,
        config: &SessionConfig,
    ) -> Self {
        let mut warnings = WarningLog::new();
        warnings.record_gap(0, start.min(data.len()), GapReason::CorruptSync);
        Self {
            data,
            pos: start,
            framing,
            dictionary,
            max_resync_scan: config.max_resync_scan,
            warnings,
            tlog_origin: None,
            clock_us: 0,
            done: false,
        }
    }

    fn prefix_len(&self) -> usize {
        match self.framing {
            MavlinkFraming::Tlog => TLOG_TIMESTAMP_LEN,
            MavlinkFraming::Raw => 0,
        }
    }

    /// Whether a record (optional tlog prefix plus frame) could start at `pos`.
    fn record_starts_at(&self, pos: usize) -> bool {
        self.data.get(pos + self.prefix_len()).copied().is_some_and(is_marker)
    }

    /// Skip ahead from a bad record at `bad` to the next candidate.
    fn resync(&mut self, bad: usize) {
        let prefix = self.prefix_len();
        let outcome = scan_forward(self.data, bad + 1, self.max_resync_scan, |d, p| {
            d.get(p + prefix).copied().is_some_and(is_marker)
        });
        match outcome {
            Resync::Found(next) => {
                trace!(from = bad, to = next, "resynchronized");
                self.warnings.record_gap(bad, next, GapReason::CorruptSync);
                self.pos = next;
            }
            Resync::Exhausted => {
                let end = self.data.len();
                if end - bad > self.max_resync_scan {
                    warn!(
                        offset = bad,
                        scanned = self.max_resync_scan,
                        "resync scan exhausted, abandoning rest of log"
                    );
                }
                let reason = if end - bad < MIN_FRAME_LEN + prefix {
                    GapReason::Truncated
                } else {
                    GapReason::CorruptSync
                };
                self.warnings.record_gap(bad, end, reason);
                self.pos = end;
                self.done = true;
            }
        }
    }

    fn timestamp_for(&mut self, record: usize, frame_ts: Option<u64>, message: &DecodedMessage) -> u64 {
        if let Some(unix_us) = frame_ts {
            let origin = *self.tlog_origin.get_or_insert(unix_us);
            if unix_us < origin {
                trace!(offset = record, "tlog timestamp before log start");
            }
            return unix_us.saturating_sub(origin);
        }
        if let Some((idx, unit)) = message.layout.timestamp_field() {
            if let Some(raw) = message.values[idx].as_u64() {
                self.clock_us = unit.to_micros(raw);
            }
        }
        self.clock_us
    }

    fn try_decode_at(&mut self, record: usize) -> Step {
        let prefix = self.prefix_len();
        let frame_ts = match self.framing {
            MavlinkFraming::Tlog => match ByteCursor::at(self.data, record)
                .and_then(|mut c| c.read_u64::<BigEndian>())
            {
                Ok(ts) => Some(ts),
                Err(_) => return Step::Bad,
            },
            MavlinkFraming::Raw => None,
        };

        let frame = match Frame::parse(self.data, record + prefix) {
            Ok(frame) => frame,
            Err(_) => return Step::Bad,
        };
        let next = record + prefix + frame.len;

        let dictionary = self.dictionary;
        let Some(entry) = dictionary.get(frame.version, frame.message_id) else {
            if next == self.data.len() || self.record_starts_at(next) {
                trace!(offset = record, id = frame.message_id, "skipping unknown message id");
                self.warnings.record_unknown_id(frame.message_id);
                return Step::Skip(next);
            }
            return Step::Bad;
        };

        if let Err(err) = frame.verify(entry.crc_extra) {
            trace!(offset = record, id = frame.message_id, error = %err, "dropping frame");
            self.warnings.record_checksum_failure();
            return Step::Bad;
        }

        let full_len = entry.payload_len();
        let payload: Cow<'_, [u8]> = if frame.payload.len() >= full_len {
            Cow::Borrowed(&frame.payload[..full_len])
        } else {
            let mut padded = frame.payload.to_vec();
            padded.resize(full_len, 0);
            Cow::Owned(padded)
        };

        let values = match entry.layout.decode(&mut ByteCursor::new(&payload)) {
            Ok(values) => values,
            Err(_) => return Step::Bad,
        };

        let mut message = DecodedMessage {
            layout: entry.layout.clone(),
            timestamp_us: 0,
            instance: Some(InstanceKey::Component {
                system: frame.system,
                component: frame.component,
            }),
            offset: record,
            values,
        };
        message.timestamp_us = self.timestamp_for(record, frame_ts, &message);
        Step::Emit(message, next)
    }
}

enum Step {
    Emit(DecodedMessage, usize),
    Skip(usize),
    Bad,
}

impl MessageDecoder for MavlinkDecoder<'_> {
    fn format(&self) -> LogFormat {
        LogFormat::Mavlink(self.framing)
    }

    fn next_message(&mut self) -> Option<DecodedMessage> {
        while !self.done && self.pos < self.data.len() {
            let record = self.pos;
            match self.try_decode_at(record) {
                Step::Emit(message, next) => {
                    self.pos = next;
                    return Some(message);
                }
                Step::Skip(next) => self.pos = next,
                Step::Bad => self.resync(record),
            }
        }
        if !self.done {
            self.done = true;
            debug!(
                checksum_failures = self.warnings.checksum_failures(),
                skipped_bytes = self.warnings.skipped_bytes(),
                "mavlink stream finished"
            );
        }
        None
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn take_warnings(&mut self) -> WarningLog {
        std::mem::take(&mut self.warnings)
    }

    fn wall_clock_start(&self) -> Option<DateTime<Utc>> {
        let origin = self.tlog_origin?;
        DateTime::from_timestamp_micros(i64::try_from(origin).ok()?)
    }
}

impl Iterator for MavlinkDecoder<'_> {
    type Item = DecodedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;
    use crate::io::formats::mavlink::writer::MavlinkWriter;
    use crate::io::warnings::DecodeWarning;

    fn heartbeat(mode: u32) -> Vec<FieldValue> {
        vec![
            FieldValue::UInt32(mode),
            FieldValue::UInt8(2),
            FieldValue::UInt8(3),
            FieldValue::UInt8(81),
            FieldValue::UInt8(4),
            FieldValue::UInt8(3),
        ]
    }

    fn attitude(time_ms: u32, roll: f32) -> Vec<FieldValue> {
        let mut values = vec![FieldValue::UInt32(time_ms), FieldValue::Float32(roll)];
        values.extend((0..5).map(|_| FieldValue::Float32(0.0)));
        values
    }

    #[test]
    fn test_frame_parse_v1() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V1, MavlinkFraming::Raw);
        writer.write_message(1, 1, 0, &heartbeat(7), None).unwrap();
        let bytes = writer.into_bytes();
        let frame = Frame::parse(&bytes, 0).unwrap();
        assert_eq!(frame.version, MavlinkVersion::V1);
        assert_eq!(frame.message_id, 0);
        assert_eq!(frame.payload.len(), 9);
        assert_eq!(frame.len, bytes.len());
        assert!(frame.verify(50).is_ok());
        assert!(frame.verify(51).is_err());
    }

    #[test]
    fn test_frame_parse_v2_header_and_body() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V2, MavlinkFraming::Raw);
        writer.write_message(4, 7, 30, &attitude(10, 0.5), None).unwrap();
        let bytes = writer.into_bytes();
        let frame = Frame::parse(&bytes, 0).unwrap();
        assert_eq!(frame.version, MavlinkVersion::V2);
        assert_eq!((frame.system, frame.component), (4, 7));
        assert_eq!(frame.message_id, 30);
        // Trailing zero fields are truncated down to time_boot_ms and roll.
        assert_eq!(frame.payload.len(), 8);
        assert_eq!(
            frame.body.len(),
            MavlinkVersion::V2.header_len() - 1 + frame.payload.len()
        );
        assert_eq!(
            frame.len,
            MavlinkVersion::V2.header_len() + frame.payload.len() + CHECKSUM_LEN
        );
        assert!(frame.verify(39).is_ok());
    }

    #[test]
    fn test_frame_parse_truncated() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V2, MavlinkFraming::Raw);
        writer.write_message(1, 1, 30, &attitude(10, 0.5), None).unwrap();
        let bytes = writer.into_bytes();
        assert!(matches!(
            Frame::parse(&bytes[..bytes.len() - 1], 0),
            Err(DecodeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            Frame::parse(&[0x00, 0x01], 0),
            Err(DecodeError::CorruptSync { offset: 0 })
        ));
    }

    #[test]
    fn test_raw_stream_uses_time_boot_ms() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V2, MavlinkFraming::Raw);
        writer.write_message(1, 1, 30, &attitude(1500, 0.1), None).unwrap();
        writer.write_message(1, 1, 0, &heartbeat(0), None).unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let mut decoder = MavlinkDecoder::new(&bytes, 0, MavlinkFraming::Raw, &config);
        let messages: Vec<_> = decoder.by_ref().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].name(), "ATTITUDE");
        assert_eq!(messages[0].timestamp_us, 1_500_000);
        // HEARTBEAT has no time field and inherits the running clock
        assert_eq!(messages[1].timestamp_us, 1_500_000);
        assert_eq!(
            messages[1].instance,
            Some(InstanceKey::Component {
                system: 1,
                component: 1
            })
        );
        assert!(decoder.take_warnings().is_empty());
    }

    #[test]
    fn test_tlog_timestamps_are_log_relative() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V1, MavlinkFraming::Tlog);
        let start = 1_700_000_000_000_000u64;
        writer.write_message(1, 1, 0, &heartbeat(0), Some(start)).unwrap();
        writer
            .write_message(1, 1, 0, &heartbeat(1), Some(start + 250_000))
            .unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let mut decoder = MavlinkDecoder::new(&bytes, 0, MavlinkFraming::Tlog, &config);
        let times: Vec<_> = decoder.by_ref().map(|m| m.timestamp_us).collect();
        assert_eq!(times, vec![0, 250_000]);
        assert_eq!(
            decoder.wall_clock_start().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_checksum_failure_resumes_at_next_frame() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V2, MavlinkFraming::Raw);
        writer.write_message(1, 1, 30, &attitude(100, 1.0), None).unwrap();
        let second = writer.len();
        writer.write_message(1, 1, 30, &attitude(200, 2.0), None).unwrap();
        writer.write_message(1, 1, 30, &attitude(300, 3.0), None).unwrap();
        let mut bytes = writer.into_bytes();
        // Corrupt one payload byte of the second frame
        bytes[second + 12] ^= 0xFF;

        let config = SessionConfig::default();
        let mut decoder = MavlinkDecoder::new(&bytes, 0, MavlinkFraming::Raw, &config);
        let times: Vec<_> = decoder.by_ref().map(|m| m.timestamp_us).collect();
        assert_eq!(times, vec![100_000, 300_000]);
        let warnings = decoder.take_warnings();
        assert_eq!(warnings.checksum_failures(), 1);
    }

    #[test]
    fn test_unknown_id_skipped_by_length() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V2, MavlinkFraming::Raw);
        writer.write_raw_frame(1, 1, 9000, &[1, 2, 3, 4], 0).unwrap();
        writer.write_message(1, 1, 0, &heartbeat(5), None).unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let mut decoder = MavlinkDecoder::new(&bytes, 0, MavlinkFraming::Raw, &config);
        let names: Vec<_> = decoder.by_ref().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["HEARTBEAT"]);
        let warnings = decoder.take_warnings().into_warnings();
        assert!(warnings.iter().any(|w| matches!(
            w,
            DecodeWarning::UnknownMessageIds { counts } if counts.get(&9000) == Some(&1)
        )));
    }

    #[test]
    fn test_zero_truncated_payload_is_extended() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V2, MavlinkFraming::Raw);
        // An all-zero payload truncates to its first byte
        writer
            .write_message(1, 1, 42, &[FieldValue::UInt16(0)], None)
            .unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes[1], 1);

        let config = SessionConfig::default();
        let messages: Vec<_> =
            MavlinkDecoder::new(&bytes, 0, MavlinkFraming::Raw, &config).collect();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].get("seq"), Some(&FieldValue::UInt16(0)));
    }

    #[test]
    fn test_trailing_garbage_becomes_gap() {
        let mut writer = MavlinkWriter::new(MavlinkVersion::V1, MavlinkFraming::Raw);
        writer.write_message(1, 1, 0, &heartbeat(0), None).unwrap();
        let mut bytes = writer.into_bytes();
        let end = bytes.len();
        bytes.extend_from_slice(&[0x11; 40]);

        let config = SessionConfig::default();
        let mut decoder = MavlinkDecoder::new(&bytes, 0, MavlinkFraming::Raw, &config);
        assert_eq!(decoder.by_ref().count(), 1);
        let warnings = decoder.take_warnings();
        assert_eq!(warnings.skipped_bytes(), bytes.len() - end);
    }
}
