// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dataflash record decoder.
//!
//! The decoder owns the log's layout table: `FMT` records add (or replace)
//! entries as they are met, and every other record is decoded with the entry
//! current at that point of the stream. Records without their own time field
//! are stamped with the running clock, which follows the most recent
//! `TimeUS`/`TimeMS` value seen in the stream.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace, warn};

use crate::core::{DecodedMessage, FieldLayout, InstanceKey};
use crate::encoding::ByteCursor;
use crate::io::formats::resync::{scan_forward, Resync};
use crate::io::metadata::LogFormat;
use crate::io::traits::MessageDecoder;
use crate::io::warnings::{GapReason, WarningLog};
use crate::{DecodeError, Result, SessionConfig};

use super::constants::{
    is_record_start, FMT_TYPE, GPS_MESSAGE, GPS_MS_COLUMN, GPS_WEEK_COLUMN, RECORD_HEADER_LEN,
};
use super::layout::FormatDefinition;

/// GPS epoch (1980-01-06T00:00:00Z) as Unix seconds.
const GPS_EPOCH_UNIX_SECS: i64 = 315_964_800;
/// GPS time runs ahead of UTC by the leap seconds accumulated since 1980.
const GPS_UTC_LEAP_SECS: i64 = 18;
const MS_PER_WEEK: i64 = 7 * 24 * 3600 * 1000;

/// Convert GPS week / ms-of-week to UTC.
pub fn gps_to_utc(week: u32, week_ms: u32) -> Option<DateTime<Utc>> {
    let epoch = DateTime::from_timestamp(GPS_EPOCH_UNIX_SECS - GPS_UTC_LEAP_SECS, 0)?;
    let ms = (week as i64)
        .checked_mul(MS_PER_WEEK)?
        .checked_add(week_ms as i64)?;
    epoch.checked_add_signed(Duration::milliseconds(ms))
}

/// Layout table built from the log's `FMT` records.
#[derive(Debug, Clone)]
pub struct LayoutTable {
    layouts: HashMap<u8, Arc<FieldLayout>>,
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTable {
    /// Create a table holding only the built-in `FMT` layout.
    pub fn new() -> Self {
        let mut layouts = HashMap::new();
        if let Ok(fmt) = FormatDefinition::fmt().to_layout() {
            layouts.insert(FMT_TYPE, Arc::new(fmt));
        }
        Self { layouts }
    }

    /// Layout for a type id.
    pub fn get(&self, type_id: u8) -> Option<&Arc<FieldLayout>> {
        self.layouts.get(&type_id)
    }

    /// Install a definition, replacing any earlier one for the same id.
    ///
    /// `FMT` itself cannot be redefined; a definition for it is checked but
    /// otherwise ignored.
    pub fn define(&mut self, def: &FormatDefinition) -> Result<Arc<FieldLayout>> {
        let layout = Arc::new(def.to_layout()?);
        if def.type_id != FMT_TYPE {
            self.layouts.insert(def.type_id, layout.clone());
        }
        Ok(layout)
    }

    /// Number of known layouts, `FMT` included.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

/// Decoder over a dataflash byte stream.
pub struct DataflashDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    layouts: LayoutTable,
    max_resync_scan: usize,
    warnings: WarningLog,
    clock_us: u64,
    wall_clock_start: Option<DateTime<Utc>>,
    done: bool,
}

impl<'a> DataflashDecoder<'a> {
    /// Create a decoder starting at `start`.
    pub fn new(data: &'a [u8], start: usize, config: &SessionConfig) -> Self {
        let mut warnings = WarningLog::new();
        warnings.record_gap(0, start.min(data.len()), GapReason::CorruptSync);
        Self {
            data,
            pos: start,
            layouts: LayoutTable::new(),
            max_resync_scan: config.max_resync_scan,
            warnings,
            clock_us: 0,
            wall_clock_start: None,
            done: false,
        }
    }

    /// Layouts defined so far.
    pub fn layouts(&self) -> &LayoutTable {
        &self.layouts
    }

    /// Current running clock (µs).
    pub fn clock_us(&self) -> u64 {
        self.clock_us
    }

    /// Skip from a bad record at `bad` to the next record marker.
    fn resync(&mut self, bad: usize, reason: GapReason) {
        match scan_forward(self.data, bad + 1, self.max_resync_scan, is_record_start) {
            Resync::Found(next) => {
                trace!(from = bad, to = next, ?reason, "resynchronized");
                self.warnings.record_gap(bad, next, reason);
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
                self.warnings.record_gap(bad, end, reason);
                self.pos = end;
                self.done = true;
            }
        }
    }

    fn decode_at(&mut self, record: usize) -> std::result::Result<DecodedMessage, GapReason> {
        if !is_record_start(self.data, record) {
            return Err(GapReason::CorruptSync);
        }
        let Some(&type_id) = self.data.get(record + 2) else {
            return Err(GapReason::Truncated);
        };
        let Some(layout) = self.layouts.get(type_id).cloned() else {
            let err = DecodeError::MissingLayout {
                id: type_id,
                offset: record,
            };
            trace!(error = %err, "no FMT for record");
            return Err(GapReason::MissingLayout);
        };

        let mut cursor =
            ByteCursor::at(self.data, record + RECORD_HEADER_LEN).map_err(|_| GapReason::Truncated)?;
        let values = layout
            .decode(&mut cursor)
            .map_err(|_| GapReason::Truncated)?;
        self.pos = cursor.position();

        if let Some((idx, unit)) = layout.timestamp_field() {
            if let Some(raw) = values[idx].as_u64() {
                self.clock_us = unit.to_micros(raw);
            }
        }
        let instance = layout
            .instance_field()
            .and_then(|idx| values[idx].as_u64())
            .and_then(|i| u8::try_from(i).ok())
            .map(InstanceKey::Index);

        let message = DecodedMessage {
            layout,
            timestamp_us: self.clock_us,
            instance,
            offset: record,
            values,
        };

        if type_id == FMT_TYPE {
            self.apply_format(&message);
        } else if self.wall_clock_start.is_none() && message.name() == GPS_MESSAGE {
            self.anchor_wall_clock(&message);
        }
        Ok(message)
    }

    fn apply_format(&mut self, message: &DecodedMessage) {
        let result =
            FormatDefinition::from_values(&message.values).and_then(|def| {
                let layout = self.layouts.define(&def)?;
                Ok((def, layout))
            });
        match result {
            Ok((def, layout)) => {
                trace!(
                    type_id = def.type_id,
                    name = %def.name,
                    fields = layout.fields.len(),
                    "format defined"
                );
            }
            Err(DecodeError::InvalidLayout { name, reason }) => {
                debug!(offset = message.offset, %name, %reason, "rejected FMT record");
                self.warnings.record_invalid_layout(name, reason);
            }
            Err(other) => {
                debug!(offset = message.offset, error = %other, "rejected FMT record");
                self.warnings.record_invalid_layout("FMT", other.to_string());
            }
        }
    }

    fn anchor_wall_clock(&mut self, message: &DecodedMessage) {
        let week = message.get(GPS_WEEK_COLUMN).and_then(|v| v.as_u64());
        let week_ms = message.get(GPS_MS_COLUMN).and_then(|v| v.as_u64());
        let (Some(week), Some(week_ms)) = (week, week_ms) else {
            return;
        };
        // Week 0 means no fix yet
        if week == 0 {
            return;
        }
        let utc = gps_to_utc(week as u32, week_ms as u32);
        let start = utc.and_then(|t| {
            t.checked_sub_signed(Duration::microseconds(message.timestamp_us as i64))
        });
        if let Some(start) = start {
            debug!(%start, "anchored log to UTC");
            self.wall_clock_start = Some(start);
        }
    }
}

impl MessageDecoder for DataflashDecoder<'_> {
    fn format(&self) -> LogFormat {
        LogFormat::Dataflash
    }

    fn next_message(&mut self) -> Option<DecodedMessage> {
        while !self.done && self.pos < self.data.len() {
            let record = self.pos;
            match self.decode_at(record) {
                Ok(message) => return Some(message),
                Err(reason) => self.resync(record, reason),
            }
        }
        if !self.done {
            self.done = true;
            debug!(
                layouts = self.layouts.len(),
                skipped_bytes = self.warnings.skipped_bytes(),
                "dataflash stream finished"
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
        self.wall_clock_start
    }
}

impl Iterator for DataflashDecoder<'_> {
    type Item = DecodedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;
    use crate::io::formats::dataflash::writer::DataflashWriter;
    use crate::io::warnings::DecodeWarning;

    fn baro_log() -> DataflashWriter {
        let mut writer = DataflashWriter::new();
        writer
            .write_format(&FormatDefinition::new(10, "BARO", "Qf", &["TimeUS", "Alt"]).unwrap())
            .unwrap();
        writer
            .write_format(&FormatDefinition::new(11, "MODE", "MB", &["Mode", "Rsn"]).unwrap())
            .unwrap();
        writer
    }

    fn baro(time_us: u64, alt: f32) -> Vec<FieldValue> {
        vec![FieldValue::UInt64(time_us), FieldValue::Float32(alt)]
    }

    #[test]
    fn test_running_clock_stamps_untimed_records() {
        let mut writer = baro_log();
        writer.write_record(10, &baro(1_000, 5.0)).unwrap();
        writer
            .write_record(11, &[FieldValue::UInt8(4), FieldValue::UInt8(1)])
            .unwrap();
        writer.write_record(10, &baro(2_000, 6.0)).unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let messages: Vec<_> = DataflashDecoder::new(&bytes, 0, &config)
            .filter(|m| m.name() != "FMT")
            .collect();
        let stamps: Vec<_> = messages
            .iter()
            .map(|m| (m.name().to_string(), m.timestamp_us))
            .collect();
        assert_eq!(
            stamps,
            vec![
                ("BARO".to_string(), 1_000),
                ("MODE".to_string(), 1_000),
                ("BARO".to_string(), 2_000)
            ]
        );
    }

    #[test]
    fn test_corrupt_sync_resyncs_to_next_marker() {
        let mut writer = baro_log();
        writer.write_record(10, &baro(1_000, 5.0)).unwrap();
        let bad = writer.len();
        writer.write_record(10, &baro(2_000, 6.0)).unwrap();
        writer.write_record(10, &baro(3_000, 7.0)).unwrap();
        let mut bytes = writer.into_bytes();
        bytes[bad] = 0x00;

        let config = SessionConfig::default();
        let mut decoder = DataflashDecoder::new(&bytes, 0, &config);
        let times: Vec<_> = decoder
            .by_ref()
            .filter(|m| m.name() == "BARO")
            .map(|m| m.timestamp_us)
            .collect();
        assert_eq!(times, vec![1_000, 3_000]);

        let warnings = decoder.take_warnings().into_warnings();
        assert_eq!(
            warnings,
            vec![DecodeWarning::Gap {
                start: bad,
                end: bad + 15,
                reason: GapReason::CorruptSync
            }]
        );
    }

    #[test]
    fn test_missing_layout_skipped() {
        let mut writer = baro_log();
        writer.write_raw(&[0xA3, 0x95, 42, 1, 2, 3]);
        writer.write_record(10, &baro(5, 1.0)).unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let mut decoder = DataflashDecoder::new(&bytes, 0, &config);
        assert_eq!(decoder.by_ref().filter(|m| m.name() == "BARO").count(), 1);
        let warnings = decoder.take_warnings().into_warnings();
        assert!(matches!(
            warnings[0],
            DecodeWarning::Gap {
                reason: GapReason::MissingLayout,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_tail() {
        let mut writer = baro_log();
        writer.write_record(10, &baro(5, 1.0)).unwrap();
        writer.write_record(10, &baro(6, 2.0)).unwrap();
        let mut bytes = writer.into_bytes();
        bytes.truncate(bytes.len() - 4);

        let config = SessionConfig::default();
        let mut decoder = DataflashDecoder::new(&bytes, 0, &config);
        assert_eq!(decoder.by_ref().filter(|m| m.name() == "BARO").count(), 1);
        let warnings = decoder.take_warnings().into_warnings();
        assert!(matches!(
            warnings[0],
            DecodeWarning::Gap {
                reason: GapReason::Truncated,
                ..
            }
        ));
    }

    #[test]
    fn test_fmt_redefinition_applies_forward() {
        let mut writer = baro_log();
        writer.write_record(10, &baro(5, 1.0)).unwrap();
        writer
            .write_format(&FormatDefinition::new(10, "BARO", "Qh", &["TimeUS", "Temp"]).unwrap())
            .unwrap();
        writer
            .write_record(10, &[FieldValue::UInt64(6), FieldValue::Int16(-4)])
            .unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let baro: Vec<_> = DataflashDecoder::new(&bytes, 0, &config)
            .filter(|m| m.name() == "BARO")
            .collect();
        assert_eq!(baro.len(), 2);
        assert!(baro[0].get("Alt").is_some());
        assert_eq!(baro[1].get("Temp"), Some(&FieldValue::Int16(-4)));
    }

    #[test]
    fn test_invalid_fmt_is_reported() {
        let mut writer = DataflashWriter::new();
        let mut def = FormatDefinition::new(20, "BAD", "f", &["x"]).unwrap();
        def.length = 50;
        writer.write_format_unchecked(&def).unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let mut decoder = DataflashDecoder::new(&bytes, 0, &config);
        assert_eq!(decoder.by_ref().count(), 1);
        assert!(decoder.layouts().get(20).is_none());
        let warnings = decoder.take_warnings().into_warnings();
        assert!(matches!(
            &warnings[0],
            DecodeWarning::InvalidLayout { name, .. } if name == "BAD"
        ));
    }

    #[test]
    fn test_instances() {
        let mut writer = DataflashWriter::new();
        writer
            .write_format(&FormatDefinition::new(30, "GPS", "QBL", &["TimeUS", "I", "Lat"]).unwrap())
            .unwrap();
        writer
            .write_record(
                30,
                &[FieldValue::UInt64(1), FieldValue::UInt8(1), FieldValue::Int32(0)],
            )
            .unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let gps: Vec<_> = DataflashDecoder::new(&bytes, 0, &config)
            .filter(|m| m.name() == "GPS")
            .collect();
        assert_eq!(gps[0].instance, Some(InstanceKey::Index(1)));
    }

    #[test]
    fn test_gps_anchors_wall_clock() {
        let mut writer = DataflashWriter::new();
        writer
            .write_format(
                &FormatDefinition::new(30, "GPS", "QIH", &["TimeUS", "GMS", "GWk"]).unwrap(),
            )
            .unwrap();
        writer
            .write_record(
                30,
                &[
                    FieldValue::UInt64(2_000_000),
                    FieldValue::UInt32(0),
                    FieldValue::UInt16(2000),
                ],
            )
            .unwrap();
        let bytes = writer.into_bytes();

        let config = SessionConfig::default();
        let mut decoder = DataflashDecoder::new(&bytes, 0, &config);
        decoder.by_ref().for_each(drop);
        let start = decoder.wall_clock_start().unwrap();
        let expected = gps_to_utc(2000, 0).unwrap() - Duration::seconds(2);
        assert_eq!(start, expected);
    }

    #[test]
    fn test_gps_to_utc() {
        // GPS week 0 starts at the GPS epoch, 18 leap seconds ahead of UTC
        let t = gps_to_utc(0, 18_000).unwrap();
        assert_eq!(t.timestamp(), GPS_EPOCH_UNIX_SECS);
    }
}
