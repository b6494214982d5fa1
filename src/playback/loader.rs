// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Load pipeline: buffer, detection, decode, index.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::index::{index_stream, CancelToken};
use crate::io::metadata::{ChannelMeta, LogFormat};
use crate::io::raw::RawLog;
use crate::io::warnings::DecodeWarning;
use crate::store::TimeSeriesStore;
use crate::{Result, SessionConfig};

/// Where a log comes from.
#[derive(Debug, Clone)]
pub enum LogSource {
    /// Buffer already in memory
    Bytes(Vec<u8>),
    /// File to memory-map
    File(PathBuf),
}

impl From<Vec<u8>> for LogSource {
    fn from(bytes: Vec<u8>) -> Self {
        LogSource::Bytes(bytes)
    }
}

impl From<PathBuf> for LogSource {
    fn from(path: PathBuf) -> Self {
        LogSource::File(path)
    }
}

impl From<&std::path::Path> for LogSource {
    fn from(path: &std::path::Path) -> Self {
        LogSource::File(path.to_path_buf())
    }
}

impl LogSource {
    /// Acquire the buffer and detect its format.
    pub fn open(self, config: &SessionConfig) -> Result<RawLog> {
        match self {
            LogSource::Bytes(bytes) => RawLog::from_bytes(bytes, config),
            LogSource::File(path) => RawLog::open(path, config),
        }
    }
}

/// Summary of a finished load, handed to the visualization layer.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Detected format
    pub format: LogFormat,
    /// Every channel with its sample count and time span
    pub channels: Vec<ChannelMeta>,
    /// First sample time over all channels (µs)
    pub start_us: Option<u64>,
    /// Last sample time over all channels (µs)
    pub end_us: Option<u64>,
    /// `end_us - start_us`, zero for a log without samples
    pub duration_us: u64,
    /// Records decoded
    pub records: u64,
    /// UTC time of log time zero, when known
    pub wall_clock_start: Option<DateTime<Utc>>,
    /// Non-fatal problems; non-empty means "partially decoded"
    pub warnings: Vec<DecodeWarning>,
}

impl LoadReport {
    /// Summarize a store.
    pub fn from_store(store: &TimeSeriesStore) -> Self {
        Self {
            format: store.format(),
            channels: store.channel_metas(),
            start_us: store.start_us(),
            end_us: store.end_us(),
            duration_us: store.duration_us(),
            records: store.record_count(),
            wall_clock_start: store.wall_clock_start(),
            warnings: store.warnings().to_vec(),
        }
    }

    /// Whether any part of the log was skipped or repaired.
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Decode an acquired log into a store.
pub fn load_log(
    log: &RawLog,
    config: &SessionConfig,
    cancel: Option<&CancelToken>,
) -> Result<TimeSeriesStore> {
    debug!(
        format = %log.format(),
        bytes = log.len(),
        start = log.start_offset(),
        "decoding log"
    );
    let mut decoder = log.decoder(config)?;
    let store = index_stream(decoder.as_mut(), config, cancel)?;
    info!(
        format = %store.format(),
        records = store.record_count(),
        channels = store.channels().len(),
        duration_us = store.duration_us(),
        warnings = store.warnings().len(),
        "log loaded"
    );
    Ok(store)
}

/// Acquire, detect and decode in one step.
pub fn load_source(
    source: LogSource,
    config: &SessionConfig,
    cancel: Option<&CancelToken>,
) -> Result<TimeSeriesStore> {
    let log = source.open(config)?;
    load_log(&log, config, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::dataflash::{DataflashWriter, FormatDefinition};
    use crate::core::FieldValue;
    use crate::DecodeError;

    #[test]
    fn test_load_report() {
        let mut writer = DataflashWriter::with_header().unwrap();
        let def = FormatDefinition::new(1, "ALT", "Qf", &["TimeUS", "alt"]).unwrap();
        writer.write_format(&def).unwrap();
        for (t, alt) in [(100u64, 10.0f32), (200, 12.5)] {
            writer
                .write_record(1, &[FieldValue::UInt64(t), FieldValue::Float32(alt)])
                .unwrap();
        }
        let store = load_source(writer.into_bytes().into(), &SessionConfig::default(), None)
            .unwrap();
        let report = LoadReport::from_store(&store);
        assert_eq!(report.format, LogFormat::Dataflash);
        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].id.to_string(), "ALT.alt");
        assert_eq!(report.duration_us, 100);
        assert!(!report.is_partial());
    }

    #[test]
    fn test_unrecognized_source() {
        let err = load_source(vec![0u8; 64].into(), &SessionConfig::default(), None).unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedFormat { .. }));
    }
}
