// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Immutable log buffers.

use std::fmt;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::io::detection::{Detection, FormatDetector};
use crate::io::formats::dataflash::DataflashDecoder;
use crate::io::formats::mavlink::MavlinkDecoder;
use crate::io::metadata::LogFormat;
use crate::io::traits::MessageDecoder;
use crate::{DecodeError, Result, SessionConfig};

enum Buffer {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Owned(bytes) => bytes,
            Buffer::Mapped(mmap) => mmap,
        }
    }
}

/// A whole log in memory, tagged with its detected format.
///
/// Construction fails with `UnrecognizedFormat` when neither format is
/// found, so a `RawLog` always has a known format.
pub struct RawLog {
    buffer: Buffer,
    detection: Detection,
}

impl fmt::Debug for RawLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawLog")
            .field("len", &self.len())
            .field("format", &self.detection.format)
            .field("start", &self.detection.start)
            .finish()
    }
}

impl RawLog {
    /// Take ownership of an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>, config: &SessionConfig) -> Result<Self> {
        Self::with_buffer(Buffer::Owned(bytes), config)
    }

    /// Memory-map a log file.
    pub fn open<P: AsRef<Path>>(path: P, config: &SessionConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            DecodeError::Io(format!("failed to open '{}': {e}", path.display()))
        })?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Self::from_bytes(Vec::new(), config);
        }
        // The map is read-only and owned by the RawLog for its whole lifetime.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            DecodeError::Io(format!("failed to mmap '{}': {e}", path.display()))
        })?;
        Self::with_buffer(Buffer::Mapped(mmap), config)
    }

    fn with_buffer(buffer: Buffer, config: &SessionConfig) -> Result<Self> {
        let detection = FormatDetector::new(config.detect_window).detect(buffer.as_slice())?;
        Ok(Self { buffer, detection })
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Detected format.
    pub fn format(&self) -> LogFormat {
        self.detection.format
    }

    /// Offset of the first record.
    pub fn start_offset(&self) -> usize {
        self.detection.start
    }

    /// Create a decoder for this log's format.
    pub fn decoder<'a>(&'a self, config: &SessionConfig) -> Result<Box<dyn MessageDecoder + 'a>> {
        let data = self.bytes();
        let start = self.detection.start;
        match self.detection.format {
            LogFormat::Dataflash => Ok(Box::new(DataflashDecoder::new(data, start, config))),
            LogFormat::Mavlink(framing) => {
                Ok(Box::new(MavlinkDecoder::new(data, start, framing, config)))
            }
            LogFormat::Unknown => Err(DecodeError::UnrecognizedFormat {
                inspected: data.len().min(config.detect_window),
            }),
        }
    }
}
