// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Flightcodec
//!
//! Flight-controller log decoding and time-indexed random access.
//!
//! This library turns a raw flight log into typed, seekable time series:
//! - **Dataflash** self-describing binary logs in
//!   [`io::formats::dataflash`](crate::io::formats::dataflash)
//! - **MAVLink** telemetry (raw frame streams and ground-station tlogs) in
//!   [`io::formats::mavlink`](crate::io::formats::mavlink)
//!
//! ## Architecture
//!
//! - `encoding/` - Bounds-checked binary cursor
//! - `io/` - Buffers, format detection, per-format decoders, warnings
//! - `index/` - Single-pass stream indexer and per-source checkpoints
//! - `store/` - Channels, range queries and seek
//! - `playback/` - Load/seek/playback controller with background loading
//!
//! ## Example: Load and seek
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use flightcodec::{PlaybackController, SessionConfig};
//! use std::path::Path;
//!
//! let mut controller = PlaybackController::new(SessionConfig::default());
//! let report = controller.load(Path::new("flight.bin"))?;
//! println!("{} channels over {} us", report.channels.len(), report.duration_us);
//!
//! let frame = controller.seek(report.start_us.unwrap_or(0) + 1_000_000)?;
//! let store = controller.store().expect("loaded");
//! for (id, sample) in store.frame_entries(&frame) {
//!     println!("{id} = {:?}", sample.map(|s| s.value));
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{
    DecodeError, DecodedMessage, FieldDef, FieldLayout, FieldValue, InstanceKey, PrimitiveType,
    Result,
};

// Binary cursor
pub mod encoding;

pub use encoding::ByteCursor;

// Session configuration
pub mod config;

pub use config::SessionConfig;

// I/O types (buffers, detection, decoders, warnings)
pub mod io;

pub use io::metadata::{ChannelId, ChannelMeta, LogFormat, MavlinkFraming};
pub use io::traits::{MessageDecoder, MessageDecoderExt};
pub use io::warnings::{DecodeWarning, GapReason};
pub use io::{detect_format, RawLog};

// Format decoders and writers
pub use io::formats::dataflash::{DataflashDecoder, DataflashWriter, FormatDefinition};
pub use io::formats::mavlink::{MavlinkDecoder, MavlinkDictionary, MavlinkVersion, MavlinkWriter};

// Stream index
pub mod index;

pub use index::{index_stream, CancelToken, TimeIndex};

// Time-series store
pub mod store;

pub use store::{Channel, Sample, SeekFrame, TimeSeriesStore};

// Seek/playback controller
pub mod playback;

pub use playback::{LoadReport, LogSource, PlaybackController, PlaybackState};
