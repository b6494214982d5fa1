// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MAVLink telemetry support.
//!
//! - [`decoder`]: frame parser and stream decoder (v1/v2, raw or tlog)
//! - [`dictionary`]: compiled-in message layouts and CRC extra bytes
//! - [`writer`]: frame writer used for fixtures and re-encoding

pub mod constants;
pub mod crc;
pub mod decoder;
pub mod dictionary;
pub mod writer;

pub use constants::{MavlinkVersion, MAVLINK_V1_STX, MAVLINK_V2_STX};
pub use decoder::{Frame, MavlinkDecoder};
pub use dictionary::{MavlinkDictionary, MessageEntry};
pub use writer::MavlinkWriter;
