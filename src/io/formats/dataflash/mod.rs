// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ArduPilot dataflash (`.bin`) log support.
//!
//! Dataflash logs are self-describing: `FMT` records define the layout of
//! every other message type, so the decoder builds its layout table while it
//! walks the stream.

pub mod constants;
pub mod decoder;
pub mod layout;
pub mod writer;

pub use constants::{FMT_TYPE, LOG_SIGNATURE, RECORD_MARKER};
pub use decoder::{gps_to_utc, DataflashDecoder, LayoutTable};
pub use layout::{field_for_code, FormatDefinition};
pub use writer::DataflashWriter;
