// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Log format implementations.
//!
//! - [`dataflash`]: ArduPilot self-describing binary logs
//! - [`mavlink`]: MAVLink telemetry, raw or tlog-framed

pub mod dataflash;
pub mod mavlink;
pub mod resync;

pub use resync::{scan_forward, Resync};
