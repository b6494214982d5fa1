// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for flight logs.
//!
//! This module provides log buffers, format detection and the per-format
//! decoders that turn raw bytes into [`DecodedMessage`](crate::DecodedMessage)s.

pub mod detection;
pub mod formats;
pub mod metadata;
pub mod raw;
pub mod warnings;

// Re-exports
pub use detection::{detect_format, Detection, FormatDetector};
pub use metadata::{ChannelId, ChannelMeta, LogFormat, MavlinkFraming};
pub use raw::RawLog;
pub use warnings::{DecodeWarning, GapReason, WarningLog};

// Decoder seam shared by both formats
pub mod traits;
pub use traits::{MessageDecoder, MessageDecoderExt};
