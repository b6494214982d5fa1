// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The decoder seam shared by both log formats.
//!
//! A decoder is a forward iterator over [`DecodedMessage`]s borrowed from a
//! [`RawLog`](crate::io::RawLog) buffer. Recoverable problems never end the
//! iteration; they accumulate in the decoder's [`WarningLog`], which the
//! indexer collects once the stream is drained.
//!
//! # Example
//!
//! ```no_run
//! use flightcodec::io::traits::MessageDecoder;
//!
//! fn count(decoder: &mut dyn MessageDecoder) -> usize {
//!     let mut n = 0;
//!     while decoder.next_message().is_some() {
//!         n += 1;
//!     }
//!     n
//! }
//! ```

use chrono::{DateTime, Utc};

use crate::core::DecodedMessage;

use super::metadata::LogFormat;
use super::warnings::WarningLog;

/// Forward decoder over one log buffer.
pub trait MessageDecoder: Send {
    /// Format this decoder reads.
    fn format(&self) -> LogFormat;

    /// Decode the next record, skipping anything unrecoverable.
    ///
    /// Returns `None` once the buffer is exhausted.
    fn next_message(&mut self) -> Option<DecodedMessage>;

    /// Byte offset the next record will be read from.
    fn position(&self) -> usize;

    /// Take the warnings recorded so far.
    fn take_warnings(&mut self) -> WarningLog;

    /// UTC time of log time zero, once known.
    fn wall_clock_start(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Blanket iterator adapter over any decoder.
pub struct Messages<'d, D: ?Sized> {
    decoder: &'d mut D,
}

impl<'d, D: MessageDecoder + ?Sized> Iterator for Messages<'d, D> {
    type Item = DecodedMessage;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_message()
    }
}

/// Extension methods for decoders.
pub trait MessageDecoderExt: MessageDecoder {
    /// Iterate the remaining messages.
    fn messages(&mut self) -> Messages<'_, Self> {
        Messages { decoder: self }
    }
}

impl<D: MessageDecoder + ?Sized> MessageDecoderExt for D {}
