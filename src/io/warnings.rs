// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Non-fatal decode problems.
//!
//! Decoders record recoverable problems here instead of failing the load, so
//! that the caller can report "log partially decoded" alongside whatever
//! channels did decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Why a byte range was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    /// Bytes did not start with a valid record marker
    CorruptSync,
    /// Record of a dataflash type with no `FMT` definition yet
    MissingLayout,
    /// Record or frame cut off by the end of the buffer
    Truncated,
}

/// One entry of the warning summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeWarning {
    /// Skipped byte range `[start, end)`
    Gap {
        /// First skipped byte
        start: usize,
        /// One past the last skipped byte
        end: usize,
        /// Why the range was skipped
        reason: GapReason,
    },
    /// Frames dropped for checksum mismatch
    ChecksumFailures {
        /// Number of rejected frames
        count: u64,
    },
    /// Frames whose message id is not in the dictionary
    UnknownMessageIds {
        /// Frame count per message id
        counts: BTreeMap<u32, u64>,
    },
    /// `FMT` definition rejected
    InvalidLayout {
        /// Message type name
        name: String,
        /// Rejection reason
        reason: String,
    },
    /// Records whose timestamp went backwards within their source
    ClockRegressions {
        /// Source (message type and instance)
        source: String,
        /// Number of clamped records
        count: u64,
    },
}

/// Accumulator for decode warnings.
#[derive(Debug, Default, Clone)]
pub struct WarningLog {
    gaps: Vec<(usize, usize, GapReason)>,
    checksum_failures: u64,
    unknown_ids: BTreeMap<u32, u64>,
    invalid_layouts: Vec<(String, String)>,
    clock_regressions: BTreeMap<String, u64>,
}

impl WarningLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped range, merging it with the previous gap when adjacent.
    pub fn record_gap(&mut self, start: usize, end: usize, reason: GapReason) {
        if end <= start {
            return;
        }
        if let Some(last) = self.gaps.last_mut() {
            if last.2 == reason && last.1 == start {
                last.1 = end;
                return;
            }
        }
        self.gaps.push((start, end, reason));
    }

    /// Count a checksum failure.
    pub fn record_checksum_failure(&mut self) {
        self.checksum_failures += 1;
    }

    /// Count a frame with an unknown message id.
    pub fn record_unknown_id(&mut self, id: u32) {
        *self.unknown_ids.entry(id).or_insert(0) += 1;
    }

    /// Record a rejected format definition.
    pub fn record_invalid_layout(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.invalid_layouts.push((name.into(), reason.into()));
    }

    /// Count a clamped timestamp regression.
    pub fn record_clock_regression(&mut self, source: &str) {
        *self
            .clock_regressions
            .entry(source.to_string())
            .or_insert(0) += 1;
    }

    /// Number of checksum failures so far.
    pub fn checksum_failures(&self) -> u64 {
        self.checksum_failures
    }

    /// Total bytes skipped across all gaps.
    pub fn skipped_bytes(&self) -> usize {
        self.gaps.iter().map(|(s, e, _)| e - s).sum()
    }

    /// Check whether anything was recorded.
    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
            && self.checksum_failures == 0
            && self.unknown_ids.is_empty()
            && self.invalid_layouts.is_empty()
            && self.clock_regressions.is_empty()
    }

    /// Append everything recorded in `other`.
    pub fn merge(&mut self, other: WarningLog) {
        for (start, end, reason) in other.gaps {
            self.record_gap(start, end, reason);
        }
        self.checksum_failures += other.checksum_failures;
        for (id, count) in other.unknown_ids {
            *self.unknown_ids.entry(id).or_insert(0) += count;
        }
        self.invalid_layouts.extend(other.invalid_layouts);
        for (source, count) in other.clock_regressions {
            *self.clock_regressions.entry(source).or_insert(0) += count;
        }
    }

    /// Flatten into the summary list.
    pub fn into_warnings(self) -> Vec<DecodeWarning> {
        let mut out: Vec<DecodeWarning> = self
            .gaps
            .into_iter()
            .map(|(start, end, reason)| DecodeWarning::Gap { start, end, reason })
            .collect();
        if self.checksum_failures > 0 {
            out.push(DecodeWarning::ChecksumFailures {
                count: self.checksum_failures,
            });
        }
        if !self.unknown_ids.is_empty() {
            out.push(DecodeWarning::UnknownMessageIds {
                counts: self.unknown_ids,
            });
        }
        out.extend(
            self.invalid_layouts
                .into_iter()
                .map(|(name, reason)| DecodeWarning::InvalidLayout { name, reason }),
        );
        out.extend(
            self.clock_regressions
                .into_iter()
                .map(|(source, count)| DecodeWarning::ClockRegressions { source, count }),
        );
        out
    }
}
