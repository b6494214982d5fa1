// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Time-series store.
//!
//! The queryable result of one load: every numeric field of every message
//! source as a channel of `(timestamp, value)` samples, plus the time index
//! used to seek. A store is immutable once built and is shared between
//! threads behind an `Arc`.
//!
//! Within a channel, timestamps never decrease. Samples with equal timestamps
//! keep arrival order, and a seek to that timestamp yields the last of them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::PrimitiveType;
use crate::index::TimeIndex;
use crate::io::metadata::{ChannelId, ChannelMeta, LogFormat};
use crate::io::warnings::DecodeWarning;
use crate::{DecodeError, Result};

/// One channel sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Log-relative timestamp (µs)
    pub timestamp_us: u64,
    /// Scaled value
    pub value: f64,
}

/// One field's time series, stored column-wise.
#[derive(Debug, Clone)]
pub struct Channel {
    id: ChannelId,
    primitive: PrimitiveType,
    scale: f64,
    source: usize,
    timestamps: Vec<u64>,
    values: Vec<f64>,
}

impl Channel {
    pub(crate) fn new(id: ChannelId, primitive: PrimitiveType, scale: f64, source: usize) -> Self {
        Self {
            id,
            primitive,
            scale,
            source,
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, timestamp_us: u64, value: f64) {
        debug_assert!(self.timestamps.last().map_or(true, |&t| t <= timestamp_us));
        self.timestamps.push(timestamp_us);
        self.values.push(value);
    }

    /// Channel identity.
    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    /// Index of the message source in the time index.
    pub fn source(&self) -> usize {
        self.source
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the channel has no samples.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sample timestamps.
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Sample values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sample at a position.
    pub fn sample(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            timestamp_us: *self.timestamps.get(index)?,
            value: self.values[index],
        })
    }

    /// First sample.
    pub fn first(&self) -> Option<Sample> {
        self.sample(0)
    }

    /// Last sample.
    pub fn last(&self) -> Option<Sample> {
        self.len().checked_sub(1).and_then(|i| self.sample(i))
    }

    /// Latest sample at or before `t` by full linear scan.
    ///
    /// O(n) reference used to check indexed seeks.
    pub fn latest_linear(&self, t: u64) -> Option<Sample> {
        let mut found = None;
        for (i, &ts) in self.timestamps.iter().enumerate() {
            if ts <= t {
                found = Some(i);
            }
        }
        found.and_then(|i| self.sample(i))
    }

    /// Samples with `t0 <= timestamp <= t1`.
    pub fn range(&self, t0: u64, t1: u64) -> SampleRange<'_> {
        if t0 > t1 {
            return SampleRange {
                timestamps: &[],
                values: &[],
            };
        }
        let lo = self.timestamps.partition_point(|&ts| ts < t0);
        let hi = self.timestamps.partition_point(|&ts| ts <= t1);
        SampleRange {
            timestamps: &self.timestamps[lo..hi],
            values: &self.values[lo..hi],
        }
    }

    /// Description for the visualization layer.
    pub fn meta(&self) -> ChannelMeta {
        ChannelMeta {
            id: self.id.clone(),
            primitive: self.primitive,
            scale: self.scale,
            sample_count: self.len(),
            first_us: self.timestamps.first().copied(),
            last_us: self.timestamps.last().copied(),
        }
    }
}

/// Borrowed run of consecutive samples.
#[derive(Debug, Clone, Copy)]
pub struct SampleRange<'a> {
    timestamps: &'a [u64],
    values: &'a [f64],
}

impl<'a> SampleRange<'a> {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Iterate samples in time order.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + 'a {
        self.timestamps
            .iter()
            .zip(self.values)
            .map(|(&timestamp_us, &value)| Sample {
                timestamp_us,
                value,
            })
    }

    /// Copy into a vector.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.iter().collect()
    }
}

/// Per-channel result of a seek, in store channel order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeekFrame {
    /// Requested time
    pub timestamp_us: u64,
    /// Latest sample at or before the requested time, per channel
    pub samples: Vec<Option<Sample>>,
}

/// Decoded, queryable log.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    format: LogFormat,
    channels: Vec<Channel>,
    lookup: HashMap<ChannelId, usize>,
    index: TimeIndex,
    record_count: u64,
    wall_clock_start: Option<DateTime<Utc>>,
    warnings: Vec<DecodeWarning>,
}

impl TimeSeriesStore {
    pub(crate) fn from_parts(
        format: LogFormat,
        channels: Vec<Channel>,
        index: TimeIndex,
        record_count: u64,
        wall_clock_start: Option<DateTime<Utc>>,
        warnings: Vec<DecodeWarning>,
    ) -> Self {
        let lookup = channels
            .iter()
            .enumerate()
            .map(|(slot, channel)| (channel.id.clone(), slot))
            .collect();
        Self {
            format,
            channels,
            lookup,
            index,
            record_count,
            wall_clock_start,
            warnings,
        }
    }

    /// Format of the source log.
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// All channels, in first-seen order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Look up a channel.
    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.lookup.get(id).map(|&slot| &self.channels[slot])
    }

    /// Position of a channel in [`channels`](Self::channels).
    pub fn slot(&self, id: &ChannelId) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    /// Channel descriptions.
    pub fn channel_metas(&self) -> Vec<ChannelMeta> {
        self.channels.iter().map(Channel::meta).collect()
    }

    /// The time index.
    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// Records decoded from the log.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Earliest sample time over all channels.
    pub fn start_us(&self) -> Option<u64> {
        self.channels.iter().filter_map(|c| c.timestamps.first()).min().copied()
    }

    /// Latest sample time over all channels.
    pub fn end_us(&self) -> Option<u64> {
        self.channels.iter().filter_map(|c| c.timestamps.last()).max().copied()
    }

    /// Time covered by samples.
    pub fn duration_us(&self) -> u64 {
        match (self.start_us(), self.end_us()) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }

    /// UTC time of log time zero, when the log carries one.
    pub fn wall_clock_start(&self) -> Option<DateTime<Utc>> {
        self.wall_clock_start
    }

    /// Non-fatal problems met while decoding.
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Latest sample at or before `t` for every channel.
    pub fn seek(&self, t: u64) -> SeekFrame {
        SeekFrame {
            timestamp_us: t,
            samples: (0..self.channels.len())
                .map(|slot| self.seek_slot(slot, t))
                .collect(),
        }
    }

    /// Same result as [`seek`](Self::seek) by full linear scan of every channel.
    pub fn seek_linear(&self, t: u64) -> SeekFrame {
        SeekFrame {
            timestamp_us: t,
            samples: self.channels.iter().map(|c| c.latest_linear(t)).collect(),
        }
    }

    /// Pair a frame's samples with their channel ids.
    pub fn frame_entries<'a>(
        &'a self,
        frame: &'a SeekFrame,
    ) -> impl Iterator<Item = (&'a ChannelId, Option<Sample>)> + 'a {
        self.channels
            .iter()
            .zip(&frame.samples)
            .map(|(channel, sample)| (&channel.id, *sample))
    }

    /// Latest sample at or before `t` for one channel.
    pub fn value_at(&self, id: &ChannelId, t: u64) -> Result<Option<Sample>> {
        let slot = self
            .slot(id)
            .ok_or_else(|| DecodeError::UnknownChannel(id.to_string()))?;
        Ok(self.seek_slot(slot, t))
    }

    /// Samples of one channel with `t0 <= timestamp <= t1`.
    pub fn channel_samples(&self, id: &ChannelId, t0: u64, t1: u64) -> Result<SampleRange<'_>> {
        let channel = self
            .channel(id)
            .ok_or_else(|| DecodeError::UnknownChannel(id.to_string()))?;
        Ok(channel.range(t0, t1))
    }

    /// Checkpoint lookup followed by a forward scan of at most one stride.
    fn seek_slot(&self, slot: usize, t: u64) -> Option<Sample> {
        let channel = &self.channels[slot];
        let start = self.index.scan_start(channel.source, slot, t)?;
        let ts = &channel.timestamps;
        let mut end = start;
        while end < ts.len() && ts[end] <= t {
            end += 1;
        }
        end.checked_sub(1).and_then(|i| channel.sample(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(samples: &[(u64, f64)]) -> Channel {
        let mut ch = Channel::new(ChannelId::new("ALT", "alt"), PrimitiveType::Float32, 1.0, 0);
        for &(t, v) in samples {
            ch.push(t, v);
        }
        ch
    }

    #[test]
    fn test_range_is_inclusive() {
        let ch = channel(&[(100, 1.0), (200, 2.0), (300, 3.0), (400, 4.0)]);
        let range: Vec<_> = ch.range(200, 300).iter().map(|s| s.value).collect();
        assert_eq!(range, vec![2.0, 3.0]);
        assert!(ch.range(301, 399).is_empty());
        assert!(ch.range(300, 200).is_empty());
        assert_eq!(ch.range(0, u64::MAX).len(), 4);
    }

    #[test]
    fn test_latest_linear_prefers_last_tie() {
        let ch = channel(&[(100, 1.0), (200, 2.0), (200, 2.5), (300, 3.0)]);
        assert_eq!(ch.latest_linear(99), None);
        assert_eq!(ch.latest_linear(200).map(|s| s.value), Some(2.5));
        assert_eq!(ch.latest_linear(1_000).map(|s| s.value), Some(3.0));
    }

    #[test]
    fn test_meta() {
        let ch = channel(&[(100, 1.0), (300, 3.0)]);
        let meta = ch.meta();
        assert_eq!(meta.sample_count, 2);
        assert_eq!(meta.first_us, Some(100));
        assert_eq!(meta.last_us, Some(300));
        assert_eq!(ch.first().map(|s| s.value), Some(1.0));
        assert_eq!(ch.last().map(|s| s.value), Some(3.0));
    }
}
