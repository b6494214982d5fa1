// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message stream index.
//!
//! One forward pass over the decoded stream builds the channels of a
//! [`TimeSeriesStore`] and, per message source, a list of checkpoints taken
//! every `checkpoint_stride` records of that source. A checkpoint remembers
//! the record's timestamp, its byte offset and ordinal in the stream, and how
//! many samples each of the source's channels held just before the record.
//!
//! A seek binary-searches the source's checkpoints for the last one at or
//! before the target and scans forward from the saved sample position, so it
//! never looks at more than one stride of samples.
//!
//! A message source is a message type plus its instance (dataflash instance
//! column or MAVLink system/component). Timestamps are clamped to be
//! non-decreasing within a source; each clamp is reported as a clock
//! regression.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::core::{DecodedMessage, FieldLayout, InstanceKey};
use crate::io::metadata::{ChannelId, LogFormat};
use crate::io::traits::MessageDecoder;
use crate::io::warnings::WarningLog;
use crate::store::{Channel, TimeSeriesStore};
use crate::{DecodeError, Result, SessionConfig};

/// Shared view of the latest load generation.
///
/// A load holding a token whose generation is no longer the latest has been
/// superseded and should stop.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl CancelToken {
    /// Create a token for `generation`, watching `latest`.
    pub fn new(generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self { generation, latest }
    }

    /// Generation this token belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a newer load has started.
    pub fn is_cancelled(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.generation
    }
}

/// One index entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Timestamp of the checkpointed record
    pub timestamp_us: u64,
    /// Byte offset of the record in the raw log
    pub offset: usize,
    /// Ordinal of the record in the decoded stream
    pub ordinal: u64,
    /// `(channel slot, sample count)` pairs, sorted by slot
    positions: Vec<(usize, usize)>,
}

impl Checkpoint {
    /// Samples the channel held before the checkpointed record.
    ///
    /// `None` when the channel did not exist yet.
    pub fn position_of(&self, slot: usize) -> Option<usize> {
        self.positions
            .binary_search_by_key(&slot, |&(s, _)| s)
            .ok()
            .map(|i| self.positions[i].1)
    }
}

/// Checkpoints of one message source.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    /// Message type name
    pub message: String,
    /// Source instance
    pub instance: Option<InstanceKey>,
    /// Records seen from this source
    pub records: u64,
    checkpoints: Vec<Checkpoint>,
}

impl SourceIndex {
    /// Checkpoints in stream order.
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Display label, e.g. `GPS[0]`.
    pub fn label(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}[{}]", self.message, instance),
            None => self.message.clone(),
        }
    }
}

/// Per-source checkpoint table.
#[derive(Debug, Clone)]
pub struct TimeIndex {
    stride: usize,
    sources: Vec<SourceIndex>,
}

impl TimeIndex {
    /// Records per checkpoint.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// All sources.
    pub fn sources(&self) -> &[SourceIndex] {
        &self.sources
    }

    /// Total checkpoints over all sources.
    pub fn checkpoint_count(&self) -> usize {
        self.sources.iter().map(|s| s.checkpoints.len()).sum()
    }

    /// Sample position to start a seek scan from.
    ///
    /// Returns `None` when `t` precedes the source's first record, which
    /// means the channel has no sample at or before `t`.
    pub fn scan_start(&self, source: usize, slot: usize, t: u64) -> Option<usize> {
        let checkpoints = &self.sources.get(source)?.checkpoints;
        let k = checkpoints.partition_point(|cp| cp.timestamp_us <= t);
        let checkpoint = checkpoints.get(k.checked_sub(1)?)?;
        Some(checkpoint.position_of(slot).unwrap_or(0))
    }
}

struct SourceState {
    index: SourceIndex,
    label: String,
    last_timestamp: Option<u64>,
    /// Channel slots of this source, in creation order
    slots: Vec<usize>,
    /// Layout the field mapping below was built for
    layout: Option<Arc<FieldLayout>>,
    /// Channel slot per layout field
    field_slots: Vec<Option<usize>>,
}

/// Single-pass builder of a [`TimeSeriesStore`].
pub struct StreamIndexer {
    stride: u64,
    channels: Vec<Channel>,
    channel_lookup: HashMap<ChannelId, usize>,
    sources: Vec<SourceState>,
    source_lookup: HashMap<String, HashMap<Option<InstanceKey>, usize>>,
    warnings: WarningLog,
    records: u64,
}

impl StreamIndexer {
    /// Create an indexer.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            stride: config.checkpoint_stride.max(1) as u64,
            channels: Vec::new(),
            channel_lookup: HashMap::new(),
            sources: Vec::new(),
            source_lookup: HashMap::new(),
            warnings: WarningLog::new(),
            records: 0,
        }
    }

    /// Records pushed so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Index one message.
    pub fn push(&mut self, message: &DecodedMessage) {
        self.records += 1;
        if !message.layout.fields.iter().any(|f| f.is_channel()) {
            return;
        }

        let source = self.source_for(message);
        let state = &mut self.sources[source];

        let mut timestamp = message.timestamp_us;
        if let Some(last) = state.last_timestamp {
            if timestamp < last {
                trace!(
                    source = %state.label,
                    timestamp,
                    last,
                    "clamping regressed timestamp"
                );
                self.warnings.record_clock_regression(&state.label);
                timestamp = last;
            }
        }
        state.last_timestamp = Some(timestamp);

        let layout_changed = !state
            .layout
            .as_ref()
            .is_some_and(|l| Arc::ptr_eq(l, &message.layout));
        if layout_changed {
            state.field_slots.clear();
            for field in &message.layout.fields {
                if !field.is_channel() {
                    state.field_slots.push(None);
                    continue;
                }
                let id = ChannelId {
                    message: message.name().to_string(),
                    instance: message.instance,
                    field: field.name.clone(),
                };
                let slot = match self.channel_lookup.get(&id) {
                    Some(&slot) => slot,
                    None => {
                        let slot = self.channels.len();
                        self.channels
                            .push(Channel::new(id.clone(), field.primitive, field.scale, source));
                        self.channel_lookup.insert(id, slot);
                        state.slots.push(slot);
                        slot
                    }
                };
                state.field_slots.push(Some(slot));
            }
            state.layout = Some(message.layout.clone());
        }

        if state.index.records % self.stride == 0 {
            let mut positions: Vec<(usize, usize)> = state
                .slots
                .iter()
                .map(|&slot| (slot, self.channels[slot].len()))
                .collect();
            positions.sort_unstable_by_key(|&(slot, _)| slot);
            state.index.checkpoints.push(Checkpoint {
                timestamp_us: timestamp,
                offset: message.offset,
                ordinal: self.records - 1,
                positions,
            });
        }
        state.index.records += 1;

        for (field, (value, slot)) in message
            .layout
            .fields
            .iter()
            .zip(message.values.iter().zip(&state.field_slots))
        {
            let (Some(slot), Some(raw)) = (slot, value.as_f64()) else {
                continue;
            };
            let value = if field.scale == 1.0 {
                raw
            } else {
                raw * field.scale
            };
            self.channels[*slot].push(timestamp, value);
        }
    }

    fn source_for(&mut self, message: &DecodedMessage) -> usize {
        if let Some(&idx) = self
            .source_lookup
            .get(message.name())
            .and_then(|by_instance| by_instance.get(&message.instance))
        {
            return idx;
        }
        let idx = self.sources.len();
        let index = SourceIndex {
            message: message.name().to_string(),
            instance: message.instance,
            records: 0,
            checkpoints: Vec::new(),
        };
        self.sources.push(SourceState {
            label: index.label(),
            index,
            last_timestamp: None,
            slots: Vec::new(),
            layout: None,
            field_slots: Vec::new(),
        });
        self.source_lookup
            .entry(message.name().to_string())
            .or_default()
            .insert(message.instance, idx);
        idx
    }

    /// Finish the pass and build the store.
    pub fn finish(
        self,
        format: LogFormat,
        mut warnings: WarningLog,
        wall_clock_start: Option<DateTime<Utc>>,
    ) -> TimeSeriesStore {
        warnings.merge(self.warnings);
        let index = TimeIndex {
            stride: self.stride as usize,
            sources: self.sources.into_iter().map(|s| s.index).collect(),
        };
        debug!(
            records = self.records,
            channels = self.channels.len(),
            sources = index.sources.len(),
            checkpoints = index.checkpoint_count(),
            "index built"
        );
        TimeSeriesStore::from_parts(
            format,
            self.channels,
            index,
            self.records,
            wall_clock_start,
            warnings.into_warnings(),
        )
    }
}

/// Drain a decoder into a store.
///
/// With a token, the pass checks every `cancel_check_interval` records
/// whether it was superseded and stops with `Superseded` if so.
pub fn index_stream(
    decoder: &mut dyn MessageDecoder,
    config: &SessionConfig,
    cancel: Option<&CancelToken>,
) -> Result<TimeSeriesStore> {
    let interval = config.cancel_check_interval.max(1) as u64;
    let superseded = |token: &CancelToken| {
        warn!(generation = token.generation(), "load superseded, stopping decode");
        DecodeError::Superseded {
            generation: token.generation(),
        }
    };

    if let Some(token) = cancel.filter(|t| t.is_cancelled()) {
        return Err(superseded(token));
    }

    let mut indexer = StreamIndexer::new(config);
    while let Some(message) = decoder.next_message() {
        indexer.push(&message);
        if indexer.records() % interval == 0 {
            if let Some(token) = cancel.filter(|t| t.is_cancelled()) {
                return Err(superseded(token));
            }
        }
    }
    Ok(indexer.finish(
        decoder.format(),
        decoder.take_warnings(),
        decoder.wall_clock_start(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldDef, FieldRole, FieldValue, PrimitiveType, TimeUnit};
    use crate::io::warnings::DecodeWarning;

    fn layout() -> Arc<FieldLayout> {
        Arc::new(FieldLayout::new(
            1,
            "BARO",
            vec![
                FieldDef::scalar("TimeUS", PrimitiveType::UInt64)
                    .with_role(FieldRole::Timestamp(TimeUnit::Micros)),
                FieldDef::scalar("Alt", PrimitiveType::Int32).with_scale(0.01),
            ],
        ))
    }

    fn message(layout: &Arc<FieldLayout>, t: u64, alt: i32, instance: Option<u8>) -> DecodedMessage {
        DecodedMessage {
            layout: layout.clone(),
            timestamp_us: t,
            instance: instance.map(InstanceKey::Index),
            offset: t as usize,
            values: vec![FieldValue::UInt64(t), FieldValue::Int32(alt)],
        }
    }

    fn build(messages: &[DecodedMessage], stride: usize) -> TimeSeriesStore {
        let config = SessionConfig::default().with_checkpoint_stride(stride);
        let mut indexer = StreamIndexer::new(&config);
        for m in messages {
            indexer.push(m);
        }
        indexer.finish(LogFormat::Dataflash, WarningLog::new(), None)
    }

    #[test]
    fn test_scale_applied_and_time_field_excluded() {
        let l = layout();
        let store = build(&[message(&l, 10, 1250, None)], 4);
        assert_eq!(store.channels().len(), 1);
        let ch = &store.channels()[0];
        assert_eq!(ch.id().to_string(), "BARO.Alt");
        assert_eq!(ch.values(), &[12.5]);
    }

    #[test]
    fn test_checkpoints_every_stride() {
        let l = layout();
        let messages: Vec<_> = (0..10).map(|i| message(&l, i * 10, i as i32, None)).collect();
        let store = build(&messages, 4);
        let source = &store.index().sources()[0];
        let stamps: Vec<_> = source.checkpoints().iter().map(|c| c.timestamp_us).collect();
        assert_eq!(stamps, vec![0, 40, 80]);
        assert_eq!(source.checkpoints()[1].position_of(0), Some(4));
        assert_eq!(source.records, 10);
    }

    #[test]
    fn test_instances_split_sources() {
        let l = layout();
        let store = build(
            &[
                message(&l, 10, 1, Some(0)),
                message(&l, 10, 2, Some(1)),
                message(&l, 20, 3, Some(0)),
            ],
            64,
        );
        let names: Vec<_> = store.channels().iter().map(|c| c.id().to_string()).collect();
        assert_eq!(names, vec!["BARO[0].Alt", "BARO[1].Alt"]);
        assert_eq!(store.index().sources().len(), 2);
        assert_eq!(store.channels()[0].len(), 2);
    }

    #[test]
    fn test_regression_is_clamped() {
        let l = layout();
        let store = build(
            &[message(&l, 100, 1, None), message(&l, 90, 2, None), message(&l, 120, 3, None)],
            64,
        );
        assert_eq!(store.channels()[0].timestamps(), &[100, 100, 120]);
        assert!(store.warnings().contains(&DecodeWarning::ClockRegressions {
            source: "BARO".to_string(),
            count: 1
        }));
    }

    #[test]
    fn test_seek_uses_checkpoints() {
        let l = layout();
        let messages: Vec<_> = (1..=100)
            .map(|i| message(&l, i * 10, i as i32 * 100, None))
            .collect();
        let store = build(&messages, 8);
        let id = ChannelId::new("BARO", "Alt");
        assert_eq!(store.value_at(&id, 5).unwrap(), None);
        assert_eq!(store.value_at(&id, 10).unwrap().map(|s| s.value), Some(1.0));
        assert_eq!(store.value_at(&id, 555).unwrap().map(|s| s.value), Some(55.0));
        assert_eq!(store.value_at(&id, 99_999).unwrap().map(|s| s.value), Some(100.0));
        for t in 0..1_100 {
            assert_eq!(store.seek(t), store.seek_linear(t), "t = {t}");
        }
    }

    #[test]
    fn test_cancel_token() {
        let latest = Arc::new(AtomicU64::new(1));
        let token = CancelToken::new(1, latest.clone());
        assert!(!token.is_cancelled());
        latest.store(2, Ordering::Release);
        assert!(token.is_cancelled());
    }
}
