// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Seek/playback controller.
//!
//! The controller owns at most one loaded [`TimeSeriesStore`] and moves
//! through `Idle -> Loading -> Loaded <-> Seeking`. `Seeking` only lasts for
//! the duration of a [`PlaybackController::seek`] call, so callers observe
//! `Idle`, `Loading` or `Loaded` between calls. Loads can run on a
//! background thread; each load takes a new generation number and a result
//! whose generation is no longer the latest is dropped.
//!
//! Playback is a virtual clock advanced by the caller with wall time. Frames
//! are produced at a fixed cadence regardless of how much time passes between
//! calls, so a slow caller skips frames rather than queueing them.

pub mod loader;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use tracing::{debug, trace, warn};

use crate::index::CancelToken;
use crate::io::metadata::{ChannelId, ChannelMeta};
use crate::store::{Sample, SampleRange, SeekFrame, TimeSeriesStore};
use crate::{DecodeError, Result, SessionConfig};

pub use loader::{load_log, load_source, LoadReport, LogSource};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded
    Idle,
    /// A load of the given generation is in flight
    Loading {
        /// Generation of the pending load
        generation: u64,
    },
    /// A store is loaded and queryable
    Loaded,
    /// A seek is being resolved
    ///
    /// Internal to [`PlaybackController::seek`]; the controller is back in
    /// `Loaded` when the call returns.
    Seeking,
}

struct PendingLoad {
    generation: u64,
    receiver: Receiver<(u64, Result<TimeSeriesStore>)>,
}

/// Drives loading, seeking and playback for one log at a time.
pub struct PlaybackController {
    config: SessionConfig,
    state: PlaybackState,
    store: Option<Arc<TimeSeriesStore>>,
    latest_generation: Arc<AtomicU64>,
    pending: Option<PendingLoad>,
    position_us: u64,
    rate: f64,
    playing: bool,
    accumulated: Duration,
}

impl PlaybackController {
    /// Create an idle controller.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: PlaybackState::Idle,
            store: None,
            latest_generation: Arc::new(AtomicU64::new(0)),
            pending: None,
            position_us: 0,
            rate: 1.0,
            playing: false,
            accumulated: Duration::ZERO,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Generation of the most recent load request.
    pub fn generation(&self) -> u64 {
        self.latest_generation.load(Ordering::Acquire)
    }

    /// Shared handle to the loaded store, for concurrent readers.
    pub fn store(&self) -> Option<Arc<TimeSeriesStore>> {
        self.store.clone()
    }

    /// Channel descriptions of the loaded log; empty when nothing is loaded.
    pub fn channels(&self) -> Vec<ChannelMeta> {
        self.store
            .as_ref()
            .map(|s| s.channel_metas())
            .unwrap_or_default()
    }

    /// Start a new generation, invalidating any in-flight load and the
    /// current store.
    fn begin_generation(&mut self) -> u64 {
        let generation = self.latest_generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(pending) = self.pending.take() {
            debug!(
                superseded = pending.generation,
                generation, "superseding in-flight load"
            );
        }
        self.store = None;
        self.reset_playback(0);
        generation
    }

    fn reset_playback(&mut self, position_us: u64) {
        self.position_us = position_us;
        self.playing = false;
        self.rate = 1.0;
        self.accumulated = Duration::ZERO;
    }

    fn install(&mut self, store: TimeSeriesStore) -> LoadReport {
        let report = LoadReport::from_store(&store);
        self.reset_playback(store.start_us().unwrap_or(0));
        self.store = Some(Arc::new(store));
        self.state = PlaybackState::Loaded;
        report
    }

    /// Load on the calling thread.
    ///
    /// On failure the controller is left idle with no channels.
    pub fn load(&mut self, source: impl Into<LogSource>) -> Result<LoadReport> {
        let generation = self.begin_generation();
        self.state = PlaybackState::Loading { generation };
        let token = CancelToken::new(generation, self.latest_generation.clone());
        match load_source(source.into(), &self.config, Some(&token)) {
            Ok(store) => Ok(self.install(store)),
            Err(err) => {
                self.state = PlaybackState::Idle;
                Err(err)
            }
        }
    }

    /// Start a load on a worker thread and return its generation.
    ///
    /// Completion is delivered through [`poll_load`](Self::poll_load) or
    /// [`wait_load`](Self::wait_load).
    pub fn load_async(&mut self, source: impl Into<LogSource>) -> Result<u64> {
        let generation = self.begin_generation();
        let token = CancelToken::new(generation, self.latest_generation.clone());
        let config = self.config.clone();
        let source = source.into();
        let (sender, receiver) = bounded(1);

        thread::Builder::new()
            .name(format!("flightcodec-load-{generation}"))
            .spawn(move || {
                let result = load_source(source, &config, Some(&token));
                // Receiver is gone when a newer load replaced this one.
                let _ = sender.send((generation, result));
            })
            .map_err(|e| {
                self.state = PlaybackState::Idle;
                DecodeError::Io(format!("failed to spawn load worker: {e}"))
            })?;

        self.pending = Some(PendingLoad {
            generation,
            receiver,
        });
        self.state = PlaybackState::Loading { generation };
        Ok(generation)
    }

    /// Collect a finished background load without blocking.
    ///
    /// `None` while the load is still running or when none is pending.
    pub fn poll_load(&mut self) -> Option<Result<LoadReport>> {
        let pending = self.pending.as_ref()?;
        match pending.receiver.try_recv() {
            Ok((generation, result)) => self.complete(generation, result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.worker_lost()),
        }
    }

    /// Block until the pending background load finishes.
    pub fn wait_load(&mut self) -> Option<Result<LoadReport>> {
        let pending = self.pending.as_ref()?;
        match pending.receiver.recv() {
            Ok((generation, result)) => self.complete(generation, result),
            Err(_) => Some(self.worker_lost()),
        }
    }

    fn complete(
        &mut self,
        generation: u64,
        result: Result<TimeSeriesStore>,
    ) -> Option<Result<LoadReport>> {
        self.pending = None;
        if generation != self.generation() {
            debug!(generation, latest = self.generation(), "discarding stale load result");
            return None;
        }
        match result {
            Ok(store) => Some(Ok(self.install(store))),
            Err(err) => {
                self.state = PlaybackState::Idle;
                Some(Err(err))
            }
        }
    }

    fn worker_lost(&mut self) -> Result<LoadReport> {
        let generation = self.pending.take().map(|p| p.generation).unwrap_or(0);
        warn!(generation, "load worker exited without a result");
        self.state = PlaybackState::Idle;
        Err(DecodeError::Io(format!(
            "load worker for generation {generation} exited without a result"
        )))
    }

    /// Drop the loaded store and cancel any in-flight load.
    pub fn unload(&mut self) {
        self.begin_generation();
        self.state = PlaybackState::Idle;
    }

    fn loaded(&self) -> Result<&TimeSeriesStore> {
        match (&self.store, self.state) {
            (Some(store), PlaybackState::Loaded | PlaybackState::Seeking) => Ok(store),
            _ => Err(DecodeError::NotLoaded),
        }
    }

    /// Resolve every channel at `t` and move the playhead there.
    pub fn seek(&mut self, t: u64) -> Result<SeekFrame> {
        let store = self.store.clone().ok_or(DecodeError::NotLoaded)?;
        if self.state != PlaybackState::Loaded {
            return Err(DecodeError::NotLoaded);
        }
        self.state = PlaybackState::Seeking;
        let frame = store.seek(t);
        self.position_us = t;
        self.accumulated = Duration::ZERO;
        self.state = PlaybackState::Loaded;
        trace!(t, channels = frame.samples.len(), "seek");
        Ok(frame)
    }

    /// Latest sample of one channel at or before `t`.
    pub fn value_at(&self, id: &ChannelId, t: u64) -> Result<Option<Sample>> {
        self.loaded()?.value_at(id, t)
    }

    /// Samples of one channel in `[t0, t1]` for chart rendering.
    pub fn channel_samples(&self, id: &ChannelId, t0: u64, t1: u64) -> Result<SampleRange<'_>> {
        self.loaded()?.channel_samples(id, t0, t1)
    }

    /// Playhead position (µs, log-relative).
    pub fn position(&self) -> u64 {
        self.position_us
    }

    /// Move the playhead without resolving channels.
    pub fn set_position(&mut self, t: u64) -> Result<()> {
        self.loaded()?;
        self.position_us = t;
        self.accumulated = Duration::ZERO;
        Ok(())
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playback rate (log time per wall time).
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Start playback at `rate`.
    pub fn play(&mut self, rate: f64) -> Result<()> {
        self.loaded()?;
        self.config.frame_interval()?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DecodeError::invalid_config(format!(
                "playback rate must be positive, got {rate}"
            )));
        }
        self.rate = rate;
        self.playing = true;
        self.accumulated = Duration::ZERO;
        Ok(())
    }

    /// Pause playback, keeping the playhead.
    pub fn pause(&mut self) {
        self.playing = false;
        self.accumulated = Duration::ZERO;
    }

    /// Advance the virtual clock by `elapsed` wall time.
    ///
    /// Returns the frame for the latest cadence tick that became due, or
    /// `None` if no tick is due yet. Playback stops at the end of the log
    /// after emitting the final frame.
    pub fn advance(&mut self, elapsed: Duration) -> Result<Option<SeekFrame>> {
        let store = self.loaded()?;
        if !self.playing {
            return Ok(None);
        }
        let interval = self.config.frame_interval()?;
        let accumulated = self.accumulated + elapsed;
        let ticks = accumulated.as_nanos() / interval.as_nanos().max(1);
        if ticks == 0 {
            self.accumulated = accumulated;
            return Ok(None);
        }

        let due = interval.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX));
        let end = store.end_us().unwrap_or(0);
        let step = (due.as_micros() as f64 * self.rate) as u64;
        let mut position = self.position_us.saturating_add(step);
        let mut finished = false;
        if position >= end {
            position = end;
            finished = true;
        }
        let frame = store.seek(position);

        self.accumulated = accumulated.saturating_sub(due);
        self.position_us = position;
        if finished {
            debug!(position, "playback reached end of log");
            self.pause();
        }
        Ok(Some(frame))
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
