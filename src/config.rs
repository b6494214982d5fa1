// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Session configuration.
//!
//! Every knob has a default, so a TOML file only needs the keys it changes:
//!
//! ```
//! use flightcodec::SessionConfig;
//!
//! let config = SessionConfig::from_toml_str("checkpoint_stride = 16").unwrap();
//! assert_eq!(config.checkpoint_stride, 16);
//! assert_eq!(config.frame_rate_hz, 30.0);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DecodeError, Result};

/// Tunables for loading, indexing and playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Records of one message source between time-index checkpoints.
    /// Smaller strides seek faster and use more memory.
    pub checkpoint_stride: usize,
    /// Leading bytes the format detector may inspect.
    pub detect_window: usize,
    /// Bytes a single resynchronization scan may inspect before giving up.
    pub max_resync_scan: usize,
    /// Playback frame cadence.
    pub frame_rate_hz: f64,
    /// Records decoded between checks for a superseding load.
    pub cancel_check_interval: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            checkpoint_stride: 64,
            detect_window: 4096,
            max_resync_scan: 1024 * 1024, // 1MB
            frame_rate_hz: 30.0,
            cancel_check_interval: 4096,
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SessionConfig =
            toml::from_str(text).map_err(|e| DecodeError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Set the checkpoint stride.
    pub fn with_checkpoint_stride(mut self, stride: usize) -> Self {
        self.checkpoint_stride = stride;
        self
    }

    /// Set the detection window.
    pub fn with_detect_window(mut self, bytes: usize) -> Self {
        self.detect_window = bytes;
        self
    }

    /// Set the resynchronization scan bound.
    pub fn with_max_resync_scan(mut self, bytes: usize) -> Self {
        self.max_resync_scan = bytes;
        self
    }

    /// Set the playback frame rate.
    pub fn with_frame_rate(mut self, hz: f64) -> Self {
        self.frame_rate_hz = hz;
        self
    }

    /// Set the cancellation check interval.
    pub fn with_cancel_check_interval(mut self, records: usize) -> Self {
        self.cancel_check_interval = records;
        self
    }

    /// Duration of one playback frame.
    ///
    /// Fails with `InvalidConfig` unless the frame rate is a positive,
    /// finite number whose period is representable.
    pub fn frame_interval(&self) -> Result<Duration> {
        if !self.frame_rate_hz.is_finite() || self.frame_rate_hz <= 0.0 {
            return Err(DecodeError::invalid_config(format!(
                "frame_rate_hz must be a positive number, got {}",
                self.frame_rate_hz
            )));
        }
        let interval = Duration::try_from_secs_f64(1.0 / self.frame_rate_hz)
            .map_err(|e| DecodeError::invalid_config(format!("frame_rate_hz: {e}")))?;
        if interval.is_zero() {
            return Err(DecodeError::invalid_config(format!(
                "frame_rate_hz {} is too high",
                self.frame_rate_hz
            )));
        }
        Ok(interval)
    }

    /// Reject values no session can run with.
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_stride == 0 {
            return Err(DecodeError::invalid_config("checkpoint_stride must be > 0"));
        }
        if self.detect_window == 0 {
            return Err(DecodeError::invalid_config("detect_window must be > 0"));
        }
        if self.max_resync_scan == 0 {
            return Err(DecodeError::invalid_config("max_resync_scan must be > 0"));
        }
        self.frame_interval()?;
        if self.cancel_check_interval == 0 {
            return Err(DecodeError::invalid_config(
                "cancel_check_interval must be > 0",
            ));
        }
        Ok(())
    }
}
