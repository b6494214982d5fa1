// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Args};
use flightcodec::{DecodeWarning, LoadReport, PlaybackController, SessionConfig};
use regex::Regex;
use tracing_subscriber::EnvFilter;

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Options shared by every command.
#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Session configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Records per time-index checkpoint
    #[arg(long, value_name = "N", global = true)]
    pub stride: Option<usize>,
}

impl GlobalArgs {
    /// Build the session configuration from the file and flag overrides.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_file(path)?,
            None => SessionConfig::default(),
        };
        if let Some(stride) = self.stride {
            config = config.with_checkpoint_stride(stride);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` applies unless `-v` is given.
pub fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Spinner shown on an interactive stderr while a log decodes.
pub struct Spinner {
    inner: Option<indicatif::ProgressBar>,
}

impl Spinner {
    /// Create a spinner; hidden when stderr is not a terminal.
    pub fn new(message: impl Into<String>) -> Result<Self> {
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.set_style(
                indicatif::ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
            );
            pb.set_message(message.into());
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };
        Ok(Self { inner })
    }

    /// Remove the spinner.
    pub fn finish(&self) {
        if let Some(pb) = &self.inner {
            pb.finish_and_clear();
        }
    }
}

/// Decode a log file on a background worker and return the loaded controller.
pub fn load(path: &Path, config: SessionConfig) -> Result<(PlaybackController, LoadReport)> {
    let mut controller = PlaybackController::new(config);
    let generation = controller.load_async(path.to_path_buf())?;
    let spinner = Spinner::new(format!("Decoding {}", path.display()))?;
    let result = controller.wait_load();
    spinner.finish();
    let report = result
        .ok_or_else(|| anyhow::anyhow!("load generation {generation} was discarded"))??;
    Ok((controller, report))
}

/// Compile an optional channel filter.
pub fn channel_filter(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(p).map_err(|e| anyhow::anyhow!("Invalid filter '{p}': {e}")))
        .transpose()
}

/// Format a duration in microseconds to human-readable string.
pub fn format_duration(micros: u64) -> String {
    let secs = micros / 1_000_000;
    let millis = (micros % 1_000_000) / 1_000;

    if secs >= 3600 {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    } else if secs >= 60 {
        let minutes = secs / 60;
        let remaining_secs = secs % 60;
        format!("{}m {}s", minutes, remaining_secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

/// Parse a log-relative time to microseconds.
///
/// Accepts:
/// - Plain microseconds: "1500000"
/// - With a unit suffix: "1500ms", "1.5s", "250us"
pub fn parse_time(s: &str) -> CliResult<u64> {
    let s = s.trim();
    let (number, scale) = if let Some(n) = s.strip_suffix("us") {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix("ms") {
        (n, 1e3)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1e6)
    } else {
        (s, 1.0)
    };

    if scale == 1.0 {
        if let Ok(us) = number.parse::<u64>() {
            return Ok(us);
        }
    }
    match number.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok((v * scale).round() as u64),
        _ => Err(anyhow::anyhow!("Invalid time: {s}")),
    }
}

/// Parse a time range string.
///
/// Formats: "start,end" or "start:end"
pub fn parse_time_range(s: &str) -> CliResult<(u64, u64)> {
    let (start, end) = s
        .split_once(',')
        .or_else(|| s.split_once(':'))
        .ok_or_else(|| anyhow::anyhow!("Time range must be in format: start,end"))?;

    let start_us = parse_time(start)?;
    let end_us = parse_time(end)?;

    if end_us < start_us {
        return Err(anyhow::anyhow!("End time must not precede start time"));
    }

    Ok((start_us, end_us))
}

/// One-line description of a decode warning.
pub fn describe_warning(warning: &DecodeWarning) -> String {
    match warning {
        DecodeWarning::Gap { start, end, reason } => {
            format!("skipped bytes {start}..{end} ({reason:?}, {} bytes)", end - start)
        }
        DecodeWarning::ChecksumFailures { count } => {
            format!("{count} frame(s) failed checksum")
        }
        DecodeWarning::UnknownMessageIds { counts } => {
            let ids: Vec<String> = counts.iter().map(|(id, n)| format!("{id}x{n}")).collect();
            format!("unknown message ids: {}", ids.join(", "))
        }
        DecodeWarning::InvalidLayout { name, reason } => {
            format!("invalid layout for {name}: {reason}")
        }
        DecodeWarning::ClockRegressions { source, count } => {
            format!("{count} clock regression(s) in {source}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(500_000), "500ms");
        assert_eq!(format_duration(1_500_000), "1.500s");
        assert_eq!(format_duration(90_000_000), "1m 30s");
        assert_eq!(format_duration(3_600_000_000), "1h 0m");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("0").unwrap(), 0);
        assert_eq!(parse_time("250").unwrap(), 250);
        assert_eq!(parse_time("250us").unwrap(), 250);
        assert_eq!(parse_time("1500ms").unwrap(), 1_500_000);
        assert_eq!(parse_time("1.5s").unwrap(), 1_500_000);
        assert!(parse_time("-1s").is_err());
        assert!(parse_time("soon").is_err());
    }

    #[test]
    fn test_parse_time_range() {
        let (start, end) = parse_time_range("0,1s").unwrap();
        assert_eq!(start, 0);
        assert_eq!(end, 1_000_000);

        let (start, end) = parse_time_range("100:300").unwrap();
        assert_eq!((start, end), (100, 300));

        assert!(parse_time_range("300,100").is_err());
        assert!(parse_time_range("100").is_err());
    }

    #[test]
    fn test_channel_filter() {
        let re = channel_filter(Some("^GPS")).unwrap().unwrap();
        assert!(re.is_match("GPS[0].Lat"));
        assert!(channel_filter(None).unwrap().is_none());
        assert!(channel_filter(Some("(")).is_err());
    }
}
