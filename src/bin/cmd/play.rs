// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Play command - step through the log at the configured frame cadence.

use std::path::PathBuf;
use std::thread;

use clap::Args;
use flightcodec::SessionConfig;

use crate::common::{channel_filter, load, parse_time, Result};

/// Play back a log.
#[derive(Args, Clone, Debug)]
pub struct PlayCmd {
    /// Input log
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Log time per wall time
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// Start time (defaults to the start of the log)
    #[arg(long, value_name = "TIME")]
    from: Option<String>,

    /// Frames to emit
    #[arg(long, default_value_t = 10)]
    frames: usize,

    /// Only show channels matching this regex
    #[arg(short, long)]
    filter: Option<String>,

    /// Sleep between frames instead of stepping as fast as possible
    #[arg(long)]
    realtime: bool,
}

impl PlayCmd {
    pub fn run(self, config: SessionConfig) -> Result<()> {
        let filter = channel_filter(self.filter.as_deref())?;
        let interval = config.frame_interval()?;
        let (mut controller, report) = load(&self.input, config)?;
        let store = controller
            .store()
            .ok_or_else(|| anyhow::anyhow!("no log loaded"))?;

        let start = match &self.from {
            Some(t) => parse_time(t)?,
            None => report.start_us.unwrap_or(0),
        };
        controller.set_position(start)?;
        controller.play(self.rate)?;

        let mut emitted = 0;
        while emitted < self.frames && controller.is_playing() {
            if self.realtime {
                thread::sleep(interval);
            }
            let Some(frame) = controller.advance(interval)? else {
                continue;
            };
            emitted += 1;

            let values: Vec<String> = store
                .frame_entries(&frame)
                .filter(|(id, _)| filter.as_ref().map_or(true, |re| re.is_match(&id.to_string())))
                .map(|(id, sample)| match sample {
                    Some(s) => format!("{id}={}", s.value),
                    None => format!("{id}=-"),
                })
                .collect();
            println!("[{}] {}", frame.timestamp_us, values.join(" "));
        }

        if !controller.is_playing() {
            println!("(end of log)");
        }

        Ok(())
    }
}
