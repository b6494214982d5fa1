// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Samples command - dump one channel.

use std::path::PathBuf;

use clap::Args;
use flightcodec::{ChannelId, SessionConfig};

use crate::common::{load, parse_time_range, Result};

/// Print the samples of one channel.
#[derive(Args, Clone, Debug)]
pub struct SamplesCmd {
    /// Input log
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Channel id, e.g. `GPS[0].Alt` or `ATTITUDE[1:1].roll`
    #[arg(value_name = "CHANNEL")]
    channel: String,

    /// Inclusive time window "start,end" (whole log if omitted)
    #[arg(short, long, value_name = "START,END")]
    range: Option<String>,

    /// Stop after this many samples
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl SamplesCmd {
    pub fn run(self, config: SessionConfig) -> Result<()> {
        let id: ChannelId = self.channel.parse()?;
        let (t0, t1) = match &self.range {
            Some(range) => parse_time_range(range)?,
            None => (0, u64::MAX),
        };
        let (controller, _report) = load(&self.input, config)?;
        let range = controller.channel_samples(&id, t0, t1)?;
        let limit = self.limit.unwrap_or(usize::MAX);

        if self.json {
            let samples: Vec<_> = range.iter().take(limit).collect();
            println!("{}", serde_json::to_string_pretty(&samples)?);
            return Ok(());
        }

        println!("=== {id} ({} samples) ===", range.len());
        for sample in range.iter().take(limit) {
            println!("{}\t{}", sample.timestamp_us, sample.value);
        }
        if range.len() > limit {
            println!("... ({} more)", range.len() - limit);
        }

        Ok(())
    }
}
