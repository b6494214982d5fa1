// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Seek command - resolve every channel at one time.

use std::path::PathBuf;

use clap::Args;
use flightcodec::SessionConfig;

use crate::common::{channel_filter, load, parse_time, Result};

/// Resolve channels at a time.
#[derive(Args, Clone, Debug)]
pub struct SeekCmd {
    /// Input log
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Log-relative time (e.g. 1500000, 1500ms, 1.5s)
    #[arg(value_name = "TIME")]
    time: String,

    /// Only show channels matching this regex
    #[arg(short, long)]
    filter: Option<String>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl SeekCmd {
    pub fn run(self, config: SessionConfig) -> Result<()> {
        let t = parse_time(&self.time)?;
        let filter = channel_filter(self.filter.as_deref())?;
        let (mut controller, _report) = load(&self.input, config)?;
        let frame = controller.seek(t)?;
        let store = controller
            .store()
            .ok_or_else(|| anyhow::anyhow!("no log loaded"))?;

        let entries: Vec<_> = store
            .frame_entries(&frame)
            .filter(|(id, _)| filter.as_ref().map_or(true, |re| re.is_match(&id.to_string())))
            .collect();

        if self.json {
            let mut map = serde_json::Map::new();
            for (id, sample) in &entries {
                map.insert(id.to_string(), serde_json::to_value(sample)?);
            }
            println!("{}", serde_json::to_string_pretty(&map)?);
            return Ok(());
        }

        println!("=== t = {t} us ===");
        for (id, sample) in entries {
            match sample {
                Some(s) => println!("  {id} = {} (@ {} us)", s.value, s.timestamp_us),
                None => println!("  {id} = -"),
            }
        }

        Ok(())
    }
}
