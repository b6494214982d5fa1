// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - show format, duration, warnings and channels.

use std::path::PathBuf;

use clap::Args;
use flightcodec::SessionConfig;

use crate::common::{channel_filter, describe_warning, format_duration, load, Result};

/// Inspect a log.
#[derive(Args, Clone, Debug)]
pub struct InspectCmd {
    /// Input log (dataflash .bin or MAVLink .tlog)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Only list channels matching this regex
    #[arg(short, long)]
    filter: Option<String>,

    /// Print the load report as JSON
    #[arg(long)]
    json: bool,
}

impl InspectCmd {
    pub fn run(self, config: SessionConfig) -> Result<()> {
        let filter = channel_filter(self.filter.as_deref())?;
        let (_controller, mut report) = load(&self.input, config)?;

        if let Some(re) = &filter {
            report
                .channels
                .retain(|meta| re.is_match(&meta.id.to_string()));
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("=== {} ===", self.input.display());
        println!("Format: {}", report.format);
        println!("Records: {}", report.records);
        if let (Some(start), Some(end)) = (report.start_us, report.end_us) {
            println!("Start: {start} us");
            println!("End: {end} us");
        }
        println!("Duration: {}", format_duration(report.duration_us));
        if let Some(utc) = report.wall_clock_start {
            println!("Wall clock: {}", utc.format("%Y-%m-%d %H:%M:%S%.3f UTC"));
        }

        if report.is_partial() {
            println!();
            println!("Warnings (log partially decoded):");
            for warning in &report.warnings {
                println!("  {}", describe_warning(warning));
            }
        }

        println!();
        println!("Channels: {}", report.channels.len());
        for meta in &report.channels {
            let span = match (meta.first_us, meta.last_us) {
                (Some(first), Some(last)) => format!("{first}..{last} us"),
                _ => "empty".to_string(),
            };
            println!(
                "  {} | {:?} | {} samples | {}",
                meta.id, meta.primitive, meta.sample_count, span
            );
        }

        Ok(())
    }
}
