// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Flightcodec CLI
//!
//! Command-line tool for exploring flight-controller logs.
//!
//! ## Usage
//!
//! ```sh
//! # Show format, duration, warnings and channels
//! flightcodec inspect flight.bin
//!
//! # Resolve every channel at 90 seconds into the log
//! flightcodec seek flight.bin 90s
//!
//! # Dump one channel over a time window
//! flightcodec samples flight.tlog 'ATTITUDE[1:1].roll' --range 10s,20s
//!
//! # Play back at 4x from 60 seconds
//! flightcodec play flight.bin --rate 4 --from 60s --frames 20
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{InspectCmd, PlayCmd, SamplesCmd, SeekCmd};
use common::{GlobalArgs, Result};

/// Flightcodec - flight log explorer
///
/// Decodes dataflash and MAVLink telemetry logs into time-indexed channels.
/// Format auto-detection means you never need to specify the log type.
#[derive(Parser, Clone)]
#[command(name = "flightcodec")]
#[command(about = "Flight log toolkit for dataflash and MAVLink telemetry logs", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Show log format, duration, warnings and channels
    Inspect(InspectCmd),

    /// Resolve every channel at a point in time
    Seek(SeekCmd),

    /// Print the samples of one channel
    Samples(SamplesCmd),

    /// Step through the log at a fixed frame cadence
    Play(PlayCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    common::init_tracing(cli.global.verbose);
    let config = cli.global.session_config()?;

    match cli.command {
        Commands::Inspect(cmd) => cmd.run(config),
        Commands::Seek(cmd) => cmd.run(config),
        Commands::Samples(cmd) => cmd.run(config),
        Commands::Play(cmd) => cmd.run(config),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
