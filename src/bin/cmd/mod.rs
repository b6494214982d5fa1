// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod inspect;
mod play;
mod samples;
mod seek;

pub use inspect::InspectCmd;
pub use play::PlayCmd;
pub use samples::SamplesCmd;
pub use seek::SeekCmd;
