// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Low-level binary reading primitives.

pub mod cursor;

pub use cursor::{ByteCursor, CursorMark};
