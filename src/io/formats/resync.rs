// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Forward scan for the next plausible record start.

/// Result of a resynchronization scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resync {
    /// A candidate record starts at this offset
    Found(usize),
    /// No candidate before the end of the buffer or the scan bound
    Exhausted,
}

/// Scan `data` from `from` for the first offset accepted by `is_start`.
///
/// At most `max_scan` offsets are tried.
pub fn scan_forward<F>(data: &[u8], from: usize, max_scan: usize, mut is_start: F) -> Resync
where
    F: FnMut(&[u8], usize) -> bool,
{
    let end = data.len().min(from.saturating_add(max_scan));
    (from..end)
        .find(|&pos| is_start(data, pos))
        .map_or(Resync::Exhausted, Resync::Found)
}
