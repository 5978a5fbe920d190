//! Target-tick arithmetic
//!
//! A time marker is measured in seconds before the round end tick. The
//! computed target tick is clamped into the round's `[start, end]` interval
//! so a marker longer than the round still lands on a valid tick.

use crate::demo::RoundRow;

/// Convert a second offset to a tick count at the given tickrate.
pub fn offset_ticks(seconds: f32, tickrate: f32) -> i64 {
    (seconds * tickrate) as i64
}

/// Target tick for a round: `end - offset`, clamped into `[start, end]`.
pub fn target_tick(start: i64, end: i64, offset: i64) -> i64 {
    (end - offset).max(start).min(end)
}

/// Target tick for a round row, or None when the row lacks usable
/// boundaries.
pub fn round_target_tick(round: &RoundRow, offset: i64) -> Option<i64> {
    let start = round.start_tick()?;
    let end = round.end_tick()?;
    Some(target_tick(start, end, offset))
}
