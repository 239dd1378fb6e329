//! Replay timing.
//!
//! Each event gets a target offset from the start of replay. Offsets follow
//! the recorded gaps, divided by the timescale, with any single gap capped so
//! long idle periods do not stall a replay.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Longest target offset any event gets, however small the timescale.
pub const MAX_OFFSET: Duration = Duration::from_secs(24 * 60 * 60);

/// Target offsets for events captured at `timestamps`.
///
/// The first offset is zero. Negative gaps (clock adjustments) count as zero,
/// so offsets never decrease. A non-positive or non-finite `timescale` is
/// treated as 1. Offsets are capped at [`MAX_OFFSET`].
pub fn plan_offsets(timestamps: &[DateTime<Utc>], timescale: f64, max_gap: Duration) -> Vec<Duration> {
    let timescale = if timescale.is_finite() && timescale > 0.0 {
        timescale
    } else {
        1.0
    };
    let max_gap_ms = i64::try_from(max_gap.as_millis()).unwrap_or(i64::MAX);
    let max_offset_ms = MAX_OFFSET.as_millis() as u64;

    let mut offsets = Vec::with_capacity(timestamps.len());
    let mut total_ms: u64 = 0;
    for (i, t) in timestamps.iter().enumerate() {
        if i > 0 {
            let gap = (*t - timestamps[i - 1]).num_milliseconds().clamp(0, max_gap_ms);
            // Float-to-int casts saturate.
            let scaled = (gap as f64 / timescale).floor() as u64;
            total_ms = total_ms.saturating_add(scaled).min(max_offset_ms);
        }
        offsets.push(Duration::from_millis(total_ms));
    }
    offsets
}

/// Sleeps until each event's target time.
#[derive(Debug)]
pub struct Pacer {
    start: Instant,
    offsets: Vec<Duration>,
}

impl Pacer {
    /// Start the clock now.
    pub fn start(offsets: Vec<Duration>) -> Self {
        Self {
            start: Instant::now(),
            offsets,
        }
    }

    pub fn offset(&self, index: usize) -> Option<Duration> {
        self.offsets.get(index).copied()
    }

    /// Wait for event `index`'s target time. Returns at once if it has
    /// already passed, so a slow step never makes later ones wait longer.
    pub async fn wait(&self, index: usize) {
        if let Some(offset) = self.offset(index) {
            match self.start.checked_add(offset) {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => tokio::time::sleep(offset).await,
            }
        }
    }
}

#[cfg(test)]
#[path = "pacing_tests.rs"]
mod tests;
