//! Unix-second time helpers and the validated analysis window.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds in one civil day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Seconds in one civil week.
pub const SECONDS_PER_WEEK: i64 = 604_800;

/// Seconds in a 30-day month, the approximation all period math uses.
pub const SECONDS_PER_MONTH: i64 = 2_592_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: i64, end: i64 },
}

/// Day index of a unix timestamp (floor division, so pre-epoch
/// timestamps bucket correctly too).
#[inline]
pub fn day_bucket(ts: i64) -> i64 {
    ts.div_euclid(SECONDS_PER_DAY)
}

/// Whole days between two timestamps, by day bucket.
pub fn days_between(a: i64, b: i64) -> i64 {
    (day_bucket(a) - day_bucket(b)).abs()
}

/// Current unix timestamp in seconds.
pub fn now_unix() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

// ─────────────────────────────────────────────
// DateRange
// ─────────────────────────────────────────────

/// Inclusive unix-second window for filtering transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

impl DateRange {
    /// Build a validated range. Fails when `start > end`.
    pub fn new(start: i64, end: i64) -> Result<Self, TimeError> {
        if start > end {
            return Err(TimeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// True when `ts` falls inside the window, both bounds inclusive.
    #[inline]
    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Whole days the window spans, never less than 1.
    pub fn span_days(&self) -> i64 {
        ((self.end - self.start) / SECONDS_PER_DAY).max(1)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
