//! Trigger gates evaluated once per poll quantum.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::time::{Duration, Instant};

/// Daily time-of-day trigger.
///
/// Due while the wall clock sits inside the configured `HH:MM` minute, at
/// most once per calendar date. A daemon that is not running during that
/// minute skips the day.
#[derive(Debug, Clone)]
pub struct CycleSchedule {
    at: NaiveTime,
    last_run: Option<NaiveDate>,
}

impl CycleSchedule {
    #[must_use]
    pub fn new(at: NaiveTime) -> Self {
        Self { at, last_run: None }
    }

    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now.hour() == self.at.hour()
            && now.minute() == self.at.minute()
            && self.last_run != Some(now.date())
    }

    /// Record that today's run has been started (or deferred and latched).
    pub fn mark_run(&mut self, now: NaiveDateTime) {
        self.last_run = Some(now.date());
    }
}

/// Minimum-interval gate for change detection.
#[derive(Debug, Clone)]
pub struct DetectionGate {
    interval: Duration,
    last: Option<Instant>,
}

impl DetectionGate {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// The first evaluation is always due.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}
