//! Time source for entry/exit stamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use smartpark_state::Timestamp;

/// Seconds in a UTC day.
pub const SECS_PER_DAY: u64 = 86_400;

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        epoch_secs()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance_minutes(&self, minutes: u64) {
        self.now.fetch_add(minutes * 60, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Current Unix epoch in seconds.
pub fn epoch_secs() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Half-open `[start, end)` bounds of the UTC day containing `ts`.
pub fn utc_day_bounds(ts: Timestamp) -> (Timestamp, Timestamp) {
    let start = ts - ts % SECS_PER_DAY;
    (start, start + SECS_PER_DAY)
}

/// Whole minutes elapsed from `from` to `to`; zero if `to` precedes `from`.
pub fn minutes_between(from: Timestamp, to: Timestamp) -> u64 {
    to.saturating_sub(from) / 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance_minutes(2);
        assert_eq!(clock.now(), 1_120);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn day_bounds() {
        let (start, end) = utc_day_bounds(SECS_PER_DAY * 3 + 42);
        assert_eq!(start, SECS_PER_DAY * 3);
        assert_eq!(end, SECS_PER_DAY * 4);
    }

    #[test]
    fn minutes_truncate_and_saturate() {
        assert_eq!(minutes_between(0, 119), 1);
        assert_eq!(minutes_between(0, 3_660), 61);
        assert_eq!(minutes_between(500, 100), 0);
    }
}
