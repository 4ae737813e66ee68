//! Wall clock and monotonic time sources

use std::sync::Mutex;

use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use tokio::time::Instant;

/// Broken-down wall clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub year: i32,
    pub month: u32,
    pub day_of_month: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
    pub day_key: i32,
}

impl WallClock {
    pub fn from_datetime(time: &NaiveDateTime) -> Self {
        let date = time.date();
        Self {
            year: date.year(),
            month: date.month(),
            day_of_month: date.day(),
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            millisecond: (time.nanosecond() / 1_000_000).min(999),
            day_key: day_key(&date),
        }
    }
}

/// Integer key for a calendar date: `year*10000 + month*100 + day`
pub fn day_key(date: &NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Calendar date of a day key, `None` when the key is not a real date
pub fn date_from_day_key(key: i32) -> Option<NaiveDate> {
    if key <= 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(key / 10_000, (key / 100 % 100) as u32, (key % 100) as u32)
}

/// Time source consumed by the engine and the render scheduler
pub trait Clock: Send + Sync {
    fn now_wall_clock(&self) -> WallClock;

    /// Milliseconds on a monotonic timeline, used for phase-aligned redraws
    fn now_monotonic_ms(&self) -> i64;
}

/// Local-time clock.
///
/// The monotonic timeline starts at the epoch millisecond of construction
/// and then advances with the tokio clock, so phase alignment lands on
/// round wall-clock boundaries without ever going backwards.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
    origin_epoch_ms: i64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_epoch_ms: Utc::now().timestamp_millis(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_wall_clock(&self) -> WallClock {
        // Re-read the zone every call so time zone changes are picked up
        WallClock::from_datetime(&Local::now().naive_local())
    }

    fn now_monotonic_ms(&self) -> i64 {
        self.origin_epoch_ms + self.origin.elapsed().as_millis() as i64
    }
}

/// Hand-driven clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    origin: Instant,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
            origin: Instant::now(),
        }
    }

    /// Clock at midday on the given date
    pub fn on_date(year: i32, month: u32, day: u32) -> Self {
        let now = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .unwrap_or_default();
        Self::new(now)
    }

    pub fn advance_days(&self, days: u64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = now.checked_add_days(Days::new(days)) {
            *now = next;
        }
    }

    pub fn today(&self) -> i32 {
        self.now_wall_clock().day_key
    }
}

impl Clock for ManualClock {
    fn now_wall_clock(&self) -> WallClock {
        WallClock::from_datetime(&self.now.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn now_monotonic_ms(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}
