//! Render schedule state

use std::time::Duration;

/// Redraw cadences for the two interactive display modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePeriods {
    /// Cadence while interactive and not muted
    pub interactive: Duration,
    /// Cadence while muted, and the nominal ambient cadence
    pub muted: Duration,
}

impl UpdatePeriods {
    pub fn new(interactive: Duration, muted: Duration) -> Self {
        Self {
            interactive: interactive.max(Duration::from_millis(1)),
            muted: muted.max(Duration::from_millis(1)),
        }
    }
}

impl Default for UpdatePeriods {
    fn default() -> Self {
        // 20 frames per second, one frame per minute when muted
        Self::new(Duration::from_millis(1000 / 20), Duration::from_secs(60))
    }
}

/// Whether the redraw timer has a callback pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePhase {
    Stopped,
    Scheduled,
}

/// Display state that decides if and how often the face redraws
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderScheduleState {
    pub is_visible: bool,
    pub is_ambient: bool,
    pub is_muted: bool,
    pub update_period: Duration,
    pub timer_armed: bool,
    periods: UpdatePeriods,
}

impl RenderScheduleState {
    /// Create a hidden, interactive, unmuted state
    pub fn new(periods: UpdatePeriods) -> Self {
        Self {
            is_visible: false,
            is_ambient: false,
            is_muted: false,
            update_period: periods.interactive,
            timer_armed: false,
            periods,
        }
    }

    /// The timer runs only while visible and interactive
    pub fn should_run(&self) -> bool {
        self.is_visible && !self.is_ambient
    }

    pub fn phase(&self) -> SchedulePhase {
        if self.timer_armed {
            SchedulePhase::Scheduled
        } else {
            SchedulePhase::Stopped
        }
    }

    /// Update the mute flag, returns whether the period changed
    pub fn set_muted(&mut self, muted: bool) -> bool {
        self.is_muted = muted;
        let period = if muted || self.is_ambient {
            self.periods.muted
        } else {
            self.periods.interactive
        };
        let changed = period != self.update_period;
        self.update_period = period;
        changed
    }

    pub fn set_ambient(&mut self, ambient: bool) {
        self.is_ambient = ambient;
        self.set_muted(self.is_muted);
    }

    /// Delay until the next period boundary after `now_ms`
    pub fn next_delay(&self, now_ms: i64) -> Duration {
        let period = self.update_period.as_millis().max(1) as i64;
        let delay = period - now_ms.rem_euclid(period);
        Duration::from_millis(delay as u64)
    }
}

impl Default for RenderScheduleState {
    fn default() -> Self {
        Self::new(UpdatePeriods::default())
    }
}
