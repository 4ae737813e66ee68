//! Persisted step counter state and its event-driven transitions

use crate::clock::{date_from_day_key, day_key};

/// Offset applied when a sensor reading falls below the midnight baseline.
///
/// The displayed count becomes exactly this value until the next day
/// rollover, which makes the resync visible on the watch face.
pub const RESYNC_MARKER: i64 = -1337;

/// Step counter state as persisted in the counter store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCounterState {
    /// Latest raw cumulative count, counted since the device last booted
    pub last_step_count: i64,
    /// Raw count at the most recent day boundary, negative after a reboot
    pub midnight_step_count: i64,
    /// Day key of the day `midnight_step_count` belongs to
    pub current_day: i32,
}

/// Inputs to the step state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// New cumulative count from the hardware counter
    SensorReading { raw_count: i64, today: i32 },
    /// Day rollover probe fired by the redraw loop
    PeriodicCheck { today: i32 },
    /// Consistency check run once when the engine is created
    StartupCheck,
}

/// Invariant violations found while applying an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// `last < midnight` found in the persisted state at startup
    InconsistentAtStartup { last: i64, midnight: i64 },
    /// A raw reading below the midnight baseline
    ReadingBelowMidnight { raw_count: i64, midnight: i64 },
}

/// Result of applying one event to a state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: StepCounterState,
    pub anomaly: Option<Anomaly>,
    pub rebooted: bool,
    pub rolled_over: bool,
}

impl Transition {
    /// Whether the new state differs from `previous` and must be written
    pub fn changed_from(&self, previous: &StepCounterState) -> bool {
        self.state != *previous
    }
}

impl StepCounterState {
    /// Steps walked since the current day started
    pub fn steps_today(&self) -> i64 {
        self.last_step_count - self.midnight_step_count
    }

    /// Compute the state that follows `event`
    pub fn apply(self, event: StepEvent) -> Transition {
        let mut next = self;
        let mut anomaly = None;
        let mut rebooted = false;
        let mut rolled_over = false;

        match event {
            StepEvent::StartupCheck => {
                if self.last_step_count < self.midnight_step_count {
                    anomaly = Some(Anomaly::InconsistentAtStartup {
                        last: self.last_step_count,
                        midnight: self.midnight_step_count,
                    });
                    next = StepCounterState::default();
                }
            }
            StepEvent::PeriodicCheck { today } => {
                rolled_over = next.roll_over(today);
            }
            StepEvent::SensorReading { raw_count, today } => {
                if raw_count < self.last_step_count && today == self.current_day {
                    // Counter restarted with the device: carry today's steps
                    // over as a negative baseline
                    rebooted = true;
                    next.midnight_step_count = -self.steps_today();
                    next.last_step_count = raw_count;
                } else if raw_count < self.midnight_step_count {
                    anomaly = Some(Anomaly::ReadingBelowMidnight {
                        raw_count,
                        midnight: self.midnight_step_count,
                    });
                    next.midnight_step_count = raw_count - RESYNC_MARKER;
                    next.last_step_count = raw_count;
                } else {
                    next.last_step_count = raw_count;
                }
                rolled_over = next.roll_over(today);
            }
        }

        Transition {
            state: next,
            anomaly,
            rebooted,
            rolled_over,
        }
    }

    /// Start a new day if `today` is one, returns whether it did
    fn roll_over(&mut self, today: i32) -> bool {
        if !is_new_day(today, self.current_day) {
            return false;
        }
        self.midnight_step_count = self.last_step_count;
        self.current_day = today;
        true
    }
}

/// Day rollover rule.
///
/// The calendar day before the stored one is tolerated so that a clock
/// oscillating across midnight does not reset the count twice. Any other
/// earlier day counts as a new day.
pub fn is_new_day(today: i32, current_day: i32) -> bool {
    if today >= current_day {
        return today > current_day;
    }
    let previous = date_from_day_key(current_day)
        .and_then(|date| date.pred_opt())
        .map(|date| day_key(&date));
    previous != Some(today)
}
