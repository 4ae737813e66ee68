//! Serialized step state machine over the counter store

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::step_state::{Anomaly, StepCounterState, StepEvent};
use crate::{
    error::{ErrorSink, FaceError},
    store::CounterStore,
};

/// The only writer of the counter store.
///
/// Every event runs as one read-modify-write under a single lock, so
/// concurrent sensor callbacks and timer ticks are applied one after the
/// other and each sees the effect of the previous one.
pub struct StepStateMachine {
    store: Mutex<CounterStore>,
    latest_tx: watch::Sender<StepCounterState>,
    sink: Arc<dyn ErrorSink>,
}

impl StepStateMachine {
    pub fn new(store: CounterStore, sink: Arc<dyn ErrorSink>) -> Self {
        let (latest_tx, _) = watch::channel(store.get());
        Self {
            store: Mutex::new(store),
            latest_tx,
            sink,
        }
    }

    /// Apply one event and return the resulting state.
    ///
    /// The returned state is used for display even if persisting it
    /// failed; the failure goes to the error sink and the next event
    /// recomputes from whatever the store holds.
    pub fn apply_event(&self, event: StepEvent) -> StepCounterState {
        let store = self.store.lock().unwrap_or_else(|e| {
            warn!("Step store lock was poisoned, recovering");
            e.into_inner()
        });

        let current = store.get();
        let transition = current.apply(event);

        if let Some(anomaly) = &transition.anomaly {
            self.report_anomaly(anomaly);
        }
        if transition.rebooted {
            info!(
                "Step counter restarted ({} -> {}), carrying {} steps over",
                current.last_step_count,
                transition.state.last_step_count,
                current.steps_today()
            );
        }
        if transition.rolled_over {
            info!(
                "Day rolled over from {} to {}, baseline {}",
                current.current_day, transition.state.current_day, transition.state.midnight_step_count
            );
        }

        if transition.changed_from(&current) {
            if let Err(e) = store.set(&transition.state) {
                self.sink.report(&FaceError::PersistenceWriteFailure(e));
            }
        } else {
            debug!("{:?} left step state unchanged", event);
        }

        self.latest_tx.send_replace(transition.state);
        transition.state
    }

    /// State produced by the most recent event (or loaded at startup)
    pub fn latest(&self) -> StepCounterState {
        *self.latest_tx.borrow()
    }

    pub fn steps_today(&self) -> i64 {
        self.latest().steps_today()
    }

    fn report_anomaly(&self, anomaly: &Anomaly) {
        let error = match anomaly {
            Anomaly::InconsistentAtStartup { last, midnight } => FaceError::CorruptPersistedState {
                last: *last,
                midnight: *midnight,
                detail: "last step count below midnight count at startup, state cleared".to_string(),
            },
            Anomaly::ReadingBelowMidnight { raw_count, midnight } => {
                FaceError::CorruptPersistedState {
                    last: *raw_count,
                    midnight: *midnight,
                    detail: "sensor reading below midnight count, baseline resynchronized"
                        .to_string(),
                }
            }
        };
        self.sink.report(&error);
    }
}

impl std::fmt::Debug for StepStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepStateMachine")
            .field("latest", &self.latest())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStorage, MemoryStorage, KEY_LAST_STEPS};

    const D: i32 = 20261017;

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<String>>,
    }

    impl ErrorSink for RecordingSink {
        fn report(&self, error: &FaceError) {
            self.reports.lock().unwrap().push(error.to_string());
        }
    }

    fn machine(storage: Arc<MemoryStorage>) -> (StepStateMachine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let machine = StepStateMachine::new(CounterStore::new(storage), sink.clone());
        (machine, sink)
    }

    #[test]
    fn test_events_are_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let (machine, sink) = machine(storage.clone());

        machine.apply_event(StepEvent::SensorReading { raw_count: 100, today: D });
        machine.apply_event(StepEvent::SensorReading { raw_count: 180, today: D });

        assert_eq!(storage.get_int(KEY_LAST_STEPS), Some(180));
        assert_eq!(machine.steps_today(), 80);
        assert!(sink.reports.lock().unwrap().is_empty());
    }

    #[test]
    fn test_write_failure_still_returns_new_state() {
        let storage = Arc::new(MemoryStorage::new());
        let (machine, sink) = machine(storage.clone());
        machine.apply_event(StepEvent::SensorReading { raw_count: 100, today: D });

        storage.set_fail_writes(true);
        let state = machine.apply_event(StepEvent::SensorReading { raw_count: 150, today: D });

        assert_eq!(state.steps_today(), 50);
        assert_eq!(machine.steps_today(), 50);
        assert_eq!(storage.get_int(KEY_LAST_STEPS), Some(100));
        assert_eq!(sink.reports.lock().unwrap().len(), 1);

        // The next event recomputes from the store and persists again
        storage.set_fail_writes(false);
        machine.apply_event(StepEvent::SensorReading { raw_count: 160, today: D });
        assert_eq!(storage.get_int(KEY_LAST_STEPS), Some(160));
        assert_eq!(machine.steps_today(), 60);
    }

    #[test]
    fn test_startup_repair_is_reported() {
        let storage = Arc::new(MemoryStorage::with_values([
            ("LastStepCount", 10),
            ("MidnightStepCount", 50),
            ("CurDay", i64::from(D)),
        ]));
        let (machine, sink) = machine(storage.clone());

        let state = machine.apply_event(StepEvent::StartupCheck);

        assert_eq!(state, StepCounterState::default());
        assert_eq!(storage.get_int(KEY_LAST_STEPS), Some(0));
        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("last=10"));
    }

    #[test]
    fn test_latest_starts_from_persisted_state() {
        let storage = Arc::new(MemoryStorage::with_values([
            ("LastStepCount", 300),
            ("MidnightStepCount", 120),
            ("CurDay", i64::from(D)),
        ]));
        let (machine, _) = machine(storage);

        assert_eq!(machine.steps_today(), 180);
        machine.apply_event(StepEvent::SensorReading { raw_count: 342, today: D });
        assert_eq!(machine.latest().last_step_count, 342);
    }
}
