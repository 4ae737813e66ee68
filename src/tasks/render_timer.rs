//! Redraw timer driven by display visibility and mode

use std::{
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinHandle, time::sleep};
use tracing::{debug, trace};

use crate::{
    clock::Clock,
    face::Renderer,
    state::{RenderScheduleState, SchedulePhase, StepEvent, StepStateMachine, UpdatePeriods},
};

/// Phase-aligned redraw loop.
///
/// While the face is visible and interactive, one one-shot timer is
/// pending at a time. Each firing runs the day rollover check, requests a
/// redraw, and re-arms for the next period boundary. Every change of
/// visibility, ambient mode, or cadence replaces the pending timer under
/// the same lock the timer callback takes, so a cancelled timer can never
/// issue a redraw.
pub struct RenderScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    steps: Arc<StepStateMachine>,
    renderer: Arc<dyn Renderer>,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    slot: Mutex<TimerSlot>,
}

struct TimerSlot {
    state: RenderScheduleState,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl RenderScheduler {
    pub fn new(
        steps: Arc<StepStateMachine>,
        renderer: Arc<dyn Renderer>,
        clock: Arc<dyn Clock>,
        periods: UpdatePeriods,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                steps,
                renderer,
                clock,
                runtime,
                slot: Mutex::new(TimerSlot {
                    state: RenderScheduleState::new(periods),
                    pending: None,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        let mut slot = self.shared.lock_slot();
        debug!("Visibility changed: {}", visible);
        slot.state.is_visible = visible;
        self.shared.reschedule(&mut slot);
    }

    pub fn set_ambient(&self, ambient: bool) {
        let mut slot = self.shared.lock_slot();
        debug!("Ambient mode changed: {}", ambient);
        slot.state.set_ambient(ambient);
        self.shared.reschedule(&mut slot);
    }

    /// Switch cadence; a running timer is replaced right away so the new
    /// period applies without waiting out the old one. Returns whether the
    /// mute flag changed.
    pub fn set_muted(&self, muted: bool) -> bool {
        let mut slot = self.shared.lock_slot();
        let flag_changed = slot.state.is_muted != muted;
        if slot.state.set_muted(muted) {
            debug!(
                "Mute changed: {}, update period now {:?}",
                muted, slot.state.update_period
            );
            if slot.state.should_run() {
                self.shared.reschedule(&mut slot);
            }
        }
        flag_changed
    }

    /// Cancel any pending timer and keep it cancelled until the face is
    /// shown again
    pub fn stop(&self) {
        let mut slot = self.shared.lock_slot();
        slot.state.is_visible = false;
        Shared::cancel(&mut slot);
        debug!("Render scheduler stopped");
    }

    pub fn state(&self) -> RenderScheduleState {
        self.shared.lock_slot().state.clone()
    }

    pub fn phase(&self) -> SchedulePhase {
        self.shared.lock_slot().state.phase()
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        let mut slot = self.shared.lock_slot();
        Shared::cancel(&mut slot);
    }
}

impl Shared {
    fn lock_slot(&self) -> MutexGuard<'_, TimerSlot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cancel the pending timer and, if the face should be animating, fire
    /// immediately and continue from there
    fn reschedule(self: &Arc<Self>, slot: &mut TimerSlot) {
        Self::cancel(slot);
        if slot.state.should_run() {
            self.arm(slot, Duration::ZERO);
        }
    }

    fn cancel(slot: &mut TimerSlot) {
        slot.generation += 1;
        if let Some(pending) = slot.pending.take() {
            pending.abort();
            trace!("Cancelled pending redraw timer");
        }
        slot.state.timer_armed = false;
    }

    fn arm(self: &Arc<Self>, slot: &mut TimerSlot, delay: Duration) {
        slot.generation += 1;
        let generation = slot.generation;
        let shared: Weak<Shared> = Arc::downgrade(self);

        let pending = self.runtime.spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            if let Some(shared) = shared.upgrade() {
                shared.fire(generation);
            }
        });

        slot.pending = Some(pending);
        slot.state.timer_armed = true;
        trace!("Armed redraw timer #{} in {:?}", generation, delay);
    }

    fn fire(self: &Arc<Self>, generation: u64) {
        let mut slot = self.lock_slot();
        if slot.generation != generation || !slot.state.should_run() {
            trace!("Ignoring stale redraw timer #{}", generation);
            return;
        }
        // The handle belongs to the task running this callback
        slot.pending = None;

        let today = self.clock.now_wall_clock().day_key;
        self.steps.apply_event(StepEvent::PeriodicCheck { today });
        self.renderer.request_redraw();

        let delay = slot.state.next_delay(self.clock.now_monotonic_ms());
        self.arm(&mut slot, delay);
    }
}
