//! Watch face engine: the entry points the host shell calls

use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::{
    clock::{Clock, SystemClock, WallClock},
    error::{ErrorSink, FaceError, LogErrorSink},
    face::{DisplayProperties, RenderMode, Renderer},
    state::{
        RenderScheduleState, SchedulePhase, StepCounterState, StepEvent, StepStateMachine,
        UpdatePeriods,
    },
    store::{CounterStore, KeyValueStorage, MemoryStorage},
    tasks::RenderScheduler,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no tokio runtime available to drive the redraw timer")]
    NoRuntime,
}

/// One running instance of the watch face.
///
/// Host notifications arrive through the `on_*` methods, possibly from
/// different threads. None of them fail: anomalies go to the error sink.
pub struct WatchFaceEngine {
    steps: Arc<StepStateMachine>,
    scheduler: RenderScheduler,
    renderer: Arc<dyn Renderer>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ErrorSink>,
    sensor_available: bool,
    props: Mutex<DisplayProperties>,
    mode: Arc<Mutex<RenderMode>>,
    publishing: Mutex<()>,
}

impl WatchFaceEngine {
    pub fn builder(renderer: Arc<dyn Renderer>) -> EngineBuilder {
        EngineBuilder {
            renderer,
            storage: None,
            clock: None,
            sink: None,
            periods: UpdatePeriods::default(),
            sensor_available: true,
            runtime: None,
        }
    }

    /// Repair inconsistent persisted state and publish the initial mode
    pub fn on_engine_created(&self) {
        let state = self.steps.apply_event(StepEvent::StartupCheck);
        info!(
            "Watch face engine created, {} steps today (day {})",
            state.steps_today(),
            state.current_day
        );

        if !self.sensor_available {
            self.sink.report(&FaceError::SensorUnavailable);
        }
        self.publish_mode();
    }

    pub fn on_engine_destroyed(&self) {
        self.scheduler.stop();
        info!("Watch face engine destroyed");
    }

    pub fn on_sensor_reading(&self, raw_count: i64, today: i32) -> StepCounterState {
        debug!("Sensor reading: {} on day {}", raw_count, today);
        self.steps
            .apply_event(StepEvent::SensorReading { raw_count, today })
    }

    pub fn on_visibility_changed(&self, visible: bool) {
        self.scheduler.set_visible(visible);
    }

    pub fn on_ambient_mode_changed(&self, ambient: bool) {
        self.scheduler.set_ambient(ambient);
        self.publish_mode();
    }

    pub fn on_mute_changed(&self, muted: bool) {
        if self.scheduler.set_muted(muted) {
            self.publish_mode();
        }
    }

    /// Device display capabilities, delivered once by the host
    pub fn on_properties_changed(&self, props: DisplayProperties) {
        debug!("Display properties: {:?}", props);
        *self.props.lock().unwrap_or_else(|e| e.into_inner()) = props;
        self.publish_mode();
    }

    /// Host minute tick, the only clock source while ambient
    pub fn on_time_tick(&self) {
        let today = self.clock.now_wall_clock().day_key;
        self.steps.apply_event(StepEvent::PeriodicCheck { today });
        self.renderer.request_redraw();
    }

    pub fn steps_today(&self) -> i64 {
        self.steps.steps_today()
    }

    pub fn step_state(&self) -> StepCounterState {
        self.steps.latest()
    }

    pub fn schedule_state(&self) -> RenderScheduleState {
        self.scheduler.state()
    }

    pub fn schedule_phase(&self) -> SchedulePhase {
        self.scheduler.phase()
    }

    pub fn render_mode(&self) -> RenderMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn sensor_available(&self) -> bool {
        self.sensor_available
    }

    /// Read-only handle for renderers
    pub fn view(&self) -> FaceView {
        FaceView {
            steps: Arc::clone(&self.steps),
            clock: Arc::clone(&self.clock),
            mode: Arc::clone(&self.mode),
        }
    }

    /// Resolve and deliver the current mode. Publishers run one at a time
    /// and read the schedule inside the lock, so the last mode delivered
    /// always reflects the last state change.
    fn publish_mode(&self) {
        let _publishing = self.publishing.lock().unwrap_or_else(|e| e.into_inner());
        let schedule = self.scheduler.state();
        let props = *self.props.lock().unwrap_or_else(|e| e.into_inner());
        let mode = RenderMode::resolve(schedule.is_ambient, schedule.is_muted, props);
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
        self.renderer.render_mode_changed(mode);
    }
}

/// What a renderer may read while drawing a frame
#[derive(Clone)]
pub struct FaceView {
    steps: Arc<StepStateMachine>,
    clock: Arc<dyn Clock>,
    mode: Arc<Mutex<RenderMode>>,
}

impl FaceView {
    pub fn steps_today(&self) -> i64 {
        self.steps.steps_today()
    }

    pub fn now(&self) -> WallClock {
        self.clock.now_wall_clock()
    }

    pub fn render_mode(&self) -> RenderMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct EngineBuilder {
    renderer: Arc<dyn Renderer>,
    storage: Option<Arc<dyn KeyValueStorage>>,
    clock: Option<Arc<dyn Clock>>,
    sink: Option<Arc<dyn ErrorSink>>,
    periods: UpdatePeriods,
    sensor_available: bool,
    runtime: Option<Handle>,
}

impl EngineBuilder {
    /// Persistent storage, volatile memory storage when not set
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn periods(mut self, periods: UpdatePeriods) -> Self {
        self.periods = periods;
        self
    }

    pub fn sensor_available(mut self, available: bool) -> Self {
        self.sensor_available = available;
        self
    }

    /// Runtime that owns the redraw timer, the current one when not set
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<WatchFaceEngine, EngineError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| EngineError::NoRuntime)?,
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let sink = self.sink.unwrap_or_else(|| Arc::new(LogErrorSink));

        let steps = Arc::new(StepStateMachine::new(
            CounterStore::new(storage),
            Arc::clone(&sink),
        ));
        let scheduler = RenderScheduler::new(
            Arc::clone(&steps),
            Arc::clone(&self.renderer),
            Arc::clone(&clock),
            self.periods,
            runtime,
        );

        Ok(WatchFaceEngine {
            steps,
            scheduler,
            renderer: self.renderer,
            clock,
            sink,
            sensor_available: self.sensor_available,
            props: Mutex::new(DisplayProperties::default()),
            mode: Arc::new(Mutex::new(RenderMode::default())),
            publishing: Mutex::new(()),
        })
    }
}
