#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use stepface::{
    clock::ManualClock,
    error::{ErrorSink, FaceError},
    face::{RenderMode, Renderer},
    state::UpdatePeriods,
    store::KeyValueStorage,
    WatchFaceEngine,
};

#[derive(Default)]
pub struct CountingRenderer {
    redraws: AtomicUsize,
    modes: Mutex<Vec<RenderMode>>,
}

impl CountingRenderer {
    pub fn redraws(&self) -> usize {
        self.redraws.load(Ordering::SeqCst)
    }

    pub fn last_mode(&self) -> Option<RenderMode> {
        self.modes.lock().unwrap().last().copied()
    }
}

impl Renderer for CountingRenderer {
    fn request_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
    }

    fn render_mode_changed(&self, mode: RenderMode) {
        self.modes.lock().unwrap().push(mode);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, error: &FaceError) {
        self.reports.lock().unwrap().push(error.to_string());
    }
}

pub struct Harness {
    pub engine: WatchFaceEngine,
    pub renderer: Arc<CountingRenderer>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
}

/// Engine on 2026-10-17 with the default cadences
pub fn harness(storage: Arc<dyn KeyValueStorage>) -> Harness {
    harness_with(storage, true)
}

pub fn harness_with(storage: Arc<dyn KeyValueStorage>, sensor_available: bool) -> Harness {
    let renderer = Arc::new(CountingRenderer::default());
    let clock = Arc::new(ManualClock::on_date(2026, 10, 17));
    let sink = Arc::new(RecordingSink::default());
    let engine = WatchFaceEngine::builder(renderer.clone())
        .storage(storage)
        .clock(clock.clone())
        .error_sink(sink.clone())
        .periods(UpdatePeriods::default())
        .sensor_available(sensor_available)
        .build()
        .expect("engine builds inside a runtime");
    Harness {
        engine,
        renderer,
        clock,
        sink,
    }
}
