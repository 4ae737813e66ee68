//! Text renderer that draws the face into the log

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Mutex,
};
use tokio::sync::Notify;
use tracing::{debug, info, trace};

use super::{FaceSkin, RenderMode, Renderer};
use crate::{clock::WallClock, engine::FaceView};

/// Renderer for the simulator: coalesces redraw requests and logs a line
/// of text whenever the drawn face changes.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    dirty: AtomicBool,
    wake: Notify,
    mode: Mutex<RenderMode>,
    frames: AtomicU64,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn mode(&self) -> RenderMode {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Draw loop, one frame per batch of redraw requests
    pub async fn run(&self, view: FaceView, skin: FaceSkin) {
        info!("Starting console renderer with skin '{}'", skin.name);
        let mut last_frame = String::new();

        loop {
            self.wake.notified().await;
            self.dirty.store(false, Ordering::SeqCst);

            let frame = compose_frame(&view.now(), view.steps_today(), self.mode(), &skin);
            self.frames.fetch_add(1, Ordering::Relaxed);

            if frame != last_frame {
                info!("{}", frame);
                last_frame = frame;
            } else {
                trace!("Frame unchanged");
            }
        }
    }
}

impl Renderer for ConsoleRenderer {
    fn request_redraw(&self) {
        if !self.dirty.swap(true, Ordering::SeqCst) {
            self.wake.notify_one();
        }
    }

    fn render_mode_changed(&self, mode: RenderMode) {
        debug!("Render mode changed: {:?}", mode);
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
        self.request_redraw();
    }
}

fn convert_to_12_hour(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// Render one frame of the face as text
pub fn compose_frame(now: &WallClock, steps_today: i64, mode: RenderMode, skin: &FaceSkin) -> String {
    let hour = if skin.twelve_hour {
        convert_to_12_hour(now.hour)
    } else {
        now.hour
    };

    let mut frame = format!("[{}] {}:{:02}", skin.name, hour, now.minute);
    if skin.seconds_arc && !mode.ambient && !mode.muted {
        frame.push_str(&format!(" ({:02}s)", now.second));
    }
    frame.push_str(&format!("  {} {}", skin.step_label, steps_today));

    if mode.ambient {
        frame.push_str(" [ambient]");
    }
    if mode.muted {
        frame.push_str(" [muted]");
    }
    frame
}
