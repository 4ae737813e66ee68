//! Stepface - the core of a step-counting watch face
//!
//! This library keeps a persisted daily step count consistent across device
//! reboots and day boundaries, and decides when the face must be redrawn.
//! Drawing, sensors, and storage are capabilities supplied by the host.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod face;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::{EngineBuilder, FaceView, WatchFaceEngine};
pub use error::{ErrorSink, FaceError, StoreError};
pub use state::{StepCounterState, StepEvent};
pub use utils::signals::shutdown_signal;
