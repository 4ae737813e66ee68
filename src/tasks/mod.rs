//! Background tasks module
//!
//! The redraw timer used by every engine, plus the simulated sensor and
//! display driver that stand in for the host in the simulator binary.

pub mod display_driver;
pub mod render_timer;
pub mod sensor_feed;

// Re-export main types
pub use display_driver::{display_driver_task, DisplayScript};
pub use render_timer::RenderScheduler;
pub use sensor_feed::{sensor_feed_task, SensorFeed};
