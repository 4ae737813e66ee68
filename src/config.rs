//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    face::FaceSkin,
    state::UpdatePeriods,
    tasks::{DisplayScript, SensorFeed},
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "stepface")]
#[command(about = "Simulated step-counting watch face")]
#[command(version)]
pub struct Config {
    /// JSON file holding the step counters; in-memory when omitted
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Face skin (healthy-miami or digital)
    #[arg(long, default_value = "healthy-miami")]
    pub skin: String,

    /// Redraw period in milliseconds while interactive
    #[arg(long, default_value = "50")]
    pub interactive_ms: u64,

    /// Redraw period in milliseconds while muted
    #[arg(long, default_value = "60000")]
    pub mute_ms: u64,

    /// Start with mute active
    #[arg(long)]
    pub muted: bool,

    /// Simulate a device without a step counter
    #[arg(long)]
    pub no_sensor: bool,

    /// Simulated steps per second
    #[arg(long, default_value = "2")]
    pub steps_per_second: u32,

    /// Initial cumulative sensor count
    #[arg(long, default_value = "0")]
    pub start_steps: i64,

    /// Restart the simulated sensor counter once after this many seconds
    #[arg(long)]
    pub reboot_after_secs: Option<u64>,

    /// Enter ambient mode after this many seconds
    #[arg(long)]
    pub ambient_after_secs: Option<u64>,

    /// Leave ambient mode after this many seconds in it
    #[arg(long)]
    pub ambient_for_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn periods(&self) -> UpdatePeriods {
        UpdatePeriods::new(
            Duration::from_millis(self.interactive_ms),
            Duration::from_millis(self.mute_ms),
        )
    }

    /// Selected skin, the default one for unknown names
    pub fn face_skin(&self) -> FaceSkin {
        FaceSkin::from_name(&self.skin).unwrap_or_else(|| {
            tracing::warn!("Unknown skin '{}', using default", self.skin);
            FaceSkin::default()
        })
    }

    pub fn sensor_feed(&self) -> SensorFeed {
        SensorFeed {
            start_steps: self.start_steps,
            steps_per_second: self.steps_per_second,
            reboot_after: self.reboot_after_secs.map(Duration::from_secs),
        }
    }

    pub fn display_script(&self) -> DisplayScript {
        DisplayScript {
            ambient_after: self.ambient_after_secs.map(Duration::from_secs),
            ambient_for: self.ambient_for_secs.map(Duration::from_secs),
        }
    }
}
