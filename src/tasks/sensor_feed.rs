//! Simulated step counter sensor

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use crate::{clock::Clock, engine::WatchFaceEngine};

/// Shape of the simulated cumulative step count
#[derive(Debug, Clone)]
pub struct SensorFeed {
    pub start_steps: i64,
    pub steps_per_second: u32,
    /// Restart the counter from zero once, as a device reboot would
    pub reboot_after: Option<Duration>,
}

/// Background task reporting a cumulative count once per second
pub async fn sensor_feed_task(engine: Arc<WatchFaceEngine>, clock: Arc<dyn Clock>, feed: SensorFeed) {
    info!(
        "Starting simulated step sensor at {} steps, {} steps/s",
        feed.start_steps, feed.steps_per_second
    );

    let started = Instant::now();
    let mut ticker = interval(Duration::from_secs(1));
    let mut count = feed.start_steps;
    let mut rebooted = false;

    loop {
        ticker.tick().await;

        if !rebooted && feed.reboot_after.is_some_and(|after| started.elapsed() >= after) {
            warn!("Simulating device reboot, sensor counter restarts at 0");
            count = 0;
            rebooted = true;
        } else {
            count += i64::from(feed.steps_per_second);
        }

        let today = clock.now_wall_clock().day_key;
        let state = engine.on_sensor_reading(count, today);
        debug!("Sensor {} -> {} steps today", count, state.steps_today());
    }
}
