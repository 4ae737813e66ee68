//! Simulated host display driver

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::info;

use crate::engine::WatchFaceEngine;

/// Host ambient minute tick
const TIME_TICK: Duration = Duration::from_secs(60);

/// When the simulated watch drops into ambient mode and for how long
#[derive(Debug, Clone, Default)]
pub struct DisplayScript {
    pub ambient_after: Option<Duration>,
    /// Stay ambient forever when unset
    pub ambient_for: Option<Duration>,
}

/// Show the face, then follow the ambient script
pub async fn display_driver_task(engine: Arc<WatchFaceEngine>, script: DisplayScript) {
    engine.on_visibility_changed(true);

    let Some(ambient_after) = script.ambient_after else {
        return;
    };
    sleep(ambient_after).await;

    info!("Display entering ambient mode");
    engine.on_ambient_mode_changed(true);

    let mut ticks = interval(TIME_TICK);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let leave = async {
        match script.ambient_for {
            Some(duration) => sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(leave);

    loop {
        tokio::select! {
            _ = ticks.tick() => engine.on_time_tick(),
            _ = &mut leave => break,
        }
    }

    info!("Display leaving ambient mode");
    engine.on_ambient_mode_changed(false);
}
