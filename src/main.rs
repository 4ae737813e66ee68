//! Stepface - simulated host shell for the step-counting watch face
//!
//! Wires the engine to a console renderer, a simulated step sensor, and a
//! simulated display driver, then runs until interrupted.

use std::sync::Arc;
use tracing::{error, info};

use stepface::{
    clock::{Clock, SystemClock},
    config::Config,
    error::{ErrorSink, LogErrorSink},
    face::{ConsoleRenderer, DisplayProperties},
    store::{FileStorage, KeyValueStorage, MemoryStorage},
    tasks::{display_driver_task, sensor_feed_task},
    utils::shutdown_signal,
    WatchFaceEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("stepface={}", config.log_level()))
        .init();

    info!("Starting stepface v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: skin={}, interactive={}ms, muted={}ms, sensor={}",
        config.skin,
        config.interactive_ms,
        config.mute_ms,
        !config.no_sensor
    );

    let sink: Arc<dyn ErrorSink> = Arc::new(LogErrorSink);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    // A state file that cannot be opened falls back to volatile storage
    let file_storage = match &config.state_file {
        Some(path) => match FileStorage::open(path, Arc::clone(&sink)).await {
            Ok(storage) => Some(storage),
            Err(e) => {
                error!("Cannot open state file {}: {}, counts will not persist", path.display(), e);
                None
            }
        },
        None => None,
    };
    let storage: Arc<dyn KeyValueStorage> = match &file_storage {
        Some(storage) => storage.clone(),
        None => Arc::new(MemoryStorage::new()),
    };

    let renderer = Arc::new(ConsoleRenderer::new());
    let engine = Arc::new(
        WatchFaceEngine::builder(renderer.clone())
            .storage(storage)
            .clock(Arc::clone(&clock))
            .error_sink(Arc::clone(&sink))
            .periods(config.periods())
            .sensor_available(!config.no_sensor)
            .build()?,
    );

    engine.on_engine_created();
    engine.on_properties_changed(DisplayProperties::default());
    engine.on_mute_changed(config.muted);

    // Start the draw loop
    let view = engine.view();
    let skin = config.face_skin();
    let draw_renderer = Arc::clone(&renderer);
    let draw = tokio::spawn(async move {
        draw_renderer.run(view, skin).await;
    });

    // Start the simulated step sensor
    let sensor = if engine.sensor_available() {
        let sensor_engine = Arc::clone(&engine);
        let sensor_clock = Arc::clone(&clock);
        let feed = config.sensor_feed();
        Some(tokio::spawn(async move {
            sensor_feed_task(sensor_engine, sensor_clock, feed).await;
        }))
    } else {
        None
    };

    // Start the simulated display driver
    let display_engine = Arc::clone(&engine);
    let script = config.display_script();
    let display = tokio::spawn(async move {
        display_driver_task(display_engine, script).await;
    });

    if let Err(e) = shutdown_signal().await {
        error!("Cannot wait for shutdown signals: {}", e);
    }
    info!("Shutdown signal received");

    display.abort();
    if let Some(sensor) = sensor {
        sensor.abort();
    }
    engine.on_engine_destroyed();
    draw.abort();

    if let Some(storage) = &file_storage {
        if let Err(e) = storage.flush().await {
            error!("Failed to flush {}: {}", storage.path().display(), e);
        }
    }

    info!(
        "Stepface shutdown complete, {} steps today, {} frames drawn",
        engine.steps_today(),
        renderer.frames()
    );
    Ok(())
}
