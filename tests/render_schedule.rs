mod common;

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;

use common::harness;
use stepface::{
    face::{DisplayProperties, MUTE_ALPHA, NORMAL_ALPHA},
    state::SchedulePhase,
    store::MemoryStorage,
};

const D: i32 = 20261017;

#[tokio::test(start_paused = true)]
async fn test_visible_face_redraws_on_cadence() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_engine_created();

    h.engine.on_visibility_changed(true);
    assert_eq!(h.engine.schedule_phase(), SchedulePhase::Scheduled);

    sleep(Duration::from_millis(1)).await;
    assert_eq!(h.renderer.redraws(), 1);

    // Boundaries at 50, 100, ... 1000 ms
    sleep(Duration::from_millis(1010)).await;
    assert_eq!(h.renderer.redraws(), 21);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_face_never_redraws() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_engine_created();

    h.engine.on_ambient_mode_changed(true);
    h.engine.on_ambient_mode_changed(false);
    h.engine.on_mute_changed(true);
    h.engine.on_mute_changed(false);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.engine.schedule_phase(), SchedulePhase::Stopped);
    assert_eq!(h.renderer.redraws(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ambient_stops_and_resumes_timer() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_visibility_changed(true);
    sleep(Duration::from_millis(1)).await;
    assert_eq!(h.renderer.redraws(), 1);

    h.engine.on_ambient_mode_changed(true);
    assert_eq!(h.engine.schedule_phase(), SchedulePhase::Stopped);
    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.renderer.redraws(), 1);

    h.engine.on_ambient_mode_changed(false);
    assert_eq!(h.engine.schedule_phase(), SchedulePhase::Scheduled);
    sleep(Duration::from_millis(1)).await;
    assert_eq!(h.renderer.redraws(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_phase_follows_should_run_for_any_toggle_sequence() {
    let h = harness(Arc::new(MemoryStorage::new()));
    let mut visible = false;
    let mut ambient = false;

    let steps: [(bool, bool); 10] = [
        (true, false),
        (false, true),
        (true, true),
        (true, false),
        (false, false),
        (true, true),
        (true, true),
        (false, true),
        (true, false),
        (true, false),
    ];

    for (toggle_visible, toggle_ambient) in steps {
        if toggle_visible {
            visible = !visible;
            h.engine.on_visibility_changed(visible);
        }
        if toggle_ambient {
            ambient = !ambient;
            h.engine.on_ambient_mode_changed(ambient);
        }

        let expected = if visible && !ambient {
            SchedulePhase::Scheduled
        } else {
            SchedulePhase::Stopped
        };
        assert_eq!(h.engine.schedule_phase(), expected);

        if expected == SchedulePhase::Stopped {
            let before = h.renderer.redraws();
            sleep(Duration::from_millis(500)).await;
            assert_eq!(h.renderer.redraws(), before, "redraw issued while stopped");
        } else {
            sleep(Duration::from_millis(120)).await;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_timer_never_fires() {
    let h = harness(Arc::new(MemoryStorage::new()));

    // No await between arming and cancelling
    h.engine.on_visibility_changed(true);
    h.engine.on_ambient_mode_changed(true);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.renderer.redraws(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_mute_switches_cadence_immediately() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_visibility_changed(true);
    sleep(Duration::from_millis(1)).await;
    assert_eq!(h.renderer.redraws(), 1);

    h.engine.on_mute_changed(true);
    assert_eq!(h.engine.schedule_state().update_period, Duration::from_secs(60));
    sleep(Duration::from_millis(1)).await;
    assert_eq!(h.renderer.redraws(), 2);

    // Next firing on the minute boundary
    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.renderer.redraws(), 2);
    sleep(Duration::from_secs(31)).await;
    assert_eq!(h.renderer.redraws(), 3);

    // Repeating the same mute state leaves the timer alone
    h.engine.on_mute_changed(true);
    sleep(Duration::from_millis(1)).await;
    assert_eq!(h.renderer.redraws(), 3);

    h.engine.on_mute_changed(false);
    sleep(Duration::from_millis(1)).await;
    assert_eq!(h.renderer.redraws(), 4);
    sleep(Duration::from_millis(200)).await;
    assert!(h.renderer.redraws() >= 7);
}

#[tokio::test(start_paused = true)]
async fn test_engine_destroy_cancels_timer() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_visibility_changed(true);
    sleep(Duration::from_millis(120)).await;
    let before = h.renderer.redraws();
    assert!(before > 0);

    h.engine.on_engine_destroyed();
    assert_eq!(h.engine.schedule_phase(), SchedulePhase::Stopped);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.renderer.redraws(), before);
}

#[tokio::test(start_paused = true)]
async fn test_redraw_loop_detects_day_rollover() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_engine_created();
    h.engine.on_sensor_reading(500, D);
    h.engine.on_sensor_reading(900, D);
    assert_eq!(h.engine.steps_today(), 400);

    h.engine.on_visibility_changed(true);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(h.engine.step_state().current_day, D);

    h.clock.advance_days(1);
    sleep(Duration::from_millis(100)).await;

    let state = h.engine.step_state();
    assert_eq!(state.current_day, D + 1);
    assert_eq!(state.midnight_step_count, 900);
    assert_eq!(h.engine.steps_today(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_time_tick_checks_day_in_ambient() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_sensor_reading(300, D);
    h.engine.on_sensor_reading(420, D);
    h.engine.on_visibility_changed(true);
    h.engine.on_ambient_mode_changed(true);

    h.clock.advance_days(1);
    h.engine.on_time_tick();

    assert_eq!(h.engine.step_state().current_day, D + 1);
    assert_eq!(h.engine.steps_today(), 0);
    assert_eq!(h.renderer.redraws(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_render_mode_notifications() {
    let h = harness(Arc::new(MemoryStorage::new()));
    h.engine.on_engine_created();
    h.engine.on_properties_changed(DisplayProperties {
        low_bit_ambient: true,
        burn_in_protection: true,
    });

    h.engine.on_ambient_mode_changed(true);
    let mode = h.renderer.last_mode().unwrap();
    assert!(mode.ambient);
    assert!(!mode.anti_alias);
    assert!(mode.thin_hours);

    h.engine.on_ambient_mode_changed(false);
    h.engine.on_mute_changed(true);
    let mode = h.renderer.last_mode().unwrap();
    assert!(!mode.ambient && mode.anti_alias && !mode.thin_hours);
    assert_eq!(mode.alpha, MUTE_ALPHA);
    assert_eq!(h.engine.render_mode(), mode);
    assert_eq!(h.engine.view().render_mode(), mode);

    h.engine.on_mute_changed(false);
    assert_eq!(h.renderer.last_mode().unwrap().alpha, NORMAL_ALPHA);
}
