//! Sandbox runs end to end: auto-play, cadence, finish, transport, mute.

use crate::config::STEP_INTERVAL;
use crate::engine::RunRequest;
use crate::interpolation::LevelInterpolator;
use crate::playback::PlaybackPhase;
use crate::systems::{EngineAction, TimelineLoaded};
use crate::test_harness::TestDashboard;
use crate::timeline::SandboxRequest;

fn sandbox(percent: u8, hours: u32) -> EngineAction {
    EngineAction::Run(RunRequest::Sandbox(SandboxRequest::new(percent, hours)))
}

#[test]
fn test_sandbox_run_plays_to_last_sample_and_pauses() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(21);

    dashboard.send(engine, sandbox(0, 24));
    dashboard.tick(1);
    assert_eq!(
        dashboard.log().loaded,
        vec![TimelineLoaded {
            engine,
            samples: 24
        }]
    );
    dashboard.assert_phase(engine, PlaybackPhase::Playing);
    assert_eq!(dashboard.engine(engine).timeline().len(), 24);

    let finished = dashboard.tick_until(400, |d| {
        d.engine(engine).state().phase == PlaybackPhase::Paused
    });
    assert!(finished, "playback should finish within 400 frames");
    dashboard.assert_playhead(engine, 23);

    // Nothing moves afterwards.
    dashboard.tick_for(STEP_INTERVAL * 3);
    dashboard.assert_phase(engine, PlaybackPhase::Paused);
    dashboard.assert_playhead(engine, 23);
}

#[test]
fn test_playhead_advances_once_per_interval() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(22);
    dashboard.send(engine, sandbox(40, 48));
    // The run frame already counts 100 ms towards the first interval.
    dashboard.tick(1);
    dashboard.tick_for(STEP_INTERVAL * 3);
    let playhead = dashboard.engine(engine).state().playhead;
    assert!((3..=4).contains(&playhead), "playhead = {playhead}");
}

#[test]
fn test_toggle_pauses_and_freezes_playhead() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(23);
    dashboard.send(engine, sandbox(40, 24));
    dashboard.tick_for(STEP_INTERVAL * 2);

    dashboard.send(engine, EngineAction::TogglePlay);
    dashboard.tick(1);
    dashboard.assert_phase(engine, PlaybackPhase::Paused);
    let frozen = dashboard.engine(engine).state().playhead;

    dashboard.tick_for(STEP_INTERVAL * 5);
    dashboard.assert_playhead(engine, frozen);

    dashboard.send(engine, EngineAction::TogglePlay);
    dashboard.tick(1);
    dashboard.assert_phase(engine, PlaybackPhase::Playing);
}

#[test]
fn test_mute_silences_every_following_step() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(24);
    dashboard.send(engine, sandbox(95, 24));
    dashboard.tick(1);
    assert!(dashboard.engine(engine).audio().active_voices() > 0);

    dashboard.send(engine, EngineAction::SetMuted(true));
    for _ in 0..60 {
        dashboard.tick(1);
        dashboard.assert_silent(engine);
    }
    assert!(dashboard.engine(engine).state().muted);

    dashboard.send(engine, EngineAction::SetMuted(false));
    dashboard.tick(1);
    assert!(dashboard.engine(engine).audio().rain().is_some());
}

#[test]
fn test_seek_moves_playhead_and_level_target() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(25);
    dashboard.send(engine, sandbox(50, 24));
    dashboard.tick(1);

    dashboard.send(engine, EngineAction::Seek(20));
    dashboard.tick(1);
    dashboard.assert_playhead(engine, 20);
    dashboard.assert_phase(engine, PlaybackPhase::Playing);

    let engine_ref = dashboard.engine(engine);
    let expected = engine_ref.timeline()[20].probability;
    assert!((engine_ref.interpolator().target() - expected).abs() < f32::EPSILON);

    // Past the end clamps onto the last sample.
    dashboard.send(engine, EngineAction::Seek(1_000));
    dashboard.tick(1);
    dashboard.assert_playhead(engine, 23);
}

#[test]
fn test_water_level_settles_on_the_current_sample() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(26);
    dashboard.send(engine, sandbox(70, 24));
    dashboard.tick(1);
    // Freeze the playhead so the target stops moving.
    dashboard.send(engine, EngineAction::TogglePlay);
    dashboard.tick(1);

    dashboard.tick(LevelInterpolator::frames_to_settle(1.0));
    let target = dashboard.engine(engine).current_sample().unwrap().probability;
    assert!((dashboard.water_level(engine) - target).abs() < 1e-3);
}

#[test]
fn test_engines_keep_independent_cadences() {
    let mut dashboard = TestDashboard::new();
    let a = dashboard.spawn_engine(27);
    let b = dashboard.spawn_engine(28);
    dashboard.send(a, sandbox(30, 24));
    dashboard.send(b, sandbox(30, 24));
    dashboard.tick(1);

    dashboard.send(b, EngineAction::TogglePlay);
    dashboard.tick_for(STEP_INTERVAL * 4);

    assert!(dashboard.engine(a).state().playhead >= 4);
    dashboard.assert_playhead(b, 0);
    dashboard.assert_phase(b, PlaybackPhase::Paused);
}
