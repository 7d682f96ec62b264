//! Mount/unmount, render-loop restarts and platform audio state.

use crate::audio::{AudioAvailability, AudioContextState};
use crate::config::STEP_INTERVAL;
use crate::engine::RunRequest;
use crate::playback::PlaybackPhase;
use crate::systems::EngineAction;
use crate::test_harness::TestDashboard;
use crate::timeline::SandboxRequest;

fn sandbox(percent: u8) -> EngineAction {
    EngineAction::Run(RunRequest::Sandbox(SandboxRequest::new(percent, 24)))
}

#[test]
fn test_unmount_leaves_nothing_running() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(41);
    dashboard.send(engine, sandbox(90));
    dashboard.tick_for(STEP_INTERVAL * 2);

    dashboard.send(engine, EngineAction::Unmount);
    dashboard.tick(1);
    dashboard.assert_fully_stopped(engine);
    let playhead = dashboard.engine(engine).state().playhead;
    let level = dashboard.water_level(engine);

    dashboard.tick_for(STEP_INTERVAL * 5);
    dashboard.assert_playhead(engine, playhead);
    assert_eq!(dashboard.water_level(engine), level, "no frames after unmount");
}

#[test]
fn test_remount_resumes_frames_but_not_playback() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(42);
    dashboard.send(engine, sandbox(60));
    dashboard.tick(1);
    dashboard.send(engine, EngineAction::Unmount);
    dashboard.tick(1);

    dashboard.send(engine, EngineAction::Mount);
    dashboard.tick(1);
    assert!(dashboard.engine(engine).interpolator().is_running());
    dashboard.assert_phase(engine, PlaybackPhase::Paused);
}

#[test]
fn test_resize_restarts_the_render_loop() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(43);
    dashboard.send(engine, sandbox(50));
    dashboard.tick(10);
    let before = dashboard.engine(engine).interpolator().generation();

    dashboard.send(engine, EngineAction::RestartRenderLoop);
    dashboard.tick(3);
    let interpolator = dashboard.engine(engine).interpolator();
    assert_ne!(interpolator.generation(), before);
    assert!(interpolator.is_running());
    assert_eq!(interpolator.frames_this_generation(), 3);
}

#[test]
fn test_unavailable_audio_keeps_visual_playback() {
    let mut dashboard = TestDashboard::new().with_audio(AudioAvailability::Unavailable);
    let engine = dashboard.spawn_engine(44);
    dashboard.send(engine, sandbox(95));
    dashboard.tick_for(STEP_INTERVAL * 3);

    let engine_ref = dashboard.engine(engine);
    assert_eq!(engine_ref.state().phase, PlaybackPhase::Playing);
    assert!(engine_ref.state().playhead >= 2);
    assert_eq!(engine_ref.audio().context(), AudioContextState::Unavailable);
    assert_eq!(engine_ref.audio().voices_started(), 0);
    assert!(dashboard.water_level(engine) > 0.0);
}

#[test]
fn test_audio_withdrawn_mid_run_goes_silent() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(45);
    dashboard.send(engine, sandbox(80));
    dashboard.tick(1);
    assert!(dashboard.engine(engine).audio().active_voices() > 0);

    dashboard
        .world_mut()
        .insert_resource(AudioAvailability::Suspended);
    dashboard.tick_for(STEP_INTERVAL * 2);
    dashboard.assert_silent(engine);
    dashboard.assert_phase(engine, PlaybackPhase::Playing);

    // The next user-triggered run resumes the context.
    dashboard.send(engine, sandbox(80));
    dashboard.tick(1);
    assert_eq!(
        dashboard.engine(engine).audio().context(),
        AudioContextState::Running
    );
    assert!(dashboard.engine(engine).audio().active_voices() > 0);
}

#[test]
fn test_unmounted_engine_ignores_transport_and_runs() {
    let mut dashboard = TestDashboard::new();
    let engine = dashboard.spawn_engine(46);
    dashboard.send(engine, sandbox(90));
    dashboard.tick(1);
    dashboard.send(engine, EngineAction::Unmount);
    dashboard.tick(1);

    dashboard.send(engine, EngineAction::TogglePlay);
    dashboard.send(engine, sandbox(95));
    dashboard.send(engine, EngineAction::SetMuted(false));
    dashboard.tick_for(STEP_INTERVAL * 2);

    dashboard.assert_fully_stopped(engine);
    assert!(!dashboard.engine(engine).is_mounted());
    assert_eq!(dashboard.log().loaded.len(), 1, "only the run before unmount loaded");
}
