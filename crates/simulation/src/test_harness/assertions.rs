//! Assertion helpers for `TestDashboard` integration tests.

use bevy::prelude::*;

use crate::playback::PlaybackPhase;

use super::TestDashboard;

impl TestDashboard {
    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_phase(&self, engine: Entity, expected: PlaybackPhase) {
        let phase = self.engine(engine).state().phase;
        assert_eq!(phase, expected, "engine {engine:?} in {phase:?}");
    }

    pub fn assert_playhead(&self, engine: Entity, expected: usize) {
        let playhead = self.engine(engine).state().playhead;
        assert_eq!(playhead, expected, "engine {engine:?} playhead");
    }

    /// No rain and no warning voice.
    pub fn assert_silent(&self, engine: Entity) {
        let voices = self.engine(engine).audio().active_voices();
        assert_eq!(voices, 0, "expected silence, {voices} voice(s) active");
    }

    /// Nothing periodic left running: no step cadence, no render loop.
    pub fn assert_fully_stopped(&self, engine: Entity) {
        let engine_ref = self.engine(engine);
        assert!(
            !engine_ref.controller().is_cadence_active(),
            "step cadence still active"
        );
        assert!(
            !engine_ref.interpolator().is_running(),
            "render loop still running"
        );
        self.assert_silent(engine);
    }
}
