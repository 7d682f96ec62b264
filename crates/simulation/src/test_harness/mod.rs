//! # TestDashboard: headless integration test harness
//!
//! Wraps `bevy::app::App` + `MinimalPlugins` + `SimulationPlugin` with a
//! manually stepped clock, a scripted prediction service and a log of
//! outbound events, so whole runs can be driven without a window, an audio
//! device or a network.

mod assertions;
mod queries;
mod stub;

use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::audio::AudioAvailability;
use crate::systems::{RunFailed, TimelineLoaded};
use crate::timeline::{PredictionClient, PredictionService};
use crate::{PlaybackSet, SimulationPlugin};

pub use stub::StubPrediction;

/// Simulated wall-clock time per `app.update()`.
pub const FRAME: Duration = Duration::from_millis(100);

/// Outbound events collected across frames (Bevy only keeps them for two).
#[derive(Resource, Default, Debug)]
pub struct OutcomeLog {
    pub loaded: Vec<TimelineLoaded>,
    pub failed: Vec<RunFailed>,
}

fn record_outcomes(
    mut log: ResMut<OutcomeLog>,
    mut loaded: EventReader<TimelineLoaded>,
    mut failed: EventReader<RunFailed>,
) {
    log.loaded.extend(loaded.read().cloned());
    log.failed.extend(failed.read().cloned());
}

/// A headless dashboard for integration testing.
///
/// Spawn engines with [`TestDashboard::spawn_engine`], send them commands,
/// then `tick()` and assert on engine state.
pub struct TestDashboard {
    app: App,
}

impl Default for TestDashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDashboard {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Audio available, and a prediction service that fails every request
    /// with a network error until replaced.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SimulationPlugin);

        // Override what the plugin derived from the environment.
        app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
        app.insert_resource(AudioAvailability::Available);
        app.insert_resource(PredictionService::new(StubPrediction::unreachable()));

        app.init_resource::<OutcomeLog>();
        app.add_systems(Update, record_outcomes.after(PlaybackSet::Visual));

        // First update has a zero time delta; get it out of the way.
        app.update();

        Self { app }
    }

    // -----------------------------------------------------------------------
    // Setup (builder pattern, consumes and returns Self)
    // -----------------------------------------------------------------------

    pub fn with_prediction(mut self, client: impl PredictionClient) -> Self {
        self.app
            .world_mut()
            .insert_resource(PredictionService::new(client));
        self
    }

    pub fn with_audio(mut self, availability: AudioAvailability) -> Self {
        self.app.world_mut().insert_resource(availability);
        self
    }
}
