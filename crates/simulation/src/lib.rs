use bevy::prelude::*;

pub mod audio;
pub mod config;
pub mod engine;
pub mod interpolation;
pub mod playback;
pub mod risk;
pub mod sim_rng;
pub mod simulation_sets;
pub mod systems;
pub mod timeline;

#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use audio::AudioAvailability;
pub use config::PredictionEndpoint;
pub use engine::{EngineError, RunRequest, SimulationEngine, SimulationMode};
pub use simulation_sets::PlaybackSet;
pub use systems::{EngineAction, EngineCommand, RunFailed, TimelineLoaded, WaterLevel};
pub use timeline::PredictionService;

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Registers the playback engine: resources, host events and the ordered
/// `Update` systems. Engines themselves are spawned by the host as
/// [`SimulationEngine`] components.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let endpoint = PredictionEndpoint::from_env();
        info!("Prediction service at {}", endpoint.base_url);

        app.insert_resource(PredictionService::for_endpoint(&endpoint))
            .insert_resource(endpoint)
            .init_resource::<AudioAvailability>()
            .add_event::<EngineCommand>()
            .add_event::<TimelineLoaded>()
            .add_event::<RunFailed>();

        app.configure_sets(
            Update,
            (PlaybackSet::Commands, PlaybackSet::Step, PlaybackSet::Visual).chain(),
        );

        app.add_systems(
            Update,
            (
                systems::mount_new_engines,
                systems::handle_engine_commands,
                systems::collect_prediction_results,
                systems::sync_audio_availability,
            )
                .chain()
                .in_set(PlaybackSet::Commands),
        )
        .add_systems(
            Update,
            systems::advance_playback.in_set(PlaybackSet::Step),
        )
        .add_systems(
            Update,
            systems::step_render_frames.in_set(PlaybackSet::Visual),
        );
    }
}
