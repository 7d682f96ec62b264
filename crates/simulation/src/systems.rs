//! ECS glue: host commands in, engine stepping, fetch tasks, outcome events.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};

use crate::audio::AudioAvailability;
use crate::config::PREDICTION_HORIZON_HOURS;
use crate::engine::{
    EngineError, FetchTicket, RunOutcome, RunRequest, SimulationEngine, SimulationMode,
};
use crate::timeline::{PredictionService, RequestError, Timeline, WeatherInput};

// =============================================================================
// Events & components
// =============================================================================

/// Host request addressed to one engine entity.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EngineCommand {
    pub engine: Entity,
    pub action: EngineAction,
}

impl EngineCommand {
    pub fn new(engine: Entity, action: EngineAction) -> Self {
        Self { engine, action }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineAction {
    Run(RunRequest),
    TogglePlay,
    SetMuted(bool),
    Seek(usize),
    SwitchMode(SimulationMode),
    SetBaseInput(WeatherInput),
    Mount,
    Unmount,
    /// The drawing surface was resized.
    RestartRenderLoop,
}

/// A run produced a timeline and playback started (if non-empty).
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct TimelineLoaded {
    pub engine: Entity,
    pub samples: usize,
}

/// A run failed; the engine is still usable.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct RunFailed {
    pub engine: Entity,
    pub error: EngineError,
}

/// In-flight prediction request for an engine. Removing the component drops
/// the task, which cancels it.
#[derive(Component)]
pub struct PendingPrediction {
    ticket: FetchTicket,
    task: Task<Result<Timeline, RequestError>>,
}

/// Smoothed water level published once per frame for the canvas.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct WaterLevel(pub f32);

// =============================================================================
// Systems
// =============================================================================

/// Engines spawned by the host are mounted on their first frame.
pub fn mount_new_engines(
    mut commands: Commands,
    mut engines: Query<(Entity, &mut SimulationEngine), Added<SimulationEngine>>,
) {
    for (entity, mut engine) in &mut engines {
        if !engine.is_mounted() {
            engine.mount();
        }
        commands.entity(entity).insert(WaterLevel(engine.level()));
        debug!("Mounted simulation engine {:?}", entity);
    }
}

pub fn handle_engine_commands(
    mut commands: Commands,
    mut events: EventReader<EngineCommand>,
    mut engines: Query<&mut SimulationEngine>,
    service: Res<PredictionService>,
    availability: Res<AudioAvailability>,
    mut loaded: EventWriter<TimelineLoaded>,
    mut failed: EventWriter<RunFailed>,
) {
    for command in events.read() {
        let entity = command.engine;
        let Ok(mut engine) = engines.get_mut(entity) else {
            warn!("Command for missing engine {:?}: {:?}", entity, command.action);
            continue;
        };
        // A torn-down panel only accepts being mounted again.
        if !engine.is_mounted() && command.action != EngineAction::Mount {
            debug!(
                "Ignoring {:?} for unmounted engine {:?}",
                command.action, entity
            );
            continue;
        }

        match &command.action {
            EngineAction::Run(request) => match engine.run(request.clone(), *availability) {
                Ok(RunOutcome::Loaded { samples }) => {
                    commands.entity(entity).remove::<PendingPrediction>();
                    loaded.send(TimelineLoaded {
                        engine: entity,
                        samples,
                    });
                }
                Ok(RunOutcome::AwaitingPrediction { ticket, input }) => {
                    let client = Arc::clone(&service.0);
                    let task = IoTaskPool::get()
                        .spawn(async move { client.simulate(&input, PREDICTION_HORIZON_HOURS) });
                    // Replaces (and thereby cancels) any older request.
                    commands
                        .entity(entity)
                        .insert(PendingPrediction { ticket, task });
                }
                Err(error) => {
                    warn!("Run rejected: {}", error);
                    failed.send(RunFailed {
                        engine: entity,
                        error,
                    });
                }
            },
            EngineAction::TogglePlay => {
                if let Err(e) = engine.toggle_play() {
                    debug!("Toggle ignored: {}", e);
                }
            }
            EngineAction::SetMuted(muted) => engine.set_muted(*muted),
            EngineAction::Seek(index) => {
                if let Err(e) = engine.seek(*index) {
                    debug!("Seek ignored: {}", e);
                }
            }
            EngineAction::SwitchMode(mode) => {
                engine.switch_mode(*mode);
                commands.entity(entity).remove::<PendingPrediction>();
            }
            EngineAction::SetBaseInput(input) => engine.set_base_input(input.clone()),
            EngineAction::Mount => {
                engine.mount();
            }
            EngineAction::Unmount => {
                engine.unmount();
                commands.entity(entity).remove::<PendingPrediction>();
                debug!("Unmounted simulation engine {:?}", entity);
            }
            EngineAction::RestartRenderLoop => {
                engine.restart_render_loop();
            }
        }
    }
}

/// Poll in-flight prediction tasks and apply finished ones.
pub fn collect_prediction_results(
    mut commands: Commands,
    mut query: Query<(Entity, &mut SimulationEngine, &mut PendingPrediction)>,
    mut loaded: EventWriter<TimelineLoaded>,
    mut failed: EventWriter<RunFailed>,
) {
    for (entity, mut engine, mut pending) in &mut query {
        let Some(result) = block_on(futures_lite::future::poll_once(&mut pending.task)) else {
            continue;
        };
        commands.entity(entity).remove::<PendingPrediction>();

        match engine.finish_prediction(pending.ticket, result) {
            Ok(Some(samples)) => {
                loaded.send(TimelineLoaded {
                    engine: entity,
                    samples,
                });
            }
            Ok(None) => {}
            Err(error) => {
                warn!("Prediction failed: {}", error);
                failed.send(RunFailed {
                    engine: entity,
                    error,
                });
            }
        }
    }
}

/// Silence every engine when the platform withdraws audio output.
pub fn sync_audio_availability(
    availability: Res<AudioAvailability>,
    mut engines: Query<&mut SimulationEngine>,
) {
    if !availability.is_changed() || *availability == AudioAvailability::Available {
        return;
    }
    for mut engine in &mut engines {
        engine.suspend_audio(*availability);
    }
}

/// Drive each engine's step cadence by the frame delta.
pub fn advance_playback(time: Res<Time>, mut engines: Query<&mut SimulationEngine>) {
    let delta = time.delta();
    if delta.is_zero() {
        return;
    }
    for mut engine in &mut engines {
        if engine.controller().is_cadence_active() {
            engine.advance(delta);
        }
    }
}

/// One render-loop frame per engine; the level lands in [`WaterLevel`].
pub fn step_render_frames(mut engines: Query<(&mut SimulationEngine, &mut WaterLevel)>) {
    for (mut engine, mut level) in &mut engines {
        if let Some(current) = engine.frame() {
            level.set_if_neq(WaterLevel(current));
        }
    }
}
