//! Window camera and viewport changes.

use bevy::prelude::*;
use bevy::window::WindowResized;

use simulation::{EngineAction, EngineCommand, SimulationEngine};

/// The dashboard is drawn entirely by egui; a 2D camera gives it a cleared
/// surface to draw on.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2d, Name::new("Dashboard camera")));
}

/// A window resize invalidates every engine's render loop.
pub fn restart_render_loops_on_resize(
    mut resized: EventReader<WindowResized>,
    engines: Query<(Entity, &SimulationEngine)>,
    mut commands: EventWriter<EngineCommand>,
) {
    // Many resize events can arrive in one frame while dragging.
    if resized.read().last().is_none() {
        return;
    }
    for (entity, engine) in &engines {
        if engine.is_mounted() {
            commands.send(EngineCommand::new(entity, EngineAction::RestartRenderLoop));
        }
    }
}
