use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy::winit::{UpdateMode, WinitSettings};

use simulation::SimulationEngine;
use ui::DashboardPanel;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Floodwatch".to_string(),
                resolution: (1100.0, 760.0).into(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.06, 0.08, 0.1)))
        .insert_resource(WinitSettings {
            // The water column animates every frame while focused.
            focused_mode: UpdateMode::Continuous,
            unfocused_mode: UpdateMode::reactive_low_power(std::time::Duration::from_millis(100)),
        })
        .add_plugins((
            simulation::SimulationPlugin,
            rendering::RenderingPlugin,
            ui::UiPlugin,
        ))
        .add_systems(Startup, spawn_dashboard)
        .run();
}

fn spawn_dashboard(mut commands: Commands) {
    commands.spawn((
        SimulationEngine::default(),
        DashboardPanel::default(),
        Name::new("Flood dashboard"),
    ));
}
