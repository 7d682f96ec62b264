use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use simulation::PlaybackSet;

pub mod dashboard_panel;
pub mod step_list;
pub mod theme;
pub mod water_canvas;

pub use dashboard_panel::DashboardPanel;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<EguiPlugin>() {
            app.add_plugins(EguiPlugin);
        }
        app.add_systems(Startup, theme::apply_flood_theme)
            .add_systems(
                Update,
                (
                    dashboard_panel::record_run_outcomes,
                    dashboard_panel::dashboard_ui,
                )
                    .chain()
                    .after(PlaybackSet::Visual),
            );
    }
}
