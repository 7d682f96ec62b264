use bevy::prelude::*;

pub mod audio_playback;
pub mod camera;

use simulation::PlaybackSet;

/// Window-side output for the playback engines: camera, viewport changes and
/// audible feedback voices.
pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(audio_playback::AudioPlaybackPlugin)
            .add_systems(Startup, camera::setup_camera)
            .add_systems(
                Update,
                camera::restart_render_loops_on_resize.before(PlaybackSet::Commands),
            );
    }
}
