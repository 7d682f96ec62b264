//! Audio playback bridge for the engines' feedback voices.
//!
//! Each engine decides which voices should be sounding (`simulation::audio`).
//! This module mirrors that set onto `AudioPlayer` entities, one per live
//! voice, backed by procedural `Decodable` sources. A voice id the engine no
//! longer reports (replaced, muted, unmounted, engine despawned) gets its
//! player despawned, which stops the sound.

use std::collections::HashSet;
use std::time::Duration;

use bevy::audio::{AddAudioSource, AudioPlugin, Decodable, Source};
use bevy::prelude::*;

use simulation::audio::synth::{RainNoise, WarningTone};
use simulation::audio::{AudioLayer, RainParams, VoiceId, WarningParams};
use simulation::config::SAMPLE_RATE;
use simulation::{AudioAvailability, PlaybackSet, SimulationEngine};

// =============================================================================
// Procedural sources
// =============================================================================

/// Looping lowpass noise for one rain voice.
#[derive(Asset, TypePath, Clone, Copy, Debug)]
pub struct RainNoiseAudio {
    pub params: RainParams,
    pub seed: u64,
}

/// Sawtooth warning tone.
#[derive(Asset, TypePath, Clone, Copy, Debug)]
pub struct WarningToneAudio {
    pub params: WarningParams,
}

pub struct RainDecoder(RainNoise);

impl Iterator for RainDecoder {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.0.next()
    }
}

impl Source for RainDecoder {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Decodable for RainNoiseAudio {
    type DecoderItem = f32;
    type Decoder = RainDecoder;

    fn decoder(&self) -> Self::Decoder {
        RainDecoder(RainNoise::new(self.params, self.seed))
    }
}

pub struct ToneDecoder(WarningTone);

impl Iterator for ToneDecoder {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.0.next()
    }
}

impl Source for ToneDecoder {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Decodable for WarningToneAudio {
    type DecoderItem = f32;
    type Decoder = ToneDecoder;

    fn decoder(&self) -> Self::Decoder {
        ToneDecoder(WarningTone::new(self.params))
    }
}

// =============================================================================
// Voice players
// =============================================================================

/// Marks an audio player entity as the output of one engine voice.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerVoice {
    pub engine: Entity,
    pub layer: AudioLayer,
    pub voice: VoiceId,
}

/// Which `(engine, voice)` pairs currently have a player.
fn playing_voices<'a>(
    players: impl Iterator<Item = (Entity, &'a LayerVoice)>,
    engines: &Query<(Entity, &mut SimulationEngine)>,
    commands: &mut Commands,
) -> HashSet<(Entity, VoiceId)> {
    let mut playing = HashSet::new();
    for (player, voice) in players {
        let live = engines.get(voice.engine).is_ok_and(|(_, engine)| {
            engine
                .audio()
                .live_voices()
                .any(|(layer, id)| layer == voice.layer && id == voice.voice)
        });
        if live {
            playing.insert((voice.engine, voice.voice));
        } else {
            debug!("Stopping {:?} voice {:?}", voice.layer, voice.voice);
            commands.entity(player).despawn();
        }
    }
    playing
}

/// Spawn players for new voices and despawn players for dead ones.
pub fn sync_layer_voices(
    mut commands: Commands,
    mut engines: Query<(Entity, &mut SimulationEngine)>,
    players: Query<(Entity, &LayerVoice)>,
    mut rain_sources: ResMut<Assets<RainNoiseAudio>>,
    mut tone_sources: ResMut<Assets<WarningToneAudio>>,
) {
    let playing = playing_voices(players.iter(), &engines, &mut commands);

    for (entity, mut engine) in &mut engines {
        let rain = engine.audio().rain().copied();
        let warning = engine.audio().warning().copied();

        if let Some(voice) = rain {
            if !playing.contains(&(entity, voice.id)) {
                let handle = rain_sources.add(RainNoiseAudio {
                    params: voice.params,
                    seed: engine.fork_seed(),
                });
                commands.spawn((
                    AudioPlayer(handle),
                    PlaybackSettings::LOOP,
                    LayerVoice {
                        engine: entity,
                        layer: AudioLayer::Rain,
                        voice: voice.id,
                    },
                ));
            }
        }

        if let Some(voice) = warning {
            if !playing.contains(&(entity, voice.id)) {
                let handle = tone_sources.add(WarningToneAudio {
                    params: voice.params,
                });
                commands.spawn((
                    AudioPlayer(handle),
                    PlaybackSettings::LOOP,
                    LayerVoice {
                        engine: entity,
                        layer: AudioLayer::Warning,
                        voice: voice.id,
                    },
                ));
            }
        }
    }
}

// =============================================================================
// Plugin
// =============================================================================

/// What this build can do for audio output, given the plugins in the app.
pub fn detect_audio_availability(audio_plugin_added: bool) -> AudioAvailability {
    if !audio_plugin_added {
        AudioAvailability::Unavailable
    } else if cfg!(target_arch = "wasm32") {
        // Browsers hold new audio contexts until a user gesture.
        AudioAvailability::Suspended
    } else {
        AudioAvailability::Available
    }
}

/// Plugin that turns engine voices into audible output.
pub struct AudioPlaybackPlugin;

impl Plugin for AudioPlaybackPlugin {
    fn build(&self, app: &mut App) {
        let audio_plugin_added = app.is_plugin_added::<AudioPlugin>();
        let availability = detect_audio_availability(audio_plugin_added);
        info!("Audio output: {:?}", availability);
        app.insert_resource(availability);

        if !audio_plugin_added {
            return;
        }
        app.add_audio_source::<RainNoiseAudio>()
            .add_audio_source::<WarningToneAudio>()
            .add_systems(Update, sync_layer_voices.after(PlaybackSet::Visual));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simulation::engine::RunRequest;
    use simulation::timeline::SandboxRequest;

    /// App without an audio device: assets exist, players are plain entities.
    fn voice_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()));
        app.init_asset::<RainNoiseAudio>()
            .init_asset::<WarningToneAudio>()
            .add_systems(Update, sync_layer_voices);
        app
    }

    fn voices(app: &mut App) -> Vec<LayerVoice> {
        let mut query = app.world_mut().query::<&LayerVoice>();
        query.iter(app.world()).copied().collect()
    }

    fn engine_mut(app: &mut App, entity: Entity) -> Mut<'_, SimulationEngine> {
        app.world_mut()
            .get_mut::<SimulationEngine>(entity)
            .expect("engine entity")
    }

    #[test]
    fn test_availability_detection() {
        assert_eq!(
            detect_audio_availability(false),
            AudioAvailability::Unavailable
        );
        if !cfg!(target_arch = "wasm32") {
            assert_eq!(detect_audio_availability(true), AudioAvailability::Available);
        }
    }

    #[test]
    fn test_players_follow_engine_voices() {
        let mut app = voice_app();
        let mut engine = SimulationEngine::with_seed(5);
        engine.mount();
        engine
            .run(
                RunRequest::Sandbox(SandboxRequest::new(95, 24)),
                AudioAvailability::Available,
            )
            .unwrap();
        let expected = engine.audio().active_voices();
        let entity = app.world_mut().spawn(engine).id();

        app.update();
        let players = voices(&mut app);
        assert_eq!(players.len(), expected);
        assert!(players.iter().all(|v| v.engine == entity));

        // Steady state: no duplicates.
        app.update();
        assert_eq!(voices(&mut app).len(), expected);

        engine_mut(&mut app, entity).set_muted(true);
        app.update();
        assert!(voices(&mut app).is_empty());
    }

    #[test]
    fn test_players_of_despawned_engine_are_removed() {
        let mut app = voice_app();
        let mut engine = SimulationEngine::with_seed(6);
        engine
            .run(
                RunRequest::Sandbox(SandboxRequest::new(50, 24)),
                AudioAvailability::Available,
            )
            .unwrap();
        let entity = app.world_mut().spawn(engine).id();
        app.update();
        assert!(!voices(&mut app).is_empty());

        app.world_mut().despawn(entity);
        app.update();
        assert!(voices(&mut app).is_empty());
    }

    #[test]
    fn test_rain_replacement_swaps_player() {
        let mut app = voice_app();
        let mut engine = SimulationEngine::with_seed(7);
        engine
            .run(
                RunRequest::Sandbox(SandboxRequest::new(10, 24)),
                AudioAvailability::Available,
            )
            .unwrap();
        let entity = app.world_mut().spawn(engine).id();
        app.update();
        let before: Vec<VoiceId> = voices(&mut app).iter().map(|v| v.voice).collect();

        // A new run at a very different level replaces the rain voice.
        engine_mut(&mut app, entity)
            .run(
                RunRequest::Sandbox(SandboxRequest::new(90, 24)),
                AudioAvailability::Available,
            )
            .unwrap();
        app.update();
        let after: Vec<LayerVoice> = voices(&mut app);
        let rain: Vec<&LayerVoice> = after
            .iter()
            .filter(|v| v.layer == AudioLayer::Rain)
            .collect();
        assert_eq!(rain.len(), 1);
        assert!(!before.contains(&rain[0].voice));
    }
}
