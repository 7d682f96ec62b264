//! Procedural audio feedback for the flood simulation.
//!
//! Owns the data layer: which voices should be sounding and with what
//! parameters. The rendering crate turns each live [`Voice`] into an audio
//! player backed by the generators in [`synth`]; this module never touches an
//! output device.
//!
//! Two layers:
//! - **Rain**: looping lowpass noise, `gain = clamp(p, 0.08, 0.9)`,
//!   `cutoff = 800 + 600·p` Hz.
//! - **Warning**: 880 Hz sawtooth at a low fixed gain, sounding only while the
//!   current band is CRITICAL.
//!
//! Parameters are not automated in place. When the rain parameters move
//! materially the running voice is stopped and a new one (new [`VoiceId`])
//! is started. Updates are driven by playhead steps, loads, seeks and mute
//! changes, never by animation frames.

pub mod synth;

use std::fmt;

use bevy::prelude::*;

use crate::config::{
    RAIN_CUTOFF_BASE_HZ, RAIN_CUTOFF_SPAN_HZ, RAIN_CUTOFF_TOLERANCE_HZ, RAIN_GAIN_MAX,
    RAIN_GAIN_MIN, RAIN_GAIN_TOLERANCE, WARNING_FREQUENCY_HZ, WARNING_GAIN,
};
use crate::risk::RiskBand;

// =============================================================================
// Platform state
// =============================================================================

/// What the host platform currently allows for audio output.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioAvailability {
    Available,
    /// Output exists but starts suspended until a user gesture (browser
    /// autoplay policy).
    Suspended,
    /// No output device, or the platform refused one.
    #[default]
    Unavailable,
}

/// Lifecycle of an engine's audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioContextState {
    /// Not created yet; created on the first user-triggered run.
    #[default]
    Uninitialized,
    Suspended,
    Running,
    Unavailable,
}

/// The platform denied audio. Non-fatal: playback continues silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioInitError {
    Unavailable,
}

impl fmt::Display for AudioInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioInitError::Unavailable => write!(f, "Audio output is unavailable"),
        }
    }
}

impl std::error::Error for AudioInitError {}

// =============================================================================
// Voices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioLayer {
    Rain,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainParams {
    pub gain: f32,
    pub cutoff_hz: f32,
}

impl RainParams {
    pub fn for_probability(probability: f32) -> Self {
        let p = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            gain: p.clamp(RAIN_GAIN_MIN, RAIN_GAIN_MAX),
            cutoff_hz: RAIN_CUTOFF_BASE_HZ + p * RAIN_CUTOFF_SPAN_HZ,
        }
    }

    /// Whether switching from `self` to `other` warrants restarting the voice.
    pub fn differs_materially(&self, other: &RainParams) -> bool {
        (self.gain - other.gain).abs() > RAIN_GAIN_TOLERANCE
            || (self.cutoff_hz - other.cutoff_hz).abs() > RAIN_CUTOFF_TOLERANCE_HZ
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningParams {
    pub frequency_hz: f32,
    pub gain: f32,
}

impl Default for WarningParams {
    fn default() -> Self {
        Self {
            frequency_hz: WARNING_FREQUENCY_HZ,
            gain: WARNING_GAIN,
        }
    }
}

/// One live instance of a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice<P> {
    pub id: VoiceId,
    pub params: P,
}

// =============================================================================
// Engine
// =============================================================================

/// Per-engine audio feedback state.
#[derive(Debug, Default)]
pub struct AudioFeedback {
    context: AudioContextState,
    muted: bool,
    rain: Option<Voice<RainParams>>,
    warning: Option<Voice<WarningParams>>,
    next_voice: u64,
    voices_started: u64,
}

impl AudioFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> AudioContextState {
        self.context
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn rain(&self) -> Option<&Voice<RainParams>> {
        self.rain.as_ref()
    }

    pub fn warning(&self) -> Option<&Voice<WarningParams>> {
        self.warning.as_ref()
    }

    /// Number of voices currently sounding (0..=2).
    pub fn active_voices(&self) -> usize {
        usize::from(self.rain.is_some()) + usize::from(self.warning.is_some())
    }

    /// Total voices ever started by this engine.
    pub fn voices_started(&self) -> u64 {
        self.voices_started
    }

    /// Ids of every live voice with its layer.
    pub fn live_voices(&self) -> impl Iterator<Item = (AudioLayer, VoiceId)> + '_ {
        self.rain
            .iter()
            .map(|v| (AudioLayer::Rain, v.id))
            .chain(self.warning.iter().map(|v| (AudioLayer::Warning, v.id)))
    }

    /// Create the context on first use, or resume it if the platform left it
    /// suspended. Called from user-triggered runs only.
    pub fn ensure_context(&mut self, platform: AudioAvailability) -> Result<(), AudioInitError> {
        match platform {
            AudioAvailability::Unavailable => {
                self.context = AudioContextState::Unavailable;
                self.silence();
                Err(AudioInitError::Unavailable)
            }
            AudioAvailability::Suspended | AudioAvailability::Available => {
                match self.context {
                    AudioContextState::Running => {}
                    AudioContextState::Suspended => debug!("Resuming suspended audio context"),
                    AudioContextState::Uninitialized | AudioContextState::Unavailable => {
                        debug!("Audio context created")
                    }
                }
                self.context = AudioContextState::Running;
                Ok(())
            }
        }
    }

    /// The platform pulled the output away. Silences everything until the
    /// next [`ensure_context`](Self::ensure_context).
    pub fn suspend(&mut self, platform: AudioAvailability) {
        if self.context != AudioContextState::Running {
            return;
        }
        self.silence();
        self.context = match platform {
            AudioAvailability::Unavailable => AudioContextState::Unavailable,
            _ => AudioContextState::Suspended,
        };
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.silence();
        }
    }

    /// Re-derive both layers from the sample under the playhead.
    ///
    /// `None` (no timeline) silences everything, as do a muted engine and a
    /// context that is not running.
    pub fn update(&mut self, current: Option<(f32, RiskBand)>) {
        let Some((probability, band)) = current else {
            self.silence();
            return;
        };
        if self.muted || self.context != AudioContextState::Running {
            self.silence();
            return;
        }

        let desired = RainParams::for_probability(probability);
        let keep = self
            .rain
            .as_ref()
            .is_some_and(|voice| !voice.params.differs_materially(&desired));
        if !keep {
            self.stop_rain();
            let id = self.allocate_voice();
            debug!(
                "Rain voice {:?}: gain={:.2} cutoff={:.0}Hz",
                id, desired.gain, desired.cutoff_hz
            );
            self.rain = Some(Voice {
                id,
                params: desired,
            });
        }

        if band.is_critical() {
            if self.warning.is_none() {
                let id = self.allocate_voice();
                debug!("Warning tone {:?} started", id);
                self.warning = Some(Voice {
                    id,
                    params: WarningParams::default(),
                });
            }
        } else {
            self.stop_warning();
        }
    }

    /// Stop both layers. Safe to call any number of times.
    pub fn silence(&mut self) {
        self.stop_rain();
        self.stop_warning();
    }

    pub fn stop_rain(&mut self) {
        if let Some(voice) = self.rain.take() {
            debug!("Rain voice {:?} stopped", voice.id);
        }
    }

    pub fn stop_warning(&mut self) {
        if let Some(voice) = self.warning.take() {
            debug!("Warning tone {:?} stopped", voice.id);
        }
    }

    fn allocate_voice(&mut self) -> VoiceId {
        self.next_voice += 1;
        self.voices_started += 1;
        VoiceId(self.next_voice)
    }
}

// =============================================================================
// Tests
// =============================================================================
