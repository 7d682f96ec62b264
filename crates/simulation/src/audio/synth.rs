//! Sample generators for the two feedback layers.
//!
//! Both are infinite mono `f32` streams at [`SAMPLE_RATE`]; the rendering
//! crate wraps them as Bevy audio sources.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SAMPLE_RATE;

use super::{RainParams, WarningParams};

/// White noise through a one-pole lowpass, scaled by the rain gain.
#[derive(Debug, Clone)]
pub struct RainNoise {
    rng: ChaCha8Rng,
    alpha: f32,
    state: f32,
    gain: f32,
}

impl RainNoise {
    pub fn new(params: RainParams, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            alpha: lowpass_alpha(params.cutoff_hz, SAMPLE_RATE),
            state: 0.0,
            gain: params.gain,
        }
    }
}

impl Iterator for RainNoise {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let white: f32 = self.rng.gen_range(-1.0..=1.0);
        self.state += self.alpha * (white - self.state);
        Some(self.state * self.gain)
    }
}

/// Smoothing coefficient of a one-pole lowpass at `cutoff_hz`.
pub fn lowpass_alpha(cutoff_hz: f32, sample_rate: u32) -> f32 {
    let cutoff = cutoff_hz.max(0.0);
    1.0 - (-TAU * cutoff / sample_rate as f32).exp()
}

/// Naive sawtooth in `[-gain, gain)`.
#[derive(Debug, Clone)]
pub struct WarningTone {
    phase: f32,
    increment: f32,
    gain: f32,
}

impl WarningTone {
    pub fn new(params: WarningParams) -> Self {
        Self {
            phase: 0.0,
            increment: params.frequency_hz / SAMPLE_RATE as f32,
            gain: params.gain,
        }
    }
}

impl Iterator for WarningTone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let value = (2.0 * self.phase - 1.0) * self.gain;
        self.phase = (self.phase + self.increment).rem_euclid(1.0);
        Some(value)
    }
}
