//! Local "what if" timeline generator.
//!
//! Not a hydrological model: a base probability, a sine hump peaking mid-run
//! and a small uniform jitter, clamped to `[0, 1]`. Repeated calls with the
//! same inputs differ unless the caller passes a seeded RNG.

use std::f32::consts::PI;

use rand::Rng;

use crate::config::{
    SANDBOX_HUMP_AMPLITUDE, SANDBOX_JITTER, SANDBOX_MAX_HOURS, SANDBOX_MAX_PERCENT,
    SANDBOX_MIN_HOURS,
};

use super::{HourlySample, Timeline};

/// Parameters for a sandbox run. Constructed through [`SandboxRequest::new`],
/// which clamps both fields into their accepted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxRequest {
    base_probability_percent: u8,
    duration_hours: u32,
}

impl SandboxRequest {
    pub fn new(base_probability_percent: u8, duration_hours: u32) -> Self {
        Self {
            base_probability_percent: base_probability_percent.min(SANDBOX_MAX_PERCENT),
            duration_hours: duration_hours.clamp(SANDBOX_MIN_HOURS, SANDBOX_MAX_HOURS),
        }
    }

    pub fn base_probability_percent(&self) -> u8 {
        self.base_probability_percent
    }

    pub fn duration_hours(&self) -> u32 {
        self.duration_hours
    }
}

impl Default for SandboxRequest {
    fn default() -> Self {
        Self::new(40, 24)
    }
}

/// Generate `duration_hours` samples with contiguous hours starting at 0.
pub fn generate_sandbox<R: Rng + ?Sized>(
    rng: &mut R,
    base_probability_percent: u8,
    duration_hours: u32,
) -> Timeline {
    let base = f32::from(base_probability_percent.min(SANDBOX_MAX_PERCENT)) / 100.0;
    let hours = duration_hours as f32;

    let samples = (0..duration_hours)
        .map(|hour| {
            let variation = (hour as f32 / hours * PI).sin() * SANDBOX_HUMP_AMPLITUDE;
            let jitter = rng.gen_range(-SANDBOX_JITTER..=SANDBOX_JITTER);
            let probability = (base + variation + jitter).clamp(0.0, 1.0);
            HourlySample::classified(hour, probability)
        })
        .collect();

    Timeline::new(samples)
}
