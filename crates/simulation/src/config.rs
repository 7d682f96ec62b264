use std::time::Duration;

use bevy::prelude::*;

/// Wall-clock interval between two playhead steps.
pub const STEP_INTERVAL: Duration = Duration::from_millis(1200);

/// Fraction of the remaining distance the water level covers each frame.
pub const SMOOTHING_FACTOR: f32 = 0.08;
/// Below this distance the water level snaps onto its target.
pub const SNAP_EPSILON: f32 = 0.001;

/// Amplitude of the mid-run hump added by the sandbox generator.
pub const SANDBOX_HUMP_AMPLITUDE: f32 = 0.15;
/// Half-width of the uniform jitter added to each sandbox sample.
pub const SANDBOX_JITTER: f32 = 0.05;
pub const SANDBOX_MAX_PERCENT: u8 = 100;
pub const SANDBOX_MIN_HOURS: u32 = 1;
pub const SANDBOX_MAX_HOURS: u32 = 168;

/// Horizon requested from the prediction service.
pub const PREDICTION_HORIZON_HOURS: u32 = 24;

pub const RAIN_GAIN_MIN: f32 = 0.08;
pub const RAIN_GAIN_MAX: f32 = 0.9;
pub const RAIN_CUTOFF_BASE_HZ: f32 = 800.0;
pub const RAIN_CUTOFF_SPAN_HZ: f32 = 600.0;
/// Rain parameter changes smaller than these keep the running voice.
pub const RAIN_GAIN_TOLERANCE: f32 = 0.01;
pub const RAIN_CUTOFF_TOLERANCE_HZ: f32 = 6.0;

pub const WARNING_FREQUENCY_HZ: f32 = 880.0;
pub const WARNING_GAIN: f32 = 0.04;

pub const SAMPLE_RATE: u32 = 44_100;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
/// Environment variable overriding [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "FLOODWATCH_API_URL";

/// Base URL of the prediction service.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct PredictionEndpoint {
    pub base_url: String,
}

impl Default for PredictionEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl PredictionEndpoint {
    /// Reads `FLOODWATCH_API_URL`, falling back to the local development server.
    pub fn from_env() -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Full URL of the timeline simulation route.
    pub fn simulate_url(&self) -> String {
        format!("{}/simulate", self.base_url)
    }
}
