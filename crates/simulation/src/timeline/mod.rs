//! Hourly risk timelines and the two sources that produce them.
//!
//! A [`Timeline`] is an immutable, reference-counted slice of
//! [`HourlySample`]s. It is replaced wholesale on every run; the host can keep
//! a cheap clone for drawing the step list while the engine plays it.

pub mod prediction;
pub mod sandbox;

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::risk::{classify, RiskBand};

pub use prediction::{
    parse_error_detail, parse_timeline_payload, PredictionClient, PredictionRequest,
    PredictionService, RequestError, WeatherInput,
};
pub use sandbox::{generate_sandbox, SandboxRequest};

/// One hour of a flood-risk timeline.
///
/// On the wire the band is called `risk_state`; `risk_band` is accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub hour: u32,
    pub probability: f32,
    #[serde(rename = "risk_state", alias = "risk_band")]
    pub risk_band: RiskBand,
}

impl HourlySample {
    /// Build a sample whose band is derived from `probability`.
    pub fn classified(hour: u32, probability: f32) -> Self {
        Self {
            hour,
            probability,
            risk_band: classify(probability).band,
        }
    }
}

/// Ordered, finite sequence of hourly samples for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline(Arc<[HourlySample]>);

impl Default for Timeline {
    fn default() -> Self {
        Self(Arc::from(Vec::new()))
    }
}

impl Timeline {
    pub fn new(samples: Vec<HourlySample>) -> Self {
        Self(Arc::from(samples))
    }

    pub fn samples(&self) -> &[HourlySample] {
        &self.0
    }

    /// Index of the final sample, or `None` for an empty timeline.
    pub fn last_index(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    /// Highest probability in the run (0 when empty).
    pub fn peak_probability(&self) -> f32 {
        self.0
            .iter()
            .map(|s| s.probability)
            .fold(0.0_f32, f32::max)
    }
}

impl Deref for Timeline {
    type Target = [HourlySample];

    fn deref(&self) -> &[HourlySample] {
        &self.0
    }
}

impl From<Vec<HourlySample>> for Timeline {
    fn from(samples: Vec<HourlySample>) -> Self {
        Self::new(samples)
    }
}
