//! Probability → risk band classification.
//!
//! Every other part of the engine (sandbox generator, audio warning layer,
//! water-column colour) derives its notion of "how bad" from this one pure
//! function. Intervals are closed-open, so a boundary value belongs to the
//! upper band.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// Ordinal flood risk band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    #[default]
    Low,
    Moderate,
    High,
    Critical,
}

/// Result of classifying a probability: the band plus its display colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub band: RiskBand,
    pub color: Color,
}

// =============================================================================
// Constants
// =============================================================================

/// Lower bound (inclusive) of the MODERATE band.
pub const MODERATE_THRESHOLD: f32 = 0.3;
/// Lower bound (inclusive) of the HIGH band.
pub const HIGH_THRESHOLD: f32 = 0.5;
/// Lower bound (inclusive) of the CRITICAL band.
pub const CRITICAL_THRESHOLD: f32 = 0.7;

// =============================================================================
// Classification
// =============================================================================

/// Classify a flood probability. Total: NaN and out-of-range inputs still map
/// to a band (NaN → LOW, negatives → LOW, above 1 → CRITICAL).
pub fn classify(probability: f32) -> RiskAssessment {
    let band = RiskBand::from_probability(probability);
    RiskAssessment {
        band,
        color: band.color(),
    }
}

impl RiskBand {
    pub const ALL: [RiskBand; 4] = [
        RiskBand::Low,
        RiskBand::Moderate,
        RiskBand::High,
        RiskBand::Critical,
    ];

    pub fn from_probability(probability: f32) -> Self {
        if probability >= CRITICAL_THRESHOLD {
            RiskBand::Critical
        } else if probability >= HIGH_THRESHOLD {
            RiskBand::High
        } else if probability >= MODERATE_THRESHOLD {
            RiskBand::Moderate
        } else {
            // Also catches NaN, which fails every comparison above.
            RiskBand::Low
        }
    }

    /// Label used on the wire and in the step list.
    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "LOW",
            RiskBand::Moderate => "MODERATE",
            RiskBand::High => "HIGH",
            RiskBand::Critical => "CRITICAL",
        }
    }

    /// Display colour: green, yellow, orange, red.
    pub fn color(self) -> Color {
        match self {
            RiskBand::Low => Color::srgb(0.13, 0.77, 0.37),
            RiskBand::Moderate => Color::srgb(0.92, 0.70, 0.03),
            RiskBand::High => Color::srgb(0.98, 0.45, 0.09),
            RiskBand::Critical => Color::srgb(0.94, 0.27, 0.27),
        }
    }

    pub fn is_critical(self) -> bool {
        self == RiskBand::Critical
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Tests
// =============================================================================
