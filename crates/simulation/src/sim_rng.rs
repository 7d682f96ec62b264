//! Per-engine random source for sandbox generation.
//!
//! Wraps `ChaCha8Rng`. Engines created for the app draw their seed from OS
//! entropy so repeated sandbox runs differ; tests and replays pass an explicit
//! seed through [`SimRng::from_seed_u64`] for reproducible timelines.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl SimRng {
    /// Create a new `SimRng` seeded from the given `u64` value.
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }

    /// Seed for a child stream (e.g. one rain voice's noise).
    pub fn fork_seed(&mut self) -> u64 {
        self.0.next_u64()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
