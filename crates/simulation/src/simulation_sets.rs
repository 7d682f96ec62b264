//! Ordering of the playback systems within `Update`.
//!
//! ```text
//! Commands  →  Step  →  Visual
//! ```
//!
//! * **Commands** – Mount new engines, apply host commands (run, transport,
//!   mode switches), collect finished prediction requests.
//! * **Step** – Advance each engine's step cadence by the frame delta and
//!   refresh audio voices for the samples that became current.
//! * **Visual** – One interpolation frame per engine; publishes the water
//!   level. Never mutates playback state.
//!
//! UI and audio output plugins read engine state after `Visual`.

use bevy::prelude::*;

/// Configured as a chain: `Commands` → `Step` → `Visual`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaybackSet {
    Commands,
    Step,
    Visual,
}
