//! Water-level smoothing, decoupled from the hourly step cadence.
//!
//! The playhead jumps once per step; the drawn water column should not. Each
//! animation frame moves `current` a fixed fraction of the way towards
//! `target`:
//!
//!   `current += (target - current) * SMOOTHING_FACTOR`
//!
//! and snaps onto `target` once the gap drops below [`SNAP_EPSILON`], so the
//! level settles exactly instead of drifting asymptotically.
//!
//! Frames are only produced while the render loop is running. The loop is an
//! explicit handle: `start` opens a new generation, `stop` closes it, and a
//! frame request tagged with an older generation yields nothing.

use crate::config::{SMOOTHING_FACTOR, SNAP_EPSILON};

/// Identifies one started render loop. Bumped on every (re)start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderLoopGeneration(pub u64);

#[derive(Debug, Clone, Default)]
pub struct LevelInterpolator {
    current: f32,
    target: f32,
    generation: RenderLoopGeneration,
    running: bool,
    /// Frames produced by the current generation.
    frames: u64,
}

impl LevelInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> RenderLoopGeneration {
        self.generation
    }

    pub fn frames_this_generation(&self) -> u64 {
        self.frames
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = if target.is_finite() {
            target.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Start the render loop. Already running: returns the live generation.
    pub fn start(&mut self) -> RenderLoopGeneration {
        if !self.running {
            self.generation.0 += 1;
            self.running = true;
            self.frames = 0;
        }
        self.generation
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stop and start again, e.g. after the canvas was resized.
    pub fn restart(&mut self) -> RenderLoopGeneration {
        self.stop();
        self.start()
    }

    /// Advance one animation frame of the live loop.
    pub fn frame(&mut self) -> Option<f32> {
        self.frame_for(self.generation)
    }

    /// Advance one frame on behalf of `generation`. Requests from a stopped or
    /// superseded loop are dropped.
    pub fn frame_for(&mut self, generation: RenderLoopGeneration) -> Option<f32> {
        if !self.running || generation != self.generation {
            return None;
        }
        self.frames += 1;
        self.step();
        Some(self.current)
    }

    /// The smoothing step itself, independent of the loop state.
    pub fn step(&mut self) {
        self.current += (self.target - self.current) * SMOOTHING_FACTOR;
        if (self.target - self.current).abs() < SNAP_EPSILON {
            self.current = self.target;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Frames needed to settle from a gap of `distance`.
    pub fn frames_to_settle(distance: f32) -> u32 {
        let distance = distance.abs();
        if distance < SNAP_EPSILON {
            return 1;
        }
        let ratio = SNAP_EPSILON / distance;
        (ratio.ln() / (1.0 - SMOOTHING_FACTOR).ln()).ceil() as u32 + 1
    }
}
