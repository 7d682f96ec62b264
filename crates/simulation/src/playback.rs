//! Timeline playback state machine.
//!
//! ```text
//! IDLE --load(non-empty)--> READY --play--> PLAYING <--pause/play--> PAUSED
//!                                              |
//!                               tick at last index: PAUSED (no wrap)
//! ```
//!
//! The cadence source is a repeating [`Timer`] owned by the controller. It
//! exists only while PLAYING, so each controller has at most one.

use std::fmt;
use std::time::Duration;

use bevy::prelude::*;

use crate::config::STEP_INTERVAL;
use crate::timeline::{HourlySample, Timeline};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackPhase {
    /// No timeline loaded.
    #[default]
    Idle,
    /// Timeline loaded, playhead at 0, not advancing.
    Ready,
    Playing,
    Paused,
}

/// Snapshot of the transport state for rendering host controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub phase: PlaybackPhase,
    pub playhead: usize,
    pub muted: bool,
}

/// What a single cadence step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The playhead moved to this index.
    Advanced(usize),
    /// The playhead was already on the final sample; playback paused.
    Finished,
}

/// A transport request the controller cannot honour right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// Needs a loaded, non-empty timeline.
    NoTimeline,
    /// A new timeline is being fetched; the loaded one is only kept for rollback.
    LoadPending,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::NoTimeline => write!(f, "No timeline loaded"),
            TransitionError::LoadPending => write!(f, "A new timeline is still loading"),
        }
    }
}

impl std::error::Error for TransitionError {}

// =============================================================================
// Controller
// =============================================================================

#[derive(Debug, Default)]
pub struct PlaybackController {
    timeline: Timeline,
    phase: PlaybackPhase,
    playhead: usize,
    muted: bool,
    /// Active cadence source. `Some` iff the phase is PLAYING.
    cadence: Option<Timer>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            phase: self.phase,
            playhead: self.playhead,
            muted: self.muted,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn playhead(&self) -> usize {
        self.playhead
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn current_sample(&self) -> Option<&HourlySample> {
        match self.phase {
            PlaybackPhase::Idle => None,
            _ => self.timeline.get(self.playhead),
        }
    }

    pub fn is_cadence_active(&self) -> bool {
        self.cadence.is_some()
    }

    /// Replace the timeline. Any running playback is stopped first.
    pub fn load(&mut self, timeline: Timeline) {
        self.stop();
        self.timeline = timeline;
        self.playhead = 0;
        self.phase = if self.timeline.is_empty() {
            PlaybackPhase::Idle
        } else {
            PlaybackPhase::Ready
        };
    }

    /// Stop and forget the current timeline.
    pub fn unload(&mut self) {
        self.load(Timeline::default());
    }

    /// Start advancing. Calling it again while playing does nothing.
    pub fn play(&mut self) -> Result<(), TransitionError> {
        match self.phase {
            PlaybackPhase::Idle => Err(TransitionError::NoTimeline),
            PlaybackPhase::Playing => Ok(()),
            PlaybackPhase::Ready | PlaybackPhase::Paused => {
                self.phase = PlaybackPhase::Playing;
                self.start_cadence();
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) {
        if self.phase == PlaybackPhase::Playing {
            self.cadence = None;
            self.phase = PlaybackPhase::Paused;
        }
    }

    /// Flip between playing and paused. No-op without a timeline.
    pub fn toggle(&mut self) {
        match self.phase {
            PlaybackPhase::Idle => {}
            PlaybackPhase::Playing => self.pause(),
            PlaybackPhase::Ready | PlaybackPhase::Paused => {
                // Cannot fail: the phase guarantees a non-empty timeline.
                let _ = self.play();
            }
        }
    }

    /// Cancel the cadence; a playing controller ends up paused.
    pub fn stop(&mut self) {
        self.pause();
        self.cadence = None;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Move the playhead (clamped into range) without changing the phase.
    pub fn seek(&mut self, index: usize) -> Result<usize, TransitionError> {
        let Some(last) = self.timeline.last_index() else {
            return Err(TransitionError::NoTimeline);
        };
        if self.phase == PlaybackPhase::Idle {
            return Err(TransitionError::NoTimeline);
        }
        self.playhead = index.min(last);
        if self.phase == PlaybackPhase::Playing {
            // The step after a scrub gets a full interval on screen.
            self.start_cadence();
        }
        Ok(self.playhead)
    }

    /// One cadence step. Does nothing unless PLAYING.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.phase != PlaybackPhase::Playing {
            return None;
        }
        let last = self.timeline.last_index()?;
        if self.playhead >= last {
            self.cadence = None;
            self.phase = PlaybackPhase::Paused;
            return Some(TickOutcome::Finished);
        }
        self.playhead += 1;
        Some(TickOutcome::Advanced(self.playhead))
    }

    /// Drive the cadence by `delta` of wall-clock time, performing one
    /// [`tick`](Self::tick) per elapsed interval.
    pub fn advance(&mut self, delta: Duration) -> Vec<TickOutcome> {
        let fired = match self.cadence.as_mut() {
            Some(timer) => {
                timer.tick(delta);
                timer.times_finished_this_tick()
            }
            None => return Vec::new(),
        };

        let mut outcomes = Vec::new();
        for _ in 0..fired {
            match self.tick() {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
            if !self.is_playing() {
                break;
            }
        }
        outcomes
    }

    fn start_cadence(&mut self) {
        self.cadence = Some(Timer::new(STEP_INTERVAL, TimerMode::Repeating));
    }
}

// =============================================================================
// Tests
// =============================================================================
