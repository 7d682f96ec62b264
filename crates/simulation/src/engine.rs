//! One flood simulation panel: timeline source, playback, water level and
//! audio feedback composed behind a single component.
//!
//! Every engine owns its own step timer, render-loop handle and voices, so
//! several panels can run side by side without sharing state. The host drives
//! the lifecycle explicitly through [`SimulationEngine::mount`] and
//! [`SimulationEngine::unmount`].

use std::fmt;
use std::time::Duration;

use bevy::prelude::*;

use crate::audio::{AudioAvailability, AudioFeedback};
use crate::interpolation::{LevelInterpolator, RenderLoopGeneration};
use crate::playback::{PlaybackController, PlaybackState, TickOutcome, TransitionError};
use crate::sim_rng::SimRng;
use crate::timeline::{
    generate_sandbox, HourlySample, PredictionRequest, RequestError, SandboxRequest, Timeline,
    WeatherInput,
};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimulationMode {
    #[default]
    Sandbox,
    Prediction,
}

impl SimulationMode {
    pub fn label(self) -> &'static str {
        match self {
            SimulationMode::Sandbox => "Sandbox",
            SimulationMode::Prediction => "ML prediction",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunRequest {
    Sandbox(SandboxRequest),
    Prediction(PredictionRequest),
}

impl RunRequest {
    pub fn mode(&self) -> SimulationMode {
        match self {
            RunRequest::Sandbox(_) => SimulationMode::Sandbox,
            RunRequest::Prediction(_) => SimulationMode::Prediction,
        }
    }
}

/// Identifies the in-flight prediction a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// A timeline was loaded synchronously and playback started if non-empty.
    Loaded { samples: usize },
    /// The caller must obtain a timeline for `input` and hand it back through
    /// [`SimulationEngine::finish_prediction`] with `ticket`.
    AwaitingPrediction {
        ticket: FetchTicket,
        input: WeatherInput,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Prediction run without a weather input, and none stored from earlier.
    MissingInput,
    Request(RequestError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MissingInput => {
                write!(f, "Enter weather conditions before running a prediction")
            }
            EngineError::Request(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::MissingInput => None,
            EngineError::Request(e) => Some(e),
        }
    }
}

impl From<RequestError> for EngineError {
    fn from(e: RequestError) -> Self {
        EngineError::Request(e)
    }
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Component, Debug)]
pub struct SimulationEngine {
    mode: SimulationMode,
    base_input: Option<WeatherInput>,
    controller: PlaybackController,
    interpolator: LevelInterpolator,
    audio: AudioFeedback,
    rng: SimRng,
    mounted: bool,
    pending: Option<FetchTicket>,
    next_ticket: u64,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimRng::default())
    }
}

impl SimulationEngine {
    pub fn new(rng: SimRng) -> Self {
        Self {
            mode: SimulationMode::default(),
            base_input: None,
            controller: PlaybackController::new(),
            interpolator: LevelInterpolator::new(),
            audio: AudioFeedback::new(),
            rng,
            mounted: false,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(SimRng::from_seed_u64(seed))
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn timeline(&self) -> &Timeline {
        self.controller.timeline()
    }

    pub fn current_sample(&self) -> Option<&HourlySample> {
        self.controller.current_sample()
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn interpolator(&self) -> &LevelInterpolator {
        &self.interpolator
    }

    /// Current interpolated water level in `[0, 1]`.
    pub fn level(&self) -> f32 {
        self.interpolator.current()
    }

    pub fn audio(&self) -> &AudioFeedback {
        &self.audio
    }

    pub fn base_input(&self) -> Option<&WeatherInput> {
        self.base_input.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_awaiting_prediction(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_ticket(&self) -> Option<FetchTicket> {
        self.pending
    }

    /// Seed for a new rain voice's noise stream.
    pub fn fork_seed(&mut self) -> u64 {
        self.rng.fork_seed()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Attach to a host panel and start the render loop.
    pub fn mount(&mut self) -> RenderLoopGeneration {
        self.mounted = true;
        self.interpolator.start()
    }

    /// Detach from the host. Nothing keeps running afterwards: no cadence, no
    /// render loop, no voices, no pending fetch.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.controller.stop();
        self.interpolator.stop();
        self.audio.silence();
        self.pending = None;
    }

    /// The drawing surface changed size; restart the render loop so frames
    /// from the old loop are dropped.
    pub fn restart_render_loop(&mut self) -> Option<RenderLoopGeneration> {
        self.mounted.then(|| self.interpolator.restart())
    }

    // -------------------------------------------------------------------------
    // Runs
    // -------------------------------------------------------------------------

    /// The platform took audio output away mid-session.
    pub fn suspend_audio(&mut self, availability: AudioAvailability) {
        self.audio.suspend(availability);
    }

    pub fn set_base_input(&mut self, input: WeatherInput) {
        self.base_input = Some(input);
    }

    /// Start a run. Sandbox runs complete immediately; prediction runs return
    /// a ticket for the asynchronous fetch.
    pub fn run(
        &mut self,
        request: RunRequest,
        availability: AudioAvailability,
    ) -> Result<RunOutcome, EngineError> {
        match request {
            RunRequest::Sandbox(sandbox) => {
                self.switch_mode(SimulationMode::Sandbox);
                self.init_audio(availability);
                self.pending = None;

                let timeline = generate_sandbox(
                    &mut self.rng.0,
                    sandbox.base_probability_percent(),
                    sandbox.duration_hours(),
                );
                info!(
                    "Sandbox run: base {}%, {} h",
                    sandbox.base_probability_percent(),
                    sandbox.duration_hours()
                );
                let samples = self.load_and_play(timeline);
                Ok(RunOutcome::Loaded { samples })
            }
            RunRequest::Prediction(prediction) => {
                let input = prediction
                    .weather_input
                    .or_else(|| self.base_input.clone())
                    .ok_or(EngineError::MissingInput)?;

                self.switch_mode(SimulationMode::Prediction);
                self.init_audio(availability);
                self.base_input = Some(input.clone());
                self.controller.stop();
                self.audio.silence();

                self.next_ticket += 1;
                let ticket = FetchTicket(self.next_ticket);
                self.pending = Some(ticket);
                info!("Prediction run requested ({:?})", ticket);
                Ok(RunOutcome::AwaitingPrediction { ticket, input })
            }
        }
    }

    /// Apply the result of a prediction fetch.
    ///
    /// Returns `Ok(None)` when `ticket` is no longer the pending one (the
    /// request was superseded, the mode switched or the engine unmounted).
    pub fn finish_prediction(
        &mut self,
        ticket: FetchTicket,
        result: Result<Timeline, RequestError>,
    ) -> Result<Option<usize>, EngineError> {
        if self.pending != Some(ticket) {
            debug!("Dropping stale prediction result {:?}", ticket);
            return Ok(None);
        }
        self.pending = None;

        match result {
            Ok(timeline) => {
                info!("Prediction timeline received: {} samples", timeline.len());
                Ok(Some(self.load_and_play(timeline)))
            }
            Err(error) => {
                // Back to a resumable state on whatever was loaded before.
                let previous = self.controller.timeline().clone();
                self.controller.load(previous);
                self.audio.silence();
                self.sync_target();
                Err(EngineError::Request(error))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// Play/pause. Rejected while a prediction fetch is pending.
    pub fn toggle_play(&mut self) -> Result<(), TransitionError> {
        self.ensure_not_pending()?;
        self.controller.toggle();
        self.refresh_audio();
        Ok(())
    }

    /// Muting always applies; unmuting only brings voices back once no fetch
    /// is pending.
    pub fn set_muted(&mut self, muted: bool) {
        self.controller.set_muted(muted);
        self.audio.set_muted(muted);
        if !muted && self.pending.is_none() {
            self.refresh_audio();
        }
    }

    pub fn seek(&mut self, index: usize) -> Result<usize, TransitionError> {
        self.ensure_not_pending()?;
        let playhead = self.controller.seek(index)?;
        self.sync_target();
        self.refresh_audio();
        Ok(playhead)
    }

    /// Change the data source. Playback stops and audio goes quiet before the
    /// flag flips; the loaded timeline and any pending fetch are dropped.
    pub fn switch_mode(&mut self, mode: SimulationMode) {
        if mode == self.mode {
            return;
        }
        self.controller.stop();
        self.audio.silence();
        self.mode = mode;
        self.controller.unload();
        self.pending = None;
        self.sync_target();
        info!("Simulation mode: {}", mode.label());
    }

    /// Drive the step cadence by `delta`. Audio is refreshed once per step.
    pub fn advance(&mut self, delta: Duration) -> Vec<TickOutcome> {
        let outcomes = self.controller.advance(delta);
        for outcome in &outcomes {
            match outcome {
                TickOutcome::Advanced(index) => debug!("Step -> {}", index),
                TickOutcome::Finished => debug!("Timeline finished"),
            }
            self.sync_target();
            self.refresh_audio();
        }
        outcomes
    }

    /// Next render-loop frame: the smoothed level, or `None` when the loop is
    /// not running.
    pub fn frame(&mut self) -> Option<f32> {
        self.interpolator.frame()
    }

    pub fn frame_for(&mut self, generation: RenderLoopGeneration) -> Option<f32> {
        self.interpolator.frame_for(generation)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_not_pending(&self) -> Result<(), TransitionError> {
        match self.pending {
            Some(_) => Err(TransitionError::LoadPending),
            None => Ok(()),
        }
    }

    fn init_audio(&mut self, availability: AudioAvailability) {
        if let Err(e) = self.audio.ensure_context(availability) {
            warn!("{}; continuing without sound", e);
        }
    }

    fn load_and_play(&mut self, timeline: Timeline) -> usize {
        let samples = timeline.len();
        self.controller.load(timeline);
        if samples > 0 {
            // Non-empty timeline: READY, so play cannot be rejected.
            let _ = self.controller.play();
        }
        self.sync_target();
        self.refresh_audio();
        samples
    }

    fn sync_target(&mut self) {
        let target = self
            .controller
            .current_sample()
            .map_or(0.0, |sample| sample.probability);
        self.interpolator.set_target(target);
    }

    fn refresh_audio(&mut self) {
        let current = self
            .controller
            .current_sample()
            .map(|sample| (sample.probability, sample.risk_band));
        self.audio.update(current);
    }
}

// =============================================================================
// Tests
// =============================================================================
