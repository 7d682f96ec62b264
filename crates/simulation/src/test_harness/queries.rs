//! Commands, frame stepping and queries for `TestDashboard`.

use std::time::Duration;

use bevy::prelude::*;

use crate::engine::SimulationEngine;
use crate::systems::{EngineAction, EngineCommand, PendingPrediction, WaterLevel};

use super::{OutcomeLog, TestDashboard, FRAME};

impl TestDashboard {
    // -----------------------------------------------------------------------
    // Engines & commands
    // -----------------------------------------------------------------------

    /// Spawn a seeded engine and run one frame so it gets mounted.
    pub fn spawn_engine(&mut self, seed: u64) -> Entity {
        let entity = self
            .app
            .world_mut()
            .spawn(SimulationEngine::with_seed(seed))
            .id();
        self.tick(1);
        entity
    }

    /// Queue a command; it is applied on the next `tick`.
    pub fn send(&mut self, engine: Entity, action: EngineAction) {
        self.app
            .world_mut()
            .send_event(EngineCommand::new(engine, action));
    }

    pub fn despawn(&mut self, engine: Entity) {
        self.app.world_mut().despawn(engine);
    }

    // -----------------------------------------------------------------------
    // Frames
    // -----------------------------------------------------------------------

    /// Run `n` frames of [`FRAME`] each.
    ///
    /// A `yield_now()` between frames lets IO pool threads finish prediction
    /// tasks when the pool is multi-threaded.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
            std::thread::yield_now();
        }
    }

    /// Run enough frames to cover `duration` of wall-clock time.
    pub fn tick_for(&mut self, duration: Duration) {
        let frames = duration.as_millis().div_ceil(FRAME.as_millis());
        self.tick(frames as u32);
    }

    /// Tick until `done` holds, at most `max_frames`. Returns whether it held.
    pub fn tick_until(
        &mut self,
        max_frames: u32,
        mut done: impl FnMut(&mut TestDashboard) -> bool,
    ) -> bool {
        for _ in 0..max_frames {
            if done(self) {
                return true;
            }
            self.tick(1);
        }
        done(self)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn engine(&self, entity: Entity) -> &SimulationEngine {
        self.app
            .world()
            .get::<SimulationEngine>(entity)
            .expect("entity should carry a SimulationEngine")
    }

    pub fn water_level(&self, entity: Entity) -> f32 {
        self.app
            .world()
            .get::<WaterLevel>(entity)
            .map_or(0.0, |level| level.0)
    }

    pub fn has_pending_prediction(&self, entity: Entity) -> bool {
        self.app.world().get::<PendingPrediction>(entity).is_some()
    }

    pub fn log(&self) -> &OutcomeLog {
        self.app.world().resource::<OutcomeLog>()
    }
}
