use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::{KeeperAction, ScriptedAction};
use crate::simulation::bus::NotificationBus;
use crate::simulation::comb::StageApplied;
use crate::transport::SimulationState;

/// Simulation frame counter
#[derive(Resource, Debug, Default)]
pub struct FrameCounter {
    pub count: u64,
    pub timestamp: f64,
}

/// Delta time for simulation updates
#[derive(Resource, Debug)]
pub struct Time {
    pub delta_seconds: f32,
    pub elapsed_seconds: f64,
}

impl Default for Time {
    fn default() -> Self {
        Self {
            delta_seconds: 1.0 / 60.0, // Default 60 FPS
            elapsed_seconds: 0.0,
        }
    }
}

/// Every random draw in the simulation goes through this generator.
#[derive(Resource, Debug)]
pub struct SimRng(pub StdRng);

impl SimRng {
    /// Falls back to OS entropy when no seed is configured.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

/// Comb cell entities subscribed to nectar deliveries, in registration order.
#[derive(Resource, Debug, Default)]
pub struct DeliveryBus(pub NotificationBus<Entity>);

/// Entities by their position in the scene config.
#[derive(Resource, Debug, Default)]
pub struct SceneIndex {
    pub hives: Vec<Entity>,
    pub combs: Vec<Entity>,
    pub lids: Vec<Entity>,
}

/// A stage the presentation layer must apply to a comb cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageChange {
    pub comb: usize,
    pub stage: i32,
    pub representation: String,
}

impl StageChange {
    pub fn new(comb: usize, applied: StageApplied) -> Self {
        Self {
            comb,
            stage: applied.stage,
            representation: applied.representation.0,
        }
    }
}

/// Presentation events raised during the current tick; drained by state export.
#[derive(Resource, Debug, Default)]
pub struct PresentationFeed {
    pub stage_changes: Vec<StageChange>,
    /// Comb indices that completed their last stage.
    pub completions: Vec<usize>,
}

/// Scripted keeper actions, replayed in tick order.
#[derive(Resource, Debug, Default)]
pub struct KeeperScript {
    entries: Vec<ScriptedAction>,
    cursor: usize,
}

impl KeeperScript {
    pub fn new(mut entries: Vec<ScriptedAction>) -> Self {
        // Stable, so same-tick actions keep their listed order.
        entries.sort_by_key(|entry| entry.tick);
        Self { entries, cursor: 0 }
    }

    /// Actions scheduled at or before `tick` that have not run yet.
    pub fn take_due(&mut self, tick: u64) -> Vec<KeeperAction> {
        let start = self.cursor;
        while self.cursor < self.entries.len() && self.entries[self.cursor].tick <= tick {
            self.cursor += 1;
        }
        self.entries[start..self.cursor]
            .iter()
            .map(|entry| entry.action.clone())
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }
}

/// Resource holding the latest exported simulation state
#[derive(Resource, Default, Debug, Clone)]
pub struct CurrentSimulationState(pub SimulationState);
