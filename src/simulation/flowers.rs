//! Registry of harvestable flowers.
//!
//! Mutated only between ticks (keeper script, scene setup); bees read it.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::Rng;
use serde::Serialize;

/// Stable handle to a registered flower. Ids are never reused, so a bee
/// holding a removed flower's id can detect that it vanished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FlowerId(pub u32);

#[derive(Resource, Debug, Clone, Default)]
pub struct FlowerRegistry {
    flowers: Vec<(FlowerId, Vec3)>,
    next_id: u32,
}

impl FlowerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flowers(positions: impl IntoIterator<Item = Vec3>) -> Self {
        let mut registry = Self::new();
        for position in positions {
            registry.insert(position);
        }
        registry
    }

    pub fn insert(&mut self, position: Vec3) -> FlowerId {
        let id = FlowerId(self.next_id);
        self.next_id += 1;
        self.flowers.push((id, position));
        id
    }

    /// Returns the removed flower's position, if it was registered.
    pub fn remove(&mut self, id: FlowerId) -> Option<Vec3> {
        let index = self.flowers.iter().position(|(fid, _)| *fid == id)?;
        Some(self.flowers.swap_remove(index).1)
    }

    /// Uniformly picks one flower, or `None` when the registry is empty.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(FlowerId, Vec3)> {
        if self.flowers.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.flowers.len());
        Some(self.flowers[index])
    }

    pub fn has_any(&self) -> bool {
        !self.flowers.is_empty()
    }

    pub fn contains(&self, id: FlowerId) -> bool {
        self.flowers.iter().any(|(fid, _)| *fid == id)
    }

    pub fn len(&self) -> usize {
        self.flowers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flowers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FlowerId, Vec3)> + '_ {
        self.flowers.iter().copied()
    }
}
