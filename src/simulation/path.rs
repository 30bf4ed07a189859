use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::Serialize;

/// Ordered route a returning bee walks before it enters the hive.
///
/// Immutable once built; bees only keep an index into it.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaypointPath {
    points: Vec<Vec3>,
}

impl WaypointPath {
    pub fn new(points: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    pub fn first(&self) -> Option<Vec3> {
        self.get(0)
    }
}
