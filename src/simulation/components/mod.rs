use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use serde::Serialize;

use crate::simulation::comb::CombCellController;
use crate::simulation::lid::LidGateController;

/// World-space placement of a bee.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Hive entity (carrying `Hive` and `WaypointPath`) a bee belongs to.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeHive(pub Entity);

/// Staged fill state of one comb cell. `index` is the cell's position in the scene config.
#[derive(Component, Debug, Clone)]
pub struct CombCell {
    pub index: usize,
    pub controller: CombCellController,
}

/// Whether a comb cell is raised out of the hive body.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct CombLift {
    lifted: bool,
    interactive: bool,
    lid: Option<Entity>,
}

impl CombLift {
    pub fn new(lifted: bool, interactive: bool, lid: Option<Entity>) -> Self {
        Self { lifted, interactive, lid }
    }

    pub fn is_lifted(&self) -> bool {
        self.lifted
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Lid gate to notify when the lift state changes.
    pub fn lid(&self) -> Option<Entity> {
        self.lid
    }

    pub fn lift(&mut self) -> bool {
        self.set_lifted(true)
    }

    pub fn lower(&mut self) -> bool {
        self.set_lifted(false)
    }

    /// User-driven flip. Non-interactive cells ignore it.
    pub fn toggle(&mut self) -> bool {
        if !self.interactive {
            return false;
        }
        self.set_lifted(!self.lifted)
    }

    /// Returns true when the flag actually changed.
    pub fn set_lifted(&mut self, lifted: bool) -> bool {
        if self.lifted == lifted {
            return false;
        }
        self.lifted = lifted;
        true
    }
}

/// Hive lid over a set of comb cell entities.
#[derive(Component, Debug, Clone)]
pub struct LidGate {
    pub index: usize,
    pub controller: LidGateController<Entity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lift_changes_are_reported_once() {
        let mut lift = CombLift::new(false, true, None);
        assert!(lift.lift());
        assert!(!lift.lift());
        assert!(lift.is_lifted());
        assert!(lift.toggle());
        assert!(!lift.is_lifted());
        assert!(!lift.lower());
    }

    #[test]
    fn non_interactive_cell_ignores_toggle_only() {
        let mut lift = CombLift::new(false, false, None);
        assert!(!lift.toggle());
        assert!(!lift.is_lifted());
        assert!(lift.set_lifted(true));
        assert!(lift.is_lifted());
    }
}
