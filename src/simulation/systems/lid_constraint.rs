use bevy_ecs::prelude::*;
use tracing::info;

use crate::simulation::components::{CombLift, LidGate};
use crate::simulation::lid::GateTransition;

/// Re-applies the lift constraint to every gate, so a lifted cell forces its
/// gate open even when nobody sent a notification.
pub fn enforce_lid_constraints(lifts: Query<&CombLift>, mut lids: Query<&mut LidGate>) {
    for mut gate in lids.iter_mut() {
        let probe = |cell: Entity| lifts.get(cell).map_or(false, |lift| lift.is_lifted());
        if gate.controller.notify_cell_state_changed(&probe) == GateTransition::Opened {
            info!(lid = gate.index, "Lid forced open by lifted comb cell");
        }
    }
}
