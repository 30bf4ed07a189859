use bevy_ecs::prelude::*;

use crate::simulation::bee::BeeAgent;
use crate::simulation::components::{CombCell, CombLift, LidGate, Pose};
use crate::simulation::flowers::FlowerRegistry;
use crate::simulation::resources::{CurrentSimulationState, FrameCounter, PresentationFeed};
use crate::transport::{BeeSnapshot, CombSnapshot, FlowerSnapshot, LidSnapshot, SimulationState};

/// Snapshots bees, combs and lids into `CurrentSimulationState` and drains
/// the presentation feed for this tick. Runs after all simulation systems.
pub fn update_current_simulation_state_resource(
    mut state_resource: ResMut<CurrentSimulationState>,
    frame_counter: Res<FrameCounter>,
    flowers: Res<FlowerRegistry>,
    mut feed: ResMut<PresentationFeed>,
    bees: Query<(&BeeAgent, &Pose)>,
    combs: Query<(&CombCell, &CombLift)>,
    lids: Query<&LidGate>,
    lifts: Query<&CombLift>,
) {
    let mut bee_states: Vec<BeeSnapshot> = bees
        .iter()
        .map(|(bee, pose)| BeeSnapshot {
            id: bee.id(),
            state: bee.state(),
            position: pose.translation,
            carrying_nectar: bee.is_carrying_nectar(),
        })
        .collect();
    bee_states.sort_by_key(|bee| bee.id);

    let mut comb_states: Vec<CombSnapshot> = combs
        .iter()
        .map(|(comb, lift)| CombSnapshot {
            index: comb.index,
            stage: comb.controller.stage(),
            delivery_count: comb.controller.delivery_count(),
            fill_progress: comb.controller.fill_progress(),
            completed: comb.controller.is_completed(),
            lifted: lift.is_lifted(),
        })
        .collect();
    comb_states.sort_by_key(|comb| comb.index);

    let probe = |cell: Entity| lifts.get(cell).map_or(false, |lift| lift.is_lifted());
    let mut lid_states: Vec<LidSnapshot> = lids
        .iter()
        .map(|gate| LidSnapshot {
            index: gate.index,
            open: gate.controller.is_open(),
            lifted_cells: gate.controller.lifted_cells(&probe).len(),
        })
        .collect();
    lid_states.sort_by_key(|lid| lid.index);

    state_resource.0 = SimulationState {
        frame: frame_counter.count,
        timestamp: frame_counter.timestamp,
        bees: bee_states,
        combs: comb_states,
        lids: lid_states,
        flowers: flowers
            .iter()
            .map(|(id, position)| FlowerSnapshot { id, position })
            .collect(),
        stage_changes: std::mem::take(&mut feed.stage_changes),
        completed_combs: std::mem::take(&mut feed.completions),
    };
}
