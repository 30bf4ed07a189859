//! Replays scripted keeper input at the start of a tick.
//!
//! This is the only place the flower registry, lift flags and comb resets
//! are mutated, so bees never see them change mid-tick.

use bevy_ecs::prelude::*;
use tracing::{debug, info, warn};

use crate::config::KeeperAction;
use crate::simulation::components::{CombCell, CombLift, LidGate};
use crate::simulation::flowers::{FlowerId, FlowerRegistry};
use crate::simulation::lid::GateTransition;
use crate::simulation::resources::{FrameCounter, KeeperScript, PresentationFeed, SceneIndex, StageChange};

pub fn run_keeper_script(
    frame: Res<FrameCounter>,
    mut script: ResMut<KeeperScript>,
    index: Res<SceneIndex>,
    mut flowers: ResMut<FlowerRegistry>,
    mut feed: ResMut<PresentationFeed>,
    mut combs: Query<&mut CombCell>,
    mut lifts: Query<&mut CombLift>,
    mut lids: Query<&mut LidGate>,
) {
    for action in script.take_due(frame.count) {
        debug!(tick = frame.count, ?action, "Keeper action");
        match action {
            KeeperAction::LiftCell { cell }
            | KeeperAction::LowerCell { cell }
            | KeeperAction::ToggleCell { cell } => {
                let Some(&entity) = index.combs.get(cell) else {
                    warn!(cell, "Keeper action targets unknown comb cell");
                    continue;
                };
                let (changed, lid) = {
                    let Ok(mut lift) = lifts.get_mut(entity) else {
                        continue;
                    };
                    let changed = match action {
                        KeeperAction::LiftCell { .. } => lift.lift(),
                        KeeperAction::LowerCell { .. } => lift.lower(),
                        _ => lift.toggle(),
                    };
                    (changed, lift.lid())
                };
                if !changed {
                    continue;
                }
                if let Some(lid) = lid {
                    notify_lid(lid, &lifts, &mut lids);
                }
            }
            KeeperAction::ResetComb { cell } => {
                let Some(&entity) = index.combs.get(cell) else {
                    warn!(cell, "Keeper action targets unknown comb cell");
                    continue;
                };
                let Ok(mut comb) = combs.get_mut(entity) else {
                    continue;
                };
                let applied = comb.controller.restart();
                feed.stage_changes.push(StageChange::new(cell, applied));
            }
            KeeperAction::ToggleLid { lid }
            | KeeperAction::OpenLid { lid }
            | KeeperAction::CloseLid { lid }
            | KeeperAction::ForceOpenLid { lid }
            | KeeperAction::ForceCloseLid { lid } => {
                let Some(&entity) = index.lids.get(lid) else {
                    warn!(lid, "Keeper action targets unknown lid");
                    continue;
                };
                apply_lid_action(&action, entity, &lifts, &mut lids);
            }
            KeeperAction::AddFlower { position } => {
                let id = flowers.insert(position);
                debug!(flower = id.0, "Flower added");
            }
            KeeperAction::RemoveFlower { flower } => {
                if flowers.remove(FlowerId(flower)).is_none() {
                    warn!(flower, "Keeper tried to remove a missing flower");
                }
            }
        }
    }
}

fn apply_lid_action(
    action: &KeeperAction,
    entity: Entity,
    lifts: &Query<&mut CombLift>,
    lids: &mut Query<&mut LidGate>,
) {
    let Ok(mut gate) = lids.get_mut(entity) else {
        return;
    };
    let probe = |cell: Entity| lifts.get(cell).map_or(false, |lift| lift.is_lifted());
    let result = match action {
        KeeperAction::ToggleLid { .. } => gate.controller.request_toggle(&probe),
        KeeperAction::OpenLid { .. } => gate.controller.request_set_open(true, &probe),
        KeeperAction::CloseLid { .. } => gate.controller.request_set_open(false, &probe),
        KeeperAction::ForceOpenLid { .. } => Ok(gate.controller.force_open()),
        KeeperAction::ForceCloseLid { .. } => Ok(gate.controller.force_close()),
        _ => return,
    };
    match result {
        Ok(GateTransition::Unchanged) => {}
        Ok(transition) => info!(lid = gate.index, ?transition, "Lid moved by keeper"),
        Err(err) => warn!(lid = gate.index, %err, "Keeper lid request rejected"),
    }
}

/// Re-checks a gate after one of its cells moved.
pub(crate) fn notify_lid(lid: Entity, lifts: &Query<&mut CombLift>, lids: &mut Query<&mut LidGate>) {
    let Ok(mut gate) = lids.get_mut(lid) else {
        return;
    };
    let probe = |cell: Entity| lifts.get(cell).map_or(false, |lift| lift.is_lifted());
    if gate.controller.notify_cell_state_changed(&probe) == GateTransition::Opened {
        info!(lid = gate.index, "Lifted comb cell forced the lid open");
    }
}
