//! Builds the initial world from the scene config.

use std::collections::HashSet;

use bevy_ecs::prelude::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::simulation::bee::BeeAgent;
use crate::simulation::bus::NotificationBus;
use crate::simulation::comb::CombCellController;
use crate::simulation::components::{CombCell, CombLift, HomeHive, LidGate};
use crate::simulation::flowers::FlowerRegistry;
use crate::simulation::hive::Hive;
use crate::simulation::lid::{GateTransition, LidGateController};
use crate::simulation::path::WaypointPath;
use crate::simulation::resources::{DeliveryBus, SceneIndex, SimRng};

/// Spawns hives, bees, comb cells and lid gates, and inserts the flower
/// registry, delivery bus and scene index resources.
///
/// Config indices are assumed valid (`ConfigLoader::validate`); dangling
/// ones are skipped.
pub fn spawn_scene(world: &mut World, config: &Config, rng: &mut SimRng) {
    let scene = &config.scene;
    let flowers = FlowerRegistry::with_flowers(scene.flowers.iter().copied());
    let mut index = SceneIndex::default();

    // Lids first so cells can name the gate they notify.
    for (i, lid) in scene.lids.iter().enumerate() {
        let controller = LidGateController::new(lid.start_open, lid.enforce_lift_constraint, []);
        index.lids.push(world.spawn(LidGate { index: i, controller }).id());
    }

    let mut bus = NotificationBus::new();
    let mut lifted = HashSet::new();
    for (i, comb) in scene.combs.iter().enumerate() {
        let lid = comb.lid.and_then(|lid| index.lids.get(lid).copied());
        let entity = world
            .spawn((
                CombCell {
                    index: i,
                    controller: CombCellController::from_config(&config.comb),
                },
                CombLift::new(!comb.start_lowered, comb.interactive, lid),
            ))
            .id();
        bus.subscribe(entity);
        if !comb.start_lowered {
            lifted.insert(entity);
        }
        index.combs.push(entity);
    }

    for (lid_config, &lid) in scene.lids.iter().zip(&index.lids) {
        let Some(mut gate) = world.get_mut::<LidGate>(lid) else {
            continue;
        };
        for cell in &lid_config.tracked_cells {
            if let Some(&entity) = index.combs.get(*cell) {
                gate.controller.track(entity);
            }
        }
        // Cells that start lifted notify their gate once at setup.
        let probe = |cell: Entity| lifted.contains(&cell);
        if gate.controller.notify_cell_state_changed(&probe) == GateTransition::Opened {
            debug!(lid = gate.index, "Lid opened by initially lifted comb cells");
        }
    }

    let mut next_bee = 0;
    for hive_config in &scene.hives {
        let hive = Hive::new(hive_config.entrance, hive_config.exit);
        let path = if hive_config.waypoints.is_empty() {
            WaypointPath::new([hive_config.entrance])
        } else {
            WaypointPath::new(hive_config.waypoints.iter().copied())
        };

        let bees: Vec<_> = (0..hive_config.bee_count)
            .map(|offset| {
                BeeAgent::spawn(next_bee + offset, config.bees.clone(), &hive, &path, &flowers, &mut rng.0)
            })
            .collect();
        next_bee += bees.len();

        let hive_entity = world.spawn((hive, path)).id();
        for (agent, pose) in bees {
            world.spawn((agent, pose, HomeHive(hive_entity)));
        }
        index.hives.push(hive_entity);
    }

    info!(
        hives = index.hives.len(),
        bees = next_bee,
        combs = index.combs.len(),
        lids = index.lids.len(),
        flowers = flowers.len(),
        "Scene spawned"
    );

    world.insert_resource(flowers);
    world.insert_resource(DeliveryBus(bus));
    world.insert_resource(index);
}
