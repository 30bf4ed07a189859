use bevy_ecs::prelude::*;
use tracing::{debug, info, warn};

use crate::simulation::bee::{BeeAgent, DeliverySink, ForageContext, NectarDelivered};
use crate::simulation::bus::NotificationBus;
use crate::simulation::comb::FillOutcome;
use crate::simulation::components::{CombCell, HomeHive, Pose};
use crate::simulation::flowers::FlowerRegistry;
use crate::simulation::hive::Hive;
use crate::simulation::path::WaypointPath;
use crate::simulation::resources::{DeliveryBus, PresentationFeed, SimRng, StageChange, Time};

/// Fans a delivery out to every subscribed comb cell before the bee moves on.
struct BusDispatch<'a, 'w, 's, 'c> {
    bus: &'a NotificationBus<Entity>,
    combs: &'a mut Query<'w, 's, &'c mut CombCell>,
    feed: &'a mut PresentationFeed,
}

impl DeliverySink for BusDispatch<'_, '_, '_, '_> {
    fn publish(&mut self, delivery: NectarDelivered) {
        let combs = &mut *self.combs;
        let feed = &mut *self.feed;
        self.bus.publish(&delivery, |cell, event| {
            let Ok(mut comb) = combs.get_mut(cell) else {
                return;
            };
            let index = comb.index;
            match comb.controller.advance(event) {
                FillOutcome::Counted => {}
                FillOutcome::Advanced(applied) => {
                    debug!(comb = index, stage = applied.stage, "Comb stage applied");
                    feed.stage_changes.push(StageChange::new(index, applied));
                }
                FillOutcome::Completed => {
                    info!(comb = index, "Comb cell filled");
                    feed.completions.push(index);
                }
            }
        });
    }
}

/// Ticks every bee once, in query order.
pub fn forage(
    time: Res<Time>,
    mut rng: ResMut<SimRng>,
    flowers: Res<FlowerRegistry>,
    bus: Res<DeliveryBus>,
    mut feed: ResMut<PresentationFeed>,
    hives: Query<(&Hive, &WaypointPath)>,
    mut bees: Query<(&mut BeeAgent, &mut Pose, &HomeHive)>,
    mut combs: Query<&mut CombCell>,
) {
    let mut sink = BusDispatch {
        bus: &bus.0,
        combs: &mut combs,
        feed: &mut *feed,
    };

    for (mut bee, mut pose, home) in bees.iter_mut() {
        let Ok((hive, path)) = hives.get(home.0) else {
            warn!(bee = bee.id(), "Bee has no home hive");
            continue;
        };
        let mut ctx = ForageContext {
            hive,
            path,
            flowers: &*flowers,
            rng: &mut rng.0,
            dt: time.delta_seconds,
            elapsed: time.elapsed_seconds as f32,
        };
        if let Some(change) = bee.tick(&mut *pose, &mut ctx, &mut sink) {
            debug!(bee = bee.id(), from = ?change.from, to = ?change.to, "Bee state change");
        }
    }
}
