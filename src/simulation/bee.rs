//! Forager state machine.
//!
//! A bee loops Idle → ExitHive → FlyToFlower → Collecting → FollowPath →
//! EnterHive → Idle, publishing one delivery whenever it enters the hive
//! carrying nectar. The agent owns only its own timers and target; the hive,
//! return path and flower registry are handed in on every tick.

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::Rng;
use serde::Serialize;
use tracing::trace;

use crate::config::BeeConfig;
use crate::simulation::components::Pose;
use crate::simulation::flowers::{FlowerId, FlowerRegistry};
use crate::simulation::hive::Hive;
use crate::simulation::motion::{move_towards, smooth_damp, turn_towards};
use crate::simulation::path::WaypointPath;

const FLIGHT_LATERAL_JITTER: f32 = 0.3;
const COLLECT_JITTER_AMPLITUDE: f32 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BeeState {
    Idle,
    ExitHive,
    FlyToFlower,
    Collecting,
    FollowPath,
    EnterHive,
}

/// Published when a bee enters the hive with nectar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NectarDelivered {
    pub bee: usize,
}

/// Receives deliveries synchronously, while the publishing bee is mid-tick.
pub trait DeliverySink {
    fn publish(&mut self, delivery: NectarDelivered);
}

impl DeliverySink for Vec<NectarDelivered> {
    fn publish(&mut self, delivery: NectarDelivered) {
        self.push(delivery);
    }
}

/// Everything a bee reads during one tick.
pub struct ForageContext<'a, R: Rng + ?Sized> {
    pub hive: &'a Hive,
    pub path: &'a WaypointPath,
    pub flowers: &'a FlowerRegistry,
    pub rng: &'a mut R,
    pub dt: f32,
    /// Simulation clock, seconds since start.
    pub elapsed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: BeeState,
    pub to: BeeState,
}

#[derive(Component, Debug, Clone)]
pub struct BeeAgent {
    id: usize,
    config: BeeConfig,
    state: BeeState,
    /// Counts up in Idle, down in Collecting, unused elsewhere.
    state_timer: f32,
    idle_duration: f32,
    target: Vec3,
    target_flower: Option<FlowerId>,
    path_index: usize,
    carrying_nectar: bool,
    velocity: Vec3,
}

impl BeeAgent {
    /// Creates a bee at a random point inside `hive`, already idling.
    pub fn spawn<R: Rng + ?Sized>(
        id: usize,
        config: BeeConfig,
        hive: &Hive,
        path: &WaypointPath,
        flowers: &FlowerRegistry,
        rng: &mut R,
    ) -> (Self, Pose) {
        let mut agent = Self {
            id,
            config,
            state: BeeState::Idle,
            state_timer: 0.0,
            idle_duration: 0.0,
            target: hive.entrance,
            target_flower: None,
            path_index: 0,
            carrying_nectar: false,
            velocity: Vec3::ZERO,
        };
        let pose = Pose::at(hive.random_interior_point(agent.config.wander_radius, rng));
        let mut ctx = ForageContext { hive, path, flowers, rng, dt: 0.0, elapsed: 0.0 };
        agent.switch_state(BeeState::Idle, &mut ctx);
        (agent, pose)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> BeeState {
        self.state
    }

    pub fn is_carrying_nectar(&self) -> bool {
        self.carrying_nectar
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn target_flower(&self) -> Option<FlowerId> {
        self.target_flower
    }

    /// Only meaningful while following the return path.
    pub fn path_index(&self) -> Option<usize> {
        (self.state == BeeState::FollowPath).then_some(self.path_index)
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn state_timer(&self) -> f32 {
        self.state_timer
    }

    pub fn config(&self) -> &BeeConfig {
        &self.config
    }

    /// Advances the bee by one tick. Returns the state change, if the bee
    /// ended the tick in a different state than it started.
    pub fn tick<R, S>(
        &mut self,
        pose: &mut Pose,
        ctx: &mut ForageContext<'_, R>,
        deliveries: &mut S,
    ) -> Option<StateChange>
    where
        R: Rng + ?Sized,
        S: DeliverySink + ?Sized,
    {
        let from = self.state;

        match self.state {
            BeeState::Idle => self.idle(pose, ctx),
            BeeState::ExitHive => self.exit_hive(pose, ctx),
            BeeState::FlyToFlower => self.fly_to_flower(pose, ctx),
            BeeState::Collecting => self.collect(pose, ctx),
            BeeState::FollowPath => self.follow_path(pose, ctx),
            BeeState::EnterHive => self.enter_hive(pose, ctx, deliveries),
        }

        (from != self.state).then(|| StateChange { from, to: self.state })
    }

    fn idle<R: Rng + ?Sized>(&mut self, pose: &mut Pose, ctx: &mut ForageContext<'_, R>) {
        self.state_timer += ctx.dt;
        self.carrying_nectar = false;

        let step = self.config.flight_speed * self.config.idle_speed_factor * ctx.dt;
        pose.translation = move_towards(pose.translation, self.target, step);

        let arrived = pose.translation.distance(self.target) < self.config.epsilons.idle;
        if !arrived && self.state_timer < self.idle_duration {
            return;
        }

        let roll: f32 = ctx.rng.gen();
        if roll < self.config.forage_probability && ctx.flowers.has_any() {
            self.switch_state(BeeState::ExitHive, ctx);
        } else {
            self.target = ctx.hive.random_interior_point(self.config.wander_radius, ctx.rng);
            self.state_timer = 0.0;
        }
    }

    fn exit_hive<R: Rng + ?Sized>(&mut self, pose: &mut Pose, ctx: &mut ForageContext<'_, R>) {
        let step = self.config.flight_speed * ctx.dt;
        pose.translation = move_towards(pose.translation, self.target, step);

        if pose.translation.distance(self.target) < self.config.epsilons.exit {
            self.switch_state(BeeState::FlyToFlower, ctx);
        }
    }

    fn fly_to_flower<R: Rng + ?Sized>(&mut self, pose: &mut Pose, ctx: &mut ForageContext<'_, R>) {
        let flower_present = self
            .target_flower
            .map_or(false, |flower| ctx.flowers.contains(flower));
        if !flower_present {
            trace!(bee = self.id, "Target flower vanished, returning");
            self.switch_state(BeeState::FollowPath, ctx);
            return;
        }

        self.steer(pose, ctx.dt);

        if pose.translation.distance(self.target) < self.config.epsilons.flower {
            self.switch_state(BeeState::Collecting, ctx);
        }
    }

    fn collect<R: Rng + ?Sized>(&mut self, pose: &mut Pose, ctx: &mut ForageContext<'_, R>) {
        self.state_timer -= ctx.dt;

        // Hover while collecting; purely cosmetic.
        let t = ctx.elapsed;
        pose.translation += Vec3::new((t * 5.0).sin(), (t * 4.0).cos(), (t * 3.0).sin())
            * COLLECT_JITTER_AMPLITUDE;

        if self.state_timer <= 0.0 {
            self.carrying_nectar = true;
            self.switch_state(BeeState::FollowPath, ctx);
        }
    }

    fn follow_path<R: Rng + ?Sized>(&mut self, pose: &mut Pose, ctx: &mut ForageContext<'_, R>) {
        self.steer(pose, ctx.dt);

        if pose.translation.distance(self.target) >= self.config.epsilons.waypoint {
            return;
        }

        self.path_index += 1;
        match ctx.path.get(self.path_index) {
            Some(next) => self.target = next,
            None => self.switch_state(BeeState::EnterHive, ctx),
        }
    }

    fn enter_hive<R, S>(&mut self, pose: &mut Pose, ctx: &mut ForageContext<'_, R>, deliveries: &mut S)
    where
        R: Rng + ?Sized,
        S: DeliverySink + ?Sized,
    {
        let step = self.config.flight_speed * self.config.enter_speed_factor * ctx.dt;
        pose.translation = move_towards(pose.translation, self.target, step);

        if pose.translation.distance(self.target) >= self.config.epsilons.enter {
            return;
        }

        if self.carrying_nectar {
            deliveries.publish(NectarDelivered { bee: self.id });
            self.carrying_nectar = false;
        }

        pose.translation = ctx.hive.random_interior_point(self.config.wander_radius, ctx.rng);
        self.switch_state(BeeState::Idle, ctx);
    }

    /// Smoothed flight towards the current target, turning to face the motion.
    fn steer(&mut self, pose: &mut Pose, dt: f32) {
        pose.translation = smooth_damp(
            pose.translation,
            self.target,
            &mut self.velocity,
            self.config.smooth_time,
            self.config.flight_speed,
            dt,
        );
        pose.rotation = turn_towards(pose.rotation, self.velocity, self.config.rotation_speed, dt);
    }

    fn switch_state<R: Rng + ?Sized>(&mut self, next: BeeState, ctx: &mut ForageContext<'_, R>) {
        self.state = next;
        self.state_timer = 0.0;
        self.velocity = Vec3::ZERO;

        match next {
            BeeState::Idle => {
                let (lo, hi) = ordered(self.config.min_idle_time, self.config.max_idle_time);
                self.idle_duration = ctx.rng.gen_range(lo..=hi);
                self.target = ctx.hive.random_interior_point(self.config.wander_radius, ctx.rng);
                self.carrying_nectar = false;
                self.target_flower = None;
            }
            BeeState::ExitHive => {
                self.target = ctx.hive.exit;
            }
            BeeState::FlyToFlower => match ctx.flowers.pick_random(ctx.rng) {
                Some((flower, position)) => {
                    self.target_flower = Some(flower);
                    self.target = position + self.flight_offset(ctx.rng);
                }
                None => {
                    self.target_flower = None;
                    self.switch_state(BeeState::FollowPath, ctx);
                }
            },
            BeeState::Collecting => {
                self.state_timer = self.config.collection_time;
            }
            BeeState::FollowPath => {
                self.path_index = 0;
                match ctx.path.first() {
                    Some(first) => self.target = first,
                    None => self.switch_state(BeeState::EnterHive, ctx),
                }
            }
            BeeState::EnterHive => {
                self.target = ctx.hive.entrance;
            }
        }
    }

    fn flight_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let (lo, hi) = ordered(self.config.min_height, self.config.max_height);
        Vec3::new(
            rng.gen_range(-FLIGHT_LATERAL_JITTER..=FLIGHT_LATERAL_JITTER),
            rng.gen_range(lo..=hi),
            rng.gen_range(-FLIGHT_LATERAL_JITTER..=FLIGHT_LATERAL_JITTER),
        )
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 0.02;

    struct Scene {
        hive: Hive,
        path: WaypointPath,
        flowers: FlowerRegistry,
        rng: StdRng,
        elapsed: f32,
    }

    impl Scene {
        fn new(flowers: &[Vec3], path: &[Vec3]) -> Self {
            Self {
                hive: Hive::new(Vec3::ZERO, Some(Vec3::new(0.0, 0.0, 2.0))),
                path: WaypointPath::new(path.iter().copied()),
                flowers: FlowerRegistry::with_flowers(flowers.iter().copied()),
                rng: StdRng::seed_from_u64(42),
                elapsed: 0.0,
            }
        }

        fn spawn(&mut self, config: BeeConfig) -> (BeeAgent, Pose) {
            BeeAgent::spawn(0, config, &self.hive, &self.path, &self.flowers, &mut self.rng)
        }

        fn tick(
            &mut self,
            bee: &mut BeeAgent,
            pose: &mut Pose,
            sink: &mut Vec<NectarDelivered>,
        ) -> Option<StateChange> {
            self.elapsed += DT;
            let mut ctx = ForageContext {
                hive: &self.hive,
                path: &self.path,
                flowers: &self.flowers,
                rng: &mut self.rng,
                dt: DT,
                elapsed: self.elapsed,
            };
            bee.tick(pose, &mut ctx, sink)
        }
    }

    fn eager_config() -> BeeConfig {
        BeeConfig { forage_probability: 1.0, ..BeeConfig::default() }
    }

    #[test]
    fn spawns_idle_inside_hive() {
        let mut scene = Scene::new(&[Vec3::new(5.0, 0.0, 5.0)], &[]);
        let (bee, pose) = scene.spawn(BeeConfig::default());
        assert_eq!(bee.state(), BeeState::Idle);
        assert!(!bee.is_carrying_nectar());
        assert!(pose.translation.length() <= bee.config().wander_radius + 1e-4);
        assert!(bee.path_index().is_none());
    }

    #[test]
    fn full_cycle_delivers_exactly_once() {
        let mut scene = Scene::new(
            &[Vec3::new(5.0, 0.0, 5.0)],
            &[Vec3::new(3.0, 2.0, 3.0), Vec3::new(1.0, 1.0, 1.0)],
        );
        let (mut bee, mut pose) = scene.spawn(eager_config());
        let mut sink = Vec::new();
        let mut visited = vec![BeeState::Idle];

        for _ in 0..20_000 {
            if let Some(change) = scene.tick(&mut bee, &mut pose, &mut sink) {
                visited.push(change.to);
                if change.to == BeeState::Idle {
                    break;
                }
            }
        }

        assert_eq!(
            visited,
            vec![
                BeeState::Idle,
                BeeState::ExitHive,
                BeeState::FlyToFlower,
                BeeState::Collecting,
                BeeState::FollowPath,
                BeeState::EnterHive,
                BeeState::Idle,
            ]
        );
        assert_eq!(sink, vec![NectarDelivered { bee: 0 }]);
        assert!(!bee.is_carrying_nectar());
    }

    #[test]
    fn stays_idle_without_flowers() {
        let mut scene = Scene::new(&[], &[Vec3::ONE]);
        let (mut bee, mut pose) = scene.spawn(eager_config());
        let mut sink = Vec::new();

        for _ in 0..5_000 {
            scene.tick(&mut bee, &mut pose, &mut sink);
            assert_eq!(bee.state(), BeeState::Idle);
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn vanished_flower_short_circuits_to_return_path() {
        let mut scene = Scene::new(&[Vec3::new(5.0, 0.0, 5.0)], &[Vec3::new(2.0, 1.0, 2.0)]);
        let (mut bee, mut pose) = scene.spawn(eager_config());
        let mut sink = Vec::new();

        while bee.state() != BeeState::FlyToFlower {
            scene.tick(&mut bee, &mut pose, &mut sink);
        }
        let flower = bee.target_flower().unwrap();
        scene.flowers.remove(flower);

        let change = scene.tick(&mut bee, &mut pose, &mut sink);
        assert_eq!(change, Some(StateChange { from: BeeState::FlyToFlower, to: BeeState::FollowPath }));
        assert_eq!(bee.path_index(), Some(0));
        assert!(!bee.is_carrying_nectar());

        // The empty-handed return publishes nothing.
        while bee.state() != BeeState::Idle {
            scene.tick(&mut bee, &mut pose, &mut sink);
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_path_goes_straight_to_hive_entry() {
        let mut scene = Scene::new(&[Vec3::new(2.0, 0.0, 2.0)], &[]);
        let (mut bee, mut pose) = scene.spawn(eager_config());
        let mut sink = Vec::new();

        while bee.state() != BeeState::Collecting {
            scene.tick(&mut bee, &mut pose, &mut sink);
        }
        let mut change = None;
        while change.is_none() {
            change = scene.tick(&mut bee, &mut pose, &mut sink);
        }
        assert_eq!(change, Some(StateChange { from: BeeState::Collecting, to: BeeState::EnterHive }));
        assert!(bee.is_carrying_nectar());
        assert_eq!(bee.target(), scene.hive.entrance);
    }

    #[test]
    fn collecting_counts_down_configured_duration() {
        let mut scene = Scene::new(&[Vec3::new(2.0, 0.0, 2.0)], &[Vec3::ONE]);
        let config = BeeConfig { collection_time: 1.0, ..eager_config() };
        let (mut bee, mut pose) = scene.spawn(config);
        let mut sink = Vec::new();

        while bee.state() != BeeState::Collecting {
            scene.tick(&mut bee, &mut pose, &mut sink);
        }
        assert_eq!(bee.state_timer(), 1.0);

        let mut ticks = 0;
        while bee.state() == BeeState::Collecting {
            scene.tick(&mut bee, &mut pose, &mut sink);
            ticks += 1;
        }
        // 1.0 s at 0.02 s per tick, allowing for float accumulation.
        assert!((50..=51).contains(&ticks), "collected for {ticks} ticks");
        assert_eq!(bee.state(), BeeState::FollowPath);
        assert!(bee.is_carrying_nectar());
    }

    #[test]
    fn never_forages_with_zero_probability() {
        let mut scene = Scene::new(&[Vec3::new(5.0, 0.0, 5.0)], &[]);
        let config = BeeConfig { forage_probability: 0.0, ..BeeConfig::default() };
        let (mut bee, mut pose) = scene.spawn(config);
        let mut sink = Vec::new();

        for _ in 0..5_000 {
            scene.tick(&mut bee, &mut pose, &mut sink);
        }
        assert_eq!(bee.state(), BeeState::Idle);
    }
}
