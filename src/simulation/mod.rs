pub mod bee;
pub mod bus;
pub mod comb;
pub mod components;
pub mod flowers;
pub mod hive;
pub mod lid;
pub mod motion;
pub mod path;
pub mod resources;
pub mod systems;

use std::thread::sleep;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::transport::{SimulationState, TransportController};
use self::resources::{
    CurrentSimulationState, FrameCounter, KeeperScript, PresentationFeed, SimRng, Time,
};
use self::systems::{
    enforce_lid_constraints, forage, run_keeper_script, send_simulation_data_system, spawn_scene,
    update_current_simulation_state_resource,
};

/// The main simulation application
pub struct SimulationApp {
    world: World,
    schedule: Schedule,
    running: bool,
    config: Config,
}

impl SimulationApp {
    /// Create a new simulation app with the provided configuration
    pub fn new(config: Config) -> Self {
        let mut world = World::new();

        world.insert_resource(Time {
            delta_seconds: 1.0 / config.simulation.frame_rate.max(1) as f32,
            elapsed_seconds: 0.0,
        });
        world.insert_resource(FrameCounter::default());
        world.insert_resource(KeeperScript::new(config.scene.keeper_script.clone()));
        world.init_resource::<PresentationFeed>();
        world.init_resource::<CurrentSimulationState>();

        match TransportController::from_config(&config.transport) {
            Ok(controller) => {
                world.insert_resource(controller);
            }
            Err(err) => {
                error!("Failed to create transport controller: {}. Transport will be disabled.", err);
            }
        };

        let mut rng = SimRng::new(config.simulation.seed);
        info!("Initializing scene...");
        spawn_scene(&mut world, &config, &mut rng);
        world.insert_resource(rng);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                run_keeper_script,
                forage,
                enforce_lid_constraints,
                update_current_simulation_state_resource,
                send_simulation_data_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            running: false,
            config,
        }
    }

    /// Advances the simulation by exactly one tick of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let elapsed_seconds = {
            let mut time = self.world.resource_mut::<Time>();
            time.delta_seconds = dt;
            time.elapsed_seconds += f64::from(dt);
            time.elapsed_seconds
        };
        {
            let mut frame_count = self.world.resource_mut::<FrameCounter>();
            frame_count.count += 1;
            frame_count.timestamp = elapsed_seconds;
        }

        self.schedule.run(&mut self.world);
    }

    /// Runs at a fixed timestep of `1 / frame_rate` until `max_ticks` (when
    /// set) or `stop()`, sleeping to hold the frame rate.
    pub fn run(&mut self) {
        self.running = true;

        let frame_duration = Duration::from_secs_f64(1.0 / self.config.simulation.frame_rate.max(1) as f64);
        let dt = frame_duration.as_secs_f32();
        let max_ticks = self.config.simulation.max_ticks;

        while self.running {
            if max_ticks.is_some_and(|max| self.frame() >= max) {
                info!(ticks = self.frame(), "Tick limit reached");
                break;
            }

            let started = Instant::now();
            self.step(dt);

            if self.frame() % 100 == 0 {
                let state = self.current_state();
                let delivered: u64 = state.combs.iter().map(|comb| comb.delivery_count).max().unwrap_or(0);
                debug!(
                    frame = state.frame,
                    timestamp = state.timestamp,
                    bees = state.bees.len(),
                    delivered,
                    "Simulation frame update"
                );
            }

            let elapsed = started.elapsed();
            if elapsed > frame_duration {
                warn!(
                    target_duration_ms = frame_duration.as_millis(),
                    actual_duration_ms = elapsed.as_millis(),
                    lag_ms = (elapsed - frame_duration).as_millis(),
                    "Frame lag detected!"
                );
            } else {
                sleep(frame_duration - elapsed);
            }
        }

        self.running = false;
        if let Some(controller) = self.world.get_resource::<TransportController>() {
            if let Err(err) = controller.flush() {
                error!("Failed to flush transport: {}", err);
            }
        }
    }

    /// Stop the simulation
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Ticks run so far.
    pub fn frame(&self) -> u64 {
        self.world.resource::<FrameCounter>().count
    }

    /// State exported at the end of the last tick.
    pub fn current_state(&self) -> &SimulationState {
        &self.world.resource::<CurrentSimulationState>().0
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
