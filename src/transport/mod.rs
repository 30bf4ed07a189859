mod serializer;
mod sender;

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::Serialize;
use tracing::debug;

use crate::config::{SenderConfig, TransportConfig};
use crate::simulation::bee::BeeState;
use crate::simulation::flowers::FlowerId;
use crate::simulation::resources::StageChange;

// Re-export types
pub use self::serializer::{
    serializer_for, BinarySerializer, JsonSerializer, SerializationError, SerializeObject, Serializer,
};
pub use self::sender::{FileSender, NullSender, Sender, TransportError};

/// Bee state for serialization
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BeeSnapshot {
    pub id: usize,
    pub state: BeeState,
    pub position: Vec3,
    pub carrying_nectar: bool,
}

/// Comb cell state for serialization
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CombSnapshot {
    pub index: usize,
    pub stage: i32,
    pub delivery_count: u64,
    pub fill_progress: f32,
    pub completed: bool,
    pub lifted: bool,
}

/// Registered flower for serialization
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FlowerSnapshot {
    pub id: FlowerId,
    pub position: Vec3,
}

/// Lid gate state for serialization
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LidSnapshot {
    pub index: usize,
    pub open: bool,
    pub lifted_cells: usize,
}

/// Complete simulation state for serialization
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SimulationState {
    pub frame: u64,
    pub timestamp: f64,
    pub bees: Vec<BeeSnapshot>,
    pub combs: Vec<CombSnapshot>,
    pub lids: Vec<LidSnapshot>,
    pub flowers: Vec<FlowerSnapshot>,
    /// Stages applied during this frame, in the order they happened.
    pub stage_changes: Vec<StageChange>,
    /// Comb indices that completed during this frame.
    pub completed_combs: Vec<usize>,
}

/// Controller for handling serialization and transport of simulation data
#[derive(Resource)]
pub struct TransportController {
    serializer: Box<dyn Serializer>,
    sender: Box<dyn Sender>,
    output_frequency: u32,
    frames_seen: u64,
    frames_sent: u64,
}

impl TransportController {
    /// Create a new transport controller with the provided serializer and sender
    pub fn new(serializer: Box<dyn Serializer>, sender: Box<dyn Sender>, output_frequency: u32) -> Self {
        Self {
            serializer,
            sender,
            output_frequency: output_frequency.max(1),
            frames_seen: 0,
            frames_sent: 0,
        }
    }

    /// Create a transport controller from configuration
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let sender: Box<dyn Sender> = match &config.sender {
            SenderConfig::File(options) => Box::new(FileSender::new(&options.output_path)?),
            SenderConfig::Null => Box::new(NullSender),
        };

        Ok(Self::new(
            serializer_for(config.serializer),
            sender,
            config.output_frequency,
        ))
    }

    /// Serialize and send any state immediately.
    pub fn send_state<T: Serialize>(&self, state: &T) -> Result<(), TransportError> {
        let data = self.serializer.serialize_to_bytes(state)?;
        self.sender.send(&data)
    }

    /// Counts the frame and sends it if it falls on the output frequency.
    /// Returns whether the state was sent.
    pub fn send_simulation_state(&mut self, state: &SimulationState) -> Result<bool, TransportError> {
        self.frames_seen += 1;
        if self.frames_seen % u64::from(self.output_frequency) != 0 {
            return Ok(false);
        }

        self.send_state(state)?;
        self.frames_sent += 1;
        debug!(frame = state.frame, "Simulation state sent");
        Ok(true)
    }

    /// Flush the sender to ensure data is written
    pub fn flush(&self) -> Result<(), TransportError> {
        self.sender.flush()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileSenderConfig, SerializerType};
    use tempfile::tempdir;

    fn state(frame: u64) -> SimulationState {
        SimulationState {
            frame,
            timestamp: frame as f64 / 60.0,
            bees: vec![BeeSnapshot {
                id: 0,
                state: BeeState::Idle,
                position: Vec3::ZERO,
                carrying_nectar: false,
            }],
            ..SimulationState::default()
        }
    }

    #[test]
    fn sends_every_nth_frame_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let config = TransportConfig {
            serializer: SerializerType::Json,
            sender: SenderConfig::File(FileSenderConfig {
                output_path: path.to_string_lossy().into_owned(),
            }),
            output_frequency: 3,
        };
        let mut controller = TransportController::from_config(&config).unwrap();

        let sent: Vec<bool> = (1..=7)
            .map(|frame| controller.send_simulation_state(&state(frame)).unwrap())
            .collect();
        controller.flush().unwrap();

        assert_eq!(sent, vec![false, false, true, false, false, true, false]);
        assert_eq!(controller.frames_sent(), 2);

        let written = std::fs::read_to_string(&path).unwrap();
        let frames: Vec<u64> = written
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["frame"].as_u64().unwrap())
            .collect();
        assert_eq!(frames, vec![3, 6]);
    }

    #[test]
    fn null_sender_accepts_everything() {
        let mut controller = TransportController::from_config(&TransportConfig::default()).unwrap();
        assert!(controller.send_simulation_state(&state(1)).unwrap());
        assert_eq!(controller.frames_sent(), 1);
    }

    #[test]
    fn binary_frames_are_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let config = TransportConfig {
            serializer: SerializerType::Binary,
            sender: SenderConfig::File(FileSenderConfig {
                output_path: path.to_string_lossy().into_owned(),
            }),
            output_frequency: 1,
        };
        let mut controller = TransportController::from_config(&config).unwrap();
        controller.send_simulation_state(&state(1)).unwrap();
        controller.flush().unwrap();

        let expected = bincode::serialize(&state(1)).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(&written[..expected.len()], expected.as_slice());
    }
}
