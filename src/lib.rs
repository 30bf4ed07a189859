pub mod config;      // Configuration handling
pub mod simulation;  // Bees, comb cells, lid gates and the ECS host
pub mod transport;   // Data serialization and transport

// Re-export commonly used items
pub mod prelude {
    pub use crate::config::{Config, ConfigError, ConfigLoader, SerializerType, TransportConfig};
    pub use crate::simulation::bee::{BeeAgent, BeeState, NectarDelivered};
    pub use crate::simulation::bus::NotificationBus;
    pub use crate::simulation::comb::{CombCellController, CombError, FillOutcome};
    pub use crate::simulation::lid::{GateTransition, LidError, LidGateController};
    pub use crate::simulation::SimulationApp;
    pub use crate::transport::{SerializationError, SimulationState, TransportController, TransportError};
}
