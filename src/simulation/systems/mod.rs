pub mod foraging;
pub mod keeper;
pub mod lid_constraint;
pub mod setup;
pub mod state_export;
pub mod transport_integration;

// Re-export system functions for easier access
pub use foraging::forage;
pub use keeper::run_keeper_script;
pub use lid_constraint::enforce_lid_constraints;
pub use setup::spawn_scene;
pub use state_export::update_current_simulation_state_resource;
pub use transport_integration::send_simulation_data_system;
