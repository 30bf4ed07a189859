use std::fs;
use std::path::Path;
use thiserror::Error;

// Re-export types
pub use self::types::{
    ArrivalEpsilons, BeeConfig, CombCellConfig, CombConfig, Config, FileSenderConfig, HiveConfig,
    KeeperAction, LidGateConfig, SceneConfig, ScriptedAction, SenderConfig, SerializerType,
    SimulationConfig, TransportConfig,
};
mod types;

// Config error handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn require_non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!("{name} must be a finite, non-negative number (got {value})")));
    }
    Ok(())
}

fn require_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{name} must be greater than 0 (got {value})")));
    }
    Ok(())
}

// Config loader implementation
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let file_content = fs::read_to_string(path)
            .map_err(ConfigError::FileReadError)?;

        Self::from_str(&file_content)
    }

    pub fn from_str(content: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(content)
            .map_err(ConfigError::JsonParseError)?;

        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.simulation.frame_rate == 0 {
            return Err(invalid("Frame rate must be greater than 0"));
        }

        Self::validate_bees(&config.bees)?;

        let comb = &config.comb;
        if comb.deliveries_per_stage_unit == 0 {
            return Err(invalid("deliveries_per_stage_unit must be greater than 0"));
        }
        if comb.stages.is_empty() {
            return Err(invalid("At least one comb stage is required"));
        }

        Self::validate_scene(&config.scene)?;

        if config.transport.output_frequency == 0 {
            return Err(invalid("Output frequency must be greater than 0"));
        }

        Ok(())
    }

    fn validate_bees(bees: &BeeConfig) -> Result<(), ConfigError> {
        require_non_negative("flight_speed", bees.flight_speed)?;
        require_non_negative("rotation_speed", bees.rotation_speed)?;
        require_non_negative("wander_radius", bees.wander_radius)?;
        require_non_negative("min_height", bees.min_height)?;
        require_non_negative("max_height", bees.max_height)?;
        require_non_negative("idle_speed_factor", bees.idle_speed_factor)?;
        require_non_negative("enter_speed_factor", bees.enter_speed_factor)?;
        require_positive("min_idle_time", bees.min_idle_time)?;
        require_positive("max_idle_time", bees.max_idle_time)?;
        require_positive("collection_time", bees.collection_time)?;
        require_positive("smooth_time", bees.smooth_time)?;

        let eps = &bees.epsilons;
        require_positive("epsilons.idle", eps.idle)?;
        require_positive("epsilons.exit", eps.exit)?;
        require_positive("epsilons.flower", eps.flower)?;
        require_positive("epsilons.waypoint", eps.waypoint)?;
        require_positive("epsilons.enter", eps.enter)?;

        if bees.min_idle_time > bees.max_idle_time {
            return Err(invalid("min_idle_time must not exceed max_idle_time"));
        }
        if bees.min_height > bees.max_height {
            return Err(invalid("min_height must not exceed max_height"));
        }
        if !(0.0..=1.0).contains(&bees.forage_probability) {
            return Err(invalid("forage_probability must be within [0, 1]"));
        }

        Ok(())
    }

    fn validate_scene(scene: &SceneConfig) -> Result<(), ConfigError> {
        let comb_count = scene.combs.len();
        let lid_count = scene.lids.len();

        for (index, comb) in scene.combs.iter().enumerate() {
            if let Some(lid) = comb.lid {
                if lid >= lid_count {
                    return Err(invalid(format!("Comb {index} links to missing lid {lid}")));
                }
            }
        }

        for (index, lid) in scene.lids.iter().enumerate() {
            if let Some(cell) = lid.tracked_cells.iter().find(|cell| **cell >= comb_count) {
                return Err(invalid(format!("Lid {index} tracks missing comb {cell}")));
            }
        }

        for entry in &scene.keeper_script {
            let (kind, index, bound) = match &entry.action {
                KeeperAction::LiftCell { cell }
                | KeeperAction::LowerCell { cell }
                | KeeperAction::ToggleCell { cell }
                | KeeperAction::ResetComb { cell } => ("comb", *cell, comb_count),
                KeeperAction::ToggleLid { lid }
                | KeeperAction::OpenLid { lid }
                | KeeperAction::CloseLid { lid }
                | KeeperAction::ForceOpenLid { lid }
                | KeeperAction::ForceCloseLid { lid } => ("lid", *lid, lid_count),
                KeeperAction::AddFlower { .. } | KeeperAction::RemoveFlower { .. } => continue,
            };
            if index >= bound {
                return Err(invalid(format!(
                    "Keeper script at tick {} refers to missing {kind} {index}",
                    entry.tick
                )));
            }
        }

        Ok(())
    }
}
