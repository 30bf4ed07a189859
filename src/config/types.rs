use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub bees: BeeConfig,
    #[serde(default)]
    pub comb: CombConfig,
    pub scene: SceneConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Clock and run-length settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    pub frame_rate: u32,
    /// Stop after this many ticks; run forever when absent.
    #[serde(default)]
    pub max_ticks: Option<u64>,
    /// RNG seed; a fresh random seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

// --- Bees ---

/// Forager tuning shared by every bee.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BeeConfig {
    #[serde(default = "default_flight_speed")]
    pub flight_speed: f32,
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,
    #[serde(default = "default_wander_radius")]
    pub wander_radius: f32,
    #[serde(default = "default_min_height")]
    pub min_height: f32,
    #[serde(default = "default_max_height")]
    pub max_height: f32,
    #[serde(default = "default_min_idle_time")]
    pub min_idle_time: f32,
    #[serde(default = "default_max_idle_time")]
    pub max_idle_time: f32,
    #[serde(default = "default_collection_time")]
    pub collection_time: f32,
    /// Chance that an idle bee heads out when its idle hop ends.
    #[serde(default = "default_forage_probability")]
    pub forage_probability: f32,
    #[serde(default = "default_smooth_time")]
    pub smooth_time: f32,
    #[serde(default = "default_idle_speed_factor")]
    pub idle_speed_factor: f32,
    #[serde(default = "default_enter_speed_factor")]
    pub enter_speed_factor: f32,
    #[serde(default)]
    pub epsilons: ArrivalEpsilons,
}

fn default_flight_speed() -> f32 { 8.0 }
fn default_rotation_speed() -> f32 { 5.0 }
fn default_wander_radius() -> f32 { 1.5 }
fn default_min_height() -> f32 { 1.0 }
fn default_max_height() -> f32 { 3.0 }
fn default_min_idle_time() -> f32 { 2.0 }
fn default_max_idle_time() -> f32 { 5.0 }
fn default_collection_time() -> f32 { 3.0 }
fn default_forage_probability() -> f32 { 0.4 }
fn default_smooth_time() -> f32 { 0.1 }
fn default_idle_speed_factor() -> f32 { 0.3 }
fn default_enter_speed_factor() -> f32 { 1.5 }

impl Default for BeeConfig {
    fn default() -> Self {
        Self {
            flight_speed: default_flight_speed(),
            rotation_speed: default_rotation_speed(),
            wander_radius: default_wander_radius(),
            min_height: default_min_height(),
            max_height: default_max_height(),
            min_idle_time: default_min_idle_time(),
            max_idle_time: default_max_idle_time(),
            collection_time: default_collection_time(),
            forage_probability: default_forage_probability(),
            smooth_time: default_smooth_time(),
            idle_speed_factor: default_idle_speed_factor(),
            enter_speed_factor: default_enter_speed_factor(),
            epsilons: ArrivalEpsilons::default(),
        }
    }
}

/// Distance under which a bee counts as having reached its target, per state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ArrivalEpsilons {
    #[serde(default = "default_idle_epsilon")]
    pub idle: f32,
    #[serde(default = "default_exit_epsilon")]
    pub exit: f32,
    #[serde(default = "default_flower_epsilon")]
    pub flower: f32,
    #[serde(default = "default_waypoint_epsilon")]
    pub waypoint: f32,
    #[serde(default = "default_enter_epsilon")]
    pub enter: f32,
}

fn default_idle_epsilon() -> f32 { 0.1 }
fn default_exit_epsilon() -> f32 { 0.1 }
fn default_flower_epsilon() -> f32 { 0.3 }
fn default_waypoint_epsilon() -> f32 { 0.3 }
fn default_enter_epsilon() -> f32 { 0.05 }

impl Default for ArrivalEpsilons {
    fn default() -> Self {
        Self {
            idle: default_idle_epsilon(),
            exit: default_exit_epsilon(),
            flower: default_flower_epsilon(),
            waypoint: default_waypoint_epsilon(),
            enter: default_enter_epsilon(),
        }
    }
}

// --- Comb cells ---

/// Fill progression shared by every comb cell.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CombConfig {
    #[serde(default = "default_deliveries_per_stage_unit")]
    pub deliveries_per_stage_unit: u32,
    /// Representation shown before any stage is applied.
    #[serde(default = "default_base_representation")]
    pub base_representation: String,
    /// One representation per stage; the stage count is its length.
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,
}

fn default_deliveries_per_stage_unit() -> u32 { 5 }
fn default_base_representation() -> String { "comb_empty".to_string() }
fn default_stages() -> Vec<String> {
    vec![
        "comb_stage_1".to_string(),
        "comb_stage_2".to_string(),
        "comb_stage_3".to_string(),
    ]
}

impl Default for CombConfig {
    fn default() -> Self {
        Self {
            deliveries_per_stage_unit: default_deliveries_per_stage_unit(),
            base_representation: default_base_representation(),
            stages: default_stages(),
        }
    }
}

// --- Scene ---

/// What exists in the world at tick zero.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SceneConfig {
    pub hives: Vec<HiveConfig>,
    #[serde(default)]
    pub flowers: Vec<Vec3>,
    #[serde(default)]
    pub combs: Vec<CombCellConfig>,
    #[serde(default)]
    pub lids: Vec<LidGateConfig>,
    #[serde(default)]
    pub keeper_script: Vec<ScriptedAction>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HiveConfig {
    pub entrance: Vec3,
    #[serde(default)]
    pub exit: Option<Vec3>,
    /// Return route; the entrance alone is used when empty.
    #[serde(default)]
    pub waypoints: Vec<Vec3>,
    pub bee_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CombCellConfig {
    #[serde(default)]
    pub start_lowered: bool,
    #[serde(default = "default_true")]
    pub interactive: bool,
    /// Index into `scene.lids` of the gate notified when this cell moves.
    #[serde(default)]
    pub lid: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LidGateConfig {
    /// Indices into `scene.combs`.
    #[serde(default)]
    pub tracked_cells: Vec<usize>,
    #[serde(default = "default_true")]
    pub enforce_lift_constraint: bool,
    #[serde(default)]
    pub start_open: bool,
}

fn default_true() -> bool { true }

/// One keeper input replayed at the start of `tick`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScriptedAction {
    pub tick: u64,
    #[serde(flatten)]
    pub action: KeeperAction,
}

/// Inputs a keeper can make; indices refer to `scene.combs` / `scene.lids`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum KeeperAction {
    LiftCell { cell: usize },
    LowerCell { cell: usize },
    ToggleCell { cell: usize },
    ResetComb { cell: usize },
    ToggleLid { lid: usize },
    OpenLid { lid: usize },
    CloseLid { lid: usize },
    ForceOpenLid { lid: usize },
    ForceCloseLid { lid: usize },
    AddFlower { position: Vec3 },
    RemoveFlower { flower: u32 },
}

// --- Transport ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default)]
    pub serializer: SerializerType,
    #[serde(default)]
    pub sender: SenderConfig,
    /// Send every N ticks.
    #[serde(default = "default_output_frequency")]
    pub output_frequency: u32,
}

fn default_output_frequency() -> u32 { 1 }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            serializer: SerializerType::default(),
            sender: SenderConfig::default(),
            output_frequency: default_output_frequency(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SerializerType {
    #[default]
    Json,
    Binary,
}

/// Configuration specific to the File sender
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FileSenderConfig {
    pub output_path: String,
}

/// Enum defining the sender type and its specific configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(tag = "sender_type", content = "options")] // Nest options
pub enum SenderConfig {
    File(FileSenderConfig),
    #[default]
    Null,
}
