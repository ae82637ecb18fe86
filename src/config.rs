//! Game configuration: everything a game instance reads at construction time.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spatial::TilePos;
use crate::world::{BuildingKind, Resources, Terrain};

pub const MAX_GRID_SIDE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation(message.into())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub turns: TurnConfig,
    #[serde(default)]
    pub victory: VictoryConfig,
    #[serde(default)]
    pub start: StartConfig,
    #[serde(default)]
    pub exploration: ExplorationConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub buildings: BuildingConfig,
    #[serde(default)]
    pub costs: CostConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub observation: ObservationConfig,
    #[serde(default)]
    pub hazards: HazardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_name() -> String {
    "standard".to_string()
}

fn default_seed() -> u64 {
    42
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            seed: default_seed(),
            map: MapConfig::default(),
            turns: TurnConfig::default(),
            victory: VictoryConfig::default(),
            start: StartConfig::default(),
            exploration: ExplorationConfig::default(),
            economy: EconomyConfig::default(),
            buildings: BuildingConfig::default(),
            costs: CostConfig::default(),
            scoring: ScoringConfig::default(),
            observation: ObservationConfig::default(),
            hazards: HazardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    /// Starting tile; defaults to the middle of the western edge.
    pub start: Option<TilePos>,
    pub terrain_weights: TerrainWeights,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            start: None,
            terrain_weights: TerrainWeights::default(),
        }
    }
}

impl MapConfig {
    pub fn start_position(&self) -> TilePos {
        self.start
            .unwrap_or_else(|| TilePos::new(0, self.height / 2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainWeights {
    pub plain: f64,
    pub forest: f64,
    pub mountain: f64,
    pub lake: f64,
}

impl Default for TerrainWeights {
    fn default() -> Self {
        Self {
            plain: 0.4,
            forest: 0.3,
            mountain: 0.2,
            lake: 0.1,
        }
    }
}

impl TerrainWeights {
    pub fn weight(&self, terrain: Terrain) -> f64 {
        match terrain {
            Terrain::Plain => self.plain,
            Terrain::Forest => self.forest,
            Terrain::Mountain => self.mountain,
            Terrain::Lake => self.lake,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_action_points")]
    pub action_points: u32,
}

fn default_max_turns() -> u32 {
    100
}

fn default_action_points() -> u32 {
    5
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            action_points: default_action_points(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictoryConfig {
    #[serde(default = "default_metal_target")]
    pub metal_target: u64,
}

fn default_metal_target() -> u64 {
    1000
}

impl Default for VictoryConfig {
    fn default() -> Self {
        Self {
            metal_target: default_metal_target(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    pub population: u32,
    pub resources: Resources,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            population: 20,
            resources: Resources {
                ore: 50,
                wood: 50,
                metal: 20,
                food: 100,
            },
        }
    }
}

/// Inclusive range of stock revealed by exploring a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRange {
    pub min: u64,
    pub max: u64,
}

impl RevealRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    pub plain_food: RevealRange,
    pub forest_wood: RevealRange,
    pub mountain_ore: RevealRange,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            plain_food: RevealRange::new(30, 100),
            forest_wood: RevealRange::new(80, 150),
            mountain_ore: RevealRange::new(50, 200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub plain_food: f64,
    pub forest_wood: f64,
    pub forest_food: f64,
    pub mountain_ore: f64,
    /// Production bonus per inhabitant
    pub population_factor: f64,
    /// Production bonus per exploitation level
    pub exploitation_bonus: f64,
    pub max_exploitation: u8,
    pub food_per_capita: f64,
    pub base_capacity: u32,
    pub base_growth: f64,
    pub growth_variance: f64,
    pub growth_food_reserve: u64,
    pub starvation_rate: f64,
    pub expand_population: u32,
    pub migration_fraction: f64,
    pub research_bonus: f64,
    pub max_research_level: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            plain_food: 6.0,
            forest_wood: 8.0,
            forest_food: 2.0,
            mountain_ore: 5.0,
            population_factor: 0.01,
            exploitation_bonus: 0.25,
            max_exploitation: 5,
            food_per_capita: 0.25,
            base_capacity: 100,
            base_growth: 0.02,
            growth_variance: 0.25,
            growth_food_reserve: 0,
            starvation_rate: 0.1,
            expand_population: 10,
            migration_fraction: 0.25,
            research_bonus: 0.05,
            max_research_level: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    pub mine_multiplier: f64,
    pub sawmill_multiplier: f64,
    pub farm_food_bonus: f64,
    /// Ore consumed per unit of metal
    pub smelter_ratio: u64,
    /// Ore a single smelter may process per tick
    pub smelter_throughput: u64,
    pub house_capacity: u32,
    pub house_growth: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            mine_multiplier: 1.5,
            sawmill_multiplier: 1.5,
            farm_food_bonus: 10.0,
            smelter_ratio: 2,
            smelter_throughput: 20,
            house_capacity: 50,
            house_growth: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingCosts {
    pub mine: Resources,
    pub sawmill: Resources,
    pub farm: Resources,
    pub smelter: Resources,
    pub house: Resources,
}

impl Default for BuildingCosts {
    fn default() -> Self {
        Self {
            mine: Resources {
                wood: 20,
                metal: 10,
                ..Resources::default()
            },
            sawmill: Resources {
                wood: 15,
                metal: 5,
                ..Resources::default()
            },
            farm: Resources {
                wood: 10,
                ore: 5,
                ..Resources::default()
            },
            smelter: Resources {
                wood: 25,
                ore: 15,
                ..Resources::default()
            },
            house: Resources {
                wood: 15,
                ore: 5,
                ..Resources::default()
            },
        }
    }
}

impl BuildingCosts {
    pub fn cost(&self, kind: BuildingKind) -> &Resources {
        match kind {
            BuildingKind::Mine => &self.mine,
            BuildingKind::Sawmill => &self.sawmill,
            BuildingKind::Farm => &self.farm,
            BuildingKind::Smelter => &self.smelter,
            BuildingKind::House => &self.house,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub expand: Resources,
    pub research: Resources,
    pub buildings: BuildingCosts,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            expand: Resources {
                food: 20,
                wood: 10,
                ..Resources::default()
            },
            research: Resources {
                metal: 15,
                food: 10,
                ..Resources::default()
            },
            buildings: BuildingCosts::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub resource_efficiency: f64,
    pub population_health: f64,
    pub goal_progress: f64,
    pub strategy_diversity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            resource_efficiency: 0.3,
            population_health: 0.2,
            goal_progress: 0.4,
            strategy_diversity: 0.1,
        }
    }
}

impl ScoreWeights {
    fn values(&self) -> [f64; 4] {
        [
            self.resource_efficiency,
            self.population_health,
            self.goal_progress,
            self.strategy_diversity,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Production per action point that counts as fully efficient
    pub efficiency_reference: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            efficiency_reference: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationConfig {
    #[serde(default = "default_recent_events")]
    pub recent_events: usize,
    #[serde(default = "default_frontier_limit")]
    pub frontier_limit: usize,
}

fn default_recent_events() -> usize {
    5
}

fn default_frontier_limit() -> usize {
    10
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            recent_events: default_recent_events(),
            frontier_limit: default_frontier_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub chance_per_turn: f64,
    pub drought_food_factor: f64,
    pub drought_min_turns: u32,
    pub drought_max_turns: u32,
    pub harvest_food: u64,
    pub discovery_ore: u64,
    pub plague_rate: f64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            chance_per_turn: 0.0,
            drought_food_factor: 0.5,
            drought_min_turns: 1,
            drought_max_turns: 3,
            harvest_food: 50,
            discovery_ore: 30,
            plague_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GameConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let map = &self.map;
        for (side, value) in [("width", map.width), ("height", map.height)] {
            if !(1..=MAX_GRID_SIDE).contains(&value) {
                return Err(invalid(format!(
                    "map {side} must be within 1..={MAX_GRID_SIDE}, got {value}"
                )));
            }
        }
        let start = map.start_position();
        if start.x >= map.width || start.y >= map.height {
            return Err(invalid(format!(
                "start tile {start} lies outside the {}x{} map",
                map.width, map.height
            )));
        }
        let weights = &map.terrain_weights;
        let mut weight_sum = 0.0;
        for terrain in Terrain::ALL {
            let weight = weights.weight(terrain);
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!(
                    "terrain weight for {terrain} must be finite and non-negative"
                )));
            }
            weight_sum += weight;
        }
        if weight_sum <= 0.0 {
            return Err(invalid("terrain weights must not all be zero"));
        }

        if self.turns.max_turns == 0 {
            return Err(invalid("max_turns must be at least 1"));
        }
        if self.turns.action_points == 0 {
            return Err(invalid("action_points must be at least 1"));
        }
        if self.victory.metal_target == 0 {
            return Err(invalid("victory metal_target must be positive"));
        }
        if self.start.population == 0 {
            return Err(invalid("start population must be at least 1"));
        }

        let exploration = &self.exploration;
        for (label, range) in [
            ("plain_food", exploration.plain_food),
            ("forest_wood", exploration.forest_wood),
            ("mountain_ore", exploration.mountain_ore),
        ] {
            if range.min > range.max {
                return Err(invalid(format!(
                    "exploration range {label} has min {} above max {}",
                    range.min, range.max
                )));
            }
        }

        let economy = &self.economy;
        for (label, value) in [
            ("plain_food", economy.plain_food),
            ("forest_wood", economy.forest_wood),
            ("forest_food", economy.forest_food),
            ("mountain_ore", economy.mountain_ore),
            ("population_factor", economy.population_factor),
            ("exploitation_bonus", economy.exploitation_bonus),
            ("food_per_capita", economy.food_per_capita),
            ("base_growth", economy.base_growth),
            ("starvation_rate", economy.starvation_rate),
            ("research_bonus", economy.research_bonus),
            ("mine_multiplier", self.buildings.mine_multiplier),
            ("sawmill_multiplier", self.buildings.sawmill_multiplier),
            ("farm_food_bonus", self.buildings.farm_food_bonus),
            ("house_growth", self.buildings.house_growth),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{label} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !(0.0..1.0).contains(&economy.growth_variance) {
            return Err(invalid("growth_variance must lie in [0, 1)"));
        }
        if !(economy.migration_fraction > 0.0 && economy.migration_fraction <= 1.0) {
            return Err(invalid("migration_fraction must lie in (0, 1]"));
        }
        if economy.base_capacity == 0 {
            return Err(invalid("base_capacity must be at least 1"));
        }
        if self.buildings.smelter_ratio == 0 {
            return Err(invalid("smelter_ratio must be at least 1"));
        }

        let hazards = &self.hazards;
        for (label, value) in [
            ("chance_per_turn", hazards.chance_per_turn),
            ("drought_food_factor", hazards.drought_food_factor),
            ("plague_rate", hazards.plague_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("hazard {label} must lie in [0, 1]")));
            }
        }
        if hazards.drought_min_turns == 0 || hazards.drought_min_turns > hazards.drought_max_turns
        {
            return Err(invalid(
                "drought duration must satisfy 1 <= min_turns <= max_turns",
            ));
        }

        let scoring = &self.scoring;
        if scoring
            .weights
            .values()
            .iter()
            .any(|weight| !weight.is_finite() || *weight < 0.0)
        {
            return Err(invalid("score weights must be finite and non-negative"));
        }
        if !scoring.efficiency_reference.is_finite() || scoring.efficiency_reference <= 0.0 {
            return Err(invalid("efficiency_reference must be positive"));
        }

        Ok(())
    }
}
