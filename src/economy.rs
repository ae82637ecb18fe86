//! Resource economy rules. Everything here is a pure function of its inputs; the
//! tick systems decide when to call them and where the results land.

use crate::config::{BuildingConfig, EconomyConfig, GameConfig};
use crate::world::{BuildingKind, Resources, Terrain, Tile};

/// Global production multipliers in effect for a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifiers {
    pub research: f64,
    pub food: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            research: 1.0,
            food: 1.0,
        }
    }
}

pub fn research_multiplier(level: u32, economy: &EconomyConfig) -> f64 {
    1.0 + economy.research_bonus * f64::from(level)
}

fn floor_amount(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u64
    } else {
        0
    }
}

/// Per-tick yield of a tile. Unexplored or empty tiles produce nothing.
pub fn production_for(tile: &Tile, modifiers: &Modifiers, config: &GameConfig) -> Resources {
    if !tile.is_explored() || tile.population == 0 {
        return Resources::default();
    }
    let economy = &config.economy;
    let buildings = &config.buildings;

    let (mut food, mut wood, mut ore) = match tile.terrain {
        Terrain::Plain => (economy.plain_food, 0.0, 0.0),
        Terrain::Forest => (economy.forest_food, economy.forest_wood, 0.0),
        Terrain::Mountain => (0.0, 0.0, economy.mountain_ore),
        Terrain::Lake => (0.0, 0.0, 0.0),
    };

    match (tile.building, tile.terrain) {
        (Some(BuildingKind::Mine), Terrain::Mountain) => ore *= buildings.mine_multiplier,
        (Some(BuildingKind::Sawmill), Terrain::Forest) => wood *= buildings.sawmill_multiplier,
        (Some(BuildingKind::Farm), _) => food += buildings.farm_food_bonus,
        _ => {}
    }

    let scale = (1.0 + f64::from(tile.population) * economy.population_factor)
        * (1.0 + f64::from(tile.exploitation) * economy.exploitation_bonus)
        * modifiers.research;

    Resources {
        ore: floor_amount(ore * scale),
        wood: floor_amount(wood * scale),
        metal: 0,
        food: floor_amount(food * scale * modifiers.food),
    }
}

/// Food a tile eats per tick
pub fn consumption_for(tile: &Tile, economy: &EconomyConfig) -> u64 {
    if tile.population == 0 {
        return 0;
    }
    let upkeep = f64::from(tile.population) * economy.food_per_capita;
    if upkeep.is_finite() && upkeep > 0.0 {
        upkeep.ceil() as u64
    } else {
        0
    }
}

/// Population lost on a tick where upkeep could not be paid. Never below one
/// while the tile is inhabited, never more than the tile holds.
pub fn starvation_loss(population: u32, economy: &EconomyConfig) -> u32 {
    if population == 0 {
        return 0;
    }
    let loss = (f64::from(population) * economy.starvation_rate).floor() as u32;
    loss.max(1).min(population)
}

/// Growth for a fed tile, bounded by the room left under its capacity.
pub fn growth_for(tile: &Tile, variance: f64, economy: &EconomyConfig) -> u32 {
    if tile.population == 0 || tile.room() == 0 {
        return 0;
    }
    let rate = economy.base_growth + tile.growth_modifier;
    let grown = (f64::from(tile.population) * rate * variance).floor();
    let grown = if grown.is_finite() && grown > 0.0 {
        grown as u32
    } else {
        0
    };
    grown.max(1).min(tile.room())
}

/// Most a migration may move out of a tile holding `population`
pub fn migration_bound(population: u32, economy: &EconomyConfig) -> u32 {
    (f64::from(population) * economy.migration_fraction).floor() as u32
}

/// Ore consumed and metal produced by one smelter given the ore on hand.
/// Only whole batches are converted.
pub fn smelt(available_ore: u64, buildings: &BuildingConfig) -> (u64, u64) {
    let ratio = buildings.smelter_ratio.max(1);
    let usable = available_ore.min(buildings.smelter_throughput);
    let batches = usable / ratio;
    (batches * ratio, batches)
}
