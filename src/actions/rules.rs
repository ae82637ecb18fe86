use std::cmp::Reverse;

use rand::Rng;

use crate::config::RevealRange;
use crate::economy::{migration_bound, research_multiplier};
use crate::error::GameError;
use crate::game::GameState;
use crate::rng::EXPLORE_STREAM;
use crate::spatial::TilePos;
use crate::world::{BuildingKind, Exploration, ResourceKind, Resources, Terrain, Tile};

use super::{ActionEffect, ActionKind, ActionRequest};

type Prepare = fn(&GameState, &ActionRequest, Option<TilePos>) -> Result<Plan, GameError>;

/// Everything the engine knows about one action kind.
#[derive(Clone, Copy)]
pub struct ActionRule {
    pub kind: ActionKind,
    pub ap_cost: u32,
    /// Whether `target_x`/`target_y` must name a tile on the map
    pub needs_target: bool,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub(crate) prepare: Prepare,
}

pub static RULES: [ActionRule; 6] = [
    ActionRule {
        kind: ActionKind::Explore,
        ap_cost: 1,
        needs_target: true,
        required: &["target_x", "target_y"],
        optional: &[],
        prepare: prepare_explore,
    },
    ActionRule {
        kind: ActionKind::Expand,
        ap_cost: 2,
        needs_target: true,
        required: &["target_x", "target_y"],
        optional: &[],
        prepare: prepare_expand,
    },
    ActionRule {
        kind: ActionKind::Exploit,
        ap_cost: 1,
        needs_target: true,
        required: &["target_x", "target_y"],
        optional: &[],
        prepare: prepare_exploit,
    },
    ActionRule {
        kind: ActionKind::Build,
        ap_cost: 2,
        needs_target: true,
        required: &["target_x", "target_y", "building_type"],
        optional: &[],
        prepare: prepare_build,
    },
    ActionRule {
        kind: ActionKind::Research,
        ap_cost: 3,
        needs_target: false,
        required: &[],
        optional: &[],
        prepare: prepare_research,
    },
    ActionRule {
        kind: ActionKind::Migrate,
        ap_cost: 1,
        needs_target: true,
        required: &["target_x", "target_y"],
        optional: &["source_x", "source_y", "amount"],
        prepare: prepare_migrate,
    },
];

pub fn rule_for(kind: ActionKind) -> &'static ActionRule {
    match kind {
        ActionKind::Explore => &RULES[0],
        ActionKind::Expand => &RULES[1],
        ActionKind::Exploit => &RULES[2],
        ActionKind::Build => &RULES[3],
        ActionKind::Research => &RULES[4],
        ActionKind::Migrate => &RULES[5],
    }
}

/// A fully validated action, ready to commit
#[derive(Debug)]
pub(crate) enum Plan {
    Explore {
        pos: TilePos,
        terrain: Terrain,
        reveal: Option<(ResourceKind, RevealRange)>,
    },
    Expand {
        pos: TilePos,
        population: u32,
        cost: Resources,
    },
    Exploit {
        pos: TilePos,
        level: u8,
    },
    Build {
        pos: TilePos,
        building: BuildingKind,
        cost: Resources,
    },
    Research {
        level: u32,
        cost: Resources,
    },
    Migrate {
        from: TilePos,
        to: TilePos,
        amount: u32,
    },
}

fn tile_at(state: &GameState, pos: TilePos) -> Result<&Tile, GameError> {
    state
        .world
        .grid
        .tile(pos)
        .ok_or_else(|| GameError::invalid_target(format!("{pos} is outside the map")))
}

fn explored_tile(state: &GameState, pos: TilePos) -> Result<&Tile, GameError> {
    let tile = tile_at(state, pos)?;
    if !tile.is_explored() {
        return Err(GameError::invalid_target(format!("{pos} has not been explored")));
    }
    Ok(tile)
}

fn require_target(target: Option<TilePos>) -> Result<TilePos, GameError> {
    target.ok_or_else(|| GameError::invalid_target("target tile required"))
}

fn ensure_affordable(state: &GameState, cost: &Resources, what: &str) -> Result<(), GameError> {
    let stock = &state.world.ledger.stock;
    if stock.covers(cost) {
        return Ok(());
    }
    let missing: Vec<String> = ResourceKind::ALL
        .into_iter()
        .filter(|kind| stock.get(*kind) < cost.get(*kind))
        .map(|kind| format!("{} {}/{}", kind.as_str(), stock.get(kind), cost.get(kind)))
        .collect();
    Err(GameError::insufficient_resources(format!(
        "{what} needs more resources: {}",
        missing.join(", ")
    )))
}

fn prepare_explore(
    state: &GameState,
    _request: &ActionRequest,
    target: Option<TilePos>,
) -> Result<Plan, GameError> {
    let pos = require_target(target)?;
    let tile = tile_at(state, pos)?;
    if tile.is_explored() {
        return Err(GameError::invalid_target(format!("{pos} is already explored")));
    }
    if !state.world.grid.touches_explored(pos) {
        return Err(GameError::invalid_target(format!(
            "{pos} is not adjacent to explored territory"
        )));
    }
    let ranges = &state.config.exploration;
    let reveal = match tile.terrain {
        Terrain::Plain => Some((ResourceKind::Food, ranges.plain_food)),
        Terrain::Forest => Some((ResourceKind::Wood, ranges.forest_wood)),
        Terrain::Mountain => Some((ResourceKind::Ore, ranges.mountain_ore)),
        Terrain::Lake => None,
    };
    Ok(Plan::Explore {
        pos,
        terrain: tile.terrain,
        reveal,
    })
}

fn prepare_expand(
    state: &GameState,
    _request: &ActionRequest,
    target: Option<TilePos>,
) -> Result<Plan, GameError> {
    let pos = require_target(target)?;
    let tile = explored_tile(state, pos)?;
    if tile.is_populated() {
        return Err(GameError::invalid_target(format!("{pos} is already populated")));
    }
    let population = state.config.economy.expand_population.min(tile.capacity);
    if population == 0 {
        return Err(GameError::invalid_target(format!("{pos} has no room for settlers")));
    }
    let cost = state.config.costs.expand;
    ensure_affordable(state, &cost, "expand")?;
    Ok(Plan::Expand {
        pos,
        population,
        cost,
    })
}

fn prepare_exploit(
    state: &GameState,
    _request: &ActionRequest,
    target: Option<TilePos>,
) -> Result<Plan, GameError> {
    let pos = require_target(target)?;
    let tile = explored_tile(state, pos)?;
    let max = state.config.economy.max_exploitation;
    if tile.exploitation >= max {
        return Err(GameError::invalid_target(format!(
            "{pos} is already exploited to the maximum level {max}"
        )));
    }
    Ok(Plan::Exploit {
        pos,
        level: tile.exploitation + 1,
    })
}

fn prepare_build(
    state: &GameState,
    request: &ActionRequest,
    target: Option<TilePos>,
) -> Result<Plan, GameError> {
    let pos = require_target(target)?;
    let name = request
        .building_type
        .as_deref()
        .ok_or_else(|| GameError::invalid_target("build requires building_type"))?;
    let building = BuildingKind::parse(name)
        .ok_or_else(|| GameError::invalid_target(format!("unknown building type '{name}'")))?;
    let tile = explored_tile(state, pos)?;
    if let Some(existing) = tile.building {
        return Err(GameError::invalid_target(format!(
            "{pos} already has a {existing}"
        )));
    }
    if !building.allowed_on(tile.terrain) {
        return Err(GameError::invalid_target(format!(
            "a {building} cannot be built on {}",
            tile.terrain
        )));
    }
    let cost = *state.config.costs.buildings.cost(building);
    ensure_affordable(state, &cost, building.as_str())?;
    Ok(Plan::Build {
        pos,
        building,
        cost,
    })
}

fn prepare_research(
    state: &GameState,
    _request: &ActionRequest,
    _target: Option<TilePos>,
) -> Result<Plan, GameError> {
    let max = state.config.economy.max_research_level;
    if state.world.research_level >= max {
        return Err(GameError::invalid_state(format!(
            "research is already at the maximum level {max}"
        )));
    }
    let cost = state.config.costs.research;
    ensure_affordable(state, &cost, "research")?;
    Ok(Plan::Research {
        level: state.world.research_level + 1,
        cost,
    })
}

fn prepare_migrate(
    state: &GameState,
    request: &ActionRequest,
    target: Option<TilePos>,
) -> Result<Plan, GameError> {
    let to = require_target(target)?;
    let grid = &state.world.grid;
    let destination = explored_tile(state, to)?;

    let from = match (request.source_x, request.source_y) {
        (Some(x), Some(y)) => grid.shape().checked_pos(x, y).ok_or_else(|| {
            GameError::invalid_target(format!("source ({x}, {y}) is outside the map"))
        })?,
        (None, None) => busiest_neighbour(state, to).ok_or_else(|| {
            GameError::invalid_target(format!("{to} has no populated explored neighbour"))
        })?,
        _ => {
            return Err(GameError::invalid_target(
                "source_x and source_y must be given together",
            ))
        }
    };
    if !grid.shape().is_adjacent(from, to) {
        return Err(GameError::invalid_target(format!(
            "{from} is not adjacent to {to}"
        )));
    }
    let source = explored_tile(state, from)?;
    if !source.is_populated() {
        return Err(GameError::invalid_target(format!("{from} has nobody to move")));
    }

    let bound = migration_bound(source.population, &state.config.economy);
    if bound == 0 {
        return Err(GameError::invalid_target(format!(
            "{from} is too small to send migrants"
        )));
    }
    let requested = match request.amount {
        Some(amount) if amount >= 1 && amount <= i64::from(bound) => amount as u32,
        Some(amount) => {
            return Err(GameError::invalid_target(format!(
                "amount {amount} must lie within 1..={bound}"
            )))
        }
        None => bound,
    };
    let room = destination.room();
    if room == 0 {
        return Err(GameError::invalid_target(format!("{to} is at capacity")));
    }

    Ok(Plan::Migrate {
        from,
        to,
        amount: requested.min(room),
    })
}

/// Most populated explored neighbour of `pos`; ties go to the earlier tile in row-major order
fn busiest_neighbour(state: &GameState, pos: TilePos) -> Option<TilePos> {
    let grid = &state.world.grid;
    let shape = grid.shape();
    grid.neighbors(pos)
        .into_iter()
        .filter_map(|neighbour| grid.tile(neighbour))
        .filter(|tile| tile.is_explored() && tile.is_populated())
        .min_by_key(|tile| (Reverse(tile.population), shape.index_of(tile.pos)))
        .map(|tile| tile.pos)
}

impl Plan {
    /// Apply the plan. Every precondition was checked while preparing it.
    pub(crate) fn commit(self, state: &mut GameState) -> (ActionEffect, String, Vec<TilePos>) {
        match self {
            Plan::Explore {
                pos,
                terrain,
                reveal,
            } => {
                let mut revealed = Resources::default();
                if let Some((kind, range)) = reveal {
                    let amount = state
                        .rng
                        .stream(EXPLORE_STREAM)
                        .gen_range(range.min..=range.max);
                    *revealed.get_mut(kind) = amount;
                }
                if let Some(tile) = state.world.grid.tile_mut(pos) {
                    tile.exploration = Exploration::Explored;
                    tile.stock.add(&revealed);
                }
                (
                    ActionEffect::Explored {
                        pos,
                        terrain,
                        revealed,
                    },
                    format!("Explored {terrain} at {pos}"),
                    vec![pos],
                )
            }
            Plan::Expand {
                pos,
                population,
                cost,
            } => {
                let spent = state.world.grid.spend(&cost);
                debug_assert!(spent, "expand cost was checked while preparing");
                if let Some(tile) = state.world.grid.tile_mut(pos) {
                    tile.population = population;
                }
                (
                    ActionEffect::Expanded {
                        pos,
                        population,
                        cost,
                    },
                    format!("Settled {population} inhabitants at {pos}"),
                    vec![pos],
                )
            }
            Plan::Exploit { pos, level } => {
                if let Some(tile) = state.world.grid.tile_mut(pos) {
                    tile.exploitation = level;
                }
                (
                    ActionEffect::Exploited { pos, level },
                    format!("Exploitation at {pos} raised to level {level}"),
                    vec![pos],
                )
            }
            Plan::Build {
                pos,
                building,
                cost,
            } => {
                let spent = state.world.grid.spend(&cost);
                debug_assert!(spent, "building cost was checked while preparing");
                let house = &state.config.buildings;
                if let Some(tile) = state.world.grid.tile_mut(pos) {
                    tile.building = Some(building);
                    if building == BuildingKind::House {
                        tile.capacity += house.house_capacity;
                        tile.growth_modifier += house.house_growth;
                    }
                }
                (
                    ActionEffect::Built {
                        pos,
                        building,
                        cost,
                    },
                    format!("Built a {building} at {pos}"),
                    vec![pos],
                )
            }
            Plan::Research { level, cost } => {
                let spent = state.world.grid.spend(&cost);
                debug_assert!(spent, "research cost was checked while preparing");
                state.world.research_level = level;
                let multiplier = research_multiplier(level, &state.config.economy);
                (
                    ActionEffect::Researched {
                        level,
                        multiplier,
                        cost,
                    },
                    format!("Research reached level {level} (production x{multiplier:.2})"),
                    Vec::new(),
                )
            }
            Plan::Migrate { from, to, amount } => {
                if let Some(source) = state.world.grid.tile_mut(from) {
                    source.population -= amount;
                }
                if let Some(destination) = state.world.grid.tile_mut(to) {
                    destination.population += amount;
                }
                (
                    ActionEffect::Migrated { from, to, amount },
                    format!("{amount} inhabitants moved from {from} to {to}"),
                    vec![from, to],
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_is_indexed_by_kind() {
        for kind in ActionKind::ALL {
            assert_eq!(rule_for(kind).kind, kind);
        }
        assert!(!rule_for(ActionKind::Research).needs_target);
        assert!(rule_for(ActionKind::Build).required.contains(&"building_type"));
    }

    #[test]
    fn explore_reports_the_prepared_terrain() {
        let mut config = crate::config::GameConfig::default();
        config.map.width = 3;
        config.map.height = 3;
        let mut state = GameState::new(config).unwrap();
        let pos = TilePos::new(1, 1);
        let terrain = state.tile(pos).unwrap().terrain;

        let plan = prepare_explore(&state, &ActionRequest::explore(1, 1), Some(pos)).unwrap();
        let (effect, description, tiles) = plan.commit(&mut state);

        assert!(matches!(
            effect,
            ActionEffect::Explored { terrain: t, .. } if t == terrain
        ));
        assert!(description.contains(terrain.as_str()));
        assert_eq!(tiles, vec![pos]);
        assert!(state.tile(pos).unwrap().is_explored());
    }
}
