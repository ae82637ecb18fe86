//! Observation projector: read-only views of a game for clients

use std::collections::BTreeMap;

use serde::Serialize;

use crate::actions::{ActionKind, RULES};
use crate::economy::{consumption_for, production_for, research_multiplier, Modifiers};
use crate::events::Event;
use crate::game::{GameState, GameStatus};
use crate::ledger::ActionCounts;
use crate::scoring::{score, ScoreBreakdown};
use crate::spatial::TilePos;
use crate::systems::{food_factor, ActiveHazard};
use crate::world::{BuildingKind, Resources, Terrain, Tile};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Observation {
    Full(FullObservation),
    Simple(SimpleObservation),
}

impl Observation {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullObservation {
    pub game: GameInfo,
    pub resources: ResourceView,
    pub research: ResearchView,
    pub hazards: Vec<ActiveHazard>,
    pub map: MapView,
    pub frontier: Frontier,
    pub available_actions: Vec<ActionOption>,
    pub objectives: Objectives,
    pub events: Vec<Event>,
    pub score: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameInfo {
    pub name: String,
    pub turn: u32,
    pub max_turns: u32,
    pub turns_remaining: u32,
    pub action_points: u32,
    pub max_action_points: u32,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceView {
    pub stock: Resources,
    /// Expected yield of the next tick, before smelting
    pub production_per_turn: Resources,
    pub upkeep_per_turn: u64,
    pub net_food: i64,
    pub cumulative_production: Resources,
    pub action_points_spent: u64,
    pub action_counts: ActionCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchView {
    pub level: u32,
    pub max_level: u32,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub width: u32,
    pub height: u32,
    pub explored_tiles: usize,
    pub populated_tiles: usize,
    pub total_population: u64,
    pub max_population: u64,
    pub tiles: Vec<TileView>,
}

/// Unknown tiles expose only their position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileView {
    pub x: u32,
    pub y: u32,
    pub explored: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub detail: Option<TileDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileDetail {
    pub terrain: Terrain,
    pub population: u32,
    pub capacity: u32,
    pub building: Option<BuildingKind>,
    pub exploitation: u8,
    pub stock: Resources,
    pub production: Resources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frontier {
    /// Unknown tiles next to explored territory
    pub explorable: Vec<TilePos>,
    /// Explored tiles nobody lives on yet
    pub expandable: Vec<TilePos>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOption {
    pub action: ActionKind,
    pub ap_cost: u32,
    pub affordable: bool,
    pub required: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_cost: Option<Resources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_costs: Option<BTreeMap<BuildingKind, Resources>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objectives {
    pub metal_target: u64,
    pub metal: u64,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleObservation {
    pub turn: u32,
    pub max_turns: u32,
    pub action_points: u32,
    pub status: GameStatus,
    pub stock: Resources,
    pub explored_tiles: usize,
    pub populated_tiles: usize,
    pub population: u64,
    /// Explored tiles per terrain
    pub terrain: BTreeMap<Terrain, usize>,
    pub buildings: BTreeMap<BuildingKind, usize>,
    pub recent_events: Vec<Event>,
}

pub fn observe(state: &GameState, simple: bool) -> Observation {
    if simple {
        Observation::Simple(simple_view(state))
    } else {
        Observation::Full(full_view(state))
    }
}

fn modifiers(state: &GameState) -> Modifiers {
    Modifiers {
        research: research_multiplier(state.world.research_level, &state.config.economy),
        food: food_factor(&state.world.hazards, &state.config.hazards),
    }
}

fn tile_view(tile: &Tile, modifiers: &Modifiers, state: &GameState) -> TileView {
    let detail = tile.is_explored().then(|| TileDetail {
        terrain: tile.terrain,
        population: tile.population,
        capacity: tile.capacity,
        building: tile.building,
        exploitation: tile.exploitation,
        stock: tile.stock,
        production: production_for(tile, modifiers, &state.config),
    });
    TileView {
        x: tile.pos.x,
        y: tile.pos.y,
        explored: tile.is_explored(),
        detail,
    }
}

fn frontier(state: &GameState) -> Frontier {
    let grid = &state.world.grid;
    let limit = state.config.observation.frontier_limit;
    let explorable = grid
        .tiles()
        .iter()
        .filter(|tile| !tile.is_explored() && grid.touches_explored(tile.pos))
        .map(|tile| tile.pos)
        .take(limit)
        .collect();
    let expandable = grid
        .explored()
        .filter(|tile| !tile.is_populated())
        .map(|tile| tile.pos)
        .take(limit)
        .collect();
    Frontier {
        explorable,
        expandable,
    }
}

fn action_catalogue(state: &GameState) -> Vec<ActionOption> {
    if state.is_terminal() {
        return Vec::new();
    }
    let costs = &state.config.costs;
    RULES
        .iter()
        .map(|rule| {
            let resource_cost = match rule.kind {
                ActionKind::Expand => Some(costs.expand),
                ActionKind::Research => Some(costs.research),
                _ => None,
            };
            let building_costs = (rule.kind == ActionKind::Build).then(|| {
                BuildingKind::ALL
                    .into_iter()
                    .map(|kind| (kind, *costs.buildings.cost(kind)))
                    .collect()
            });
            ActionOption {
                action: rule.kind,
                ap_cost: rule.ap_cost,
                affordable: state.clock.action_points >= rule.ap_cost,
                required: rule.required.to_vec(),
                optional: rule.optional.to_vec(),
                resource_cost,
                building_costs,
            }
        })
        .collect()
}

fn full_view(state: &GameState) -> FullObservation {
    let grid = &state.world.grid;
    let ledger = &state.world.ledger;
    let config = &state.config;
    let modifiers = modifiers(state);

    let mut production_per_turn = Resources::default();
    let mut upkeep_per_turn = 0;
    for tile in grid.tiles() {
        production_per_turn.add(&production_for(tile, &modifiers, config));
        upkeep_per_turn += consumption_for(tile, &config.economy);
    }
    let net_food = production_per_turn.food as i64 - upkeep_per_turn as i64;

    let metal_target = config.victory.metal_target;
    FullObservation {
        game: GameInfo {
            name: config.name.clone(),
            turn: state.clock.turn,
            max_turns: state.clock.max_turns,
            turns_remaining: state
                .clock
                .max_turns
                .saturating_add(1)
                .saturating_sub(state.clock.turn),
            action_points: state.clock.action_points,
            max_action_points: state.clock.max_action_points,
            status: state.status,
        },
        resources: ResourceView {
            stock: ledger.stock,
            production_per_turn,
            upkeep_per_turn,
            net_food,
            cumulative_production: ledger.cumulative_production,
            action_points_spent: ledger.action_points_spent,
            action_counts: ledger.action_counts,
        },
        research: ResearchView {
            level: state.world.research_level,
            max_level: config.economy.max_research_level,
            multiplier: modifiers.research,
        },
        hazards: state.world.hazards.clone(),
        map: MapView {
            width: grid.width(),
            height: grid.height(),
            explored_tiles: grid.explored().count(),
            populated_tiles: grid.tiles().iter().filter(|t| t.is_populated()).count(),
            total_population: ledger.total_population,
            max_population: grid.max_population(),
            tiles: grid
                .tiles()
                .iter()
                .map(|tile| tile_view(tile, &modifiers, state))
                .collect(),
        },
        frontier: frontier(state),
        available_actions: action_catalogue(state),
        objectives: Objectives {
            metal_target,
            metal: ledger.stock.metal,
            progress: (ledger.stock.metal as f64 / metal_target as f64).min(1.0),
        },
        events: state.events.all().to_vec(),
        score: score(state),
    }
}

fn simple_view(state: &GameState) -> SimpleObservation {
    let grid = &state.world.grid;
    let mut terrain = BTreeMap::new();
    let mut buildings = BTreeMap::new();
    for tile in grid.explored() {
        *terrain.entry(tile.terrain).or_insert(0) += 1;
        if let Some(building) = tile.building {
            *buildings.entry(building).or_insert(0) += 1;
        }
    }
    SimpleObservation {
        turn: state.clock.turn,
        max_turns: state.clock.max_turns,
        action_points: state.clock.action_points,
        status: state.status,
        stock: state.world.ledger.stock,
        explored_tiles: grid.explored().count(),
        populated_tiles: grid.tiles().iter().filter(|t| t.is_populated()).count(),
        population: state.world.ledger.total_population,
        terrain,
        buildings,
        recent_events: state
            .events
            .tail(state.config.observation.recent_events)
            .to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionRequest;
    use crate::config::GameConfig;

    fn small_game() -> GameState {
        let mut config = GameConfig::default();
        config.map.width = 3;
        config.map.height = 3;
        GameState::new(config).unwrap()
    }

    #[test]
    fn unknown_tiles_hide_detail() {
        let state = small_game();
        let Observation::Full(full) = observe(&state, false) else {
            panic!("expected full observation");
        };

        assert_eq!(full.map.tiles.len(), 9);
        assert_eq!(full.map.explored_tiles, 1);
        let hidden = &full.map.tiles[0];
        assert!(!hidden.explored);
        assert!(hidden.detail.is_none());

        let json = serde_json::to_value(hidden).unwrap();
        assert_eq!(json.as_object().map(|o| o.len()), Some(3));

        let start = &full.map.tiles[3];
        assert_eq!(start.detail.as_ref().map(|d| d.population), Some(20));
    }

    #[test]
    fn full_view_lists_catalogue_and_frontier() {
        let state = small_game();
        let Observation::Full(full) = observe(&state, false) else {
            panic!("expected full observation");
        };

        assert_eq!(full.available_actions.len(), 6);
        let build = full
            .available_actions
            .iter()
            .find(|option| option.action == ActionKind::Build)
            .unwrap();
        assert_eq!(build.building_costs.as_ref().map(|c| c.len()), Some(5));
        assert_eq!(
            full.frontier.explorable,
            vec![TilePos::new(0, 0), TilePos::new(1, 1), TilePos::new(0, 2)]
        );
        assert!(full.frontier.expandable.is_empty());
        assert_eq!(full.resources.upkeep_per_turn, 5);
        assert_eq!(full.resources.net_food, 2);
    }

    #[test]
    fn simple_view_keeps_recent_events() {
        let mut state = small_game();
        for _ in 0..7 {
            state.advance_turn().unwrap();
        }
        state.apply_action(&ActionRequest::explore(1, 1)).unwrap();

        let Observation::Simple(simple) = observe(&state, true) else {
            panic!("expected simple observation");
        };
        assert_eq!(simple.turn, 8);
        assert!(simple.recent_events.len() <= 5);
        assert_eq!(simple.explored_tiles, 2);
        assert_eq!(simple.terrain.values().sum::<usize>(), 2);
        assert!(simple.terrain.contains_key(&Terrain::Plain));

        let yaml = Observation::Simple(simple).to_yaml().unwrap();
        assert!(yaml.contains("mode: simple"));
    }

    #[test]
    fn observing_does_not_mutate() {
        let state = small_game();
        let before = serde_json::to_string(&state).unwrap();
        let _ = observe(&state, false);
        let _ = observe(&state, true);
        assert_eq!(serde_json::to_string(&state).unwrap(), before);
    }

    #[test]
    fn unbounded_turn_limit_still_observes() {
        let mut config = GameConfig::default();
        config.turns.max_turns = u32::MAX;
        let state = GameState::new(config).unwrap();

        let Observation::Full(full) = observe(&state, false) else {
            panic!("expected full observation");
        };
        assert_eq!(full.game.turns_remaining, u32::MAX - 1);
    }
}
