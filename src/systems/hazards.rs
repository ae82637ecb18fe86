use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::HazardConfig,
    engine::{System, SystemContext},
    events::{Event, EventKind},
    rng::{SystemRng, HAZARD_STREAM},
    spatial::TilePos,
    world::World,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Drought,
    Harvest,
    Discovery,
    Plague,
}

impl HazardKind {
    pub const ALL: [HazardKind; 4] = [
        HazardKind::Drought,
        HazardKind::Harvest,
        HazardKind::Discovery,
        HazardKind::Plague,
    ];
}

/// A hazard with a lasting effect, counted down once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHazard {
    pub kind: HazardKind,
    pub remaining_turns: u32,
}

/// Multiplier applied to food output while hazards are active
pub fn food_factor(hazards: &[ActiveHazard], config: &HazardConfig) -> f64 {
    if hazards.iter().any(|h| h.kind == HazardKind::Drought) {
        config.drought_food_factor
    } else {
        1.0
    }
}

/// Random world events. Runs last in the tick: lasting hazards count down
/// first, then at most one new hazard is rolled.
pub struct HazardSystem;

impl HazardSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HazardSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for HazardSystem {
    fn name(&self) -> &'static str {
        "hazards"
    }

    fn stream(&self) -> &'static str {
        HAZARD_STREAM
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        world: &mut World,
        rng: &mut SystemRng<'_>,
        events: &mut Vec<Event>,
    ) {
        for hazard in &mut world.hazards {
            hazard.remaining_turns = hazard.remaining_turns.saturating_sub(1);
        }
        world.hazards.retain(|hazard| hazard.remaining_turns > 0);

        let config = &ctx.config.hazards;
        if config.chance_per_turn <= 0.0 || !rng.gen_bool(config.chance_per_turn) {
            return;
        }

        let kind = HazardKind::ALL[rng.gen_range(0..HazardKind::ALL.len())];
        let mut abandoned = Vec::new();
        let event = match kind {
            HazardKind::Drought => {
                let duration = rng.gen_range(config.drought_min_turns..=config.drought_max_turns);
                world.hazards.push(ActiveHazard {
                    kind,
                    remaining_turns: duration,
                });
                Some(Event::new(
                    ctx.turn,
                    EventKind::Drought,
                    format!("Drought cuts food output for {duration} turn(s)"),
                ))
            }
            HazardKind::Harvest => {
                let candidates: Vec<TilePos> = world
                    .grid
                    .tiles()
                    .iter()
                    .filter(|tile| tile.is_explored() && tile.is_populated())
                    .map(|tile| tile.pos)
                    .collect();
                pick(rng, &candidates).and_then(|pos| {
                    let tile = world.grid.tile_mut(pos)?;
                    tile.stock.food += config.harvest_food;
                    Some(
                        Event::new(
                            ctx.turn,
                            EventKind::Harvest,
                            format!("Bountiful harvest adds {} food at {pos}", config.harvest_food),
                        )
                        .at(pos),
                    )
                })
            }
            HazardKind::Discovery => {
                let candidates: Vec<TilePos> = world.grid.explored().map(|tile| tile.pos).collect();
                pick(rng, &candidates).and_then(|pos| {
                    let tile = world.grid.tile_mut(pos)?;
                    tile.stock.ore += config.discovery_ore;
                    Some(
                        Event::new(
                            ctx.turn,
                            EventKind::Discovery,
                            format!("New ore vein adds {} ore at {pos}", config.discovery_ore),
                        )
                        .at(pos),
                    )
                })
            }
            HazardKind::Plague => {
                let mut hit = Vec::new();
                let mut lost = 0u64;
                for tile in world.grid.tiles_mut() {
                    if !tile.is_populated() {
                        continue;
                    }
                    let loss = ((f64::from(tile.population) * config.plague_rate).floor() as u32)
                        .min(tile.population);
                    if loss == 0 {
                        continue;
                    }
                    tile.population -= loss;
                    lost += u64::from(loss);
                    hit.push(tile.pos);
                    if tile.population == 0 {
                        abandoned.push(tile.pos);
                    }
                }
                Some(Event {
                    turn: ctx.turn,
                    kind: EventKind::Plague,
                    description: format!("Plague kills {lost} inhabitants"),
                    tiles: hit,
                })
            }
        };

        if let Some(event) = event {
            debug!(
                target: "x4sim::turn",
                turn = ctx.turn,
                hazard = ?kind,
                "hazard struck"
            );
            events.push(event);
        }
        events.extend(abandoned.into_iter().map(|pos| {
            Event::new(
                ctx.turn,
                EventKind::Depopulated,
                format!("Tile {pos} has been abandoned"),
            )
            .at(pos)
        }));
    }
}

fn pick(rng: &mut SystemRng<'_>, candidates: &[TilePos]) -> Option<TilePos> {
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.gen_range(0..candidates.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::rng::RngManager;
    use crate::world::{Exploration, Terrain, Tile, WorldGrid};

    fn settled_world() -> World {
        let grid = WorldGrid::from_fn(2, 2, |pos| {
            let mut tile = Tile::new(pos, Terrain::Plain, 100);
            tile.exploration = Exploration::Explored;
            tile.population = 40;
            tile
        });
        World::new(grid)
    }

    fn run_with(config: &GameConfig, world: &mut World, seed: u64) -> Vec<Event> {
        let mut rng = RngManager::new(seed);
        let ctx = SystemContext { turn: 2, config };
        let mut events = Vec::new();
        HazardSystem::new().run(&ctx, world, &mut rng.stream(HAZARD_STREAM), &mut events);
        events
    }

    #[test]
    fn zero_chance_never_strikes() {
        let config = GameConfig::default();
        let mut world = settled_world();
        for seed in 0..20 {
            assert!(run_with(&config, &mut world, seed).is_empty());
        }
        assert_eq!(world.grid.total_population(), 160);
    }

    #[test]
    fn certain_hazard_strikes_every_tick() {
        let mut config = GameConfig::default();
        config.hazards.chance_per_turn = 1.0;
        for seed in 0..20 {
            let mut world = settled_world();
            let events = run_with(&config, &mut world, seed);
            assert_eq!(events.len(), 1);
            match events[0].kind {
                EventKind::Drought => assert_eq!(world.hazards.len(), 1),
                EventKind::Plague => assert_eq!(world.grid.total_population(), 144),
                EventKind::Harvest => assert_eq!(world.grid.aggregate_stock().food, 50),
                EventKind::Discovery => assert_eq!(world.grid.aggregate_stock().ore, 30),
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn lasting_hazards_count_down() {
        let config = GameConfig::default();
        let mut world = settled_world();
        world.hazards.push(ActiveHazard {
            kind: HazardKind::Drought,
            remaining_turns: 2,
        });
        assert_eq!(food_factor(&world.hazards, &config.hazards), 0.5);

        run_with(&config, &mut world, 0);
        assert_eq!(world.hazards[0].remaining_turns, 1);

        run_with(&config, &mut world, 0);
        assert!(world.hazards.is_empty());
        assert_eq!(food_factor(&world.hazards, &config.hazards), 1.0);
    }

    #[test]
    fn plague_that_empties_tiles_abandons_them() {
        let mut config = GameConfig::default();
        config.hazards.chance_per_turn = 1.0;
        config.hazards.plague_rate = 1.0;

        let (world, events) = (0..64)
            .map(|seed| {
                let mut world = settled_world();
                let events = run_with(&config, &mut world, seed);
                (world, events)
            })
            .find(|(_, events)| events[0].kind == EventKind::Plague)
            .unwrap();

        assert_eq!(world.grid.total_population(), 0);
        let abandoned: Vec<_> = events[1..].iter().map(|e| (e.kind, e.tiles.clone())).collect();
        let expected: Vec<_> = world
            .grid
            .tiles()
            .iter()
            .map(|tile| (EventKind::Depopulated, vec![tile.pos]))
            .collect();
        assert_eq!(abandoned, expected);
    }
}
