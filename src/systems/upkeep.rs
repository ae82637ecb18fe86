use rand::Rng;

use crate::{
    economy::{consumption_for, growth_for, starvation_loss},
    engine::{System, SystemContext},
    events::{Event, EventKind},
    rng::{SystemRng, GROWTH_STREAM},
    world::{ResourceKind, World},
};

/// Feeds every inhabited tile in row-major order. Unfed tiles shrink; fed tiles
/// grow only when the whole territory ate and food is left over.
pub struct UpkeepSystem;

impl UpkeepSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UpkeepSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for UpkeepSystem {
    fn name(&self) -> &'static str {
        "upkeep"
    }

    fn stream(&self) -> &'static str {
        GROWTH_STREAM
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        world: &mut World,
        rng: &mut SystemRng<'_>,
        events: &mut Vec<Event>,
    ) {
        let economy = &ctx.config.economy;
        let inhabited: Vec<_> = world
            .grid
            .tiles()
            .iter()
            .filter(|tile| tile.is_populated())
            .map(|tile| tile.pos)
            .collect();

        let mut fed = Vec::new();
        let mut starving = Vec::new();
        let mut lost = 0u64;
        for pos in inhabited {
            let Some(tile) = world.grid.tile(pos) else {
                continue;
            };
            let needed = consumption_for(tile, economy);
            let eaten = world.grid.draw(pos, ResourceKind::Food, needed);
            if eaten >= needed {
                fed.push(pos);
                continue;
            }

            let Some(tile) = world.grid.tile_mut(pos) else {
                continue;
            };
            let loss = starvation_loss(tile.population, economy);
            tile.population -= loss;
            lost += u64::from(loss);
            starving.push(pos);
            if tile.population == 0 {
                events.push(
                    Event::new(
                        ctx.turn,
                        EventKind::Depopulated,
                        format!("Tile {pos} has been abandoned"),
                    )
                    .at(pos),
                );
            }
        }

        // Growth only once every tile has eaten and nobody went hungry.
        let surplus = world.grid.aggregate_stock().food > economy.growth_food_reserve;
        if starving.is_empty() && surplus {
            let spread = economy.growth_variance;
            for pos in fed {
                let Some(tile) = world.grid.tile_mut(pos) else {
                    continue;
                };
                if tile.room() == 0 {
                    continue;
                }
                let variance = rng.gen_range((1.0 - spread)..=(1.0 + spread));
                let grown = growth_for(tile, variance, economy);
                tile.population += grown;
            }
        }

        if !starving.is_empty() {
            events.push(Event {
                turn: ctx.turn,
                kind: EventKind::Starvation,
                description: format!(
                    "Food ran short on {} tile(s); {lost} inhabitants lost",
                    starving.len()
                ),
                tiles: starving,
            });
        }
    }
}
