use crate::{
    economy::{production_for, research_multiplier, Modifiers},
    engine::{System, SystemContext},
    events::Event,
    rng::SystemRng,
    systems::food_factor,
    world::{Resources, World},
};

/// Adds every tile's yield to its own stock.
pub struct ProductionSystem;

impl ProductionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProductionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ProductionSystem {
    fn name(&self) -> &'static str {
        "production"
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
        _events: &mut Vec<Event>,
    ) {
        let modifiers = Modifiers {
            research: research_multiplier(world.research_level, &ctx.config.economy),
            food: food_factor(&world.hazards, &ctx.config.hazards),
        };
        let mut produced = Resources::default();
        for tile in world.grid.tiles_mut() {
            let yields = production_for(tile, &modifiers, ctx.config);
            tile.stock.add(&yields);
            produced.add(&yields);
        }
        world.ledger.record_production(&produced);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::rng::RngManager;
    use crate::spatial::TilePos;
    use crate::world::{Exploration, Terrain, Tile, WorldGrid};

    #[test]
    fn production_lands_on_producing_tile() {
        let config = GameConfig::default();
        let grid = WorldGrid::from_fn(2, 1, |pos| {
            let mut tile = Tile::new(pos, Terrain::Forest, 100);
            tile.exploration = Exploration::Explored;
            if pos.x == 1 {
                tile.population = 10;
            }
            tile
        });
        let mut world = World::new(grid);
        let mut rng = RngManager::new(0);
        let ctx = SystemContext {
            turn: 1,
            config: &config,
        };

        ProductionSystem::new().run(&ctx, &mut world, &mut rng.stream("production"), &mut Vec::new());

        let idle = world.grid.tile(TilePos::new(0, 0)).unwrap();
        assert!(idle.stock.is_empty());
        let worked = world.grid.tile(TilePos::new(1, 0)).unwrap();
        // 8 * 1.1 wood, 2 * 1.1 food
        assert_eq!(worked.stock.wood, 8);
        assert_eq!(worked.stock.food, 2);
        assert_eq!(world.ledger.cumulative_production.total(), 10);
    }
}
