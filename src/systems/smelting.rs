use crate::{
    economy::smelt,
    engine::{System, SystemContext},
    events::Event,
    rng::SystemRng,
    world::{BuildingKind, ResourceKind, Resources, World},
};

/// Staffed smelters turn ore into metal, drawing ore from their own tile first.
pub struct SmeltingSystem;

impl SmeltingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SmeltingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SmeltingSystem {
    fn name(&self) -> &'static str {
        "smelting"
    }

    fn run(
        &mut self,
        ctx: &SystemContext<'_>,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
        _events: &mut Vec<Event>,
    ) {
        let smelters: Vec<_> = world
            .grid
            .explored()
            .filter(|tile| tile.has_building(BuildingKind::Smelter) && tile.is_populated())
            .map(|tile| tile.pos)
            .collect();

        let mut produced = Resources::default();
        for pos in smelters {
            let available = world.grid.aggregate_stock().ore;
            let (ore_used, metal) = smelt(available, &ctx.config.buildings);
            if metal == 0 {
                continue;
            }
            world.grid.draw(pos, ResourceKind::Ore, ore_used);
            if let Some(tile) = world.grid.tile_mut(pos) {
                tile.stock.metal += metal;
                produced.metal += metal;
            }
        }
        world.ledger.record_production(&produced);
    }
}
