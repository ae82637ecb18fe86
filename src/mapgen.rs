use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::{ConfigError, GameConfig};
use crate::world::{Exploration, Terrain, Tile, WorldGrid};

/// Roll terrain for every tile, then settle the starting tile.
pub fn generate<R: Rng + ?Sized>(
    config: &GameConfig,
    rng: &mut R,
) -> Result<WorldGrid, ConfigError> {
    let weights = Terrain::ALL.map(|terrain| config.map.terrain_weights.weight(terrain));
    let terrain_dist = WeightedIndex::new(weights)
        .map_err(|err| ConfigError::Validation(format!("terrain weights: {err}")))?;
    let capacity = config.economy.base_capacity;

    let mut grid = WorldGrid::from_fn(config.map.width, config.map.height, |pos| {
        let terrain = Terrain::ALL[terrain_dist.sample(&mut *rng)];
        Tile::new(pos, terrain, capacity)
    });

    let start = config.map.start_position();
    let tile = grid.tile_mut(start).ok_or_else(|| {
        ConfigError::Validation(format!("start tile {start} lies outside the map"))
    })?;
    tile.terrain = Terrain::Plain;
    tile.exploration = Exploration::Explored;
    tile.population = config.start.population.min(tile.capacity);
    tile.stock = config.start.resources;

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngManager, MAP_STREAM};
    use crate::spatial::TilePos;

    #[test]
    fn start_tile_is_settled_plain() {
        let config = GameConfig::default();
        let mut rng = RngManager::new(config.seed);
        let grid = generate(&config, &mut rng.stream(MAP_STREAM)).unwrap();

        let start = grid.tile(TilePos::new(0, 5)).unwrap();
        assert_eq!(start.terrain, Terrain::Plain);
        assert!(start.is_explored());
        assert_eq!(start.population, 20);
        assert_eq!(start.stock.food, 100);

        assert_eq!(grid.explored().count(), 1);
        assert_eq!(grid.aggregate_stock(), config.start.resources);
    }

    #[test]
    fn same_seed_same_terrain() {
        let config = GameConfig::default();
        let terrain = |seed: u64| -> Vec<Terrain> {
            let mut rng = RngManager::new(seed);
            let grid = generate(&config, &mut rng.stream(MAP_STREAM)).unwrap();
            grid.tiles().iter().map(|tile| tile.terrain).collect()
        };

        assert_eq!(terrain(9), terrain(9));
    }

    #[test]
    fn single_terrain_weight_is_respected() {
        let mut config = GameConfig::default();
        config.map.terrain_weights.plain = 0.0;
        config.map.terrain_weights.forest = 0.0;
        config.map.terrain_weights.lake = 0.0;
        let mut rng = RngManager::new(1);
        let grid = generate(&config, &mut rng.stream(MAP_STREAM)).unwrap();

        let start = config.map.start_position();
        assert!(grid
            .tiles()
            .iter()
            .filter(|tile| tile.pos != start)
            .all(|tile| tile.terrain == Terrain::Mountain));
    }
}
