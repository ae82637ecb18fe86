use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::spatial::{GridShape, TilePos};
use crate::systems::ActiveHazard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Plain,
    Forest,
    Mountain,
    Lake,
}

impl Terrain {
    pub const ALL: [Terrain; 4] = [
        Terrain::Plain,
        Terrain::Forest,
        Terrain::Mountain,
        Terrain::Lake,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Terrain::Plain => "plain",
            Terrain::Forest => "forest",
            Terrain::Mountain => "mountain",
            Terrain::Lake => "lake",
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Ore,
    Wood,
    Metal,
    Food,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Ore,
        ResourceKind::Wood,
        ResourceKind::Metal,
        ResourceKind::Food,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Ore => "ore",
            ResourceKind::Wood => "wood",
            ResourceKind::Metal => "metal",
            ResourceKind::Food => "food",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    Mine,
    Sawmill,
    Farm,
    Smelter,
    House,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 5] = [
        BuildingKind::Mine,
        BuildingKind::Sawmill,
        BuildingKind::Farm,
        BuildingKind::Smelter,
        BuildingKind::House,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildingKind::Mine => "mine",
            BuildingKind::Sawmill => "sawmill",
            BuildingKind::Farm => "farm",
            BuildingKind::Smelter => "smelter",
            BuildingKind::House => "house",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }

    /// Placement policy. Lakes accept only farms; mines and sawmills need their terrain.
    pub fn allowed_on(self, terrain: Terrain) -> bool {
        match (self, terrain) {
            (BuildingKind::Farm, _) => true,
            (_, Terrain::Lake) => false,
            (BuildingKind::Mine, terrain) => terrain == Terrain::Mountain,
            (BuildingKind::Sawmill, terrain) => terrain == Terrain::Forest,
            (BuildingKind::Smelter | BuildingKind::House, _) => true,
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantity per resource kind. Unsigned, so a stock can never go negative;
/// every subtraction goes through a covering check first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub ore: u64,
    pub wood: u64,
    pub metal: u64,
    pub food: u64,
}

impl Resources {
    pub fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Ore => self.ore,
            ResourceKind::Wood => self.wood,
            ResourceKind::Metal => self.metal,
            ResourceKind::Food => self.food,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceKind) -> &mut u64 {
        match kind {
            ResourceKind::Ore => &mut self.ore,
            ResourceKind::Wood => &mut self.wood,
            ResourceKind::Metal => &mut self.metal,
            ResourceKind::Food => &mut self.food,
        }
    }

    pub fn add(&mut self, other: &Resources) {
        for kind in ResourceKind::ALL {
            *self.get_mut(kind) += other.get(kind);
        }
    }

    pub fn covers(&self, cost: &Resources) -> bool {
        ResourceKind::ALL
            .into_iter()
            .all(|kind| self.get(kind) >= cost.get(kind))
    }

    pub fn total(&self) -> u64 {
        ResourceKind::ALL.into_iter().map(|kind| self.get(kind)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exploration {
    Unknown,
    Explored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub pos: TilePos,
    pub terrain: Terrain,
    pub stock: Resources,
    pub population: u32,
    pub capacity: u32,
    pub growth_modifier: f64,
    pub building: Option<BuildingKind>,
    pub exploration: Exploration,
    pub exploitation: u8,
}

impl Tile {
    pub fn new(pos: TilePos, terrain: Terrain, capacity: u32) -> Self {
        Self {
            pos,
            terrain,
            stock: Resources::default(),
            population: 0,
            capacity,
            growth_modifier: 0.0,
            building: None,
            exploration: Exploration::Unknown,
            exploitation: 0,
        }
    }

    pub fn is_explored(&self) -> bool {
        self.exploration == Exploration::Explored
    }

    pub fn is_populated(&self) -> bool {
        self.population > 0
    }

    pub fn has_building(&self, kind: BuildingKind) -> bool {
        self.building == Some(kind)
    }

    /// Remaining population capacity
    pub fn room(&self) -> u32 {
        self.capacity.saturating_sub(self.population)
    }
}

/// Fixed-size grid of tiles stored row-major. Every iteration over it is row-major,
/// which keeps tick-order effects reproducible.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldGrid {
    shape: GridShape,
    tiles: Vec<Tile>,
}

impl WorldGrid {
    /// Build a grid by asking `make` for each position in row-major order.
    pub fn from_fn(width: u32, height: u32, mut make: impl FnMut(TilePos) -> Tile) -> Self {
        let shape = GridShape::new(width, height);
        let tiles = (0..shape.tile_count())
            .filter_map(|index| shape.pos_of(index))
            .map(&mut make)
            .collect();
        Self { shape, tiles }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn width(&self) -> u32 {
        self.shape.width
    }

    pub fn height(&self) -> u32 {
        self.shape.height
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.shape.index_of(pos).map(|index| &self.tiles[index])
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.shape.index_of(pos).map(|index| &mut self.tiles[index])
    }

    pub fn neighbors(&self, pos: TilePos) -> Vec<TilePos> {
        self.shape.neighbors(pos)
    }

    pub fn touches_explored(&self, pos: TilePos) -> bool {
        self.neighbors(pos)
            .into_iter()
            .filter_map(|neighbor| self.tile(neighbor))
            .any(Tile::is_explored)
    }

    pub fn explored(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|tile| tile.is_explored())
    }

    pub fn total_population(&self) -> u64 {
        self.tiles.iter().map(|tile| u64::from(tile.population)).sum()
    }

    /// Theoretical population ceiling: capacity summed over explored tiles
    pub fn max_population(&self) -> u64 {
        self.explored().map(|tile| u64::from(tile.capacity)).sum()
    }

    /// The player's stock: everything held on explored tiles
    pub fn aggregate_stock(&self) -> Resources {
        let mut total = Resources::default();
        for tile in self.explored() {
            total.add(&tile.stock);
        }
        total
    }

    /// Deduct `cost` from explored tiles in row-major order. Returns false, without
    /// touching any tile, when the aggregate stock does not cover the cost.
    pub fn spend(&mut self, cost: &Resources) -> bool {
        if !self.aggregate_stock().covers(cost) {
            return false;
        }
        for kind in ResourceKind::ALL {
            let mut remaining = cost.get(kind);
            for tile in self.tiles.iter_mut().filter(|tile| tile.is_explored()) {
                if remaining == 0 {
                    break;
                }
                let held = tile.stock.get_mut(kind);
                let taken = remaining.min(*held);
                *held -= taken;
                remaining -= taken;
            }
        }
        true
    }

    /// Take up to `amount` of `kind`, first from `origin`, then from the other
    /// explored tiles in row-major order. Returns what was actually taken.
    pub fn draw(&mut self, origin: TilePos, kind: ResourceKind, amount: u64) -> u64 {
        let mut remaining = amount;
        let origin_index = self.shape.index_of(origin);
        if let Some(index) = origin_index {
            let held = self.tiles[index].stock.get_mut(kind);
            let taken = remaining.min(*held);
            *held -= taken;
            remaining -= taken;
        }
        for (index, tile) in self.tiles.iter_mut().enumerate() {
            if remaining == 0 {
                break;
            }
            if Some(index) == origin_index || !tile.is_explored() {
                continue;
            }
            let held = tile.stock.get_mut(kind);
            let taken = remaining.min(*held);
            *held -= taken;
            remaining -= taken;
        }
        amount - remaining
    }
}

/// Everything the economy systems mutate during a tick.
#[derive(Debug, Clone, Serialize)]
pub struct World {
    pub grid: WorldGrid,
    pub ledger: Ledger,
    pub research_level: u32,
    pub hazards: Vec<ActiveHazard>,
}

impl World {
    pub fn new(grid: WorldGrid) -> Self {
        let mut world = Self {
            grid,
            ledger: Ledger::default(),
            research_level: 0,
            hazards: Vec::new(),
        };
        world.refresh_ledger();
        world
    }

    pub fn refresh_ledger(&mut self) {
        self.ledger.refresh(&self.grid);
    }
}
