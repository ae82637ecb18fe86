//! Spatial model - row-major tile grid with 4-neighbour adjacency

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tile position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Grid dimensions and the index arithmetic shared by everything that walks tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub width: u32,
    pub height: u32,
}

impl GridShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Convert tile position to its row-major index
    pub fn index_of(&self, pos: TilePos) -> Option<usize> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Convert a row-major index back to a position
    pub fn pos_of(&self, index: usize) -> Option<TilePos> {
        if index < self.tile_count() {
            let width = self.width as usize;
            Some(TilePos::new((index % width) as u32, (index / width) as u32))
        } else {
            None
        }
    }

    /// Bounds check for caller-supplied (possibly negative) coordinates
    pub fn checked_pos(&self, x: i64, y: i64) -> Option<TilePos> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(TilePos::new(x as u32, y as u32))
    }

    /// Neighbouring tiles (4-connectivity), north, south, west, east
    pub fn neighbors(&self, pos: TilePos) -> Vec<TilePos> {
        let mut neighbors = Vec::with_capacity(4);

        if pos.y > 0 {
            neighbors.push(TilePos::new(pos.x, pos.y - 1));
        }
        if pos.y + 1 < self.height {
            neighbors.push(TilePos::new(pos.x, pos.y + 1));
        }
        if pos.x > 0 {
            neighbors.push(TilePos::new(pos.x - 1, pos.y));
        }
        if pos.x + 1 < self.width {
            neighbors.push(TilePos::new(pos.x + 1, pos.y));
        }

        neighbors
    }

    pub fn is_adjacent(&self, a: TilePos, b: TilePos) -> bool {
        self.distance(a, b) == 1
    }

    /// Manhattan distance between two positions
    pub fn distance(&self, a: TilePos, b: TilePos) -> u32 {
        a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_index_conversion() {
        let shape = GridShape::new(10, 5);

        let pos = TilePos::new(3, 2);
        let index = shape.index_of(pos).unwrap();
        assert_eq!(index, 23); // 2 * 10 + 3

        assert_eq!(shape.pos_of(index), Some(pos));
        assert_eq!(shape.index_of(TilePos::new(10, 0)), None);
        assert_eq!(shape.pos_of(50), None);
    }

    #[test]
    fn test_checked_pos_rejects_negative_and_overflow() {
        let shape = GridShape::new(3, 3);

        assert_eq!(shape.checked_pos(2, 2), Some(TilePos::new(2, 2)));
        assert_eq!(shape.checked_pos(-1, 0), None);
        assert_eq!(shape.checked_pos(0, 3), None);
    }

    #[test]
    fn test_neighbors() {
        let shape = GridShape::new(10, 5);

        // Corner tile
        let neighbors = shape.neighbors(TilePos::new(0, 0));
        assert_eq!(neighbors.len(), 2);

        // Middle tile
        let neighbors = shape.neighbors(TilePos::new(5, 2));
        assert_eq!(neighbors.len(), 4);

        let single = GridShape::new(1, 1);
        assert!(single.neighbors(TilePos::new(0, 0)).is_empty());
    }

    #[test]
    fn test_adjacency_is_four_connected() {
        let shape = GridShape::new(4, 4);

        assert!(shape.is_adjacent(TilePos::new(1, 1), TilePos::new(1, 2)));
        assert!(!shape.is_adjacent(TilePos::new(1, 1), TilePos::new(2, 2)));
        assert!(!shape.is_adjacent(TilePos::new(1, 1), TilePos::new(1, 1)));
    }
}
