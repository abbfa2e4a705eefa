//! Block-grid coordinates and the six axis directions a block can face.

use serde::{Deserialize, Serialize};

/// An integer cell position on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell one step away in `dir`.
    pub fn step(&self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

/// The six base directions of a block grid.
///
/// Uses the host's convention: forward is -Z, up is +Y, right is +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All six directions.
    pub fn all() -> [Direction; 6] {
        [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ]
    }

    /// Unit offset for this direction.
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Direction::Forward => (0, 0, -1),
            Direction::Backward => (0, 0, 1),
            Direction::Left => (-1, 0, 0),
            Direction::Right => (1, 0, 0),
            Direction::Up => (0, 1, 0),
            Direction::Down => (0, -1, 0),
        }
    }

    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_cell() {
        let p = GridPosition::new(1, 2, 3);
        assert_eq!(p.step(Direction::Forward), GridPosition::new(1, 2, 2));
        assert_eq!(p.step(Direction::Right), GridPosition::new(2, 2, 3));
        assert_eq!(p.step(Direction::Down), GridPosition::new(1, 1, 3));
    }

    #[test]
    fn flipped_is_an_involution() {
        for dir in Direction::all() {
            assert_ne!(dir, dir.flipped());
            assert_eq!(dir, dir.flipped().flipped());
        }
    }

    #[test]
    fn opposite_offsets_cancel() {
        for dir in Direction::all() {
            let p = GridPosition::new(5, -4, 9);
            assert_eq!(p.step(dir).step(dir.flipped()), p);
            assert_eq!(p.manhattan_distance(&p.step(dir)), 1);
        }
    }
}
