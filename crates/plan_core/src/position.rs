//! Grid coordinates and spatial utilities.
//!
//! Units move in 8 directions, so every distance in the planner is the
//! Chebyshev distance. All math is integer-only.

use serde::{Deserialize, Serialize};

/// Direction offsets for 8-directional movement, in enumeration order.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// A cell on the map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: `max(|dx|, |dy|)`.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }

    /// True when `other` is this cell or one of its 8 neighbours.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev_distance(other) <= 1
    }

    /// Lazily enumerate the 8 surrounding cells.
    ///
    /// The iterator is finite and can be restarted by calling this again.
    /// Cells may lie outside the map; filter with [`MapExtents::contains`].
    /// Offsets that would leave the `i32` range are skipped.
    pub fn neighbors(self) -> impl Iterator<Item = Position> + Clone {
        DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
            Some(Position::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
        })
    }

    /// The 8-way direction that points from this cell toward `target`.
    ///
    /// Returns `None` when both cells are the same.
    #[must_use]
    pub fn direction_to(self, target: Self) -> Option<Direction> {
        let dx = (target.x - self.x).signum();
        let dy = (target.y - self.y).signum();
        Direction::from_offset(dx, dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass direction used by primitive gather/deposit commands.
///
/// `y` grows southward, matching the host's screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +x
    East,
    /// +x, +y
    Southeast,
    /// +y
    South,
    /// -x, +y
    Southwest,
    /// -x
    West,
    /// -x, -y
    Northwest,
    /// -y
    North,
    /// +x, -y
    Northeast,
}

impl Direction {
    /// Map a unit offset (each component in -1..=1) to a direction.
    #[must_use]
    pub const fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (1, 0) => Some(Self::East),
            (1, 1) => Some(Self::Southeast),
            (0, 1) => Some(Self::South),
            (-1, 1) => Some(Self::Southwest),
            (-1, 0) => Some(Self::West),
            (-1, -1) => Some(Self::Northwest),
            (0, -1) => Some(Self::North),
            (1, -1) => Some(Self::Northeast),
            _ => None,
        }
    }

    /// The unit offset for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::East => (1, 0),
            Self::Southeast => (1, 1),
            Self::South => (0, 1),
            Self::Southwest => (-1, 1),
            Self::West => (-1, 0),
            Self::Northwest => (-1, -1),
            Self::North => (0, -1),
            Self::Northeast => (1, -1),
        }
    }
}

/// Map size in cells. Valid cells are `0..width` by `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapExtents {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl MapExtents {
    /// Create new map extents.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if a position lies inside the map.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// The in-bounds neighbour of `target` closest to `from`.
    ///
    /// Ties resolve to the first cell in enumeration order, so the result is
    /// deterministic. Returns `None` if `target` has no in-bounds neighbour.
    #[must_use]
    pub fn closest_neighbor(&self, target: Position, from: Position) -> Option<Position> {
        let mut best: Option<(u32, Position)> = None;
        for cell in target.neighbors().filter(|c| self.contains(*c)) {
            let dist = cell.chebyshev_distance(from);
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, cell));
            }
        }
        best.map(|(_, cell)| cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance() {
        assert_eq!(Position::new(0, 0).chebyshev_distance(Position::new(5, 5)), 5);
        assert_eq!(Position::new(0, 0).chebyshev_distance(Position::new(3, 7)), 7);
        assert_eq!(Position::new(-2, 4).chebyshev_distance(Position::new(1, 4)), 3);
        assert_eq!(Position::new(5, 5).chebyshev_distance(Position::new(5, 5)), 0);
    }

    #[test]
    fn test_adjacency() {
        let origin = Position::new(3, 3);
        assert!(origin.is_adjacent(origin));
        assert!(origin.is_adjacent(Position::new(4, 4)));
        assert!(origin.is_adjacent(Position::new(2, 3)));
        assert!(!origin.is_adjacent(Position::new(5, 3)));
    }

    #[test]
    fn test_neighbors_are_restartable() {
        let pos = Position::new(1, 1);
        let first: Vec<_> = pos.neighbors().collect();
        let second: Vec<_> = pos.neighbors().collect();

        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
        assert!(first.iter().all(|n| n.chebyshev_distance(pos) == 1));
        assert!(!first.contains(&pos));
    }

    #[test]
    fn test_neighbors_at_coordinate_limit() {
        let edge = Position::new(i32::MAX, 0);
        let cells: Vec<_> = edge.neighbors().collect();

        // E, SE and NE would leave the i32 range
        assert_eq!(cells.len(), 5);
        assert!(cells.iter().all(|c| c.chebyshev_distance(edge) == 1));

        let extents = MapExtents::new(u32::MAX, 4);
        let from = Position::new(i32::MAX - 5, 0);
        assert_eq!(
            extents.closest_neighbor(edge, from),
            Some(Position::new(i32::MAX - 1, 1))
        );
    }

    #[test]
    fn test_direction_to() {
        let origin = Position::new(2, 2);
        assert_eq!(origin.direction_to(Position::new(3, 2)), Some(Direction::East));
        assert_eq!(origin.direction_to(Position::new(1, 1)), Some(Direction::Northwest));
        assert_eq!(origin.direction_to(Position::new(2, 9)), Some(Direction::South));
        assert_eq!(origin.direction_to(origin), None);
    }

    #[test]
    fn test_direction_offset_roundtrip() {
        for pos in Position::new(0, 0).neighbors() {
            let dir = Position::new(0, 0).direction_to(pos).unwrap();
            assert_eq!(dir.offset(), (pos.x, pos.y));
        }
    }

    #[test]
    fn test_extents_contains() {
        let map = MapExtents::new(4, 3);
        assert!(map.contains(Position::new(0, 0)));
        assert!(map.contains(Position::new(3, 2)));
        assert!(!map.contains(Position::new(4, 0)));
        assert!(!map.contains(Position::new(0, 3)));
        assert!(!map.contains(Position::new(-1, 0)));
    }

    #[test]
    fn test_closest_neighbor() {
        let map = MapExtents::new(10, 10);

        // (2, 1) and (2, 0) are both 2 away; southwest comes before west
        let cell = map.closest_neighbor(Position::new(3, 0), Position::new(0, 0)).unwrap();
        assert_eq!(cell, Position::new(2, 1));
        assert!(cell.is_adjacent(Position::new(3, 0)));
    }

    #[test]
    fn test_closest_neighbor_none_on_single_cell_map() {
        let map = MapExtents::new(1, 1);
        assert_eq!(map.closest_neighbor(Position::new(0, 0), Position::new(0, 0)), None);
    }
}
