//! Battle grid coordinates.
//!
//! The board is a fixed rectangle of 5-foot squares. Distances use the
//! Chebyshev metric, so a diagonal step costs the same as an orthogonal one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feet covered by one grid square.
pub const FEET_PER_SQUARE: i32 = 5;

/// A square on the battle grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance in squares.
    pub fn distance_to(&self, other: GridPosition) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// True when the two squares touch, diagonals included.
    pub fn is_adjacent(&self, other: GridPosition) -> bool {
        self.distance_to(other) <= 1
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Where a character currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    Deployed(GridPosition),
    #[default]
    NotDeployed,
}

impl Placement {
    pub fn position(&self) -> Option<GridPosition> {
        match self {
            Placement::Deployed(pos) => Some(*pos),
            Placement::NotDeployed => None,
        }
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self, Placement::Deployed(_))
    }
}

impl From<GridPosition> for Placement {
    fn from(pos: GridPosition) -> Self {
        Placement::Deployed(pos)
    }
}

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            width: 16,
            height: 8,
        }
    }
}

impl GridBounds {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    /// All in-bounds squares within `radius` of `center`, x-major then y.
    pub fn squares_within(&self, center: GridPosition, radius: i32) -> Vec<GridPosition> {
        let mut squares = Vec::new();
        for x in (center.x - radius)..=(center.x + radius) {
            for y in (center.y - radius)..=(center.y + radius) {
                let pos = GridPosition::new(x, y);
                if self.contains(pos) {
                    squares.push(pos);
                }
            }
        }
        squares
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chebyshev_distance() {
        let a = GridPosition::new(2, 2);
        assert_eq!(a.distance_to(GridPosition::new(2, 2)), 0);
        assert_eq!(a.distance_to(GridPosition::new(3, 3)), 1);
        assert_eq!(a.distance_to(GridPosition::new(7, 4)), 5);
        assert_eq!(a.distance_to(GridPosition::new(0, 6)), 4);
    }

    #[test]
    fn test_adjacency_includes_diagonals() {
        let a = GridPosition::new(5, 5);
        assert!(a.is_adjacent(GridPosition::new(6, 6)));
        assert!(a.is_adjacent(GridPosition::new(4, 5)));
        assert!(!a.is_adjacent(GridPosition::new(7, 5)));
    }

    #[test]
    fn test_bounds() {
        let bounds = GridBounds::default();
        assert!(bounds.contains(GridPosition::new(0, 0)));
        assert!(bounds.contains(GridPosition::new(15, 7)));
        assert!(!bounds.contains(GridPosition::new(16, 0)));
        assert!(!bounds.contains(GridPosition::new(0, -1)));
    }

    #[test]
    fn test_squares_within_clips_to_board() {
        let bounds = GridBounds::default();
        let squares = bounds.squares_within(GridPosition::new(0, 0), 1);
        assert_eq!(squares.len(), 4);
        assert_eq!(squares[0], GridPosition::new(0, 0));
        assert_eq!(squares[3], GridPosition::new(1, 1));
    }

    #[test]
    fn test_placement() {
        assert_eq!(Placement::default(), Placement::NotDeployed);
        assert_eq!(Placement::NotDeployed.position(), None);
        let placed: Placement = GridPosition::new(1, 3).into();
        assert_eq!(placed.position(), Some(GridPosition::new(1, 3)));
    }

    proptest! {
        #[test]
        fn distance_is_symmetric_and_max_of_axes(
            ax in -20i32..20, ay in -20i32..20, bx in -20i32..20, by in -20i32..20
        ) {
            let a = GridPosition::new(ax, ay);
            let b = GridPosition::new(bx, by);
            prop_assert_eq!(a.distance_to(b), b.distance_to(a));
            prop_assert_eq!(a.distance_to(b), (ax - bx).abs().max((ay - by).abs()));
        }
    }
}
