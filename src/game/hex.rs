//! Hexagonal coordinate system using offset coordinates (odd-r).
//!
//! Based on Red Blob Games' guide:
//! https://www.redblobgames.com/grids/hexagons/
//!
//! Rows are stacked top to bottom and odd rows are shifted right by half a
//! bubble. Positions live in "shooting space": pixels measured from the
//! top-left corner of the play area, y growing downward. Converting to Bevy's
//! y-up world happens in [`PlayArea::to_world`] and nowhere else.

use bevy::prelude::*;
use serde::Serialize;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<GridCoord>();
}

/// Bubble diameter in pixels.
pub const BUBBLE_SIZE: f32 = 40.0;

/// Vertical distance between row centers as a fraction of the diameter.
///
/// Touching circles in a hex lattice stack `sqrt(3)/2` apart; the grid uses
/// the rounded value so rows slightly overlap.
pub const ROW_PACKING: f32 = 0.86;

/// Discrete grid address: row 0 is the ceiling, rows grow downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize)]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Odd rows are the ones shifted right by half a bubble.
    #[inline]
    pub const fn is_odd_row(&self) -> bool {
        self.row.rem_euclid(2) == 1
    }

    /// Get all 6 neighboring coordinates.
    ///
    /// Diagonal neighbors depend on row parity: even rows reach `col - 1` and
    /// `col` in the rows above and below, odd rows reach `col` and `col + 1`.
    pub fn neighbors(&self) -> [GridCoord; 6] {
        let (row, col) = (self.row, self.col);

        if self.is_odd_row() {
            [
                GridCoord::new(row - 1, col),     // Northwest
                GridCoord::new(row - 1, col + 1), // Northeast
                GridCoord::new(row, col - 1),     // West
                GridCoord::new(row, col + 1),     // East
                GridCoord::new(row + 1, col),     // Southwest
                GridCoord::new(row + 1, col + 1), // Southeast
            ]
        } else {
            [
                GridCoord::new(row - 1, col - 1), // Northwest
                GridCoord::new(row - 1, col),     // Northeast
                GridCoord::new(row, col - 1),     // West
                GridCoord::new(row, col + 1),     // East
                GridCoord::new(row + 1, col - 1), // Southwest
                GridCoord::new(row + 1, col),     // Southeast
            ]
        }
    }

    /// Convert a grid address to its pixel position (top-left of the bubble's
    /// bounding box, in shooting space).
    pub fn to_position(&self, size: f32) -> Vec2 {
        let row_offset = if self.is_odd_row() { size / 2.0 } else { 0.0 };
        Vec2::new(
            self.col as f32 * size + row_offset,
            self.row as f32 * size * ROW_PACKING,
        )
    }

    /// Convert a pixel position to the nearest grid address.
    ///
    /// The row is found first, then the column using that row's shift. The
    /// result is not range-checked: positions near or past the walls can round
    /// to negative or over-range columns.
    pub fn from_position(pos: Vec2, size: f32) -> Self {
        let row = (pos.y / (size * ROW_PACKING)).round() as i32;
        let row_offset = if row.rem_euclid(2) == 1 { size / 2.0 } else { 0.0 };
        let col = ((pos.x - row_offset) / size).round() as i32;

        Self { row, col }
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The rectangle the projectile travels in, derived from the grid size.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
    pub bubble_size: f32,
}

impl PlayArea {
    /// Room below the grid for the shooter.
    pub const SHOOTER_MARGIN: f32 = 200.0;

    /// Distance of the launch point above the bottom edge.
    pub const LAUNCH_HEIGHT: f32 = 150.0;

    pub fn new(rows: i32, cols: i32, bubble_size: f32) -> Self {
        Self {
            width: cols as f32 * bubble_size,
            height: rows as f32 * bubble_size + Self::SHOOTER_MARGIN,
            bubble_size,
        }
    }

    /// Largest x a projectile's left edge may reach before bouncing.
    pub fn max_x(&self) -> f32 {
        self.width - self.bubble_size
    }

    /// Where every shot starts: horizontally centered, above the bottom edge.
    pub fn launch_position(&self) -> Vec2 {
        Vec2::new(
            self.width / 2.0 - self.bubble_size / 2.0,
            self.height - Self::LAUNCH_HEIGHT,
        )
    }

    /// Map a shooting-space position (top-left of a bubble) to the world-space
    /// center of that bubble, with the play area centered on the origin.
    pub fn to_world(&self, pos: Vec2) -> Vec2 {
        let half = self.bubble_size / 2.0;
        Vec2::new(
            pos.x + half - self.width / 2.0,
            self.height / 2.0 - pos.y - half,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_count() {
        assert_eq!(GridCoord::new(0, 0).neighbors().len(), 6);
    }

    #[test]
    fn test_even_row_neighbors() {
        let n = GridCoord::new(2, 4).neighbors();
        assert!(n.contains(&GridCoord::new(1, 3)));
        assert!(n.contains(&GridCoord::new(1, 4)));
        assert!(n.contains(&GridCoord::new(3, 3)));
        assert!(n.contains(&GridCoord::new(3, 4)));
        assert!(!n.contains(&GridCoord::new(1, 5)));
    }

    #[test]
    fn test_odd_row_neighbors() {
        let n = GridCoord::new(3, 4).neighbors();
        assert!(n.contains(&GridCoord::new(2, 4)));
        assert!(n.contains(&GridCoord::new(2, 5)));
        assert!(n.contains(&GridCoord::new(4, 4)));
        assert!(n.contains(&GridCoord::new(4, 5)));
        assert!(!n.contains(&GridCoord::new(2, 3)));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        for row in -1..12 {
            for col in -1..11 {
                let coord = GridCoord::new(row, col);
                for neighbor in coord.neighbors() {
                    assert!(
                        neighbor.neighbors().contains(&coord),
                        "{coord} -> {neighbor} is not mutual"
                    );
                }
            }
        }
    }

    #[test]
    fn test_position_formula() {
        assert_eq!(GridCoord::new(0, 3).to_position(BUBBLE_SIZE), Vec2::new(120.0, 0.0));
        let odd = GridCoord::new(1, 2).to_position(BUBBLE_SIZE);
        assert_eq!(odd.x, 100.0);
        assert!((odd.y - 34.4).abs() < 1e-4);
    }

    #[test]
    fn test_position_roundtrip_whole_grid() {
        for row in 0..10 {
            let cols = if row % 2 == 0 { 10 } else { 9 };
            for col in 0..cols {
                let original = GridCoord::new(row, col);
                let back = GridCoord::from_position(original.to_position(BUBBLE_SIZE), BUBBLE_SIZE);
                assert_eq!(original, back);
            }
        }
    }

    #[test]
    fn test_from_position_can_leave_the_grid() {
        let coord = GridCoord::from_position(Vec2::new(-30.0, 0.0), BUBBLE_SIZE);
        assert_eq!(coord, GridCoord::new(0, -1));
    }

    #[test]
    fn test_world_mapping_centers_play_area() {
        let area = PlayArea::new(10, 10, BUBBLE_SIZE);
        // Top-left bubble sits in the top-left corner, y up.
        assert_eq!(area.to_world(Vec2::ZERO), Vec2::new(-180.0, 280.0));
        // The launch point is centered horizontally.
        assert_eq!(area.to_world(area.launch_position()).x, 0.0);
    }

    #[test]
    fn test_launch_position() {
        let area = PlayArea::new(10, 10, BUBBLE_SIZE);
        assert_eq!(area.width, 400.0);
        assert_eq!(area.height, 600.0);
        assert_eq!(area.launch_position(), Vec2::new(180.0, 450.0));
    }
}
