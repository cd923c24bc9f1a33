//! The hexagonal grid that holds all bubbles.
//!
//! Uses a HashMap for sparse storage - only occupied cells are stored, keyed
//! by coordinate, so a cell can never hold two bubbles.

use bevy::prelude::*;
use rand::Rng;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use super::{
    bubble::{Bubble, BubbleColor, BubbleId},
    hex::GridCoord,
};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<GridBounds>();
}

/// Number of rows in the grid.
pub const GRID_ROWS: i32 = 10;

/// Number of columns in an even row (odd rows have one fewer).
pub const GRID_COLS: i32 = 10;

/// Rows filled at the start of a game.
pub const INITIAL_ROWS: i32 = 5;

/// Cap on the nearest-empty-cell search.
const MAX_SNAP_SEARCH: usize = 1000;

/// The bounds of the playable grid area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct GridBounds {
    pub rows: i32,
    /// Column count of even rows.
    pub cols: i32,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            rows: GRID_ROWS,
            cols: GRID_COLS,
        }
    }
}

impl GridBounds {
    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }

    /// Get the number of columns for a given row.
    ///
    /// Odd rows are shifted half a bubble right, so one fewer fits.
    pub fn columns_in_row(&self, row: i32) -> i32 {
        if row.rem_euclid(2) == 1 {
            self.cols - 1
        } else {
            self.cols
        }
    }

    /// Check if a coordinate is within bounds.
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.row >= 0
            && coord.row < self.rows
            && coord.col >= 0
            && coord.col < self.columns_in_row(coord.row)
    }

    /// Iterate over every cell of the first `rows` rows.
    pub fn cells(&self, rows: i32) -> impl Iterator<Item = GridCoord> + '_ {
        (0..rows.min(self.rows))
            .flat_map(move |row| (0..self.columns_in_row(row)).map(move |col| GridCoord::new(row, col)))
    }

    /// First row of the danger zone near the shooter.
    pub fn danger_row(&self) -> i32 {
        self.rows - 2
    }
}

/// All bubbles currently on the grid.
#[derive(Debug, Clone, Default)]
pub struct BubbleGrid {
    bubbles: HashMap<GridCoord, Bubble>,
    pub bounds: GridBounds,
}

impl BubbleGrid {
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            bubbles: HashMap::new(),
            bounds,
        }
    }

    /// Check if a cell is occupied.
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.bubbles.contains_key(&coord)
    }

    /// Get the bubble at a position, if any.
    ///
    /// Out-of-range coordinates simply find nothing.
    pub fn get(&self, coord: GridCoord) -> Option<&Bubble> {
        self.bubbles.get(&coord)
    }

    pub fn get_mut(&mut self, coord: GridCoord) -> Option<&mut Bubble> {
        self.bubbles.get_mut(&coord)
    }

    /// Insert a bubble at its own coordinate.
    ///
    /// Returns the previous bubble if the cell was occupied.
    pub fn insert(&mut self, bubble: Bubble) -> Option<Bubble> {
        self.bubbles.insert(bubble.coord, bubble)
    }

    /// Remove a bubble from a position.
    pub fn remove(&mut self, coord: GridCoord) -> Option<Bubble> {
        self.bubbles.remove(&coord)
    }

    /// Remove every listed cell, returning how many held a bubble.
    pub fn remove_all(&mut self, coords: &[GridCoord]) -> usize {
        coords.iter().filter(|&&c| self.remove(c).is_some()).count()
    }

    /// Clear all bubbles from the grid.
    pub fn clear(&mut self) {
        self.bubbles.clear();
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Iterate over all bubbles.
    pub fn iter(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.values()
    }

    /// Get all occupied coordinates.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.bubbles.keys().copied()
    }

    /// Coordinates of the bubbles touching the ceiling.
    pub fn ceiling_coords(&self) -> Vec<GridCoord> {
        self.coords().filter(|c| c.row == 0).collect()
    }

    /// Get the lowest row (highest row index) that has bubbles.
    pub fn lowest_row(&self) -> Option<i32> {
        self.bubbles.keys().map(|c| c.row).max()
    }

    /// Replace the contents with `rows` full rows of random bubbles.
    ///
    /// `next_id` supplies fresh identities.
    pub fn populate(
        &mut self,
        rows: i32,
        rng: &mut impl Rng,
        mut next_id: impl FnMut() -> BubbleId,
    ) {
        self.clear();
        let cells: Vec<GridCoord> = self.bounds.cells(rows).collect();
        for coord in cells {
            self.insert(Bubble::new(next_id(), BubbleColor::random(rng), coord));
        }
        info!("Populated {} rows with {} bubbles", rows, self.len());
    }

    /// Find the cell a landing bubble should occupy.
    ///
    /// The target itself is used when it is in bounds and free; otherwise the
    /// search expands ring by ring through neighbors until an empty in-bounds
    /// cell turns up.
    pub fn closest_empty_cell(&self, target: GridCoord) -> Option<GridCoord> {
        let mut checked = HashSet::new();
        let mut to_check = vec![target];

        while !to_check.is_empty() {
            let mut next_ring = Vec::new();

            for coord in to_check {
                if !checked.insert(coord) {
                    continue;
                }

                if self.bounds.contains(coord) && !self.is_occupied(coord) {
                    return Some(coord);
                }

                next_ring.extend(coord.neighbors().into_iter().filter(|n| !checked.contains(n)));
            }

            to_check = next_ring;

            if checked.len() > MAX_SNAP_SEARCH {
                break;
            }
        }

        None
    }
}

impl Serialize for BubbleGrid {
    /// Serialized as a list of bubbles in reading order.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut bubbles: Vec<&Bubble> = self.bubbles.values().collect();
        bubbles.sort_by_key(|b| b.coord);
        serializer.collect_seq(bubbles)
    }
}
