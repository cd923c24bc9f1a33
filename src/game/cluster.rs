//! Cluster detection - finding matching groups and floating bubbles.
//!
//! Both searches walk the 6-neighbor adjacency graph with an explicit stack,
//! so a grid-spanning group never deepens the call stack.

use std::collections::HashSet;

use super::{grid::BubbleGrid, hex::GridCoord};

/// Minimum cluster size to pop (match-3).
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Find every bubble connected to `start` through bubbles of the same color.
///
/// The start bubble is included. An empty start cell yields an empty cluster.
pub fn find_cluster(grid: &BubbleGrid, start: GridCoord) -> Vec<GridCoord> {
    let Some(target_color) = grid.get(start).map(|b| b.color) else {
        return Vec::new();
    };

    let mut cluster = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut stack = vec![start];

    while let Some(coord) = stack.pop() {
        cluster.push(coord);

        for neighbor in coord.neighbors() {
            let matches = grid.get(neighbor).is_some_and(|b| b.color == target_color);
            if matches && visited.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    cluster
}

/// Whether a cluster is large enough to pop.
pub fn is_poppable(cluster: &[GridCoord]) -> bool {
    cluster.len() >= MIN_CLUSTER_SIZE
}

/// Find all bubbles connected to the ceiling row, whatever their color.
pub fn find_anchored(grid: &BubbleGrid) -> HashSet<GridCoord> {
    let mut stack = grid.ceiling_coords();
    let mut anchored: HashSet<GridCoord> = stack.iter().copied().collect();

    while let Some(coord) = stack.pop() {
        for neighbor in coord.neighbors() {
            if grid.is_occupied(neighbor) && anchored.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    anchored
}

/// Find the bubbles with no path to the ceiling.
pub fn find_floating(grid: &BubbleGrid) -> Vec<GridCoord> {
    let anchored = find_anchored(grid);
    let mut floating: Vec<GridCoord> = grid.coords().filter(|c| !anchored.contains(c)).collect();
    floating.sort();
    floating
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        bubble::{Bubble, BubbleColor, BubbleId},
        grid::GridBounds,
    };

    fn grid_with(bubbles: &[(i32, i32, BubbleColor)]) -> BubbleGrid {
        let mut grid = BubbleGrid::new(GridBounds::default());
        for (i, &(row, col, color)) in bubbles.iter().enumerate() {
            grid.insert(Bubble::new(BubbleId(i as u64), color, GridCoord::new(row, col)));
        }
        grid
    }

    use BubbleColor::{Blue, Green, Red};

    #[test]
    fn test_straight_chain_of_three() {
        let grid = grid_with(&[(2, 1, Red), (2, 2, Red), (2, 3, Red), (2, 4, Blue)]);
        let cluster = find_cluster(&grid, GridCoord::new(2, 1));
        assert_eq!(cluster.len(), 3);
        assert!(is_poppable(&cluster));
    }

    #[test]
    fn test_isolated_same_color_is_alone() {
        let grid = grid_with(&[(2, 1, Red), (2, 2, Blue), (2, 3, Red)]);
        let cluster = find_cluster(&grid, GridCoord::new(2, 1));
        assert_eq!(cluster, vec![GridCoord::new(2, 1)]);
        assert!(!is_poppable(&cluster));
    }

    #[test]
    fn test_cluster_follows_odd_row_diagonals() {
        // (1, 3) is odd: its upper neighbors are (0, 3) and (0, 4).
        let grid = grid_with(&[(1, 3, Green), (0, 3, Green), (0, 4, Green), (0, 2, Green)]);
        let cluster = find_cluster(&grid, GridCoord::new(1, 3));
        assert_eq!(cluster.len(), 4);

        // (0, 2) only joins through (0, 3).
        let grid = grid_with(&[(1, 3, Green), (0, 4, Green), (0, 2, Green)]);
        assert_eq!(find_cluster(&grid, GridCoord::new(1, 3)).len(), 2);
    }

    #[test]
    fn test_cluster_from_empty_cell() {
        let grid = grid_with(&[(0, 0, Red)]);
        assert!(find_cluster(&grid, GridCoord::new(5, 5)).is_empty());
    }

    #[test]
    fn test_large_cluster_is_iterative() {
        let mut grid = BubbleGrid::new(GridBounds::new(200, 200));
        let mut id = 0;
        for coord in GridBounds::new(200, 200).cells(200) {
            id += 1;
            grid.insert(Bubble::new(BubbleId(id), Red, coord));
        }
        assert_eq!(find_cluster(&grid, GridCoord::new(0, 0)).len(), grid.len());
    }

    #[test]
    fn test_ceiling_group_never_floats() {
        let grid = grid_with(&[(0, 0, Red), (0, 1, Red), (0, 2, Red)]);
        assert!(find_floating(&grid).is_empty());
    }

    #[test]
    fn test_anchoring_ignores_color() {
        let grid = grid_with(&[(0, 0, Red), (1, 0, Blue), (2, 0, Green)]);
        assert!(find_floating(&grid).is_empty());
    }

    #[test]
    fn test_group_floats_once_anchor_is_gone() {
        let mut grid = grid_with(&[(0, 4, Red), (1, 4, Blue), (2, 4, Blue), (2, 5, Blue)]);
        assert!(find_floating(&grid).is_empty());

        grid.remove(GridCoord::new(0, 4));
        assert_eq!(
            find_floating(&grid),
            vec![GridCoord::new(1, 4), GridCoord::new(2, 4), GridCoord::new(2, 5)]
        );
    }

    #[test]
    fn test_empty_grid_has_nothing_floating() {
        let grid = grid_with(&[]);
        assert!(find_anchored(&grid).is_empty());
        assert!(find_floating(&grid).is_empty());
    }
}
