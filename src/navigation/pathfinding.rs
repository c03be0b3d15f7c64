//! A* pathfinding over the walkability grid
//!
//! 8-directional, octile costs, no turn penalty. Diagonal steps may not cut
//! a blocked corner. The search expands at most one node per grid cell.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f32::consts::SQRT_2;

use glam::Vec2;
use ordered_float::OrderedFloat;

use super::grid::WorldGrid;
use crate::core::types::{CellKey, GridPos};

const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Node in the A* open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    index: usize,
    f_cost: OrderedFloat<f32>, // g_cost + heuristic
    g_cost: OrderedFloat<f32>,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; deeper nodes first on ties
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| self.g_cost.cmp(&other.g_cost))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn octile(a: CellKey, b: CellKey) -> f32 {
    let dx = (a.x - b.x).abs() as f32;
    let dy = (a.y - b.y).abs() as f32;
    dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy)
}

/// Find a path between two grid positions (rounded to cells).
///
/// Returns None if either end is off-grid or blocked, or no path exists.
/// The returned waypoints include both the start and the goal cell.
pub fn find_path(grid: &WorldGrid, start: GridPos, goal: GridPos) -> Option<Vec<GridPos>> {
    let start = CellKey::from_pos(start);
    let goal = CellKey::from_pos(goal);

    if !grid.is_walkable(start.x, start.y) || !grid.is_walkable(goal.x, goal.y) {
        return None;
    }
    if start == goal {
        return Some(vec![start.to_pos()]);
    }

    let width = grid.width();
    let index_of = |c: CellKey| c.y as usize * width + c.x as usize;
    let cell_of = |i: usize| CellKey::new((i % width) as i32, (i / width) as i32);

    let cell_count = grid.cell_count();
    let mut g_scores = vec![f32::INFINITY; cell_count];
    let mut came_from = vec![usize::MAX; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open_set = BinaryHeap::new();

    let start_index = index_of(start);
    let goal_index = index_of(goal);
    g_scores[start_index] = 0.0;
    open_set.push(PathNode {
        index: start_index,
        f_cost: OrderedFloat(octile(start, goal)),
        g_cost: OrderedFloat(0.0),
    });

    let budget = cell_count;
    let mut expanded = 0usize;

    while let Some(current) = open_set.pop() {
        if current.index == goal_index {
            return Some(reconstruct_path(&came_from, goal_index, cell_of));
        }
        if closed[current.index] {
            continue;
        }
        closed[current.index] = true;

        expanded += 1;
        if expanded > budget {
            tracing::warn!(expanded, "path search exhausted its node budget");
            return None;
        }

        let cell = cell_of(current.index);
        let current_g = g_scores[current.index];

        for (dx, dy) in NEIGHBORS {
            let nx = cell.x + dx;
            let ny = cell.y + dy;
            if !grid.is_walkable(nx, ny) {
                continue;
            }
            let diagonal = dx != 0 && dy != 0;
            if diagonal && !(grid.is_walkable(cell.x + dx, cell.y) && grid.is_walkable(cell.x, cell.y + dy)) {
                continue;
            }

            let neighbor = CellKey::new(nx, ny);
            let neighbor_index = index_of(neighbor);
            if closed[neighbor_index] {
                continue;
            }

            let step = if diagonal { SQRT_2 } else { 1.0 };
            let tentative_g = current_g + step;
            if tentative_g < g_scores[neighbor_index] {
                came_from[neighbor_index] = current.index;
                g_scores[neighbor_index] = tentative_g;
                open_set.push(PathNode {
                    index: neighbor_index,
                    f_cost: OrderedFloat(tentative_g + octile(neighbor, goal)),
                    g_cost: OrderedFloat(tentative_g),
                });
            }
        }
    }

    None // No path found
}

/// Reconstruct path from the came_from table
fn reconstruct_path(
    came_from: &[usize],
    goal_index: usize,
    cell_of: impl Fn(usize) -> CellKey,
) -> Vec<GridPos> {
    let mut path = vec![cell_of(goal_index).to_pos()];
    let mut current = goal_index;
    while came_from[current] != usize::MAX {
        current = came_from[current];
        path.push(cell_of(current).to_pos());
    }
    path.reverse();
    path
}

/// Total euclidean length of a waypoint list
pub fn path_length(path: &[GridPos]) -> f32 {
    path.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Straight-line step check used by tests and diagnostics
pub fn is_adjacent_step(a: GridPos, b: GridPos) -> bool {
    let d = (a - b).abs();
    d.max_element() <= 1.0 && d != Vec2::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pathfind_straight_line() {
        let grid = WorldGrid::filled(10, 10, 1);
        let path = find_path(&grid, Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0)).unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&Vec2::new(0.0, 0.0)));
        assert_eq!(path.last(), Some(&Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_pathfind_diagonal_is_optimal() {
        let grid = WorldGrid::filled(10, 10, 1);
        let path = find_path(&grid, Vec2::ZERO, Vec2::new(9.0, 9.0)).unwrap();
        assert_eq!(path.len(), 10);
        assert!((path_length(&path) - 9.0 * SQRT_2).abs() < 1e-3);
    }

    #[test]
    fn test_pathfind_around_wall() {
        let grid = WorldGrid::from_ascii(&[
            ".....", //
            ".###.", //
            ".#...", //
            ".#.#.", //
            "...#.",
        ]);
        let path = find_path(&grid, Vec2::new(2.0, 2.0), Vec2::new(0.0, 4.0)).unwrap();
        for step in path.windows(2) {
            assert!(is_adjacent_step(step[0], step[1]));
        }
        for p in &path {
            assert!(grid.is_walkable_pos(*p));
        }
        assert_eq!(path.last(), Some(&Vec2::new(0.0, 4.0)));
    }

    #[test]
    fn test_no_corner_cutting() {
        let grid = WorldGrid::from_ascii(&[
            ".#", //
            "#.",
        ]);
        assert!(find_path(&grid, Vec2::ZERO, Vec2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_pathfind_blocked_goal_or_enclosed() {
        let grid = WorldGrid::from_ascii(&[
            "..#..", //
            "..#..", //
            "..#..",
        ]);
        assert!(find_path(&grid, Vec2::ZERO, Vec2::new(4.0, 0.0)).is_none());
        assert!(find_path(&grid, Vec2::ZERO, Vec2::new(2.0, 0.0)).is_none());
        assert!(find_path(&grid, Vec2::ZERO, Vec2::new(40.0, 0.0)).is_none());
    }

    #[test]
    fn test_pathfind_same_cell() {
        let grid = WorldGrid::filled(3, 3, 1);
        let path = find_path(&grid, Vec2::new(1.2, 0.9), Vec2::new(0.8, 1.1)).unwrap();
        assert_eq!(path, vec![Vec2::new(1.0, 1.0)]);
    }
}
