//! Movement range and A* pathfinding on the tile graph.
//!
//! Only walkable tiles can be entered. Range is counted in graph steps; path
//! cost is the sum of the entered tiles' movement delays.

use crate::hex::{HexCoord, HexEdge};
use crate::map::TileGraph;
use crate::types::TileId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use thiserror::Error;

/// Errors from path requests.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no tile at {0}")]
    NoTile(HexCoord),
    #[error("{goal} is outside the movement range")]
    GoalOutOfRange { goal: HexCoord },
    #[error("no walkable path from {start} to {goal}")]
    NoPath { start: HexCoord, goal: HexCoord },
}

/// One edge of the outline drawn around a movement range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileBorder {
    pub coord: HexCoord,
    pub edge: HexEdge,
}

/// Node in the A* priority queue.
#[derive(Clone, Copy, Eq, PartialEq)]
struct PathNode {
    tile: TileId,
    steps: u32,
    g_cost: u32, // Cost from start
    f_cost: u32, // 2 * g_cost + heuristic
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (lowest f_cost first)
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| other.tile.cmp(&self.tile))
            .then_with(|| other.steps.cmp(&self.steps))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn walkable(graph: &TileGraph, id: TileId) -> bool {
    graph.tile(id).is_some_and(|t| t.is_walkable())
}

/// Breadth-first layers out from `start`, `range` steps deep.
fn fringes(graph: &TileGraph, start: TileId, range: u32) -> (Vec<Vec<TileId>>, HashSet<TileId>, Vec<TileBorder>) {
    let mut visited: HashSet<TileId> = HashSet::new();
    let mut layers: Vec<Vec<TileId>> = vec![vec![start]];
    let mut blocked: Vec<TileBorder> = Vec::new();
    visited.insert(start);

    for step in 1..=range as usize {
        let mut next_layer = Vec::new();
        for &tile in &layers[step - 1] {
            let slots = graph[tile].neighbor_slots();
            for (edge, slot) in HexEdge::ALL.into_iter().zip(slots.iter().copied()) {
                match slot {
                    Some(next) if walkable(graph, next) => {
                        if visited.insert(next) {
                            next_layer.push(next);
                        }
                    }
                    _ => blocked.push(TileBorder {
                        coord: graph[tile].coord,
                        edge,
                    }),
                }
            }
        }
        layers.push(next_layer);
    }

    (layers, visited, blocked)
}

/// Every tile reachable within `range` steps of `start`, the start included.
///
/// A start off the map yields an empty set.
pub fn movement_range(graph: &TileGraph, start: HexCoord, range: u32) -> BTreeSet<HexCoord> {
    let Some(start) = graph.tile_id(start) else {
        return BTreeSet::new();
    };
    let (_, visited, _) = fringes(graph, start, range);
    visited.into_iter().map(|id| graph[id].coord).collect()
}

/// Outline of the movement range: edges that hit a missing or unwalkable tile
/// while expanding, plus every edge of the outermost layer that leads out of
/// the range.
pub fn movement_borders(graph: &TileGraph, start: HexCoord, range: u32) -> Vec<TileBorder> {
    let Some(start) = graph.tile_id(start) else {
        return Vec::new();
    };
    let (layers, visited, mut borders) = fringes(graph, start, range);

    if let Some(outer) = layers.last() {
        for &tile in outer {
            let slots = graph[tile].neighbor_slots();
            for (edge, slot) in HexEdge::ALL.into_iter().zip(slots.iter().copied()) {
                let inside = slot.is_some_and(|n| walkable(graph, n) && visited.contains(&n));
                if !inside {
                    borders.push(TileBorder {
                        coord: graph[tile].coord,
                        edge,
                    });
                }
            }
        }
    }

    borders
}

/// Find the cheapest walkable path from `start` to `goal` using A*.
///
/// `goal` must be in `reachable` (normally the mover's [`movement_range`])
/// and the search never leaves that set. The returned path excludes `start`
/// and ends at `goal`; it is empty when the two are equal.
pub fn find_path(
    graph: &TileGraph,
    start: HexCoord,
    goal: HexCoord,
    reachable: &BTreeSet<HexCoord>,
) -> Result<Vec<HexCoord>, PathError> {
    search(graph, start, goal, reachable, None)
}

/// Like [`find_path`], but the path may take at most `max_steps` steps.
///
/// A detour around expensive terrain can cost less yet take more steps than
/// a unit has range; this picks the cheapest path that still fits.
pub fn find_path_within(
    graph: &TileGraph,
    start: HexCoord,
    goal: HexCoord,
    reachable: &BTreeSet<HexCoord>,
    max_steps: u32,
) -> Result<Vec<HexCoord>, PathError> {
    search(graph, start, goal, reachable, Some(max_steps))
}

fn search(
    graph: &TileGraph,
    start: HexCoord,
    goal: HexCoord,
    reachable: &BTreeSet<HexCoord>,
    max_steps: Option<u32>,
) -> Result<Vec<HexCoord>, PathError> {
    if !reachable.contains(&goal) {
        return Err(PathError::GoalOutOfRange { goal });
    }
    let start_id = graph.tile_id(start).ok_or(PathError::NoTile(start))?;
    let goal_id = graph.tile_id(goal).ok_or(PathError::NoTile(goal))?;
    if start_id == goal_id {
        return Ok(Vec::new());
    }

    // Nodes are (tile, steps taken). Without a step limit every node of a
    // tile collapses onto step 0.
    let key = |tile: TileId, steps: u32| (tile, if max_steps.is_some() { steps } else { 0 });

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<(TileId, u32), (TileId, u32)> = HashMap::new();
    let mut g_scores: HashMap<(TileId, u32), u32> = HashMap::new();

    g_scores.insert(key(start_id, 0), 0);
    open_set.push(PathNode {
        tile: start_id,
        steps: 0,
        g_cost: 0,
        f_cost: heuristic(start, goal),
    });

    while let Some(current) = open_set.pop() {
        let current_key = key(current.tile, current.steps);
        if current.tile == goal_id {
            return Ok(reconstruct_path(graph, &came_from, current_key, key(start_id, 0)));
        }

        let current_g = *g_scores.get(&current_key).unwrap_or(&u32::MAX);
        if current.g_cost > current_g {
            continue; // stale entry
        }

        let steps = current.steps + 1;
        for (_, next) in graph.neighbors(current.tile) {
            let tile = &graph[next];
            if !tile.is_walkable() || !reachable.contains(&tile.coord) {
                continue;
            }
            // Each step closes the undivided distance by at most 2.
            if max_steps.is_some_and(|max| steps + heuristic(tile.coord, goal).div_ceil(2) > max) {
                continue;
            }

            let next_key = key(next, steps);
            let tentative_g = current_g.saturating_add(tile.terrain.movement_delay());
            if tentative_g >= *g_scores.get(&next_key).unwrap_or(&u32::MAX) {
                continue;
            }

            came_from.insert(next_key, current_key);
            g_scores.insert(next_key, tentative_g);
            open_set.push(PathNode {
                tile: next,
                steps,
                g_cost: tentative_g,
                f_cost: tentative_g.saturating_mul(2).saturating_add(heuristic(tile.coord, goal)),
            });
        }
    }

    Err(PathError::NoPath { start, goal })
}

/// Undivided hex distance; one step counts 2, matching the doubled cost scale.
fn heuristic(a: HexCoord, b: HexCoord) -> u32 {
    a.distance(&b)
}

fn reconstruct_path(
    graph: &TileGraph,
    came_from: &HashMap<(TileId, u32), (TileId, u32)>,
    goal: (TileId, u32),
    start: (TileId, u32),
) -> Vec<HexCoord> {
    let mut path = Vec::new();
    let mut current = goal;

    while current != start {
        path.push(graph[current.0].coord);
        match came_from.get(&current) {
            Some(&prev) => current = prev,
            None => break,
        }
    }

    path.reverse();
    path
}

/// Total movement delay of entering every tile of `path` in turn.
pub fn path_cost(graph: &TileGraph, path: &[HexCoord]) -> Option<u32> {
    path.iter().try_fold(0u32, |total, coord| {
        let tile = graph.tile_at(*coord)?;
        tile.is_walkable()
            .then(|| total.saturating_add(tile.terrain.movement_delay()))
    })
}

/// Check that consecutive tiles of `path` are adjacent and walkable,
/// beginning next to `start`.
pub fn is_valid_path(graph: &TileGraph, start: HexCoord, path: &[HexCoord]) -> bool {
    let mut previous = start;
    for &coord in path {
        if previous.distance(&coord) != 2 {
            return false;
        }
        if !graph.tile_at(coord).is_some_and(|t| t.is_walkable()) {
            return false;
        }
        previous = coord;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainType;

    fn plains(width: u32, height: u32) -> TileGraph {
        let mut graph = TileGraph::new(width, height);
        for id in graph.ids().collect::<Vec<_>>() {
            graph.set_terrain(id, TerrainType::Plains);
        }
        graph
    }

    fn set(graph: &mut TileGraph, col: i32, row: i32, terrain: TerrainType) {
        let id = graph.tile_id(HexCoord::from_offset(col, row)).unwrap();
        graph.set_terrain(id, terrain);
    }

    #[test]
    fn test_range_zero_is_start_only() {
        let graph = plains(5, 5);
        let start = HexCoord::from_offset(2, 2);
        let range = movement_range(&graph, start, 0);
        assert_eq!(range.into_iter().collect::<Vec<_>>(), vec![start]);
    }

    #[test]
    fn test_range_one_includes_neighbors() {
        let graph = plains(5, 5);
        let start = HexCoord::from_offset(2, 2);
        let range = movement_range(&graph, start, 1);
        assert_eq!(range.len(), 7);
        for n in start.neighbors() {
            assert!(range.contains(&n));
        }
    }

    #[test]
    fn test_range_respects_walls() {
        let mut graph = plains(5, 1);
        set(&mut graph, 2, 0, TerrainType::Mountain);
        let range = movement_range(&graph, HexCoord::from_offset(0, 0), 4);
        assert_eq!(
            range.into_iter().collect::<Vec<_>>(),
            vec![HexCoord::from_offset(0, 0), HexCoord::from_offset(1, 0)]
        );
    }

    #[test]
    fn test_range_off_map_is_empty() {
        let graph = plains(3, 3);
        assert!(movement_range(&graph, HexCoord::new(40, 40), 3).is_empty());
    }

    #[test]
    fn test_borders_of_range_zero() {
        let graph = plains(5, 5);
        let start = HexCoord::from_offset(2, 2);
        let borders = movement_borders(&graph, start, 0);
        assert_eq!(borders.len(), 6);
        assert!(borders.iter().all(|b| b.coord == start));
    }

    #[test]
    fn test_borders_of_isolated_tile() {
        let mut graph = TileGraph::new(3, 3);
        set(&mut graph, 1, 1, TerrainType::Plains);
        let start = HexCoord::from_offset(1, 1);
        // Every edge is blocked while expanding, and the outer layer is empty.
        let borders = movement_borders(&graph, start, 1);
        assert_eq!(borders.len(), 6);
    }

    #[test]
    fn test_path_to_neighbor() {
        let graph = plains(5, 5);
        let start = HexCoord::from_offset(2, 2);
        let goal = start.neighbor(HexEdge::E);
        let reachable = movement_range(&graph, start, 3);
        assert_eq!(find_path(&graph, start, goal, &reachable), Ok(vec![goal]));
    }

    #[test]
    fn test_path_to_self_is_empty() {
        let graph = plains(3, 3);
        let start = HexCoord::from_offset(1, 1);
        let reachable = movement_range(&graph, start, 1);
        assert_eq!(find_path(&graph, start, start, &reachable), Ok(Vec::new()));
    }

    #[test]
    fn test_path_out_of_range() {
        let graph = plains(8, 1);
        let start = HexCoord::from_offset(0, 0);
        let goal = HexCoord::from_offset(5, 0);
        let reachable = movement_range(&graph, start, 2);
        assert_eq!(
            find_path(&graph, start, goal, &reachable),
            Err(PathError::GoalOutOfRange { goal })
        );
    }

    #[test]
    fn test_path_avoids_desert_when_cheaper() {
        // The straight line along row 0 crosses two deserts (cost 5); the
        // detour through row 1 is one step longer but costs 4.
        let mut graph = plains(4, 2);
        set(&mut graph, 1, 0, TerrainType::Desert);
        set(&mut graph, 2, 0, TerrainType::Desert);
        let start = HexCoord::from_offset(0, 0);
        let goal = HexCoord::from_offset(3, 0);
        let reachable = movement_range(&graph, start, 4);

        let path = find_path(&graph, start, goal, &reachable).unwrap();
        assert!(is_valid_path(&graph, start, &path));
        assert_eq!(path_cost(&graph, &path), Some(4));
        assert_eq!(
            path,
            vec![
                HexCoord::from_offset(0, 1),
                HexCoord::from_offset(1, 1),
                HexCoord::from_offset(2, 1),
                goal,
            ]
        );
    }

    fn desert_row() -> TileGraph {
        // Row 2 is desert between the ends; the all-plains detour through a
        // neighbouring row is one step longer and cheaper.
        let mut graph = plains(10, 5);
        for col in 1..=4 {
            set(&mut graph, col, 2, TerrainType::Desert);
        }
        graph
    }

    #[test]
    fn test_step_limit_prefers_shorter_path() {
        let graph = desert_row();
        let start = HexCoord::from_offset(0, 2);
        let goal = HexCoord::from_offset(5, 2);
        let reachable = movement_range(&graph, start, 5);

        let cheapest = find_path(&graph, start, goal, &reachable).unwrap();
        assert_eq!(cheapest.len(), 6);
        assert_eq!(path_cost(&graph, &cheapest), Some(6));

        let path = find_path_within(&graph, start, goal, &reachable, 5).unwrap();
        assert!(is_valid_path(&graph, start, &path));
        assert_eq!(
            path,
            (1..=5).map(|col| HexCoord::from_offset(col, 2)).collect::<Vec<_>>()
        );
        assert_eq!(path_cost(&graph, &path), Some(9));
    }

    #[test]
    fn test_step_limit_too_short() {
        let graph = desert_row();
        let start = HexCoord::from_offset(0, 2);
        let goal = HexCoord::from_offset(5, 2);
        let reachable = movement_range(&graph, start, 5);
        assert_eq!(
            find_path_within(&graph, start, goal, &reachable, 4),
            Err(PathError::NoPath { start, goal })
        );
    }

    #[test]
    fn test_path_stays_inside_reachable() {
        // Without row 1 in the allowed set the detour must use row 3.
        let graph = desert_row();
        let start = HexCoord::from_offset(0, 2);
        let goal = HexCoord::from_offset(5, 2);
        let reachable: BTreeSet<HexCoord> = movement_range(&graph, start, 6)
            .into_iter()
            .filter(|c| c.offset_z() != 1)
            .collect();

        let path = find_path(&graph, start, goal, &reachable).unwrap();
        assert!(path.iter().all(|c| reachable.contains(c)));
        assert_eq!(path_cost(&graph, &path), Some(6));
    }

    #[test]
    fn test_path_is_adjacent_and_walkable() {
        let mut graph = plains(6, 6);
        set(&mut graph, 2, 2, TerrainType::Mountain);
        set(&mut graph, 3, 2, TerrainType::Ocean);
        let start = HexCoord::from_offset(0, 2);
        let goal = HexCoord::from_offset(5, 2);
        let reachable = movement_range(&graph, start, 10);

        let path = find_path(&graph, start, goal, &reachable).unwrap();
        assert!(is_valid_path(&graph, start, &path));
        assert_eq!(path.last(), Some(&goal));
    }

    #[test]
    fn test_path_cost_rejects_unwalkable() {
        let mut graph = plains(3, 1);
        set(&mut graph, 1, 0, TerrainType::Ocean);
        assert_eq!(path_cost(&graph, &[HexCoord::from_offset(1, 0)]), None);
        assert_eq!(path_cost(&graph, &[]), Some(0));
    }
}
