//! Property tests for hex geometry, the tile graph, pathfinding and
//! territory bookkeeping.

use hexfront_core::{
    hex::HexCoord,
    map::TileGraph,
    pathfinding::{find_path, is_valid_path, movement_range, path_cost, PathError},
    settings::WorldSettings,
    simulation::Simulation,
    terrain::TerrainType,
    types::TileId,
};
use proptest::prelude::*;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

// =============================================================================
// Strategies
// =============================================================================

fn coord() -> impl Strategy<Value = HexCoord> {
    (-50i32..50, -50i32..50).prop_map(|(x, z)| HexCoord::new(x, z))
}

/// A map of random size with random terrain on every tile.
fn terrain_map() -> impl Strategy<Value = TileGraph> {
    (2u32..9, 2u32..9).prop_flat_map(|(width, height)| {
        prop::collection::vec(
            prop::sample::select(TerrainType::all().to_vec()),
            (width * height) as usize,
        )
        .prop_map(move |terrain| {
            let mut graph = TileGraph::new(width, height);
            for (id, t) in graph.ids().collect::<Vec<_>>().into_iter().zip(terrain) {
                graph.set_terrain(id, t);
            }
            graph
        })
    })
}

fn walkable(graph: &TileGraph) -> Vec<HexCoord> {
    graph.iter().filter(|t| t.is_walkable()).map(|t| t.coord).collect()
}

/// Plain Dijkstra over walkable tiles, charging each tile's delay on entry.
fn cheapest_cost(graph: &TileGraph, start: HexCoord, goal: HexCoord) -> Option<u32> {
    let start = graph.tile_id(start)?;
    let goal = graph.tile_id(goal)?;
    let mut best: HashMap<TileId, u32> = HashMap::from([(start, 0)]);
    let mut heap = BinaryHeap::from([Reverse((0u32, start))]);

    while let Some(Reverse((cost, id))) = heap.pop() {
        if id == goal {
            return Some(cost);
        }
        if best.get(&id).is_some_and(|b| cost > *b) {
            continue;
        }
        for (_, next) in graph.neighbors(id) {
            let tile = &graph[next];
            if !tile.is_walkable() {
                continue;
            }
            let candidate = cost + tile.terrain.movement_delay();
            if best.get(&next).map_or(true, |b| candidate < *b) {
                best.insert(next, candidate);
                heap.push(Reverse((candidate, next)));
            }
        }
    }
    None
}

// =============================================================================
// Hex Geometry
// =============================================================================

proptest! {
    #[test]
    fn prop_offset_position_round_trip(col in 0i32..100, row in 0i32..100) {
        let coord = HexCoord::from_offset(col, row);
        prop_assert_eq!(HexCoord::from_position(coord.to_position()), coord);
        prop_assert_eq!((coord.offset_x(), coord.offset_z()), (col, row));
    }

    #[test]
    fn prop_distance_is_symmetric_and_even_for_neighbours(a in coord(), b in coord()) {
        prop_assert_eq!(a.distance(&b), b.distance(&a));
        prop_assert_eq!(a.distance(&b) % 2, 0);
        prop_assert_eq!(a.distance(&a), 0);
        for n in a.neighbors() {
            prop_assert_eq!(a.distance(&n), 2);
        }
    }

    #[test]
    fn prop_triangle_inequality(a in coord(), b in coord(), c in coord()) {
        prop_assert!(a.distance(&c) <= a.distance(&b) + b.distance(&c));
    }
}

// =============================================================================
// Tile Graph
// =============================================================================

proptest! {
    #[test]
    fn prop_neighbour_links_are_reciprocal(graph in terrain_map()) {
        for id in graph.ids() {
            for (edge, other) in graph.neighbors(id) {
                prop_assert_eq!(graph.neighbor(other, edge.opposite()), Some(id));
                prop_assert_eq!(graph[id].coord.neighbor(edge), graph[other].coord);
            }
        }
    }

    #[test]
    fn prop_every_coord_maps_back_to_its_tile(graph in terrain_map()) {
        for id in graph.ids() {
            prop_assert_eq!(graph.tile_id(graph[id].coord), Some(id));
        }
    }
}

// =============================================================================
// Pathfinding
// =============================================================================

proptest! {
    #[test]
    fn prop_movement_range_is_walkable_and_bounded(
        graph in terrain_map(),
        pick in any::<prop::sample::Index>(),
        range in 0u32..5,
    ) {
        let land = walkable(&graph);
        prop_assume!(!land.is_empty());
        let start = land[pick.index(land.len())];

        let reachable = movement_range(&graph, start, range);
        prop_assert!(reachable.contains(&start));
        for coord in &reachable {
            prop_assert!(graph.tile_at(*coord).unwrap().is_walkable());
            prop_assert!(start.distance(coord) <= range * 2);
        }
    }

    #[test]
    fn prop_astar_matches_dijkstra(
        graph in terrain_map(),
        from in any::<prop::sample::Index>(),
        to in any::<prop::sample::Index>(),
    ) {
        let land = walkable(&graph);
        prop_assume!(!land.is_empty());
        let start = land[from.index(land.len())];
        let goal = land[to.index(land.len())];
        let everywhere: BTreeSet<HexCoord> = land.iter().copied().collect();

        match (find_path(&graph, start, goal, &everywhere), cheapest_cost(&graph, start, goal)) {
            (Ok(path), Some(cost)) => {
                prop_assert!(is_valid_path(&graph, start, &path));
                prop_assert_eq!(path_cost(&graph, &path), Some(cost));
                if start == goal {
                    prop_assert!(path.is_empty());
                } else {
                    prop_assert_eq!(path.last(), Some(&goal));
                }
            }
            (Err(PathError::NoPath { .. }), None) => {}
            (found, expected) => {
                prop_assert!(false, "find_path gave {:?}, dijkstra gave {:?}", found, expected);
            }
        }
    }
}

// =============================================================================
// Territory
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_ownership_stays_consistent(seed in any::<u64>(), days in 1u32..120) {
        let mut sim = Simulation::new(WorldSettings::new(14, 12, seed)).unwrap();
        sim.run_days(days);
        let world = sim.world();

        let claimed = world.graph().count_where(|t| t.province.is_some());
        let listed: usize = world.provinces().map(|p| p.tiles.len()).sum();
        prop_assert_eq!(claimed, listed);

        for province in world.provinces() {
            for tile in &province.tiles {
                prop_assert_eq!(world.graph()[*tile].province, Some(province.id));
            }
            let owner = world.faction(province.faction).unwrap();
            prop_assert!(owner.owns_province(province.id));
        }

        for faction in world.factions() {
            for province in &faction.provinces {
                prop_assert_eq!(world.province(*province).unwrap().faction, faction.id);
            }
            for unit in &faction.units {
                prop_assert_eq!(world.unit(*unit).unwrap().faction, faction.id);
            }
        }
        let owned_units: usize = world.factions().map(|f| f.units.len()).sum();
        prop_assert_eq!(owned_units, world.units().count());
    }
}
