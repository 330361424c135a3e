//! Tile graph: the fixed grid of hex tiles and their adjacency links.
//!
//! Tiles live in a flat array in storage (brick-offset) order. Each tile keeps
//! six neighbour slots indexed by [`HexEdge`]; a slot is `None` on the map edge.
//! Links are always written in pairs, so `a -> edge -> b` implies
//! `b -> edge.opposite() -> a`.

use crate::hex::{HexCoord, HexEdge, INNER_RADIUS, OUTER_RADIUS};
use crate::terrain::TerrainType;
use crate::types::{ProvinceId, TileId};
use rand::Rng;
use std::collections::{HashSet, VecDeque};

/// A single hex cell.
#[derive(Clone, Debug)]
pub struct Tile {
    /// Position on the map.
    pub coord: HexCoord,
    /// Base terrain type.
    pub terrain: TerrainType,
    /// Memoised base food, drawn on first access.
    pub base_food: Option<u32>,
    /// Province that claims this tile. The tile's faction is the province's.
    pub province: Option<ProvinceId>,
    neighbors: [Option<TileId>; 6],
}

impl Tile {
    /// Create a new unlinked tile.
    pub fn new(coord: HexCoord, terrain: TerrainType) -> Self {
        Self {
            coord,
            terrain,
            base_food: None,
            province: None,
            neighbors: [None; 6],
        }
    }

    /// The tile across `edge`, if any.
    #[inline]
    pub fn neighbor(&self, edge: HexEdge) -> Option<TileId> {
        self.neighbors[edge.index()]
    }

    /// All six neighbour slots in edge order.
    #[inline]
    pub fn neighbor_slots(&self) -> &[Option<TileId>; 6] {
        &self.neighbors
    }

    pub fn is_land(&self) -> bool {
        self.terrain.is_land()
    }

    pub fn is_walkable(&self) -> bool {
        self.terrain.is_walkable()
    }
}

// Two tiles are the same tile when position and terrain agree; neighbour
// links and ownership are graph state, not identity.
impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.coord == other.coord && self.terrain == other.terrain
    }
}

impl Eq for Tile {}

impl std::hash::Hash for Tile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.coord.hash(state);
        self.terrain.hash(state);
    }
}

/// The world's tiles and their adjacency.
#[derive(Clone, Debug)]
pub struct TileGraph {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGraph {
    /// Create a `width * height` grid of ocean tiles with all neighbour links wired.
    pub fn new(width: u32, height: u32) -> Self {
        let mut graph = Self {
            width,
            height,
            tiles: Vec::with_capacity((width * height) as usize),
        };

        let w = width as usize;
        for row in 0..height as usize {
            for col in 0..w {
                let index = row * w + col;
                let coord = HexCoord::from_offset(col as i32, row as i32);
                graph.tiles.push(Tile::new(coord, TerrainType::Ocean));

                if col > 0 {
                    graph.set_neighbor(TileId(index), HexEdge::W, Some(TileId(index - 1)));
                }

                if row > 0 {
                    if row & 1 == 0 {
                        graph.set_neighbor(TileId(index), HexEdge::SE, Some(TileId(index - w)));
                        if col > 0 {
                            graph.set_neighbor(
                                TileId(index),
                                HexEdge::SW,
                                Some(TileId(index - w - 1)),
                            );
                        }
                    } else {
                        graph.set_neighbor(TileId(index), HexEdge::SW, Some(TileId(index - w)));
                        if col < w - 1 {
                            graph.set_neighbor(
                                TileId(index),
                                HexEdge::SE,
                                Some(TileId(index - w + 1)),
                            );
                        }
                    }
                }
            }
        }

        graph
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Count total tiles in the map.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Real-world extent along x.
    pub fn x_length(&self) -> f32 {
        self.width as f32 * (1.5 * OUTER_RADIUS)
    }

    /// Real-world extent along z.
    pub fn z_length(&self) -> f32 {
        self.height as f32 * (2.0 * INNER_RADIUS)
    }

    /// Storage index for a coordinate, or `None` when it lies off the map.
    pub fn tile_id(&self, coord: HexCoord) -> Option<TileId> {
        let col = coord.offset_x();
        let row = coord.offset_z();
        if col < 0 || row < 0 || col as u32 >= self.width || row as u32 >= self.height {
            return None;
        }
        Some(TileId(row as usize * self.width as usize + col as usize))
    }

    /// Get the tile at a coordinate. Out-of-bounds coordinates yield `None`.
    pub fn tile_at(&self, coord: HexCoord) -> Option<&Tile> {
        self.tile_id(coord).map(|id| &self.tiles[id.0])
    }

    /// Get a mutable reference to the tile at a coordinate.
    pub fn tile_at_mut(&mut self, coord: HexCoord) -> Option<&mut Tile> {
        let id = self.tile_id(coord)?;
        self.tiles.get_mut(id.0)
    }

    /// Get a tile by id.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0)
    }

    /// Get a tile by id mutably.
    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id.0)
    }

    /// The tile across `edge` from `id`.
    pub fn neighbor(&self, id: TileId, edge: HexEdge) -> Option<TileId> {
        self.tiles.get(id.0).and_then(|t| t.neighbor(edge))
    }

    /// Present neighbours of `id` in edge order.
    pub fn neighbors(&self, id: TileId) -> impl Iterator<Item = (HexEdge, TileId)> + '_ {
        let slots = self.tiles.get(id.0).map(|t| t.neighbors).unwrap_or([None; 6]);
        HexEdge::ALL
            .into_iter()
            .zip(slots)
            .filter_map(|(edge, slot)| slot.map(|n| (edge, n)))
    }

    /// Link `a` to `b` across `edge`, writing the reverse link as well.
    ///
    /// Passing `None` clears the slot on `a` and the matching slot on the tile
    /// it previously pointed at.
    pub fn set_neighbor(&mut self, a: TileId, edge: HexEdge, b: Option<TileId>) {
        if let Some(previous) = self.neighbor(a, edge) {
            if let Some(tile) = self.tiles.get_mut(previous.0) {
                tile.neighbors[edge.opposite().index()] = None;
            }
        }
        if let Some(tile) = self.tiles.get_mut(a.0) {
            tile.neighbors[edge.index()] = b;
        }
        if let Some(b) = b {
            if let Some(tile) = self.tiles.get_mut(b.0) {
                tile.neighbors[edge.opposite().index()] = Some(a);
            }
        }
    }

    /// Change a tile's terrain.
    pub fn set_terrain(&mut self, id: TileId, terrain: TerrainType) {
        if let Some(tile) = self.tiles.get_mut(id.0) {
            tile.terrain = terrain;
        }
    }

    /// Terrain of a tile, if it exists.
    pub fn terrain(&self, id: TileId) -> Option<TerrainType> {
        self.tiles.get(id.0).map(|t| t.terrain)
    }

    /// Base food of a tile, drawn from its terrain's range on first access.
    pub fn base_food<R: Rng + ?Sized>(&mut self, id: TileId, rng: &mut R) -> Option<u32> {
        let tile = self.tiles.get_mut(id.0)?;
        if let Some(food) = tile.base_food {
            return Some(food);
        }
        let (min, max) = tile.terrain.food_range();
        let food = rng.gen_range(min..=max);
        tile.base_food = Some(food);
        Some(food)
    }

    /// Iterate over all tiles in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Iterate over all tile ids in storage order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.tiles.len()).map(TileId)
    }

    /// Number of tiles matching a predicate.
    pub fn count_where(&self, pred: impl Fn(&Tile) -> bool) -> usize {
        self.tiles.iter().filter(|t| pred(t)).count()
    }

    /// Check whether any tile within `steps` graph steps of `id` (excluding `id`
    /// itself) satisfies `pred`.
    pub fn any_within(&self, id: TileId, steps: u32, pred: impl Fn(&Tile) -> bool) -> bool {
        let mut visited: HashSet<TileId> = HashSet::new();
        let mut queue: VecDeque<(TileId, u32)> = VecDeque::new();
        visited.insert(id);
        queue.push_back((id, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth == steps {
                continue;
            }
            for (_, next) in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                if self.tiles.get(next.0).is_some_and(&pred) {
                    return true;
                }
                queue.push_back((next, depth + 1));
            }
        }

        false
    }

    /// Render the terrain as text, one row per line, northmost row first.
    /// Odd rows are indented to show the brick offset.
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();
        let w = self.width as usize;
        for row in (0..self.height as usize).rev() {
            if row & 1 == 1 {
                out.push(' ');
            }
            for tile in &self.tiles[row * w..(row + 1) * w] {
                out.push(tile.terrain.glyph());
                out.push(' ');
            }
            out.truncate(out.trim_end().len());
            out.push('\n');
        }
        out
    }
}

impl std::ops::Index<TileId> for TileGraph {
    type Output = Tile;

    fn index(&self, id: TileId) -> &Tile {
        &self.tiles[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_graph_is_ocean() {
        let graph = TileGraph::new(6, 4);
        assert_eq!(graph.len(), 24);
        assert!(graph.iter().all(|t| t.terrain == TerrainType::Ocean));
        assert!(graph.iter().all(|t| t.province.is_none()));
    }

    #[test]
    fn test_tile_at_roundtrip() {
        let graph = TileGraph::new(7, 5);
        for id in graph.ids() {
            let coord = graph[id].coord;
            assert_eq!(graph.tile_id(coord), Some(id));
        }
    }

    #[test]
    fn test_tile_at_out_of_bounds() {
        let graph = TileGraph::new(4, 4);
        assert!(graph.tile_at(HexCoord::from_offset(4, 0)).is_none());
        assert!(graph.tile_at(HexCoord::from_offset(0, 4)).is_none());
        assert!(graph.tile_at(HexCoord::from_offset(-1, 2)).is_none());
        assert!(graph.tile_at(HexCoord::new(0, -1)).is_none());
    }

    #[test]
    fn test_links_are_reciprocal() {
        let graph = TileGraph::new(6, 6);
        for id in graph.ids() {
            for (edge, other) in graph.neighbors(id) {
                assert_eq!(graph.neighbor(other, edge.opposite()), Some(id));
            }
        }
    }

    #[test]
    fn test_links_match_coordinates() {
        let graph = TileGraph::new(6, 6);
        for id in graph.ids() {
            let coord = graph[id].coord;
            for edge in HexEdge::ALL {
                let expected = graph.tile_id(coord.neighbor(edge));
                assert_eq!(graph.neighbor(id, edge), expected, "{} {}", coord, edge);
            }
        }
    }

    #[test]
    fn test_interior_tile_has_six_neighbors() {
        let graph = TileGraph::new(5, 5);
        let centre = graph.tile_id(HexCoord::from_offset(2, 2)).unwrap();
        assert_eq!(graph.neighbors(centre).count(), 6);

        let corner = graph.tile_id(HexCoord::from_offset(0, 0)).unwrap();
        assert_eq!(graph.neighbors(corner).count(), 2);
    }

    #[test]
    fn test_set_neighbor_clear() {
        let mut graph = TileGraph::new(3, 3);
        let a = TileId(4);
        let b = graph.neighbor(a, HexEdge::E).unwrap();
        graph.set_neighbor(a, HexEdge::E, None);
        assert_eq!(graph.neighbor(a, HexEdge::E), None);
        assert_eq!(graph.neighbor(b, HexEdge::W), None);
    }

    #[test]
    fn test_base_food_is_memoised() {
        let mut graph = TileGraph::new(2, 2);
        graph.set_terrain(TileId(0), TerrainType::Plains);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let first = graph.base_food(TileId(0), &mut rng).unwrap();
        assert!((5..=50).contains(&first));
        for _ in 0..10 {
            assert_eq!(graph.base_food(TileId(0), &mut rng), Some(first));
        }
        assert_eq!(graph.base_food(TileId(99), &mut rng), None);
    }

    #[test]
    fn test_any_within() {
        let mut graph = TileGraph::new(7, 7);
        let centre = graph.tile_id(HexCoord::from_offset(3, 3)).unwrap();
        assert!(!graph.any_within(centre, 3, |t| t.is_land()));

        // Own tile does not count.
        graph.set_terrain(centre, TerrainType::Plains);
        assert!(!graph.any_within(centre, 3, |t| t.is_land()));

        let far = graph.tile_id(HexCoord::from_offset(5, 3)).unwrap();
        graph.set_terrain(far, TerrainType::Plains);
        assert!(!graph.any_within(centre, 1, |t| t.is_land()));
        assert!(graph.any_within(centre, 2, |t| t.is_land()));
    }

    #[test]
    fn test_extents() {
        let graph = TileGraph::new(4, 2);
        assert!((graph.x_length() - 60.0).abs() < 1e-4);
        assert!((graph.z_length() - 4.0 * INNER_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_tile_identity_ignores_links() {
        let graph = TileGraph::new(3, 1);
        let mut copy = graph[TileId(1)].clone();
        copy.province = Some(ProvinceId(3));
        assert_eq!(copy, graph[TileId(1)]);
        copy.terrain = TerrainType::Desert;
        assert_ne!(copy, graph[TileId(1)]);
    }

    #[test]
    fn test_render_ascii() {
        let mut graph = TileGraph::new(3, 2);
        graph.set_terrain(TileId(0), TerrainType::Plains);
        graph.set_terrain(TileId(5), TerrainType::Mountain);
        assert_eq!(graph.render_ascii(), " ~ ~ ^\n. ~ ~\n");
    }
}
