//! Procedural terrain generation.
//!
//! The generator uses one seeded stream for every pass, so the same seed and
//! map size always yield the same terrain. Passes run in a fixed order:
//! landmasses, coasts, mountain ranges, deserts. Each flood fill is written as
//! an explicit frame stack that consumes random draws in the same order a
//! depth-first recursion would.

use crate::hex::HexEdge;
use crate::map::TileGraph;
use crate::terrain::TerrainType;
use crate::types::TileId;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Start-tile searches give up after this many draws per tile in the map.
const START_ATTEMPTS_PER_TILE: usize = 16;

/// Which terrain pipeline to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// Continents, coasts, mountains and deserts.
    #[default]
    Standard,
    /// Standard pipeline with every water tile replaced by land afterwards.
    Dry,
}

/// Counts collected while generating a map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Tiles converted by the landmass pass (repeat visits counted).
    pub landmass: usize,
    /// Ocean tiles converted to coast.
    pub coast: usize,
    /// Number of mountain ranges started.
    pub mountain_ranges: usize,
    /// Tiles turned into mountains.
    pub mountains: usize,
    /// Number of deserts started.
    pub deserts: usize,
    /// Tiles turned into desert.
    pub desert_tiles: usize,
    /// Water tiles replaced by the dry pass.
    pub dried: usize,
}

/// A suspended flood-fill call: the tile it runs on, its remaining range and
/// the index of the next child step to take.
#[derive(Clone, Copy, Debug)]
struct Frame {
    tile: TileId,
    range: i32,
    step: usize,
}

/// Generates terrain from a seed.
pub struct TerrainGenerator {
    rng: ChaCha8Rng,
    seed: u64,
    kind: GeneratorKind,
}

impl TerrainGenerator {
    /// Create a new terrain generator with the given seed and pipeline.
    pub fn new(seed: u64, kind: GeneratorKind) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            kind,
        }
    }

    /// Fill `graph` with terrain. The graph is expected to be freshly built
    /// (all ocean).
    pub fn generate(&mut self, graph: &mut TileGraph) -> GenerationReport {
        let mut report = GenerationReport::default();
        if graph.is_empty() {
            return report;
        }

        // Phase 1: Landmasses
        report.landmass = self.create_landmasses(graph);

        // Phase 2: Coasts
        report.coast = self.create_coasts(graph);

        // Phase 3: Mountain ranges
        let (ranges, mountains) = self.create_mountains(graph, report.landmass);
        report.mountain_ranges = ranges;
        report.mountains = mountains;

        // Phase 4: Deserts
        let (deserts, desert_tiles) = self.create_deserts(graph, report.landmass);
        report.deserts = deserts;
        report.desert_tiles = desert_tiles;

        if self.kind == GeneratorKind::Dry {
            report.dried = self.dry_out(graph);
        }

        info!(
            seed = self.seed,
            width = graph.width(),
            height = graph.height(),
            landmass = report.landmass,
            coast = report.coast,
            mountains = report.mountains,
            deserts = report.desert_tiles,
            dried = report.dried,
            "terrain generated"
        );

        report
    }

    fn random_tile(&mut self, graph: &TileGraph) -> TileId {
        TileId(self.rng.gen_range(0..graph.len()))
    }

    /// Draw random tiles until one satisfies `accept`, giving up after a
    /// bounded number of draws.
    fn find_start(
        &mut self,
        graph: &TileGraph,
        accept: impl Fn(TerrainType) -> bool,
    ) -> Option<TileId> {
        let attempts = graph.len() * START_ATTEMPTS_PER_TILE;
        for _ in 0..attempts {
            let id = self.random_tile(graph);
            if graph.terrain(id).is_some_and(&accept) {
                return Some(id);
            }
        }
        None
    }

    // =========================================================================
    // Landmasses
    // =========================================================================

    fn create_landmasses(&mut self, graph: &mut TileGraph) -> usize {
        let landmasses: usize = self.rng.gen_range(2..=3);
        let range = (graph.len() as f32 / landmasses as f32).sqrt().round() as i32;
        let mut total = 0;

        for _ in 0..landmasses {
            // Prefer a seed tile away from existing land.
            let mut tile = self.random_tile(graph);
            let mut attempt = 0;
            while Self::land_near(graph, tile, 5) && attempt < 10 {
                attempt += 1;
                tile = self.random_tile(graph);
            }

            let size = self.fill_landmass(graph, tile, range);
            debug!(tile = %graph[tile].coord, size, "landmass");
            total += size;
        }

        total
    }

    fn land_near(graph: &TileGraph, tile: TileId, steps: u32) -> bool {
        graph[tile].is_land() || graph.any_within(tile, steps, |t| t.is_land())
    }

    fn fill_landmass(&mut self, graph: &mut TileGraph, start: TileId, range: i32) -> usize {
        let mut size = 0;
        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.enter_landmass(graph, start, range, &mut size) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if frame.step >= 6 {
                stack.pop();
                continue;
            }
            let edge = HexEdge::from_index(frame.step);
            frame.step += 1;
            let (tile, range) = (frame.tile, frame.range);

            let Some(next) = graph.neighbor(tile, edge) else {
                continue;
            };
            if graph[next].is_land() {
                continue;
            }
            let child_range = range - self.rng.gen_range(1..5);
            if let Some(child) = self.enter_landmass(graph, next, child_range, &mut size) {
                stack.push(child);
            }
        }

        size
    }

    fn enter_landmass(
        &mut self,
        graph: &mut TileGraph,
        tile: TileId,
        range: i32,
        size: &mut usize,
    ) -> Option<Frame> {
        graph.set_terrain(tile, TerrainType::Plains);
        *size += 1;
        (range >= self.rng.gen_range(0..5)).then_some(Frame {
            tile,
            range,
            step: 0,
        })
    }

    // =========================================================================
    // Coasts
    // =========================================================================

    fn create_coasts(&mut self, graph: &mut TileGraph) -> usize {
        let mut total = 0;

        for sweep in 0..10 {
            let mut converted = 0;
            for id in graph.ids().collect::<Vec<_>>() {
                if graph.terrain(id) != Some(TerrainType::Ocean) {
                    continue;
                }

                let mut score = 0;
                if graph.any_within(id, 2, |t| t.is_land()) {
                    score += 1;
                }
                if graph.any_within(id, 1, |t| t.is_land()) {
                    score += 3;
                }
                if score == 0 {
                    continue;
                }

                if score >= self.rng.gen_range(0..3) {
                    graph.set_terrain(id, TerrainType::Coast);
                    converted += 1;
                }
            }

            debug!(sweep, converted, "coast sweep");
            total += converted;
            if converted == 0 {
                break;
            }
        }

        total
    }

    // =========================================================================
    // Mountains
    // =========================================================================

    fn create_mountains(&mut self, graph: &mut TileGraph, landmass: usize) -> (usize, usize) {
        let ranges = self.rng.gen_range(1..5_usize) * self.rng.gen_range(1..landmass / 50 + 2);
        let range = (2.0 * ((landmass / ranges) as f32).sqrt()) as i32;
        let mut total = 0;
        let mut started = 0;

        for _ in 0..ranges {
            let Some(start) = self.find_start(graph, |t| t.is_walkable()) else {
                warn!("no walkable land left for a mountain range");
                break;
            };
            let direction = HexEdge::from_index(self.rng.gen_range(0..6));
            let size = self.fill_mountain_range(graph, start, range, direction);
            debug!(start = %graph[start].coord, %direction, size, "mountain range");
            started += 1;
            total += size;
        }

        (started, total)
    }

    fn fill_mountain_range(
        &mut self,
        graph: &mut TileGraph,
        start: TileId,
        range: i32,
        direction: HexEdge,
    ) -> usize {
        let opposite = direction.opposite();
        let mut size = 0;
        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.enter_mountain(graph, Some(start), range, &mut size) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let step = frame.step;
            frame.step += 1;
            let (tile, range) = (frame.tile, frame.range);

            // Steps 0 and 1 push along the primary axis, steps 2..8 walk all
            // six edges in index order.
            let child = match step {
                0 => Some((direction, range - self.rng.gen_range(0..5))),
                1 => Some((opposite, range - self.rng.gen_range(0..5))),
                2..=7 => {
                    let edge = HexEdge::from_index(step - 2);
                    if edge == direction || edge == opposite {
                        Some((edge, range - self.rng.gen_range(0..5)))
                    } else if self.rng.gen_range(1..10) <= 7 {
                        Some((edge, range - self.rng.gen_range(5..15)))
                    } else {
                        None
                    }
                }
                _ => {
                    stack.pop();
                    continue;
                }
            };

            if let Some((edge, child_range)) = child {
                let next = graph.neighbor(tile, edge);
                if let Some(frame) = self.enter_mountain(graph, next, child_range, &mut size) {
                    stack.push(frame);
                }
            }
        }

        size
    }

    fn enter_mountain(
        &mut self,
        graph: &mut TileGraph,
        tile: Option<TileId>,
        range: i32,
        size: &mut usize,
    ) -> Option<Frame> {
        let tile = tile?;
        let terrain = graph.terrain(tile)?;
        if !terrain.is_land() || terrain == TerrainType::Mountain {
            return None;
        }

        graph.set_terrain(tile, TerrainType::Mountain);
        *size += 1;
        (range >= self.rng.gen_range(0..5)).then_some(Frame {
            tile,
            range,
            step: 0,
        })
    }

    // =========================================================================
    // Deserts
    // =========================================================================

    fn create_deserts(&mut self, graph: &mut TileGraph, landmass: usize) -> (usize, usize) {
        let deserts = self.rng.gen_range(2..6_usize) * self.rng.gen_range(1..landmass / 100 + 2);
        let range = ((landmass / deserts) as f32).sqrt() as i32;
        let mut total = 0;
        let mut started = 0;

        for _ in 0..deserts {
            let Some(start) =
                self.find_start(graph, |t| t.is_walkable() || t == TerrainType::Desert)
            else {
                warn!("no walkable land left for a desert");
                break;
            };
            let size = self.fill_desert(graph, start, range);
            debug!(start = %graph[start].coord, size, "desert");
            started += 1;
            total += size;
        }

        (started, total)
    }

    fn fill_desert(&mut self, graph: &mut TileGraph, start: TileId, range: i32) -> usize {
        let mut size = 0;
        let mut stack: Vec<Frame> = Vec::new();
        if let Some(frame) = self.enter_desert(graph, Some(start), range, &mut size) {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            if frame.step >= 6 {
                stack.pop();
                continue;
            }
            let edge = HexEdge::from_index(frame.step);
            frame.step += 1;
            let (tile, range) = (frame.tile, frame.range);

            // Absent neighbours still consume a draw.
            let child_range = range - self.rng.gen_range(3..8);
            let next = graph.neighbor(tile, edge);
            if let Some(child) = self.enter_desert(graph, next, child_range, &mut size) {
                stack.push(child);
            }
        }

        size
    }

    fn enter_desert(
        &mut self,
        graph: &mut TileGraph,
        tile: Option<TileId>,
        range: i32,
        size: &mut usize,
    ) -> Option<Frame> {
        let tile = tile?;
        if graph.terrain(tile)? == TerrainType::Desert {
            return None;
        }

        graph.set_terrain(tile, TerrainType::Desert);
        *size += 1;
        (range >= self.rng.gen_range(0..5)).then_some(Frame {
            tile,
            range,
            step: 0,
        })
    }

    // =========================================================================
    // Dry variant
    // =========================================================================

    /// Replace every water tile with land: 40% desert, 20% mountain, 40% plains.
    fn dry_out(&self, graph: &mut TileGraph) -> usize {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut dried = 0;

        for id in graph.ids().collect::<Vec<_>>() {
            if graph.terrain(id).is_some_and(|t| t.is_land()) {
                continue;
            }
            let terrain = match rng.gen_range(0..10) {
                0..=3 => TerrainType::Desert,
                4..=5 => TerrainType::Mountain,
                _ => TerrainType::Plains,
            };
            graph.set_terrain(id, terrain);
            dried += 1;
        }

        dried
    }
}

/// Build and generate a graph in one step.
pub fn generate_map(width: u32, height: u32, seed: u64, kind: GeneratorKind) -> TileGraph {
    let mut graph = TileGraph::new(width, height);
    TerrainGenerator::new(seed, kind).generate(&mut graph);
    graph
}
