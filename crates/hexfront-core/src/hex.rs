//! Hex coordinate system for the world map.
//!
//! Tiles are addressed with axial coordinates `(x, z)`; the third cube
//! component `y` is always derived as `-x - z`, so a [`HexCoord`] built through
//! the public constructors can never leave the `x + y + z = 0` plane.
//!
//! Storage uses brick-offset coordinates (`col`, `row`) where odd rows are
//! shifted half a tile east. World-space positions use a flat plane with the
//! tile centres laid out in rows along `z`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance from a tile centre to any of its corners.
pub const OUTER_RADIUS: f32 = 10.0;

/// Distance from a tile centre to the middle of any of its edges.
pub const INNER_RADIUS: f32 = OUTER_RADIUS * 0.866_025_4;

/// Errors raised when building coordinates from raw cube components.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("cube coordinate ({x}, {y}, {z}) does not sum to zero")]
    NotOnPlane { x: i32, y: i32, z: i32 },
}

/// The six edges of a hex tile, clockwise from north-east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HexEdge {
    NE,
    E,
    SE,
    SW,
    W,
    NW,
}

impl HexEdge {
    /// All edges in index order.
    pub const ALL: [HexEdge; 6] = [
        HexEdge::NE,
        HexEdge::E,
        HexEdge::SE,
        HexEdge::SW,
        HexEdge::W,
        HexEdge::NW,
    ];

    /// Index of this edge (0-5).
    pub const fn index(&self) -> usize {
        match self {
            HexEdge::NE => 0,
            HexEdge::E => 1,
            HexEdge::SE => 2,
            HexEdge::SW => 3,
            HexEdge::W => 4,
            HexEdge::NW => 5,
        }
    }

    /// Edge for an index, wrapping modulo 6.
    pub const fn from_index(index: usize) -> HexEdge {
        Self::ALL[index % 6]
    }

    /// The edge on the far side of the tile: `(i + 3) mod 6`.
    pub const fn opposite(&self) -> HexEdge {
        Self::from_index(self.index() + 3)
    }

    /// Axial offset `(dx, dz)` of the neighbour across this edge.
    pub const fn direction(&self) -> (i32, i32) {
        match self {
            HexEdge::NE => (0, 1),
            HexEdge::E => (1, 0),
            HexEdge::SE => (1, -1),
            HexEdge::SW => (0, -1),
            HexEdge::W => (-1, 0),
            HexEdge::NW => (-1, 1),
        }
    }
}

impl std::fmt::Display for HexEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HexEdge::NE => "NE",
            HexEdge::E => "E",
            HexEdge::SE => "SE",
            HexEdge::SW => "SW",
            HexEdge::W => "W",
            HexEdge::NW => "NW",
        };
        f.write_str(name)
    }
}

/// A point on the world plane (`y` is up and ignored by the grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f32,
    pub z: f32,
}

impl WorldPosition {
    #[inline]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

/// One quarter of a tile, relative to its centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Quadrant {
    pub const fn is_north(&self) -> bool {
        matches!(self, Quadrant::NorthEast | Quadrant::NorthWest)
    }

    pub const fn is_east(&self) -> bool {
        matches!(self, Quadrant::NorthEast | Quadrant::SouthEast)
    }
}

/// Axial hex coordinate.
///
/// - `x` runs east along a row
/// - `z` is the row
/// - `y` is derived and never stored
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct HexCoord {
    /// Axial column.
    pub x: i32,
    /// Row.
    pub z: i32,
}

impl PartialOrd for HexCoord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HexCoord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Row-major ordering for deterministic iteration
        (self.z, self.x).cmp(&(other.z, other.x))
    }
}

impl HexCoord {
    /// Create a new hex coordinate.
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The derived third cube component.
    #[inline]
    pub const fn y(&self) -> i32 {
        -self.x - self.z
    }

    /// Build from all three cube components, rejecting triples off the plane.
    pub fn try_from_cube(x: i32, y: i32, z: i32) -> Result<Self, HexError> {
        if x + y + z != 0 {
            return Err(HexError::NotOnPlane { x, y, z });
        }
        Ok(Self::new(x, z))
    }

    /// Convert brick-offset storage coordinates into axial coordinates.
    #[inline]
    pub const fn from_offset(col: i32, row: i32) -> Self {
        Self::new(col - row / 2, row)
    }

    /// Storage column of this coordinate.
    #[inline]
    pub const fn offset_x(&self) -> i32 {
        self.x + self.z / 2
    }

    /// Storage row of this coordinate.
    #[inline]
    pub const fn offset_z(&self) -> i32 {
        self.z
    }

    /// Centre of this tile on the world plane.
    pub fn to_position(&self) -> WorldPosition {
        let offset_x = self.offset_x() as f32;
        let offset_z = self.offset_z();
        let shift = offset_z as f32 * 0.5 - (offset_z / 2) as f32;
        WorldPosition {
            x: (offset_x + shift) * (INNER_RADIUS * 2.0),
            z: offset_z as f32 * (OUTER_RADIUS * 1.5),
        }
    }

    /// The tile containing a world position.
    ///
    /// Rounds the fractional cube coordinate and, when rounding breaks the
    /// zero-sum rule, rebuilds the component that drifted furthest.
    pub fn from_position(position: WorldPosition) -> Self {
        let mut x = position.x / (INNER_RADIUS * 2.0);
        let mut y = -x;

        let offset = position.z / (OUTER_RADIUS * 3.0);
        x -= offset;
        y -= offset;
        let z = -x - y;

        let mut ix = x.round() as i32;
        let iy = y.round() as i32;
        let mut iz = z.round() as i32;

        if ix + iy + iz != 0 {
            let dx = (x - ix as f32).abs();
            let dy = (y - iy as f32).abs();
            let dz = (z - iz as f32).abs();

            if dx > dy && dx > dz {
                ix = -iy - iz;
            } else if dz > dy {
                iz = -ix - iy;
            }
        }

        Self::new(ix, iz)
    }

    /// Which quarter of this tile a world position falls in.
    pub fn quadrant_of(&self, position: WorldPosition) -> Quadrant {
        let centre = self.to_position();
        let north = position.z - centre.z >= 0.0;
        let east = position.x - centre.x >= 0.0;
        match (north, east) {
            (true, true) => Quadrant::NorthEast,
            (true, false) => Quadrant::NorthWest,
            (false, true) => Quadrant::SouthEast,
            (false, false) => Quadrant::SouthWest,
        }
    }

    /// Undivided cube distance: `|dx| + |dy| + |dz|`.
    ///
    /// This is twice the step count between the two tiles; pathfinding and
    /// terrain generation rely on this scale.
    pub fn distance(&self, other: &HexCoord) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y() - other.y()).unsigned_abs();
        let dz = (self.z - other.z).unsigned_abs();
        dx + dy + dz
    }

    /// The neighbouring coordinate across `edge`.
    #[inline]
    pub const fn neighbor(&self, edge: HexEdge) -> HexCoord {
        let (dx, dz) = edge.direction();
        HexCoord::new(self.x + dx, self.z + dz)
    }

    /// All 6 neighbouring coordinates in edge order: NE, E, SE, SW, W, NW.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        HexEdge::ALL.map(|edge| self.neighbor(edge))
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y(), self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_y() {
        let coord = HexCoord::new(3, -5);
        assert_eq!(coord.x, 3);
        assert_eq!(coord.z, -5);
        assert_eq!(coord.y(), 2);
        assert_eq!(coord.x + coord.y() + coord.z, 0);
    }

    #[test]
    fn test_try_from_cube() {
        assert_eq!(HexCoord::try_from_cube(1, -3, 2), Ok(HexCoord::new(1, 2)));
        assert_eq!(
            HexCoord::try_from_cube(1, 1, 1),
            Err(HexError::NotOnPlane { x: 1, y: 1, z: 1 })
        );
    }

    #[test]
    fn test_from_offset() {
        assert_eq!(HexCoord::from_offset(0, 0), HexCoord::new(0, 0));
        assert_eq!(HexCoord::from_offset(3, 1), HexCoord::new(3, 1));
        assert_eq!(HexCoord::from_offset(3, 2), HexCoord::new(2, 2));
        assert_eq!(HexCoord::from_offset(0, 5), HexCoord::new(-2, 5));
    }

    #[test]
    fn test_offset_roundtrip() {
        for row in 0..8 {
            for col in 0..8 {
                let coord = HexCoord::from_offset(col, row);
                assert_eq!(coord.offset_x(), col);
                assert_eq!(coord.offset_z(), row);
            }
        }
    }

    #[test]
    fn test_to_position() {
        let origin = HexCoord::from_offset(0, 0).to_position();
        assert_eq!(origin, WorldPosition::new(0.0, 0.0));

        // Odd rows are shifted half a tile east.
        let odd = HexCoord::from_offset(0, 1).to_position();
        assert!((odd.x - INNER_RADIUS).abs() < 1e-4);
        assert!((odd.z - 15.0).abs() < 1e-4);

        let even = HexCoord::from_offset(2, 2).to_position();
        assert!((even.x - 4.0 * INNER_RADIUS).abs() < 1e-4);
        assert!((even.z - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_from_position_centres() {
        for row in 0..10 {
            for col in 0..10 {
                let coord = HexCoord::from_offset(col, row);
                assert_eq!(HexCoord::from_position(coord.to_position()), coord);
            }
        }
    }

    #[test]
    fn test_from_position_near_centre() {
        let coord = HexCoord::from_offset(4, 3);
        let centre = coord.to_position();
        let nudged = WorldPosition::new(centre.x + 3.0, centre.z - 4.0);
        assert_eq!(HexCoord::from_position(nudged), coord);
    }

    #[test]
    fn test_quadrant_of() {
        let coord = HexCoord::new(2, 2);
        let c = coord.to_position();
        assert_eq!(
            coord.quadrant_of(WorldPosition::new(c.x + 1.0, c.z + 1.0)),
            Quadrant::NorthEast
        );
        assert_eq!(
            coord.quadrant_of(WorldPosition::new(c.x - 1.0, c.z - 1.0)),
            Quadrant::SouthWest
        );
        assert!(Quadrant::SouthEast.is_east());
        assert!(!Quadrant::SouthEast.is_north());
    }

    #[test]
    fn test_distance_same_hex() {
        let coord = HexCoord::new(5, 5);
        assert_eq!(coord.distance(&coord), 0);
    }

    #[test]
    fn test_distance_is_undivided() {
        let coord = HexCoord::new(5, 5);
        for neighbor in coord.neighbors() {
            assert_eq!(coord.distance(&neighbor), 2);
        }
        assert_eq!(HexCoord::new(0, 0).distance(&HexCoord::new(3, -1)), 6);
    }

    #[test]
    fn test_edge_opposite() {
        for edge in HexEdge::ALL {
            assert_eq!(edge.opposite().opposite(), edge);
            assert_eq!(edge.opposite().index(), (edge.index() + 3) % 6);
        }
        assert_eq!(HexEdge::NE.opposite(), HexEdge::SW);
        assert_eq!(HexEdge::W.opposite(), HexEdge::E);
    }

    #[test]
    fn test_neighbor_directions_cancel() {
        let coord = HexCoord::new(-2, 7);
        for edge in HexEdge::ALL {
            assert_eq!(coord.neighbor(edge).neighbor(edge.opposite()), coord);
        }
    }

    #[test]
    fn test_display() {
        let coord = HexCoord::new(3, 7);
        assert_eq!(format!("{}", coord), "(3, -10, 7)");
        assert_eq!(HexEdge::SW.to_string(), "SW");
    }
}
