//! Core identifiers and small value types used throughout the crate.

use serde::{Deserialize, Serialize};

/// Simulation day index. Day 0 is the first day of a world.
pub type Day = u32;

/// Index of a tile in the world's tile array (storage order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub usize);

/// Unique identifier for a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u64);

/// Unique identifier for a province.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProvinceId(pub u32);

/// Unique identifier for a faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

impl std::fmt::Display for ProvinceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "province#{}", self.0)
    }
}

impl std::fmt::Display for FactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "faction#{}", self.0)
    }
}

/// RGB color used for faction borders, terrain and unit markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to hex string (e.g., "#FF0000").
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::new(128, 128, 128) // Gray
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(UnitId(7).to_string(), "unit#7");
        assert_eq!(ProvinceId(2).to_string(), "province#2");
        assert_eq!(FactionId(0).to_string(), "faction#0");
        assert_eq!(TileId(12).to_string(), "tile#12");
    }

    #[test]
    fn test_id_ordering() {
        assert!(UnitId(1) < UnitId(2));
        assert!(ProvinceId(10) > ProvinceId(9));
    }

    #[test]
    fn test_colors() {
        assert_eq!(Rgb::RED.to_hex(), "#FF0000");
        assert_eq!(Rgb::BLUE.to_hex(), "#0000FF");
        assert_eq!(Rgb::default().to_hex(), "#808080");
    }
}
