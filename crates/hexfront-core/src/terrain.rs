//! Terrain catalog for world tiles.
//!
//! Every attribute is a `const fn` lookup on the closed [`TerrainType`] enum,
//! so the catalog is fixed at compile time.

use crate::types::Rgb;
use serde::{Deserialize, Serialize};

/// Base terrain type for a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerrainType {
    #[default]
    Ocean,
    Coast,
    Plains,
    Desert,
    Mountain,
}

impl TerrainType {
    /// Display name.
    pub const fn name(&self) -> &'static str {
        match self {
            TerrainType::Ocean => "Ocean",
            TerrainType::Coast => "Coast",
            TerrainType::Plains => "Plains",
            TerrainType::Desert => "Desert",
            TerrainType::Mountain => "Mountain",
        }
    }

    /// Check if this terrain counts as land for generation.
    pub const fn is_land(&self) -> bool {
        !matches!(self, TerrainType::Ocean | TerrainType::Coast)
    }

    /// Check if units may stand on or path through this terrain.
    ///
    /// Water is never walkable; mountains are land but still impassable.
    pub const fn is_walkable(&self) -> bool {
        matches!(self, TerrainType::Plains | TerrainType::Desert)
    }

    /// Days needed to enter a tile of this terrain.
    pub const fn movement_delay(&self) -> u32 {
        match self {
            TerrainType::Desert => 2,
            _ => 1,
        }
    }

    /// Inclusive `(min, max)` range for a tile's base food.
    pub const fn food_range(&self) -> (u32, u32) {
        match self {
            TerrainType::Ocean => (0, 10),
            TerrainType::Coast => (1, 20),
            TerrainType::Plains => (5, 50),
            TerrainType::Desert => (0, 10),
            TerrainType::Mountain => (0, 5),
        }
    }

    /// Presentation color.
    pub const fn color(&self) -> Rgb {
        match self {
            TerrainType::Ocean => Rgb::new(0, 0, 255),
            TerrainType::Coast => Rgb::new(64, 64, 255),
            TerrainType::Plains => Rgb::new(0, 255, 0),
            TerrainType::Desert => Rgb::new(255, 235, 4),
            TerrainType::Mountain => Rgb::new(205, 133, 36),
        }
    }

    /// Single-character glyph for text map dumps.
    pub const fn glyph(&self) -> char {
        match self {
            TerrainType::Ocean => '~',
            TerrainType::Coast => '-',
            TerrainType::Plains => '.',
            TerrainType::Desert => ':',
            TerrainType::Mountain => '^',
        }
    }

    /// Get all terrain variants.
    pub const fn all() -> &'static [TerrainType] {
        &[
            TerrainType::Ocean,
            TerrainType::Coast,
            TerrainType::Plains,
            TerrainType::Desert,
            TerrainType::Mountain,
        ]
    }
}

impl std::fmt::Display for TerrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_and_walkable() {
        assert!(!TerrainType::Ocean.is_land());
        assert!(!TerrainType::Coast.is_land());
        assert!(TerrainType::Plains.is_land());
        assert!(TerrainType::Desert.is_land());
        assert!(TerrainType::Mountain.is_land());

        assert!(TerrainType::Plains.is_walkable());
        assert!(TerrainType::Desert.is_walkable());
        assert!(!TerrainType::Mountain.is_walkable());
    }

    #[test]
    fn test_non_land_is_never_walkable() {
        for terrain in TerrainType::all() {
            if !terrain.is_land() {
                assert!(!terrain.is_walkable(), "{} should not be walkable", terrain);
            }
        }
    }

    #[test]
    fn test_movement_delay() {
        assert_eq!(TerrainType::Desert.movement_delay(), 2);
        assert_eq!(TerrainType::Plains.movement_delay(), 1);
    }

    #[test]
    fn test_food_ranges_ordered() {
        for terrain in TerrainType::all() {
            let (min, max) = terrain.food_range();
            assert!(min <= max);
        }
        assert_eq!(TerrainType::Plains.food_range(), (5, 50));
    }

    #[test]
    fn test_display() {
        assert_eq!(TerrainType::Mountain.to_string(), "Mountain");
        assert_eq!(TerrainType::default(), TerrainType::Ocean);
    }
}
