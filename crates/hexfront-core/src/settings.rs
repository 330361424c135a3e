//! World settings and configuration.

use crate::clock::{FAST_DAY_SECONDS, NORMAL_DAY_SECONDS};
use crate::mapgen::GeneratorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Radius of the territory a new province claims around its seat.
pub const DEFAULT_PROVINCE_RADIUS: u32 = 3;

/// Largest accepted map side.
pub const MAX_MAP_SIDE: u32 = 512;

/// Configuration for a world session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Seed for terrain generation and the simulation's random stream.
    pub seed: u64,
    /// Terrain pipeline.
    pub generator: GeneratorKind,
    /// Seconds per day at normal speed.
    pub day_seconds: f32,
    /// Seconds per day while fast-forwarding.
    pub fast_day_seconds: f32,
    /// Radius claimed by newly settled provinces.
    pub province_radius: u32,
}

impl WorldSettings {
    /// Create default settings for a map of the given size.
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        Self {
            width,
            height,
            seed,
            ..Self::default()
        }
    }

    /// Same as [`WorldSettings::new`] with every water tile dried out.
    pub fn dry(width: u32, height: u32, seed: u64) -> Self {
        Self {
            generator: GeneratorKind::Dry,
            ..Self::new(width, height, seed)
        }
    }

    /// Validate settings and return the first problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::EmptyMap);
        }
        if self.width > MAX_MAP_SIDE || self.height > MAX_MAP_SIDE {
            return Err(SettingsError::MapTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        if !is_positive(self.day_seconds) || !is_positive(self.fast_day_seconds) {
            return Err(SettingsError::InvalidDayLength);
        }
        if self.fast_day_seconds > self.day_seconds {
            return Err(SettingsError::FastSlowerThanNormal);
        }
        Ok(())
    }

    /// Tile count of the configured map.
    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Real time per day at normal speed.
    pub fn day_interval(&self) -> Duration {
        Duration::from_secs_f32(self.day_seconds)
    }

    /// Real time per day while fast-forwarding.
    pub fn fast_day_interval(&self) -> Duration {
        Duration::from_secs_f32(self.fast_day_seconds)
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            width: 6,
            height: 6,
            seed: 0,
            generator: GeneratorKind::Standard,
            day_seconds: NORMAL_DAY_SECONDS,
            fast_day_seconds: FAST_DAY_SECONDS,
            province_radius: DEFAULT_PROVINCE_RADIUS,
        }
    }
}

fn is_positive(seconds: f32) -> bool {
    seconds.is_finite() && seconds > 0.0
}

/// Errors from invalid world settings.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("map must be at least 1x1")]
    EmptyMap,
    #[error("map {width}x{height} exceeds the {} tile limit per side", MAX_MAP_SIDE)]
    MapTooLarge { width: u32, height: u32 },
    #[error("day lengths must be positive and finite")]
    InvalidDayLength,
    #[error("fast-forward days must not be longer than normal days")]
    FastSlowerThanNormal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = WorldSettings::default();
        assert_eq!((settings.width, settings.height), (6, 6));
        assert_eq!(settings.province_radius, 3);
        assert_eq!(settings.generator, GeneratorKind::Standard);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_dry_settings() {
        let settings = WorldSettings::dry(7, 7, 42);
        assert_eq!(settings.generator, GeneratorKind::Dry);
        assert_eq!(settings.tile_count(), 49);
    }

    #[test]
    fn test_validation_empty_map() {
        let settings = WorldSettings::new(0, 5, 1);
        assert_eq!(settings.validate(), Err(SettingsError::EmptyMap));
    }

    #[test]
    fn test_validation_too_large() {
        let settings = WorldSettings::new(1000, 5, 1);
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::MapTooLarge { width: 1000, .. })
        ));
    }

    #[test]
    fn test_validation_day_lengths() {
        let settings = WorldSettings {
            day_seconds: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::InvalidDayLength));

        let settings = WorldSettings {
            fast_day_seconds: 3.0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::FastSlowerThanNormal));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = WorldSettings::dry(9, 4, 77);
        let json = serde_json::to_string(&settings).unwrap();
        let restored: WorldSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let restored: WorldSettings = serde_json::from_str(r#"{"width": 12, "seed": 5}"#).unwrap();
        assert_eq!(restored.width, 12);
        assert_eq!(restored.height, 6);
        assert_eq!(restored.seed, 5);
        assert_eq!(restored.province_radius, DEFAULT_PROVINCE_RADIUS);
    }
}
