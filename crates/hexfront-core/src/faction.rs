//! Factions - who owns provinces and units.

use crate::types::{FactionId, ProvinceId, Rgb, UnitId};
use serde::{Deserialize, Serialize};

/// Name of the faction controlled by the local player.
pub const PLAYER_FACTION: &str = "player";

/// Name of the computer-controlled opponent.
pub const ENEMY_FACTION: &str = "enemy";

/// Who drives a faction's decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// Commands come from the host.
    Player,
    /// A faction AI task runs every day.
    Ai,
}

/// A faction and the ids of everything it owns.
///
/// The id lists are kept in acquisition order; the AI iterates them, so the
/// order is part of the simulation's determinism.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub primary: Rgb,
    pub secondary: Rgb,
    pub controller: Controller,
    pub provinces: Vec<ProvinceId>,
    pub units: Vec<UnitId>,
}

impl Faction {
    pub fn new(id: FactionId, name: &str, primary: Rgb, secondary: Rgb, controller: Controller) -> Self {
        Self {
            id,
            name: normalize_name(name),
            primary,
            secondary,
            controller,
            provinces: Vec::new(),
            units: Vec::new(),
        }
    }

    pub fn is_ai(&self) -> bool {
        self.controller == Controller::Ai
    }

    pub fn owns_unit(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    pub fn owns_province(&self, province: ProvinceId) -> bool {
        self.provinces.contains(&province)
    }

    pub(crate) fn add_unit(&mut self, unit: UnitId) {
        if !self.units.contains(&unit) {
            self.units.push(unit);
        }
    }

    pub(crate) fn remove_unit(&mut self, unit: UnitId) {
        self.units.retain(|u| *u != unit);
    }

    pub(crate) fn add_province(&mut self, province: ProvinceId) {
        if !self.provinces.contains(&province) {
            self.provinces.push(province);
        }
    }

    pub(crate) fn remove_province(&mut self, province: ProvinceId) {
        self.provinces.retain(|p| *p != province);
    }
}

/// Canonical form of a faction name: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faction() -> Faction {
        Faction::new(FactionId(1), "  Enemy ", Rgb::BLACK, Rgb::RED, Controller::Ai)
    }

    #[test]
    fn test_name_is_normalized() {
        assert_eq!(faction().name, ENEMY_FACTION);
        assert_eq!(normalize_name(" PLAYER"), PLAYER_FACTION);
    }

    #[test]
    fn test_unit_membership_is_unique() {
        let mut f = faction();
        f.add_unit(UnitId(3));
        f.add_unit(UnitId(3));
        f.add_unit(UnitId(4));
        assert_eq!(f.units, vec![UnitId(3), UnitId(4)]);
        f.remove_unit(UnitId(3));
        assert!(!f.owns_unit(UnitId(3)));
        assert!(f.owns_unit(UnitId(4)));
    }

    #[test]
    fn test_province_membership() {
        let mut f = faction();
        f.add_province(ProvinceId(0));
        assert!(f.owns_province(ProvinceId(0)));
        f.remove_province(ProvinceId(0));
        assert!(f.provinces.is_empty());
    }

    #[test]
    fn test_controller() {
        assert!(faction().is_ai());
        let player = Faction::new(FactionId(0), "player", Rgb::BLUE, Rgb::WHITE, Controller::Player);
        assert!(!player.is_ai());
    }
}
