//! Unit system - military and civilian units and their movement state.

use crate::hex::HexCoord;
use crate::types::{Day, FactionId, Rgb, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A unit on the world map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Type of unit.
    pub unit_type: UnitType,
    /// Owning faction.
    pub faction: FactionId,
    /// Current position on the map.
    pub coord: HexCoord,
    /// Path, range and timing of the unit's movement.
    pub movement: MovementState,
}

impl Unit {
    /// Create a new unit with full range, created on `day`.
    pub fn new(id: UnitId, unit_type: UnitType, faction: FactionId, coord: HexCoord, day: Day) -> Self {
        Self {
            id,
            unit_type,
            faction,
            coord,
            movement: MovementState::new(unit_type.stats().movement_range, day),
        }
    }

    pub fn stats(&self) -> UnitStats {
        self.unit_type.stats()
    }

    pub fn category(&self) -> UnitCategory {
        self.unit_type.stats().category
    }

    pub fn is_military(&self) -> bool {
        self.category() == UnitCategory::Military
    }

    pub fn is_civilian(&self) -> bool {
        self.category() == UnitCategory::Civilian
    }

    pub fn is_moving(&self) -> bool {
        self.movement.moving
    }

    /// Remaining range in tiles.
    pub fn range(&self) -> u32 {
        self.movement.range
    }
}

/// In-flight movement and range bookkeeping for a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementState {
    /// Tiles still to enter, next tile first.
    pub path: VecDeque<HexCoord>,
    /// Tiles the unit can still move this stretch.
    pub range: u32,
    /// Whether the unit is following a path.
    pub moving: bool,
    /// Day the unit may enter the next path tile.
    pub arrival_day: Day,
    /// Last day movement or regeneration was accounted for.
    pub last_measured_day: Day,
    /// A movement task is registered for this unit.
    pub task_active: bool,
}

impl MovementState {
    pub fn new(range: u32, day: Day) -> Self {
        Self {
            path: VecDeque::new(),
            range,
            moving: false,
            arrival_day: day,
            last_measured_day: day,
            task_active: false,
        }
    }

    /// Stop moving and forget the remaining path.
    pub fn cancel(&mut self) {
        self.moving = false;
        self.path.clear();
    }
}

/// Whether a unit fights or not. Occupancy rules are per category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    Military,
    Civilian,
}

/// The unit-specific command a unit type offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialAction {
    /// Found a province on the unit's tile, consuming the unit.
    Settle,
    /// Attack a unit in range.
    Attack,
}

impl SpecialAction {
    pub const fn label(&self) -> &'static str {
        match self {
            SpecialAction::Settle => "Settle",
            SpecialAction::Attack => "Attack",
        }
    }
}

/// Types of units available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Settler,
    Warrior,
}

impl UnitType {
    /// Get the stats for this unit type.
    pub const fn stats(&self) -> UnitStats {
        match self {
            UnitType::Settler => {
                UnitStats::civilian(3, 2, 45, SpecialAction::Settle, Rgb::new(0, 255, 255))
            }
            UnitType::Warrior => UnitStats::military(5, 1, 25, 1, SpecialAction::Attack, Rgb::RED),
        }
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        match self {
            UnitType::Settler => "Settler",
            UnitType::Warrior => "Warrior",
        }
    }

    /// Get all unit types.
    pub const fn all() -> &'static [UnitType] {
        &[UnitType::Settler, UnitType::Warrior]
    }

    /// Look a unit type up by name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<UnitType> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Stats for a unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Tiles a unit can move with full range.
    pub movement_range: u32,
    /// Days of rest needed to regain one point of range.
    pub regen_rate: u32,
    /// Days a province needs to produce the unit.
    pub production_time: u32,
    /// Attack range in tiles (0 for non-combatants).
    pub attack_range: u32,
    /// Unit category.
    pub category: UnitCategory,
    /// The unit's special command.
    pub special: SpecialAction,
    /// Presentation color.
    pub color: Rgb,
}

impl UnitStats {
    /// Create civilian unit stats.
    pub const fn civilian(
        movement_range: u32,
        regen_rate: u32,
        production_time: u32,
        special: SpecialAction,
        color: Rgb,
    ) -> Self {
        Self {
            movement_range,
            regen_rate,
            production_time,
            attack_range: 0,
            category: UnitCategory::Civilian,
            special,
            color,
        }
    }

    /// Create military unit stats.
    pub const fn military(
        movement_range: u32,
        regen_rate: u32,
        production_time: u32,
        attack_range: u32,
        special: SpecialAction,
        color: Rgb,
    ) -> Self {
        Self {
            movement_range,
            regen_rate,
            production_time,
            attack_range,
            category: UnitCategory::Military,
            special,
            color,
        }
    }
}
