//! Combat between units sharing a tile.
//!
//! Each military unit checks its own tile once per day. If an enemy military
//! unit is there, one coin flip decides which of the two is destroyed. If only
//! enemy civilians are there, they are captured.

use crate::hex::HexCoord;
use crate::notice::Notice;
use crate::scheduler::ActionStatus;
use crate::types::{Day, FactionId, UnitId};
use crate::unit::UnitType;
use crate::world::{World, WorldError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of a battle between two military units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker: UnitId,
    pub defender: UnitId,
    /// Whether the unit that checked its tile lost.
    pub attacker_destroyed: bool,
    pub coord: HexCoord,
}

impl CombatResult {
    pub fn winner(&self) -> UnitId {
        if self.attacker_destroyed {
            self.defender
        } else {
            self.attacker
        }
    }

    pub fn loser(&self) -> UnitId {
        if self.attacker_destroyed {
            self.attacker
        } else {
            self.defender
        }
    }
}

/// What happened on a unit's tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Engagement {
    /// No enemies present.
    Quiet,
    Battle(CombatResult),
    /// Enemy civilians taken over, in id order.
    Captured(Vec<UnitId>),
}

/// Resolve whatever the military unit `id` finds on its tile.
pub fn engage(world: &mut World, id: UnitId) -> Result<Engagement, WorldError> {
    let unit = world.unit(id).ok_or(WorldError::UnknownUnit(id))?;
    let (coord, faction) = (unit.coord, unit.faction);
    let at = world.units_at(coord);

    let enemy = at
        .military
        .iter()
        .copied()
        .find(|other| world.unit(*other).is_some_and(|u| u.faction != faction));

    if let Some(defender) = enemy {
        let attacker_destroyed = world.rng.gen_bool(0.5);
        let result = CombatResult {
            attacker: id,
            defender,
            attacker_destroyed,
            coord,
        };
        let winner_faction = faction_of(world, result.winner())?;
        let lost = world.delete_unit(result.loser())?;
        report_battle(world, lost.faction, lost.unit_type, winner_faction, coord);
        debug!(attacker = %id, %defender, attacker_destroyed, %coord, "battle resolved");
        return Ok(Engagement::Battle(result));
    }

    let captives: Vec<UnitId> = at
        .civilian
        .iter()
        .copied()
        .filter(|other| world.unit(*other).is_some_and(|u| u.faction != faction))
        .collect();
    for captive in &captives {
        let unit_type = world
            .unit(*captive)
            .map(|u| u.unit_type)
            .ok_or(WorldError::UnknownUnit(*captive))?;
        let previous = world.capture_unit(*captive, faction)?;
        if world.is_player(faction) {
            world.notify(Notice::EnemyUnitCaptured {
                unit: *captive,
                unit_type,
                coord,
            });
        } else if world.is_player(previous) {
            world.notify(Notice::UnitCaptured {
                unit: *captive,
                unit_type,
                coord,
            });
        }
    }

    if captives.is_empty() {
        Ok(Engagement::Quiet)
    } else {
        Ok(Engagement::Captured(captives))
    }
}

fn faction_of(world: &World, id: UnitId) -> Result<FactionId, WorldError> {
    world
        .unit(id)
        .map(|u| u.faction)
        .ok_or(WorldError::UnknownUnit(id))
}

fn report_battle(world: &mut World, loser: FactionId, unit_type: UnitType, winner: FactionId, coord: HexCoord) {
    if world.is_player(loser) {
        world.notify(Notice::UnitLost { unit_type, coord });
    } else if world.is_player(winner) {
        world.notify(Notice::EnemyUnitDestroyed { unit_type, coord });
    }
}

/// Daily combat check for one military unit.
pub fn resolve_unit_combat(world: &mut World, id: UnitId, day: Day) -> Result<ActionStatus, WorldError> {
    match world.unit(id) {
        Some(unit) if unit.is_military() => {}
        _ => return Ok(ActionStatus::Complete),
    }

    match engage(world, id)? {
        Engagement::Battle(result) if result.attacker_destroyed => {
            debug!(unit = %id, day, "unit fell in battle");
            Ok(ActionStatus::Complete)
        }
        _ => Ok(ActionStatus::Retain),
    }
}
