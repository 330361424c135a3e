//! Day tasks run by the scheduler against the [`World`].
//!
//! Tasks hold ids, never references. A task whose entity has disappeared
//! completes quietly on its next run.

use crate::ai::run_faction_ai;
use crate::combat::resolve_unit_combat;
use crate::hex::HexCoord;
use crate::notice::Notice;
use crate::province::{Occupation, CAPTURE_DAYS};
use crate::scheduler::{ActionStatus, BoxError, DayAction};
use crate::types::{Day, FactionId, ProvinceId, UnitId};
use crate::world::{Layer, World, WorldError};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A recurring piece of simulation work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldTask {
    /// Occupation, capture and production for one province.
    ProvinceTick(ProvinceId),
    /// Decisions for one AI faction.
    FactionAi(FactionId),
    /// Fights and captures on one military unit's tile.
    UnitCombat(UnitId),
    /// Range regeneration for one unit.
    UnitRest(UnitId),
    /// Step-by-step path following for one unit.
    UnitMovement(UnitId),
}

impl DayAction<World> for WorldTask {
    fn label(&self) -> String {
        match self {
            WorldTask::ProvinceTick(id) => format!("province-tick {}", id),
            WorldTask::FactionAi(id) => format!("faction-ai {}", id),
            WorldTask::UnitCombat(id) => format!("unit-combat {}", id),
            WorldTask::UnitRest(id) => format!("unit-rest {}", id),
            WorldTask::UnitMovement(id) => format!("unit-movement {}", id),
        }
    }

    fn on_day(&mut self, day: Day, world: &mut World) -> Result<ActionStatus, BoxError> {
        let status = match *self {
            WorldTask::ProvinceTick(id) => province_tick(world, id, day)?,
            WorldTask::FactionAi(id) => run_faction_ai(world, id, day)?,
            WorldTask::UnitCombat(id) => resolve_unit_combat(world, id, day)?,
            WorldTask::UnitRest(id) => unit_rest(world, id, day),
            WorldTask::UnitMovement(id) => unit_movement(world, id, day)?,
        };
        Ok(status)
    }
}

/// Occupation bookkeeping, capture and production for one province.
pub fn province_tick(world: &mut World, id: ProvinceId, day: Day) -> Result<ActionStatus, WorldError> {
    let Some(province) = world.provinces.get(&id) else {
        return Ok(ActionStatus::Complete);
    };
    let owner = province.faction;
    let name = province.name.clone();

    // Military factions present on each tile of the province.
    let mut garrisons: BTreeMap<HexCoord, Vec<FactionId>> = BTreeMap::new();
    for unit in world.units.values().filter(|u| u.is_military()) {
        garrisons.entry(unit.coord).or_default().push(unit.faction);
    }

    let mut occupier = None;
    for tile in world.tile_ids_of(id) {
        let Some(present) = garrisons.get(&world.graph[tile].coord) else {
            continue;
        };
        if present.contains(&owner) {
            continue;
        }
        if let Some(enemy) = present.iter().copied().find(|f| *f != owner) {
            occupier = Some(enemy);
            break;
        }
    }

    let owner_is_player = world.is_player(owner);
    let previous = world.provinces.get(&id).and_then(|p| p.occupation);
    let occupation = match (previous, occupier) {
        (None, Some(faction)) => {
            if owner_is_player {
                world.notify(Notice::OccupationStarted {
                    province: id,
                    name: name.clone(),
                });
            }
            info!(province = %id, occupier = %faction, day, "occupation started");
            Some(Occupation {
                since: day,
                occupier: faction,
            })
        }
        (Some(_), None) => {
            if owner_is_player {
                world.notify(Notice::OccupationEnded {
                    province: id,
                    name: name.clone(),
                });
            }
            info!(province = %id, day, "occupation ended");
            None
        }
        (Some(current), Some(faction)) => Some(Occupation {
            occupier: faction,
            ..current
        }),
        (None, None) => None,
    };

    if let Some(province) = world.provinces.get_mut(&id) {
        province.occupation = occupation;
    }

    if let Some(occupation) = occupation {
        if day.saturating_sub(occupation.since) >= CAPTURE_DAYS {
            if let Some(province) = world.provinces.get_mut(&id) {
                province.occupation = None;
                province.production.clear();
            }
            world.take_province(id, occupation.occupier)?;
            if owner_is_player {
                world.notify(Notice::ProvinceLost {
                    province: id,
                    name: name.clone(),
                });
            }
            if world.is_player(occupation.occupier) {
                world.notify(Notice::ProvinceCaptured {
                    province: id,
                    name: name.clone(),
                });
            }
            info!(province = %id, from = %owner, to = %occupation.occupier, day, "province captured");
        }
    }

    produce_due_units(world, id, day, &name)?;
    Ok(ActionStatus::Retain)
}

fn produce_due_units(world: &mut World, id: ProvinceId, day: Day, name: &str) -> Result<(), WorldError> {
    let Some(province) = world.provinces.get_mut(&id) else {
        return Ok(());
    };
    let due = province.take_due(day);
    if due.is_empty() {
        return Ok(());
    }

    if province.is_occupied() {
        for unit_type in due {
            province.queue_unit(day + 1, unit_type);
        }
        world.notify(Notice::ProductionDelayed {
            province: id,
            name: name.to_string(),
            until: day + 1,
        });
        return Ok(());
    }

    let owner = province.faction;
    for unit_type in due {
        match world.free_tile_in(id, unit_type.stats().category) {
            Some(coord) => {
                world.create_unit_at(unit_type, coord, owner)?;
                debug!(province = %id, %unit_type, %coord, day, "unit produced");
            }
            None => {
                if let Some(province) = world.provinces.get_mut(&id) {
                    province.queue_unit(day + 1, unit_type);
                }
                debug!(province = %id, %unit_type, day, "no room to place unit, retrying tomorrow");
            }
        }
    }
    Ok(())
}

/// Regain one point of range after resting long enough.
pub fn unit_rest(world: &mut World, id: UnitId, day: Day) -> ActionStatus {
    let selected = world.selected == Some(id);
    let Some(unit) = world.units.get_mut(&id) else {
        return ActionStatus::Complete;
    };
    if unit.movement.moving {
        return ActionStatus::Retain;
    }

    let stats = unit.stats();
    let movement = &mut unit.movement;
    if movement.range < stats.movement_range
        && day.saturating_sub(movement.last_measured_day) >= stats.regen_rate
    {
        movement.range += 1;
        movement.last_measured_day = day;
        if selected {
            world.invalidate(Layer::Units);
        }
    }
    ActionStatus::Retain
}

/// Advance a unit one tile along its path when the arrival day is reached.
pub fn unit_movement(world: &mut World, id: UnitId, day: Day) -> Result<ActionStatus, WorldError> {
    let Some(unit) = world.units.get_mut(&id) else {
        return Ok(ActionStatus::Complete);
    };
    let Some(next) = unit.movement.path.front().copied().filter(|_| unit.movement.moving) else {
        unit.movement.moving = false;
        unit.movement.task_active = false;
        return Ok(ActionStatus::Complete);
    };

    if day >= unit.movement.arrival_day {
        if world.can_move_to_tile(id, next)? {
            let following = {
                let unit = world.units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))?;
                unit.coord = next;
                unit.movement.path.pop_front();
                unit.movement.range = unit.movement.range.saturating_sub(1);
                unit.movement.path.front().copied()
            };
            if let Some(following) = following {
                let delay = world
                    .graph
                    .tile_at(following)
                    .map_or(1, |t| t.terrain.movement_delay());
                if let Some(unit) = world.units.get_mut(&id) {
                    unit.movement.arrival_day = day + delay;
                }
            }
            world.invalidate(Layer::Units);
            debug!(unit = %id, coord = %next, day, "unit stepped");
        } else {
            let unit_type = {
                let unit = world.units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))?;
                unit.movement.cancel();
                unit.unit_type
            };
            world.invalidate(Layer::Units);
            world.notify(Notice::MovementCanceled {
                unit: id,
                unit_type,
                blocked: next,
            });
        }
    }

    let unit = world.units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))?;
    unit.movement.last_measured_day = day;
    unit.movement.moving = !unit.movement.path.is_empty();
    if unit.movement.moving {
        Ok(ActionStatus::Retain)
    } else {
        unit.movement.task_active = false;
        Ok(ActionStatus::Complete)
    }
}
