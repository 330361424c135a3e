//! Computer opponent: wanders units, settles and queues production at random.

use crate::scheduler::ActionStatus;
use crate::types::{Day, FactionId};
use crate::unit::UnitType;
use crate::world::{World, WorldError};
use rand::Rng;
use tracing::debug;

/// One day of decisions for an AI faction.
///
/// Units are visited newest first. Each idle unit with range left moves to a
/// random tile of its range six times out of ten; settlers standing on
/// unclaimed land found a province one time in ten (always on day 0). Then
/// every province queues a random unit one time in a hundred (always on day 0).
pub fn run_faction_ai(world: &mut World, id: FactionId, day: Day) -> Result<ActionStatus, WorldError> {
    let units = match world.faction(id) {
        Some(faction) if faction.is_ai() => faction.units.clone(),
        _ => return Ok(ActionStatus::Complete),
    };

    for unit_id in units.into_iter().rev() {
        let Some(unit) = world.unit(unit_id) else {
            continue;
        };
        let (idle, range, unit_type, coord) = (!unit.is_moving(), unit.range(), unit.unit_type, unit.coord);

        if idle && range > 0 && world.rng.gen_range(0..10) <= 5 {
            let reachable = world.movement_range_of(unit_id)?;
            let target = match reachable.len() {
                0 => None,
                len => reachable.iter().nth(world.rng.gen_range(0..len)).copied(),
            };
            if let Some(target) = target {
                if let Err(err) = world.move_unit_to(unit_id, target) {
                    debug!(unit = %unit_id, %target, error = %err, "ai move rejected");
                }
            }
        }

        if unit_type == UnitType::Settler
            && world.tile_faction(coord).is_none()
            && (world.rng.gen_range(0..10) == 2 || day == 0)
        {
            world.perform_special_action(unit_id, None)?;
        }
    }

    let provinces = world
        .faction(id)
        .map(|f| f.provinces.clone())
        .unwrap_or_default();
    for province in provinces {
        if world.rng.gen_range(0..100) == 2 || day == 0 {
            let unit_type = if world.rng.gen_range(0..2) == 0 {
                UnitType::Settler
            } else {
                UnitType::Warrior
            };
            world.produce(province, unit_type)?;
        }
    }

    Ok(ActionStatus::Retain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faction::Controller;
    use crate::hex::HexCoord;
    use crate::types::Rgb;
    use crate::world::tests::{plains_world, with_factions};

    #[test]
    fn test_player_faction_is_ignored() {
        let mut world = plains_world(4, 4);
        let (player, _) = with_factions(&mut world);
        assert_eq!(run_faction_ai(&mut world, player, 0).unwrap(), ActionStatus::Complete);
    }

    #[test]
    fn test_day_zero_settles_and_produces() {
        let mut world = plains_world(10, 10);
        let (_, enemy) = with_factions(&mut world);
        let coord = HexCoord::from_offset(5, 5);
        world.create_unit_at(UnitType::Settler, coord, enemy).unwrap();

        assert_eq!(run_faction_ai(&mut world, enemy, 0).unwrap(), ActionStatus::Retain);

        let faction = world.faction(enemy).unwrap();
        assert_eq!(faction.provinces.len(), 1);
        assert!(faction.units.is_empty());
        let province = world.province(faction.provinces[0]).unwrap();
        assert_eq!(province.queued_count(), 1);
        assert_eq!(province.seat, coord);
    }

    #[test]
    fn test_settler_on_claimed_land_stays() {
        let mut world = plains_world(10, 10);
        let (player, enemy) = with_factions(&mut world);
        let coord = HexCoord::from_offset(5, 5);
        world.create_province_at(coord, player, "Home", 2).unwrap();
        let settler = world.create_unit_at(UnitType::Settler, coord, enemy).unwrap();

        run_faction_ai(&mut world, enemy, 0).unwrap();
        assert!(world.unit(settler).is_some());
        assert!(world.faction(enemy).unwrap().provinces.is_empty());
    }

    #[test]
    fn test_moves_stay_in_range() {
        let mut world = plains_world(12, 12);
        let enemy = world
            .create_faction("enemy", Rgb::BLACK, Rgb::RED, Controller::Ai)
            .unwrap();
        let start = HexCoord::from_offset(6, 6);
        let warrior = world.create_unit_at(UnitType::Warrior, start, enemy).unwrap();
        let reachable = world.movement_range_of(warrior).unwrap();

        for day in 1..20 {
            run_faction_ai(&mut world, enemy, day).unwrap();
            let unit = world.unit(warrior).unwrap();
            if let Some(goal) = unit.movement.path.back() {
                assert!(reachable.contains(goal));
                break;
            }
        }
    }
}
