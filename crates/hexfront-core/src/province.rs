//! Provinces - named groups of owned tiles with a production queue.

use crate::hex::HexCoord;
use crate::types::{Day, FactionId, ProvinceId, TileId};
use crate::unit::UnitType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Days of uninterrupted occupation after which a province changes hands.
pub const CAPTURE_DAYS: Day = 40;

/// A foreign military presence inside a province.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupation {
    /// Day the occupation started.
    pub since: Day,
    /// Faction of the occupying unit.
    pub occupier: FactionId,
}

/// A province owned by one faction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    /// Unique display name.
    pub name: String,
    /// Owning faction.
    pub faction: FactionId,
    /// Tile the province was founded on.
    pub seat: HexCoord,
    /// Claimed tiles in claim order. Production placement walks this order.
    pub tiles: Vec<TileId>,
    pub occupation: Option<Occupation>,
    /// Units due on a given day.
    pub production: BTreeMap<Day, Vec<UnitType>>,
}

impl Province {
    pub fn new(id: ProvinceId, name: impl Into<String>, faction: FactionId, seat: HexCoord) -> Self {
        Self {
            id,
            name: name.into(),
            faction,
            seat,
            tiles: Vec::new(),
            occupation: None,
            production: BTreeMap::new(),
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupation.is_some()
    }

    /// Days the current occupation has lasted on `day`.
    pub fn occupation_days(&self, day: Day) -> Option<Day> {
        self.occupation.map(|o| day.saturating_sub(o.since))
    }

    /// Add a unit to the queue for `day`.
    pub fn queue_unit(&mut self, day: Day, unit_type: UnitType) {
        self.production.entry(day).or_default().push(unit_type);
    }

    /// Remove and return everything due on `day`.
    pub fn take_due(&mut self, day: Day) -> Vec<UnitType> {
        self.production.remove(&day).unwrap_or_default()
    }

    /// Queued units in due-day order.
    pub fn queued(&self) -> impl Iterator<Item = (Day, UnitType)> + '_ {
        self.production
            .iter()
            .flat_map(|(day, types)| types.iter().map(move |t| (*day, *t)))
    }

    pub fn queued_count(&self) -> usize {
        self.production.values().map(Vec::len).sum()
    }
}

/// Offsets `(dx, dz)` of the hexagon of `radius` around a centre, x-major.
pub fn territory_offsets(radius: u32) -> impl Iterator<Item = (i32, i32)> {
    let r = radius as i32;
    (-r..=r).flat_map(move |dx| {
        (-r..=r)
            .filter(move |dz| (dx + dz).abs() <= r)
            .map(move |dz| (dx, dz))
    })
}
