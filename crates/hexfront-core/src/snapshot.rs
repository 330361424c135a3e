//! Save format: a self-contained, serializable copy of a [`World`].
//!
//! Scheduler state is not stored. Day tasks are rebuilt from the entities on
//! restore, in a fixed order (AI factions, units, provinces, movements).

use crate::faction::Faction;
use crate::hex::HexCoord;
use crate::map::TileGraph;
use crate::notice::NoticeQueue;
use crate::province::{Occupation, Province};
use crate::scheduler::Registrar;
use crate::settings::{SettingsError, WorldSettings};
use crate::tasks::WorldTask;
use crate::terrain::TerrainType;
use crate::types::{Day, FactionId, ProvinceId, UnitId};
use crate::unit::{Unit, UnitType};
use crate::world::{IdCounters, InvalidationFlags, World};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

/// Current save format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors from reading or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {0} (expected {})", SNAPSHOT_VERSION)]
    UnsupportedVersion(u32),
    #[error("snapshot has {found} tiles, settings call for {expected}")]
    TileCount { expected: usize, found: usize },
    #[error("{0} lies outside the map")]
    OffMap(HexCoord),
    #[error("tile {0} is claimed by more than one province")]
    DoubleClaim(HexCoord),
    #[error("{entity} refers to unknown faction {faction}")]
    UnknownFaction { entity: String, faction: FactionId },
    #[error("duplicate id {0}")]
    DuplicateId(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Saved state of one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub terrain: TerrainType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_food: Option<u32>,
}

/// Saved province, with its tiles as coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceRecord {
    pub id: ProvinceId,
    pub name: String,
    pub faction: FactionId,
    pub seat: HexCoord,
    pub tiles: Vec<HexCoord>,
    pub occupation: Option<Occupation>,
    pub production: BTreeMap<Day, Vec<UnitType>>,
}

/// Everything needed to resume a world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub settings: WorldSettings,
    pub day: Day,
    /// Tiles in storage order.
    pub tiles: Vec<TileRecord>,
    pub factions: Vec<Faction>,
    pub provinces: Vec<ProvinceRecord>,
    pub units: Vec<Unit>,
    pub next_ids: IdCounters,
    pub selected: Option<UnitId>,
    pub rng: ChaCha8Rng,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl World {
    /// Capture the world's state.
    pub fn snapshot(&self) -> WorldSnapshot {
        let provinces = self
            .provinces
            .values()
            .map(|p| ProvinceRecord {
                id: p.id,
                name: p.name.clone(),
                faction: p.faction,
                seat: p.seat,
                tiles: p.tiles.iter().map(|t| self.graph[*t].coord).collect(),
                occupation: p.occupation,
                production: p.production.clone(),
            })
            .collect();

        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            settings: self.settings.clone(),
            day: self.day,
            tiles: self
                .graph
                .iter()
                .map(|t| TileRecord {
                    terrain: t.terrain,
                    base_food: t.base_food,
                })
                .collect(),
            factions: self.factions.values().cloned().collect(),
            provinces,
            units: self.units.values().cloned().collect(),
            next_ids: self.next_ids,
            selected: self.selected,
            rng: self.rng.clone(),
        }
    }

    /// Rebuild a world from a snapshot, registering its day tasks with `tasks`.
    pub fn restore(snapshot: WorldSnapshot, tasks: Registrar<World>) -> Result<World, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        snapshot.settings.validate()?;

        let mut graph = TileGraph::new(snapshot.settings.width, snapshot.settings.height);
        if graph.len() != snapshot.tiles.len() {
            return Err(SnapshotError::TileCount {
                expected: graph.len(),
                found: snapshot.tiles.len(),
            });
        }
        for (id, record) in graph.ids().collect::<Vec<_>>().into_iter().zip(&snapshot.tiles) {
            if let Some(tile) = graph.tile_mut(id) {
                tile.terrain = record.terrain;
                tile.base_food = record.base_food;
            }
        }

        let mut factions = BTreeMap::new();
        for faction in snapshot.factions {
            let id = faction.id;
            if factions.insert(id, faction).is_some() {
                return Err(SnapshotError::DuplicateId(id.to_string()));
            }
        }

        let mut provinces = BTreeMap::new();
        for record in snapshot.provinces {
            if !factions.contains_key(&record.faction) {
                return Err(SnapshotError::UnknownFaction {
                    entity: record.id.to_string(),
                    faction: record.faction,
                });
            }
            let mut province = Province::new(record.id, record.name, record.faction, record.seat);
            province.occupation = record.occupation;
            province.production = record.production;
            for coord in record.tiles {
                let tile_id = graph.tile_id(coord).ok_or(SnapshotError::OffMap(coord))?;
                let tile = graph.tile_mut(tile_id).ok_or(SnapshotError::OffMap(coord))?;
                if tile.province.is_some() {
                    return Err(SnapshotError::DoubleClaim(coord));
                }
                tile.province = Some(record.id);
                province.tiles.push(tile_id);
            }
            if provinces.insert(record.id, province).is_some() {
                return Err(SnapshotError::DuplicateId(record.id.to_string()));
            }
        }

        let mut units = BTreeMap::new();
        for mut unit in snapshot.units {
            if !factions.contains_key(&unit.faction) {
                return Err(SnapshotError::UnknownFaction {
                    entity: unit.id.to_string(),
                    faction: unit.faction,
                });
            }
            if graph.tile_id(unit.coord).is_none() {
                return Err(SnapshotError::OffMap(unit.coord));
            }
            unit.movement.task_active = unit.movement.moving || unit.movement.task_active;
            let id = unit.id;
            if units.insert(id, unit).is_some() {
                return Err(SnapshotError::DuplicateId(id.to_string()));
            }
        }

        reconcile_membership(&mut factions, &provinces, &units);

        let selected = snapshot.selected.filter(|id| units.contains_key(id));
        let world = World {
            settings: snapshot.settings,
            graph,
            day: snapshot.day,
            factions,
            provinces,
            units,
            next_ids: snapshot.next_ids,
            selected,
            show_range: false,
            flags: InvalidationFlags::all(),
            notices: NoticeQueue::new(),
            rng: snapshot.rng,
            tasks,
        };
        world.register_restored_tasks();
        info!(
            day = world.day,
            factions = world.factions.len(),
            provinces = world.provinces.len(),
            units = world.units.len(),
            "world restored"
        );
        Ok(world)
    }

    fn register_restored_tasks(&self) {
        for faction in self.factions.values().filter(|f| f.is_ai()) {
            self.register_task(WorldTask::FactionAi(faction.id));
        }
        for unit in self.units.values() {
            self.register_task(WorldTask::UnitRest(unit.id));
            if unit.is_military() {
                self.register_task(WorldTask::UnitCombat(unit.id));
            }
        }
        for province in self.provinces.keys() {
            self.register_task(WorldTask::ProvinceTick(*province));
        }
        for unit in self.units.values().filter(|u| u.movement.task_active) {
            self.register_task(WorldTask::UnitMovement(unit.id));
        }
    }
}

/// Make each faction's unit and province lists agree with the records'
/// owners. Listed entries that check out keep their order; stale ones are
/// dropped and missing ones appended in id order.
fn reconcile_membership(
    factions: &mut BTreeMap<FactionId, Faction>,
    provinces: &BTreeMap<ProvinceId, Province>,
    units: &BTreeMap<UnitId, Unit>,
) {
    for faction in factions.values_mut() {
        let id = faction.id;
        let (listed_units, listed_provinces) = (faction.units.len(), faction.provinces.len());

        let mut kept = Vec::with_capacity(listed_units);
        for unit in &faction.units {
            if units.get(unit).is_some_and(|u| u.faction == id) && !kept.contains(unit) {
                kept.push(*unit);
            }
        }
        faction.units = kept;
        let mut kept = Vec::with_capacity(listed_provinces);
        for province in &faction.provinces {
            if provinces.get(province).is_some_and(|p| p.faction == id) && !kept.contains(province) {
                kept.push(*province);
            }
        }
        faction.provinces = kept;

        for unit in units.values().filter(|u| u.faction == id) {
            faction.add_unit(unit.id);
        }
        for province in provinces.values().filter(|p| p.faction == id) {
            faction.add_province(province.id);
        }

        if faction.units.len() != listed_units || faction.provinces.len() != listed_provinces {
            warn!(
                faction = %id,
                listed_units,
                units = faction.units.len(),
                listed_provinces,
                provinces = faction.provinces.len(),
                "faction membership repaired from records"
            );
        }
    }
}
