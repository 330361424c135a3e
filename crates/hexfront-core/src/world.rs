//! The world: tile graph, factions, provinces and units behind one API.
//!
//! Every mutation goes through [`World`], which keeps the ownership lists on
//! both sides consistent (tile ↔ province ↔ faction, unit ↔ faction), raises
//! invalidation flags for renderers and queues player notices. Day tasks are
//! handed to the scheduler through the world's [`Registrar`].

use crate::faction::{normalize_name, Controller, Faction};
use crate::hex::HexCoord;
use crate::map::{Tile, TileGraph};
use crate::notice::{Notice, NoticeQueue};
use crate::pathfinding::{self, PathError, TileBorder};
use crate::province::{territory_offsets, Province};
use crate::scheduler::Registrar;
use crate::settings::WorldSettings;
use crate::tasks::WorldTask;
use crate::types::{Day, FactionId, ProvinceId, Rgb, TileId, UnitId};
use crate::unit::{SpecialAction, Unit, UnitCategory, UnitType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

/// Stream of the simulation's random source. Terrain generation uses stream 0.
const SIMULATION_STREAM: u64 = 1;

/// Stream used to draw per-tile base food.
const FOOD_STREAM: u64 = 2;

const PROVINCE_NAME_LEN: usize = 8;
const PROVINCE_NAME_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors from world queries and mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    #[error("unknown province {0}")]
    UnknownProvince(ProvinceId),
    #[error("unknown faction {0}")]
    UnknownFaction(FactionId),
    #[error("no tile at {0}")]
    NoTile(HexCoord),
    #[error("name must not be empty")]
    EmptyName,
    #[error("a faction named '{0}' already exists")]
    DuplicateFactionName(String),
    #[error("a province named '{0}' already exists")]
    DuplicateProvinceName(String),
    #[error("tile {0} already belongs to a province")]
    TileClaimed(HexCoord),
    #[error("tile {0} is occupied")]
    TileOccupied(HexCoord),
    #[error("no unit is selected")]
    NoSelection,
    #[error("{0} is not available")]
    SpecialActionUnavailable(&'static str),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Presentation layers a renderer may need to rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Tiles,
    Provinces,
    Factions,
    /// Unit markers and the selected unit's range overlay.
    Units,
}

/// Dirty flags, one per [`Layer`].
///
/// Tile changes imply province changes, which imply faction changes. The
/// unit layer stands alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InvalidationFlags {
    tiles: bool,
    provinces: bool,
    factions: bool,
    units: bool,
}

impl InvalidationFlags {
    /// Every layer dirty, as on a fresh world.
    pub fn all() -> Self {
        Self {
            tiles: true,
            provinces: true,
            factions: true,
            units: true,
        }
    }

    pub fn invalidate(&mut self, layer: Layer) {
        match layer {
            Layer::Tiles => {
                self.tiles = true;
                self.provinces = true;
                self.factions = true;
            }
            Layer::Provinces => {
                self.provinces = true;
                self.factions = true;
            }
            Layer::Factions => self.factions = true,
            Layer::Units => self.units = true,
        }
    }

    pub fn is_set(&self, layer: Layer) -> bool {
        match layer {
            Layer::Tiles => self.tiles,
            Layer::Provinces => self.provinces,
            Layer::Factions => self.factions,
            Layer::Units => self.units,
        }
    }

    /// Read and clear one flag.
    pub fn take(&mut self, layer: Layer) -> bool {
        let slot = match layer {
            Layer::Tiles => &mut self.tiles,
            Layer::Provinces => &mut self.provinces,
            Layer::Factions => &mut self.factions,
            Layer::Units => &mut self.units,
        };
        std::mem::take(slot)
    }

    pub fn any(&self) -> bool {
        self.tiles || self.provinces || self.factions || self.units
    }
}

/// Units standing on one tile, split by category, in id order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitsAt {
    pub military: Vec<UnitId>,
    pub civilian: Vec<UnitId>,
}

impl UnitsAt {
    pub fn is_empty(&self) -> bool {
        self.military.is_empty() && self.civilian.is_empty()
    }

    pub fn len(&self) -> usize {
        self.military.len() + self.civilian.len()
    }

    pub fn of(&self, category: UnitCategory) -> &[UnitId] {
        match category {
            UnitCategory::Military => &self.military,
            UnitCategory::Civilian => &self.civilian,
        }
    }
}

/// What a special action did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialOutcome {
    /// The unit founded a province and was consumed.
    Settled(ProvinceId),
}

/// Next free ids for each entity kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub unit: u64,
    pub province: u32,
    pub faction: u32,
}

/// The simulation state.
pub struct World {
    pub(crate) settings: WorldSettings,
    pub(crate) graph: TileGraph,
    pub(crate) day: Day,
    pub(crate) factions: BTreeMap<FactionId, Faction>,
    pub(crate) provinces: BTreeMap<ProvinceId, Province>,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) next_ids: IdCounters,
    pub(crate) selected: Option<UnitId>,
    pub(crate) show_range: bool,
    pub(crate) flags: InvalidationFlags,
    pub(crate) notices: NoticeQueue,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) tasks: Registrar<World>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("day", &self.day)
            .field("tiles", &self.graph.len())
            .field("factions", &self.factions.len())
            .field("provinces", &self.provinces.len())
            .field("units", &self.units.len())
            .finish()
    }
}

impl World {
    /// Create an empty world over an already generated graph.
    pub fn new(settings: WorldSettings, graph: TileGraph, tasks: Registrar<World>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        rng.set_stream(SIMULATION_STREAM);
        Self {
            settings,
            graph,
            day: 0,
            factions: BTreeMap::new(),
            provinces: BTreeMap::new(),
            units: BTreeMap::new(),
            next_ids: IdCounters::default(),
            selected: None,
            show_range: false,
            flags: InvalidationFlags::all(),
            notices: NoticeQueue::new(),
            rng,
            tasks,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn graph(&self) -> &TileGraph {
        &self.graph
    }

    /// The current day; incremented after each scheduler run.
    pub fn day(&self) -> Day {
        self.day
    }

    pub fn tile_at(&self, coord: HexCoord) -> Option<&Tile> {
        self.graph.tile_at(coord)
    }

    /// Province claiming the tile at `coord`.
    pub fn tile_province(&self, coord: HexCoord) -> Option<&Province> {
        let id = self.graph.tile_at(coord)?.province?;
        self.provinces.get(&id)
    }

    /// Faction owning the tile at `coord`, through its province.
    pub fn tile_faction(&self, coord: HexCoord) -> Option<FactionId> {
        self.tile_province(coord).map(|p| p.faction)
    }

    /// Base food of a tile. Drawn once per tile from its own stream, so the
    /// value does not depend on when it is first asked for.
    pub fn tile_food(&mut self, coord: HexCoord) -> Option<u32> {
        let id = self.graph.tile_id(coord)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.settings.seed.wrapping_add(id.0 as u64));
        rng.set_stream(FOOD_STREAM);
        self.graph.base_food(id, &mut rng)
    }

    /// Units on a tile, split into military and civilian.
    pub fn units_at(&self, coord: HexCoord) -> UnitsAt {
        let mut at = UnitsAt::default();
        for unit in self.units.values().filter(|u| u.coord == coord) {
            match unit.category() {
                UnitCategory::Military => at.military.push(unit.id),
                UnitCategory::Civilian => at.civilian.push(unit.id),
            }
        }
        at
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn province(&self, id: ProvinceId) -> Option<&Province> {
        self.provinces.get(&id)
    }

    pub fn provinces(&self) -> impl Iterator<Item = &Province> {
        self.provinces.values()
    }

    pub fn province_by_name(&self, name: &str) -> Option<&Province> {
        let name = name.trim();
        self.provinces.values().find(|p| p.name == name)
    }

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    pub fn factions(&self) -> impl Iterator<Item = &Faction> {
        self.factions.values()
    }

    /// Faction lookup, ignoring case and surrounding whitespace.
    pub fn faction_by_name(&self, name: &str) -> Option<&Faction> {
        let key = normalize_name(name);
        self.factions.values().find(|f| f.name == key)
    }

    /// The first player-controlled faction.
    pub fn player_faction(&self) -> Option<FactionId> {
        self.factions
            .values()
            .find(|f| f.controller == Controller::Player)
            .map(|f| f.id)
    }

    pub(crate) fn is_player(&self, faction: FactionId) -> bool {
        self.factions
            .get(&faction)
            .is_some_and(|f| f.controller == Controller::Player)
    }

    /// Every tile owned by a faction, in province then claim order.
    pub fn faction_tiles(&self, id: FactionId) -> Result<Vec<HexCoord>, WorldError> {
        let faction = self.factions.get(&id).ok_or(WorldError::UnknownFaction(id))?;
        Ok(faction
            .provinces
            .iter()
            .filter_map(|p| self.provinces.get(p))
            .flat_map(|p| p.tiles.iter().map(|t| self.graph[*t].coord))
            .collect())
    }

    pub fn selected_unit(&self) -> Option<UnitId> {
        self.selected
    }

    pub fn show_range(&self) -> bool {
        self.show_range
    }

    fn unit_or_err(&self, id: UnitId) -> Result<&Unit, WorldError> {
        self.units.get(&id).ok_or(WorldError::UnknownUnit(id))
    }

    fn unit_mut_or_err(&mut self, id: UnitId) -> Result<&mut Unit, WorldError> {
        self.units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))
    }

    /// Tiles the unit can reach with its remaining range.
    pub fn movement_range_of(&self, unit: UnitId) -> Result<BTreeSet<HexCoord>, WorldError> {
        let unit = self.unit_or_err(unit)?;
        Ok(pathfinding::movement_range(&self.graph, unit.coord, unit.range()))
    }

    /// Outline of the unit's movement range.
    pub fn movement_borders_of(&self, unit: UnitId) -> Result<Vec<TileBorder>, WorldError> {
        let unit = self.unit_or_err(unit)?;
        Ok(pathfinding::movement_borders(&self.graph, unit.coord, unit.range()))
    }

    /// Whether `unit` may enter the tile at `coord` right now.
    ///
    /// Military units may not share a tile with another military unit of
    /// their faction; civilians may not share a tile with any civilian.
    pub fn can_move_to_tile(&self, unit: UnitId, coord: HexCoord) -> Result<bool, WorldError> {
        let mover = self.unit_or_err(unit)?;
        if !self.graph.tile_at(coord).is_some_and(|t| t.is_walkable()) {
            return Ok(false);
        }
        let blocked = self.units.values().any(|other| {
            other.id != mover.id
                && other.coord == coord
                && other.category() == mover.category()
                && (mover.is_civilian() || other.faction == mover.faction)
        });
        Ok(!blocked)
    }

    // =========================================================================
    // Flags and notices
    // =========================================================================

    pub fn flags(&self) -> &InvalidationFlags {
        &self.flags
    }

    pub fn invalidate(&mut self, layer: Layer) {
        self.flags.invalidate(layer);
    }

    /// Read and clear the flag for `layer`.
    pub fn take_invalidation(&mut self, layer: Layer) -> bool {
        self.flags.take(layer)
    }

    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub(crate) fn register_task(&self, task: WorldTask) {
        self.tasks.register(task);
    }

    pub(crate) fn advance_day(&mut self) {
        self.day += 1;
    }

    // =========================================================================
    // Factions
    // =========================================================================

    /// Create a faction. AI factions get a daily AI task.
    pub fn create_faction(
        &mut self,
        name: &str,
        primary: Rgb,
        secondary: Rgb,
        controller: Controller,
    ) -> Result<FactionId, WorldError> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(WorldError::EmptyName);
        }
        if self.faction_by_name(&key).is_some() {
            return Err(WorldError::DuplicateFactionName(key));
        }

        let id = FactionId(self.next_ids.faction);
        self.next_ids.faction += 1;
        self.factions
            .insert(id, Faction::new(id, &key, primary, secondary, controller));
        if controller == Controller::Ai {
            self.register_task(WorldTask::FactionAi(id));
        }
        self.invalidate(Layer::Factions);
        debug!(faction = %id, name = %key, ?controller, "faction created");
        Ok(id)
    }

    // =========================================================================
    // Units
    // =========================================================================

    /// Create a unit and register its rest task (plus combat for military).
    pub fn create_unit_at(
        &mut self,
        unit_type: UnitType,
        coord: HexCoord,
        faction: FactionId,
    ) -> Result<UnitId, WorldError> {
        if self.graph.tile_id(coord).is_none() {
            return Err(WorldError::NoTile(coord));
        }
        let owner = self
            .factions
            .get_mut(&faction)
            .ok_or(WorldError::UnknownFaction(faction))?;

        let id = UnitId(self.next_ids.unit);
        self.next_ids.unit += 1;
        owner.add_unit(id);

        let unit = Unit::new(id, unit_type, faction, coord, self.day);
        let military = unit.is_military();
        self.units.insert(id, unit);

        self.register_task(WorldTask::UnitRest(id));
        if military {
            self.register_task(WorldTask::UnitCombat(id));
        }
        self.invalidate(Layer::Units);
        debug!(unit = %id, %unit_type, %coord, %faction, "unit created");
        Ok(id)
    }

    /// Remove a unit from the world and its faction.
    pub fn delete_unit(&mut self, id: UnitId) -> Result<Unit, WorldError> {
        let unit = self.units.remove(&id).ok_or(WorldError::UnknownUnit(id))?;
        if let Some(faction) = self.factions.get_mut(&unit.faction) {
            faction.remove_unit(id);
        }
        if self.selected == Some(id) {
            self.selected = None;
            self.show_range = false;
        }
        self.invalidate(Layer::Units);
        debug!(unit = %id, unit_type = %unit.unit_type, coord = %unit.coord, "unit deleted");
        Ok(unit)
    }

    /// Move a unit to another faction. Returns the previous owner.
    pub(crate) fn capture_unit(&mut self, id: UnitId, faction: FactionId) -> Result<FactionId, WorldError> {
        if !self.factions.contains_key(&faction) {
            return Err(WorldError::UnknownFaction(faction));
        }
        let unit = self.unit_mut_or_err(id)?;
        let previous = unit.faction;
        unit.faction = faction;
        unit.movement.cancel();

        if let Some(old) = self.factions.get_mut(&previous) {
            old.remove_unit(id);
        }
        if let Some(new) = self.factions.get_mut(&faction) {
            new.add_unit(id);
        }
        self.invalidate(Layer::Units);
        debug!(unit = %id, from = %previous, to = %faction, "unit captured");
        Ok(previous)
    }

    /// Select a unit (or clear the selection). Selecting hides the range overlay.
    pub fn set_selected_unit(&mut self, unit: Option<UnitId>) -> Result<(), WorldError> {
        if let Some(id) = unit {
            self.unit_or_err(id)?;
        }
        self.selected = unit;
        self.show_range = false;
        self.invalidate(Layer::Units);
        Ok(())
    }

    /// Show or hide the selected unit's movement range.
    pub fn set_show_range(&mut self, show: bool) {
        if self.show_range != show {
            self.show_range = show;
            self.invalidate(Layer::Units);
        }
    }

    /// Plan a path to `goal` and start moving along it.
    ///
    /// Returns the planned path (start excluded). A goal equal to the unit's
    /// tile plans nothing. The path never takes more steps than the unit's
    /// remaining range, and a goal the unit could not enter is refused.
    pub fn move_unit_to(&mut self, id: UnitId, goal: HexCoord) -> Result<Vec<HexCoord>, WorldError> {
        let reachable = self.movement_range_of(id)?;
        let unit = self.unit_or_err(id)?;
        let (start, range) = (unit.coord, unit.range());
        if goal != start && reachable.contains(&goal) && !self.can_move_to_tile(id, goal)? {
            return Err(WorldError::TileOccupied(goal));
        }
        let path = pathfinding::find_path_within(&self.graph, start, goal, &reachable, range)?;
        if path.is_empty() {
            return Ok(path);
        }

        let arrival = self.day + self.delay_at(path[0]);
        let unit = self.unit_mut_or_err(id)?;
        unit.movement.path = path.iter().copied().collect();
        unit.movement.arrival_day = arrival;
        unit.movement.moving = true;
        let register = !unit.movement.task_active;
        unit.movement.task_active = true;

        if register {
            self.register_task(WorldTask::UnitMovement(id));
        }
        self.invalidate(Layer::Units);
        debug!(unit = %id, %goal, steps = path.len(), arrival, "movement planned");
        Ok(path)
    }

    pub fn move_selected_unit_to(&mut self, goal: HexCoord) -> Result<Vec<HexCoord>, WorldError> {
        let id = self.selected.ok_or(WorldError::NoSelection)?;
        self.move_unit_to(id, goal)
    }

    /// Stop a unit where it is. The movement task notices and finishes.
    pub fn cancel_unit_movement(&mut self, id: UnitId) -> Result<(), WorldError> {
        self.unit_mut_or_err(id)?.movement.cancel();
        self.invalidate(Layer::Units);
        Ok(())
    }

    /// Run the unit type's special action.
    ///
    /// Settling founds a province on the unit's tile, named `name` or a random
    /// name, and consumes the unit.
    pub fn perform_special_action(
        &mut self,
        id: UnitId,
        name: Option<&str>,
    ) -> Result<SpecialOutcome, WorldError> {
        let unit = self.unit_or_err(id)?;
        let (coord, faction) = (unit.coord, unit.faction);

        match unit.stats().special {
            SpecialAction::Settle => {
                let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
                    Some(name) => name.to_string(),
                    None => self.random_province_name(),
                };
                let radius = self.settings.province_radius;
                let province = self.create_province_at(coord, faction, &name, radius)?;
                self.delete_unit(id)?;
                Ok(SpecialOutcome::Settled(province))
            }
            SpecialAction::Attack => Err(WorldError::SpecialActionUnavailable(SpecialAction::Attack.label())),
        }
    }

    fn delay_at(&self, coord: HexCoord) -> Day {
        self.graph
            .tile_at(coord)
            .map_or(1, |t| t.terrain.movement_delay())
    }

    // =========================================================================
    // Provinces
    // =========================================================================

    /// Found a province at `coord` and claim every unowned tile within
    /// `radius` of it.
    pub fn create_province_at(
        &mut self,
        coord: HexCoord,
        faction: FactionId,
        name: &str,
        radius: u32,
    ) -> Result<ProvinceId, WorldError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorldError::EmptyName);
        }
        if self.province_by_name(name).is_some() {
            return Err(WorldError::DuplicateProvinceName(name.to_string()));
        }
        if !self.factions.contains_key(&faction) {
            return Err(WorldError::UnknownFaction(faction));
        }
        let seat = self.graph.tile_at(coord).ok_or(WorldError::NoTile(coord))?;
        if seat.province.is_some() {
            return Err(WorldError::TileClaimed(coord));
        }

        let id = ProvinceId(self.next_ids.province);
        self.next_ids.province += 1;
        let mut province = Province::new(id, name, faction, coord);

        for (dx, dz) in territory_offsets(radius) {
            let target = HexCoord::new(coord.x + dx, coord.z + dz);
            let Some(tile_id) = self.graph.tile_id(target) else {
                continue;
            };
            if let Some(tile) = self.graph.tile_mut(tile_id) {
                if tile.province.is_none() {
                    tile.province = Some(id);
                    province.tiles.push(tile_id);
                }
            }
        }

        let claimed = province.tiles.len();
        self.provinces.insert(id, province);
        if let Some(owner) = self.factions.get_mut(&faction) {
            owner.add_province(id);
        }
        self.register_task(WorldTask::ProvinceTick(id));
        self.invalidate(Layer::Tiles);
        debug!(province = %id, name, %coord, %faction, claimed, "province created");
        Ok(id)
    }

    /// Hand a province and its tiles to another faction.
    pub fn take_province(&mut self, id: ProvinceId, faction: FactionId) -> Result<(), WorldError> {
        if !self.factions.contains_key(&faction) {
            return Err(WorldError::UnknownFaction(faction));
        }
        let province = self
            .provinces
            .get_mut(&id)
            .ok_or(WorldError::UnknownProvince(id))?;
        let previous = province.faction;
        province.faction = faction;

        if let Some(old) = self.factions.get_mut(&previous) {
            old.remove_province(id);
        }
        if let Some(new) = self.factions.get_mut(&faction) {
            new.add_province(id);
        }
        self.invalidate(Layer::Provinces);
        debug!(province = %id, from = %previous, to = %faction, "province changed hands");
        Ok(())
    }

    /// Queue a unit in a province. Returns the day it is due.
    pub fn produce(&mut self, id: ProvinceId, unit_type: UnitType) -> Result<Day, WorldError> {
        let due = self.day + unit_type.stats().production_time;
        let province = self
            .provinces
            .get_mut(&id)
            .ok_or(WorldError::UnknownProvince(id))?;
        province.queue_unit(due, unit_type);
        debug!(province = %id, %unit_type, due, "production queued");
        Ok(due)
    }

    /// Random `[A-Z0-9]` name not used by any province.
    pub(crate) fn random_province_name(&mut self) -> String {
        loop {
            let name: String = (0..PROVINCE_NAME_LEN)
                .map(|_| {
                    let index = self.rng.gen_range(0..PROVINCE_NAME_CHARS.len());
                    PROVINCE_NAME_CHARS[index] as char
                })
                .collect();
            if self.province_by_name(&name).is_none() {
                return name;
            }
        }
    }

    /// First walkable tile of the province without a unit of `category`.
    pub(crate) fn free_tile_in(&self, id: ProvinceId, category: UnitCategory) -> Option<HexCoord> {
        let province = self.provinces.get(&id)?;
        province
            .tiles
            .iter()
            .map(|t| &self.graph[*t])
            .filter(|t| t.is_walkable())
            .map(|t| t.coord)
            .find(|coord| {
                !self
                    .units
                    .values()
                    .any(|u| u.coord == *coord && u.category() == category)
            })
    }

    pub(crate) fn tile_ids_of(&self, id: ProvinceId) -> Vec<TileId> {
        self.provinces
            .get(&id)
            .map(|p| p.tiles.clone())
            .unwrap_or_default()
    }
}
