//! A playable session: world, day scheduler and wall clock together.

use crate::clock::GameClock;
use crate::faction::{Controller, ENEMY_FACTION, PLAYER_FACTION};
use crate::hex::HexCoord;
use crate::map::TileGraph;
use crate::mapgen::{GenerationReport, TerrainGenerator};
use crate::scheduler::{DayReport, DayScheduler};
use crate::settings::{SettingsError, WorldSettings};
use crate::snapshot::{SnapshotError, WorldSnapshot};
use crate::types::{Day, FactionId, Rgb};
use crate::unit::UnitType;
use crate::world::{World, WorldError};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from starting or resuming a session.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// A world driven by a scheduler and a clock.
pub struct Simulation {
    world: World,
    scheduler: DayScheduler<World>,
    clock: GameClock,
    generation: GenerationReport,
}

impl Simulation {
    /// Generate terrain, create the player and enemy factions and place each
    /// faction's starting settler and warrior. The clock starts paused.
    pub fn new(settings: WorldSettings) -> Result<Self, SimulationError> {
        settings.validate()?;

        let mut graph = TileGraph::new(settings.width, settings.height);
        let generation = TerrainGenerator::new(settings.seed, settings.generator).generate(&mut graph);

        let scheduler = DayScheduler::new();
        let clock = GameClock::new(settings.day_interval(), settings.fast_day_interval());
        let mut world = World::new(settings, graph, scheduler.registrar());

        let player = world.create_faction(PLAYER_FACTION, Rgb::BLUE, Rgb::WHITE, Controller::Player)?;
        let enemy = world.create_faction(ENEMY_FACTION, Rgb::BLACK, Rgb::RED, Controller::Ai)?;
        for faction in [enemy, player] {
            place_starting_units(&mut world, faction)?;
        }

        info!(
            width = world.graph().width(),
            height = world.graph().height(),
            seed = world.settings().seed,
            units = world.units().count(),
            "simulation started"
        );
        Ok(Self {
            world,
            scheduler,
            clock,
            generation,
        })
    }

    /// Resume from a snapshot. The clock starts paused.
    pub fn from_snapshot(snapshot: WorldSnapshot) -> Result<Self, SimulationError> {
        let scheduler = DayScheduler::new();
        let world = World::restore(snapshot, scheduler.registrar())?;
        let clock = GameClock::new(world.settings().day_interval(), world.settings().fast_day_interval());
        Ok(Self {
            world,
            scheduler,
            clock,
            generation: GenerationReport::default(),
        })
    }

    /// Drive a hand-built world. The world must have been created with
    /// `scheduler.registrar()`, otherwise its tasks never run.
    pub fn from_parts(world: World, scheduler: DayScheduler<World>) -> Self {
        let clock = GameClock::new(world.settings().day_interval(), world.settings().fast_day_interval());
        Self {
            world,
            scheduler,
            clock,
            generation: GenerationReport::default(),
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    pub fn day(&self) -> Day {
        self.world.day()
    }

    /// Terrain counts from generation; empty for restored sessions.
    pub fn generation(&self) -> &GenerationReport {
        &self.generation
    }

    /// Labels of every scheduled day task.
    pub fn task_labels(&self) -> Vec<String> {
        self.scheduler.labels()
    }

    /// Run today's tasks, then move to the next day.
    pub fn advance_day(&mut self) -> DayReport {
        let day = self.world.day();
        let report = self.scheduler.run_day(day, &mut self.world);
        self.world.advance_day();
        report
    }

    /// Advance `days` days regardless of the clock.
    pub fn run_days(&mut self, days: u32) -> Vec<DayReport> {
        (0..days).map(|_| self.advance_day()).collect()
    }

    /// Feed elapsed real time to the clock; runs a day when one has passed.
    pub fn frame(&mut self, elapsed: Duration) -> Option<DayReport> {
        if self.clock.poll(elapsed) {
            Some(self.advance_day())
        } else {
            None
        }
    }
}

fn place_starting_units(world: &mut World, faction: FactionId) -> Result<(), WorldError> {
    let walkable: Vec<HexCoord> = world
        .graph()
        .iter()
        .filter(|t| t.is_walkable())
        .map(|t| t.coord)
        .collect();
    if walkable.is_empty() {
        warn!(%faction, "no walkable land for starting units");
        return Ok(());
    }

    let coord = walkable[world.rng.gen_range(0..walkable.len())];
    world.create_unit_at(UnitType::Settler, coord, faction)?;
    world.create_unit_at(UnitType::Warrior, coord, faction)?;
    Ok(())
}
