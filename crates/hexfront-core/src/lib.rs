//! Hexfront Core Library
//!
//! Game logic for Hexfront, a real-time hex-grid strategy simulation: procedural
//! terrain, factions that own provinces and units, movement with pathfinding,
//! province occupation and capture, and a day scheduler that drives it all.
//!
//! # Design Principles
//!
//! - **No UI dependencies**: This crate is purely simulation logic
//! - **Deterministic**: The same seed and the same commands replay identically
//! - **Serializable**: Worlds save and load through [`WorldSnapshot`]

// Core modules
pub mod hex;
pub mod map;
pub mod terrain;
pub mod types;

// Map generation
pub mod mapgen;

// Configuration and timing
pub mod clock;
pub mod scheduler;
pub mod settings;

// Entities
pub mod faction;
pub mod province;
pub mod unit;

// Simulation
pub mod ai;
pub mod combat;
pub mod notice;
pub mod pathfinding;
pub mod simulation;
pub mod snapshot;
pub mod tasks;
pub mod world;

// Re-exports for convenience
pub use clock::{ClockEvent, GameClock};
pub use combat::{CombatResult, Engagement};
pub use faction::{Controller, Faction};
pub use hex::{HexCoord, HexEdge, HexError, WorldPosition};
pub use map::{Tile, TileGraph};
pub use mapgen::{generate_map, GenerationReport, GeneratorKind, TerrainGenerator};
pub use notice::{Notice, NoticeQueue};
pub use pathfinding::{find_path, find_path_within, movement_range, PathError};
pub use province::{Occupation, Province};
pub use scheduler::{ActionStatus, DayAction, DayReport, DayScheduler, FnAction, Registrar};
pub use settings::{SettingsError, WorldSettings};
pub use simulation::{Simulation, SimulationError};
pub use snapshot::{SnapshotError, WorldSnapshot};
pub use tasks::WorldTask;
pub use terrain::TerrainType;
pub use types::*;
pub use unit::{SpecialAction, Unit, UnitCategory, UnitStats, UnitType};
pub use world::{Layer, SpecialOutcome, UnitsAt, World, WorldError};
