//! Session state for a running simulation and the errors the host reports.

use crate::commands::{ConsoleCommand, HELP};
use crate::saves;
use hexfront_core::{
    DayReport, Layer, Notice, SimulationError, Simulation, SnapshotError, SpecialOutcome, WorldError,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Host errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("empty command")]
    EmptyCommand,
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("bad arguments for '{0}' (try 'help')")]
    Usage(String),
    #[error("unknown unit type '{0}'")]
    UnknownUnitType(String),
    #[error("save '{0}' not found")]
    SaveNotFound(String),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the loop should do after a console command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// A simulation plus host-side settings.
pub struct Session {
    pub sim: Simulation,
    pub save_dir: PathBuf,
    /// Stop after this many days have run, if set.
    pub day_limit: Option<u32>,
}

impl Session {
    pub fn new(sim: Simulation, save_dir: PathBuf) -> Self {
        Self {
            sim,
            save_dir,
            day_limit: None,
        }
    }

    /// Whether the day limit has been reached.
    pub fn finished(&self) -> bool {
        self.day_limit.is_some_and(|limit| self.sim.day() >= limit)
    }

    /// Feed elapsed time to the simulation. Returns the day report and the
    /// notices raised, when a day ran.
    pub fn frame(&mut self, elapsed: Duration) -> Option<(DayReport, Vec<Notice>)> {
        let report = self.sim.frame(elapsed)?;
        for fault in &report.faults {
            warn!(day = fault.day, action = %fault.label, error = %fault.message, "day task fault");
        }

        let world = self.sim.world_mut();
        for layer in [Layer::Tiles, Layer::Provinces, Layer::Factions, Layer::Units] {
            if world.take_invalidation(layer) {
                debug!(?layer, "layer changed");
            }
        }
        let notices = world.drain_notices();
        Some((report, notices))
    }

    /// Parse and run one console line.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow, CliError> {
        let command = ConsoleCommand::parse(line)?;
        self.execute(command)
    }

    pub fn execute(&mut self, command: ConsoleCommand) -> Result<Flow, CliError> {
        let message = match command {
            ConsoleCommand::Pause => {
                self.sim.clock_mut().set_running(false);
                "paused".to_string()
            }
            ConsoleCommand::Resume => {
                self.sim.clock_mut().set_running(true);
                "running".to_string()
            }
            ConsoleCommand::Fast => {
                self.sim.clock_mut().set_fast_forward(true);
                "fast forward".to_string()
            }
            ConsoleCommand::Normal => {
                self.sim.clock_mut().set_fast_forward(false);
                "normal speed".to_string()
            }
            ConsoleCommand::Select(unit) => {
                self.sim.world_mut().set_selected_unit(Some(unit))?;
                let range = self.sim.world().movement_range_of(unit)?;
                format!("selected {} ({} tiles in range)", unit, range.len())
            }
            ConsoleCommand::Deselect => {
                self.sim.world_mut().set_selected_unit(None)?;
                "selection cleared".to_string()
            }
            ConsoleCommand::Move(goal) => {
                let path = self.sim.world_mut().move_selected_unit_to(goal)?;
                format!("moving {} tiles to {}", path.len(), goal)
            }
            ConsoleCommand::Cancel => {
                let unit = self.selected()?;
                self.sim.world_mut().cancel_unit_movement(unit)?;
                format!("{} stopped", unit)
            }
            ConsoleCommand::Settle(name) => {
                let unit = self.selected()?;
                let SpecialOutcome::Settled(province) = self
                    .sim
                    .world_mut()
                    .perform_special_action(unit, name.as_deref())?;
                let name = self
                    .sim
                    .world()
                    .province(province)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                format!("founded {} ({})", name, province)
            }
            ConsoleCommand::Produce(province, unit_type) => {
                let due = self.sim.world_mut().produce(province, unit_type)?;
                format!("{} queued in {}, due on day {}", unit_type, province, due)
            }
            ConsoleCommand::Save(name) => {
                let name = name.unwrap_or_else(|| format!("day {}", self.sim.day()));
                let saved = saves::write_save(&self.save_dir, &name, &self.sim)?;
                format!("saved '{}' as {}", saved.name, saved.id)
            }
            ConsoleCommand::Saves => {
                let saves = saves::list_saves(&self.save_dir);
                if saves.is_empty() {
                    "no saves".to_string()
                } else {
                    saves
                        .iter()
                        .map(|s| format!("{}  {}  day {}  {}", s.id, s.saved_at, s.day, s.name))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            ConsoleCommand::Status => self.status(),
            ConsoleCommand::Help => HELP.to_string(),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(message))
    }

    fn selected(&self) -> Result<hexfront_core::UnitId, CliError> {
        self.sim
            .world()
            .selected_unit()
            .ok_or(CliError::World(WorldError::NoSelection))
    }

    /// Day, clock state and a line per faction, province and unit.
    pub fn status(&self) -> String {
        let world = self.sim.world();
        let clock = self.sim.clock();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "day {} ({}{})",
            world.day(),
            if clock.is_running() { "running" } else { "paused" },
            if clock.is_fast_forward() { ", fast" } else { "" }
        );
        for faction in world.factions() {
            let _ = writeln!(
                out,
                "{} {} [{:?}]: {} provinces, {} units",
                faction.id,
                faction.name,
                faction.controller,
                faction.provinces.len(),
                faction.units.len()
            );
        }
        for province in world.provinces() {
            let occupied = match province.occupation_days(world.day()) {
                Some(days) => format!(", occupied {} days", days),
                None => String::new(),
            };
            let _ = writeln!(
                out,
                "  {} {} seat {} ({} tiles, {} queued{})",
                province.id,
                province.name,
                province.seat,
                province.tiles.len(),
                province.queued_count(),
                occupied
            );
        }
        for unit in world.units() {
            let marker = if world.selected_unit() == Some(unit.id) { "*" } else { " " };
            let _ = writeln!(
                out,
                " {}{} {} of {} at {} range {}{}",
                marker,
                unit.id,
                unit.unit_type,
                unit.faction,
                unit.coord,
                unit.range(),
                if unit.is_moving() { " (moving)" } else { "" }
            );
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfront_core::{UnitType, WorldSettings};

    fn session() -> (Session, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sim = Simulation::new(WorldSettings::dry(10, 10, 9)).unwrap();
        (Session::new(sim, dir.path().to_path_buf()), dir)
    }

    fn player_unit(session: &Session, unit_type: UnitType) -> hexfront_core::UnitId {
        let world = session.sim.world();
        let player = world.player_faction().unwrap();
        world
            .units()
            .find(|u| u.faction == player && u.unit_type == unit_type)
            .unwrap()
            .id
    }

    #[test]
    fn test_clock_commands() {
        let (mut session, _dir) = session();
        session.handle_line("resume").unwrap();
        assert!(session.sim.clock().is_running());
        session.handle_line("fast").unwrap();
        assert!(session.sim.clock().is_fast_forward());
        session.handle_line("pause").unwrap();
        assert!(!session.sim.clock().is_running());
        assert!(session.frame(Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_select_and_settle() {
        let (mut session, _dir) = session();
        let settler = player_unit(&session, UnitType::Settler);
        session.handle_line(&format!("select {}", settler.0)).unwrap();
        let Flow::Continue(message) = session.handle_line("settle Home").unwrap() else {
            panic!("expected a message");
        };
        assert!(message.starts_with("founded Home"));
        assert!(session.sim.world().province_by_name("Home").is_some());
        assert_eq!(session.sim.world().selected_unit(), None);
    }

    #[test]
    fn test_commands_need_selection() {
        let (mut session, _dir) = session();
        assert!(matches!(
            session.handle_line("cancel"),
            Err(CliError::World(WorldError::NoSelection))
        ));
        assert!(matches!(
            session.handle_line("move 0 0"),
            Err(CliError::World(WorldError::NoSelection))
        ));
    }

    #[test]
    fn test_save_command_writes_file() {
        let (mut session, dir) = session();
        session.handle_line("save opening").unwrap();
        let saves = saves::list_saves(dir.path());
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].name, "opening");
    }

    #[test]
    fn test_status_lists_factions() {
        let (session, _dir) = session();
        let status = session.status();
        assert!(status.starts_with("day 0 (paused)"));
        assert!(status.contains("player"));
        assert!(status.contains("enemy"));
    }

    #[test]
    fn test_quit_and_day_limit() {
        let (mut session, _dir) = session();
        assert_eq!(session.handle_line("quit").unwrap(), Flow::Quit);
        session.day_limit = Some(2);
        assert!(!session.finished());
        session.sim.run_days(2);
        assert!(session.finished());
    }
}
