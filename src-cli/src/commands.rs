//! Console commands typed on stdin while a session runs.

use crate::state::CliError;
use hexfront_core::{HexCoord, ProvinceId, UnitId, UnitType};

/// A parsed console line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Fast,
    Normal,
    Select(UnitId),
    Deselect,
    Move(HexCoord),
    Cancel,
    Settle(Option<String>),
    Produce(ProvinceId, UnitType),
    Save(Option<String>),
    Saves,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  pause | resume | fast | normal
  select <unit> | deselect
  move <x> <z>            move the selected unit (axial coordinates)
  cancel                  stop the selected unit
  settle [name]           found a province with the selected settler
  produce <province> <settler|warrior>
  save [name] | saves
  status | help | quit";

impl ConsoleCommand {
    /// Parse one line. Keywords are case-insensitive; names keep their case.
    pub fn parse(line: &str) -> Result<Self, CliError> {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Err(CliError::EmptyCommand);
        };
        let args: Vec<&str> = words.collect();

        let command = match keyword.to_ascii_lowercase().as_str() {
            "pause" => ConsoleCommand::Pause,
            "resume" | "play" => ConsoleCommand::Resume,
            "fast" => ConsoleCommand::Fast,
            "normal" => ConsoleCommand::Normal,
            "select" => ConsoleCommand::Select(UnitId(number(keyword, &args, 0)?)),
            "deselect" => ConsoleCommand::Deselect,
            "move" => {
                let x = number(keyword, &args, 0)?;
                let z = number(keyword, &args, 1)?;
                ConsoleCommand::Move(HexCoord::new(x, z))
            }
            "cancel" => ConsoleCommand::Cancel,
            "settle" => ConsoleCommand::Settle(rest(&args)),
            "produce" => {
                let province = ProvinceId(number(keyword, &args, 0)?);
                let name = args.get(1).ok_or_else(|| usage(keyword))?;
                let unit_type =
                    UnitType::from_name(name).ok_or_else(|| CliError::UnknownUnitType(name.to_string()))?;
                ConsoleCommand::Produce(province, unit_type)
            }
            "save" => ConsoleCommand::Save(rest(&args)),
            "saves" => ConsoleCommand::Saves,
            "status" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(CliError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

fn number<T: std::str::FromStr>(keyword: &str, args: &[&str], index: usize) -> Result<T, CliError> {
    args.get(index)
        .and_then(|arg| arg.parse().ok())
        .ok_or_else(|| usage(keyword))
}

fn rest(args: &[&str]) -> Option<String> {
    (!args.is_empty()).then(|| args.join(" "))
}

fn usage(keyword: &str) -> CliError {
    CliError::Usage(keyword.to_ascii_lowercase())
}
