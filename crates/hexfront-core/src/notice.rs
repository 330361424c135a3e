//! Player-facing notices produced by the simulation.
//!
//! The world pushes notices as things happen; the host drains the queue once
//! per frame and shows them however it likes.

use crate::hex::HexCoord;
use crate::types::{Day, ProvinceId, UnitId};
use crate::unit::UnitType;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::info;

/// Something the player should be told about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    OccupationStarted { province: ProvinceId, name: String },
    OccupationEnded { province: ProvinceId, name: String },
    /// The player took a province from another faction.
    ProvinceCaptured { province: ProvinceId, name: String },
    /// The player lost a province to another faction.
    ProvinceLost { province: ProvinceId, name: String },
    /// One of the player's units was destroyed in combat.
    UnitLost { unit_type: UnitType, coord: HexCoord },
    /// One of the player's civilians was taken by another faction.
    UnitCaptured { unit: UnitId, unit_type: UnitType, coord: HexCoord },
    /// The player took an enemy civilian.
    EnemyUnitCaptured { unit: UnitId, unit_type: UnitType, coord: HexCoord },
    /// The player destroyed an enemy unit in combat.
    EnemyUnitDestroyed { unit_type: UnitType, coord: HexCoord },
    /// A unit's next tile became unenterable.
    MovementCanceled { unit: UnitId, unit_type: UnitType, blocked: HexCoord },
    /// Production could not complete because the province is occupied.
    ProductionDelayed { province: ProvinceId, name: String, until: Day },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::OccupationStarted { name, .. } => write!(f, "{} is under occupation", name),
            Notice::OccupationEnded { name, .. } => write!(f, "{} is no longer occupied", name),
            Notice::ProvinceCaptured { name, .. } => write!(f, "You have captured {}", name),
            Notice::ProvinceLost { name, .. } => write!(f, "{} has been lost to the enemy", name),
            Notice::UnitLost { unit_type, coord } => {
                write!(f, "Your {} at {} was destroyed", unit_type, coord)
            }
            Notice::UnitCaptured { unit_type, coord, .. } => {
                write!(f, "Your {} at {} was captured", unit_type, coord)
            }
            Notice::EnemyUnitCaptured { unit_type, coord, .. } => {
                write!(f, "You captured an enemy {} at {}", unit_type, coord)
            }
            Notice::EnemyUnitDestroyed { unit_type, coord } => {
                write!(f, "You destroyed an enemy {} at {}", unit_type, coord)
            }
            Notice::MovementCanceled { unit_type, blocked, .. } => {
                write!(f, "{} movement canceled: {} is blocked", unit_type, blocked)
            }
            Notice::ProductionDelayed { name, until, .. } => {
                write!(f, "Production in {} delayed until day {} by occupation", name, until)
            }
        }
    }
}

/// FIFO queue of pending notices.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeQueue {
    pending: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice and log it.
    pub fn push(&mut self, notice: Notice) {
        info!(notice = %notice, "notice");
        self.pending.push_back(notice);
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }

    pub fn peek(&self) -> Option<&Notice> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_drain() {
        let mut queue = NoticeQueue::new();
        queue.push(Notice::OccupationStarted {
            province: ProvinceId(0),
            name: "Alpha".into(),
        });
        queue.push(Notice::OccupationEnded {
            province: ProvinceId(0),
            name: "Alpha".into(),
        });
        assert_eq!(queue.len(), 2);
        assert!(matches!(queue.peek(), Some(Notice::OccupationStarted { .. })));

        let drained = queue.drain();
        assert!(matches!(drained[0], Notice::OccupationStarted { .. }));
        assert!(matches!(drained[1], Notice::OccupationEnded { .. }));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_display() {
        let notice = Notice::UnitLost {
            unit_type: UnitType::Warrior,
            coord: HexCoord::new(1, 2),
        };
        assert_eq!(notice.to_string(), "Your Warrior at (1, -3, 2) was destroyed");

        let delayed = Notice::ProductionDelayed {
            province: ProvinceId(2),
            name: "Beta".into(),
            until: 31,
        };
        assert_eq!(
            delayed.to_string(),
            "Production in Beta delayed until day 31 by occupation"
        );
    }
}
