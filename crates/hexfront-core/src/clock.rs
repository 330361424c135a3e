//! Wall-clock pacing for the day scheduler.
//!
//! The clock only decides *when* a day boundary happens; the caller runs the
//! scheduler and advances the day counter. At most one boundary is reported
//! per poll, and pausing throws away any partial progress toward the next day.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds per day at normal speed.
pub const NORMAL_DAY_SECONDS: f32 = 1.5;

/// Seconds per day while fast-forwarding.
pub const FAST_DAY_SECONDS: f32 = 0.5;

/// A change in the clock's controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockEvent {
    Running(bool),
    FastForward(bool),
}

/// Paused/running state plus speed selection.
#[derive(Clone, Debug)]
pub struct GameClock {
    running: bool,
    fast_forward: bool,
    normal_interval: Duration,
    fast_interval: Duration,
    elapsed: Duration,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(
            Duration::from_secs_f32(NORMAL_DAY_SECONDS),
            Duration::from_secs_f32(FAST_DAY_SECONDS),
        )
    }
}

impl GameClock {
    /// Create a paused clock with the given day lengths.
    pub fn new(normal_interval: Duration, fast_interval: Duration) -> Self {
        Self {
            running: false,
            fast_forward: false,
            normal_interval,
            fast_interval,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_fast_forward(&self) -> bool {
        self.fast_forward
    }

    /// Current length of one day.
    pub fn interval(&self) -> Duration {
        if self.fast_forward {
            self.fast_interval
        } else {
            self.normal_interval
        }
    }

    /// Start or pause the clock. Returns an event when the state changed.
    pub fn set_running(&mut self, running: bool) -> Option<ClockEvent> {
        if self.running == running {
            return None;
        }
        self.running = running;
        self.elapsed = Duration::ZERO;
        Some(ClockEvent::Running(running))
    }

    pub fn toggle_running(&mut self) -> Option<ClockEvent> {
        self.set_running(!self.running)
    }

    /// Switch between normal speed and fast-forward.
    pub fn set_fast_forward(&mut self, fast: bool) -> Option<ClockEvent> {
        if self.fast_forward == fast {
            return None;
        }
        self.fast_forward = fast;
        Some(ClockEvent::FastForward(fast))
    }

    pub fn toggle_fast_forward(&mut self) -> Option<ClockEvent> {
        self.set_fast_forward(!self.fast_forward)
    }

    /// Feed real elapsed time. Returns `true` when a day boundary was reached.
    pub fn poll(&mut self, elapsed: Duration) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed += elapsed;
        if self.elapsed >= self.interval() {
            self.elapsed = Duration::ZERO;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_paused() {
        let mut clock = GameClock::default();
        assert!(!clock.is_running());
        assert!(!clock.poll(Duration::from_secs(100)));
    }

    #[test]
    fn test_normal_speed() {
        let mut clock = GameClock::default();
        clock.set_running(true);
        assert!(!clock.poll(Duration::from_millis(1000)));
        assert!(clock.poll(Duration::from_millis(500)));
        assert!(!clock.poll(Duration::from_millis(100)));
    }

    #[test]
    fn test_fast_forward() {
        let mut clock = GameClock::default();
        clock.set_running(true);
        assert_eq!(clock.toggle_fast_forward(), Some(ClockEvent::FastForward(true)));
        assert_eq!(clock.interval(), Duration::from_millis(500));
        assert!(clock.poll(Duration::from_millis(500)));
    }

    #[test]
    fn test_one_day_per_poll() {
        let mut clock = GameClock::default();
        clock.set_running(true);
        assert!(clock.poll(Duration::from_secs(10)));
        assert!(!clock.poll(Duration::ZERO));
    }

    #[test]
    fn test_pause_discards_progress() {
        let mut clock = GameClock::default();
        clock.set_running(true);
        assert!(!clock.poll(Duration::from_millis(1400)));
        assert_eq!(clock.toggle_running(), Some(ClockEvent::Running(false)));
        assert_eq!(clock.set_running(true), Some(ClockEvent::Running(true)));
        assert!(!clock.poll(Duration::from_millis(200)));
    }

    #[test]
    fn test_redundant_set_is_silent() {
        let mut clock = GameClock::default();
        assert_eq!(clock.set_running(false), None);
        assert_eq!(clock.set_fast_forward(false), None);
    }
}
