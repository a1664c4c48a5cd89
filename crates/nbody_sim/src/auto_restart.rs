use std::time::Duration;

use bevy::prelude::*;
use nbody_core::SimConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoState {
    Idle,
    Armed { remaining: Duration },
}

/// Wall-clock timer that periodically asks for a fresh population.
/// Independent of how many simulation steps actually run.
#[derive(Resource, Debug, Clone)]
pub struct AutoRestart {
    state: AutoState,
    interval: Duration,
}

impl Default for AutoRestart {
    fn default() -> Self {
        Self::new(SimConfig::default().auto_restart_minutes)
    }
}

impl AutoRestart {
    pub fn new(minutes: f32) -> Self {
        let mut auto = Self {
            state: AutoState::Idle,
            interval: Duration::ZERO,
        };
        auto.set_interval_minutes(minutes);
        auto
    }

    pub fn state(&self) -> AutoState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, AutoState::Armed { .. })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn remaining(&self) -> Option<Duration> {
        match self.state {
            AutoState::Idle => None,
            AutoState::Armed { remaining } => Some(remaining),
        }
    }

    /// Arm the timer. Returns true when the caller should regenerate right away,
    /// which is the case whenever the mode was off.
    pub fn enable(&mut self) -> bool {
        if self.is_enabled() {
            return false;
        }
        self.state = AutoState::Armed { remaining: self.interval };
        true
    }

    /// Stop timing; the current population is left alone
    pub fn disable(&mut self) {
        self.state = AutoState::Idle;
    }

    /// Flip the mode; returns true when a restart is due
    pub fn toggle(&mut self) -> bool {
        if self.is_enabled() {
            self.disable();
            false
        } else {
            self.enable()
        }
    }

    /// Clamp to 1-10 minutes. A running countdown never exceeds the new interval.
    pub fn set_interval_minutes(&mut self, minutes: f32) {
        let (lo, hi) = SimConfig::AUTO_RESTART_RANGE;
        let minutes = if minutes.is_finite() { minutes.clamp(lo, hi) } else { lo };
        self.interval = Duration::from_secs_f32(minutes * 60.0);
        if let AutoState::Armed { remaining } = &mut self.state {
            *remaining = (*remaining).min(self.interval);
        }
    }

    /// Count down by `elapsed`. Returns true on expiry and re-arms for another interval.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        let AutoState::Armed { remaining } = &mut self.state else {
            return false;
        };
        match remaining.checked_sub(elapsed) {
            Some(left) if !left.is_zero() => {
                *remaining = left;
                false
            }
            _ => {
                *remaining = self.interval;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_enable_requests_restart() {
        let mut auto = AutoRestart::new(2.0);
        assert!(!auto.is_enabled());
        assert!(auto.enable());
        assert_eq!(auto.remaining(), Some(2 * MINUTE));
        assert!(!auto.enable(), "already armed");
    }

    #[test]
    fn test_fires_after_interval_and_rearms() {
        let mut auto = AutoRestart::new(2.0);
        auto.enable();
        assert!(!auto.tick(MINUTE));
        assert!(!auto.tick(MINUTE - Duration::from_millis(1)));
        assert!(auto.tick(Duration::from_millis(1)));
        assert_eq!(auto.remaining(), Some(2 * MINUTE));
        assert!(!auto.tick(MINUTE));
    }

    #[test]
    fn test_disable_stops_timer() {
        let mut auto = AutoRestart::new(1.0);
        auto.enable();
        auto.disable();
        assert!(!auto.tick(10 * MINUTE));
        assert_eq!(auto.state(), AutoState::Idle);
    }

    #[test]
    fn test_toggle() {
        let mut auto = AutoRestart::new(1.0);
        assert!(auto.toggle());
        assert!(auto.is_enabled());
        assert!(!auto.toggle());
        assert!(!auto.is_enabled());
    }

    #[test]
    fn test_interval_clamped_and_shortens_countdown() {
        let mut auto = AutoRestart::new(30.0);
        assert_eq!(auto.interval(), 10 * MINUTE);
        auto.set_interval_minutes(0.1);
        assert_eq!(auto.interval(), MINUTE);

        auto.set_interval_minutes(5.0);
        auto.enable();
        auto.set_interval_minutes(2.0);
        assert_eq!(auto.remaining(), Some(2 * MINUTE));

        auto.tick(MINUTE);
        auto.set_interval_minutes(8.0);
        assert_eq!(auto.remaining(), Some(MINUTE), "longer interval leaves countdown alone");
    }
}
