use nbody_core::{MAX_STEPS_PER_FRAME, TICK_RATE};

/// Fixed-rate step scheduler fed with wall-clock frame time.
///
/// Emits one tick per `1 / TICK_RATE` seconds of accumulated time, capped at
/// `MAX_STEPS_PER_FRAME` per frame. Time beyond the cap is dropped so a slow frame
/// never snowballs into a longer one.
#[derive(Debug, Clone, PartialEq)]
pub struct StepClock {
    period: f64,
    accumulator: f64,
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(TICK_RATE)
    }
}

impl StepClock {
    pub fn new(tick_rate: f64) -> Self {
        Self {
            period: 1.0 / tick_rate.max(f64::MIN_POSITIVE),
            accumulator: 0.0,
        }
    }

    /// Number of steps to run for a frame that took `frame_seconds`
    pub fn advance(&mut self, frame_seconds: f64) -> u32 {
        if frame_seconds.is_finite() && frame_seconds > 0.0 {
            self.accumulator += frame_seconds;
        }

        let due = (self.accumulator / self.period).floor();
        let steps = due.min(MAX_STEPS_PER_FRAME as f64) as u32;
        if due > MAX_STEPS_PER_FRAME as f64 {
            self.accumulator = 0.0;
        } else {
            self.accumulator -= steps as f64 * self.period;
        }
        steps
    }
}
