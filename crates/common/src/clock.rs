//! Simulated clock used to walk source time during export.
//!
//! The export pipeline never plays media in real time. Instead it advances a
//! cursor through source time in fixed steps of `frame_duration * speed`:
//! - the sampling granularity is set by the output frame rate
//! - the speed factor stretches or compresses how much source time each
//!   output frame covers

use crate::error::{VidspliceError, VidspliceResult};

/// Cursor over source time, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedClock {
    fps: u32,
    speed_factor: f64,
    duration_ms: f64,
}

impl SimulatedClock {
    /// Create a clock sampling `duration_ms` of source time at `fps`,
    /// advancing `speed_factor` frame durations per step.
    pub fn new(fps: u32, speed_factor: f64, duration_ms: f64) -> VidspliceResult<Self> {
        if fps == 0 {
            return Err(VidspliceError::invalid_argument("fps must be positive"));
        }
        if !speed_factor.is_finite() || speed_factor <= 0.0 {
            return Err(VidspliceError::invalid_argument(format!(
                "speed factor must be positive, got {speed_factor}"
            )));
        }
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(VidspliceError::invalid_argument(format!(
                "duration must be non-negative, got {duration_ms}ms"
            )));
        }
        Ok(Self {
            fps,
            speed_factor,
            duration_ms,
        })
    }

    /// Output frame duration in milliseconds (`1000 / fps`).
    pub fn frame_duration_ms(&self) -> f64 {
        1000.0 / self.fps as f64
    }

    /// Source time covered by one step.
    pub fn step_ms(&self) -> f64 {
        1000.0 * self.speed_factor / self.fps as f64
    }

    /// Source duration being walked.
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Number of steps needed to reach the end of the source.
    ///
    /// Equal to `ceil(duration / step)`, evaluated as
    /// `duration * fps / (1000 * speed)` so whole-frame durations do not
    /// pick up a spurious extra step from rounding in `1000 / fps`.
    pub fn total_steps(&self) -> u64 {
        let steps = self.duration_ms * self.fps as f64 / (1000.0 * self.speed_factor);
        let nearest = steps.round();
        if (steps - nearest).abs() < 1e-9 {
            nearest as u64
        } else {
            steps.ceil() as u64
        }
    }

    /// Simulated time of step `index`.
    ///
    /// Computed from the index rather than accumulated so long walks do not
    /// drift.
    pub fn time_at(&self, index: u64) -> f64 {
        index as f64 * 1000.0 * self.speed_factor / self.fps as f64
    }

    /// Iterate `(index, time_ms)` for every step in order.
    pub fn steps(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        (0..self.total_steps()).map(move |i| (i, self.time_at(i)))
    }

    /// Convert seconds to milliseconds.
    pub fn secs_to_ms(secs: f64) -> f64 {
        secs * 1000.0
    }

    /// Convert milliseconds to seconds.
    pub fn ms_to_secs(ms: f64) -> f64 {
        ms / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_steps_at_normal_speed() {
        let clock = SimulatedClock::new(24, 1.0, 10_000.0).unwrap();
        assert_eq!(clock.total_steps(), 240);
        assert!((clock.frame_duration_ms() - 41.666_666).abs() < 1e-3);
    }

    #[test]
    fn test_doubling_speed_halves_steps() {
        let normal = SimulatedClock::new(24, 1.0, 10_000.0).unwrap();
        let fast = SimulatedClock::new(24, 2.0, 10_000.0).unwrap();
        assert_eq!(fast.total_steps() * 2, normal.total_steps());
    }

    #[test]
    fn test_step_times_land_on_exact_boundaries() {
        let clock = SimulatedClock::new(24, 1.0, 10_000.0).unwrap();
        assert_eq!(clock.time_at(120), 5_000.0);
        assert_eq!(clock.time_at(24), 1_000.0);
    }

    #[test]
    fn test_steps_stay_below_duration() {
        let clock = SimulatedClock::new(30, 0.5, 1_000.0).unwrap();
        let times: Vec<f64> = clock.steps().map(|(_, t)| t).collect();
        assert_eq!(times.len() as u64, clock.total_steps());
        assert_eq!(times[0], 0.0);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert!(*times.last().unwrap() < 1_000.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(SimulatedClock::new(0, 1.0, 1.0).is_err());
        assert!(SimulatedClock::new(24, 0.0, 1.0).is_err());
        assert!(SimulatedClock::new(24, f64::NAN, 1.0).is_err());
        assert!(SimulatedClock::new(24, 1.0, -1.0).is_err());
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(SimulatedClock::secs_to_ms(2.5), 2_500.0);
        assert_eq!(SimulatedClock::ms_to_secs(750.0), 0.75);
    }
}
