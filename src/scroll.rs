//! Displacement-to-scroll conversion.
//!
//! Turns the vertical distance between the pointer and the anchor into a
//! continuous step rate, then accumulates that rate over time into whole
//! scroll commands, carrying the fractional remainder between ticks.
//!
//! # Example
//!
//! ```rust,ignore
//! let params = RateParams { dead_zone: 8.0, gain: 0.3, max_rate: 240.0 };
//! let mut accumulator = StepAccumulator::new();
//!
//! // In the control loop:
//! let rate = scroll_rate(y - anchor.y, &params);
//! for direction in accumulator.advance(rate, period) {
//!     sink.scroll(direction).await?;
//! }
//! ```

use std::time::Duration;

/// One discrete scroll command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Towards the end of the document (pointer below the anchor)
    Forward,
    /// Towards the start of the document (pointer above the anchor)
    Backward,
}

/// Parameters of the linear displacement-to-rate mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateParams {
    /// Displacement band around the anchor treated as zero, in pixels
    pub dead_zone: f64,
    /// Steps per second per pixel beyond the dead zone
    pub gain: f64,
    /// Upper bound on the rate magnitude, in steps per second
    pub max_rate: f64,
}

/// Convert a signed vertical displacement into a clamped step rate.
///
/// Returns 0 inside the dead zone, otherwise the excess beyond the dead zone
/// scaled by the gain, with the sign of `dy`, clamped to `±max_rate`.
pub fn scroll_rate(dy: f64, params: &RateParams) -> f64 {
    let magnitude = dy.abs();
    if magnitude <= params.dead_zone {
        return 0.0;
    }

    let rate = (magnitude - params.dead_zone) * params.gain * dy.signum();
    rate.clamp(-params.max_rate, params.max_rate)
}

/// Accumulates fractional scroll steps into whole commands.
///
/// The remainder always stays within `(-1, 1)`, so the emitted count never
/// drifts from the integral of the rate by a full step.
#[derive(Debug, Clone, Default)]
pub struct StepAccumulator {
    /// Fractional steps owed since the last emission
    remainder: f64,
}

impl StepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rate * dt` worth of steps and return the whole steps now due,
    /// in emission order.
    pub fn advance(&mut self, rate: f64, dt: Duration) -> Vec<ScrollDirection> {
        self.remainder += rate * dt.as_secs_f64();

        let mut emitted = Vec::new();
        while self.remainder >= 1.0 {
            emitted.push(ScrollDirection::Forward);
            self.remainder -= 1.0;
        }
        while self.remainder <= -1.0 {
            emitted.push(ScrollDirection::Backward);
            self.remainder += 1.0;
        }
        emitted
    }

    /// Fractional steps currently carried over.
    #[cfg(test)]
    pub fn remainder(&self) -> f64 {
        self.remainder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: RateParams = RateParams {
        dead_zone: 8.0,
        gain: 0.3,
        max_rate: 60.0,
    };

    fn signed_count(directions: &[ScrollDirection]) -> i64 {
        directions
            .iter()
            .map(|d| match d {
                ScrollDirection::Forward => 1,
                ScrollDirection::Backward => -1,
            })
            .sum()
    }

    #[test]
    fn test_dead_zone_is_exactly_zero() {
        for dy in [-8.0, -5.0, -0.5, 0.0, 0.5, 5.0, 8.0] {
            assert_eq!(scroll_rate(dy, &PARAMS), 0.0, "dy = {}", dy);
        }

        let huge_gain = RateParams { gain: 1000.0, ..PARAMS };
        assert_eq!(scroll_rate(5.0, &huge_gain), 0.0);
    }

    #[test]
    fn test_rate_beyond_dead_zone() {
        // dy = 40 -> excess 32 -> 9.6 steps/s
        assert!((scroll_rate(40.0, &PARAMS) - 9.6).abs() < 1e-9);
        assert!((scroll_rate(-40.0, &PARAMS) + 9.6).abs() < 1e-9);
    }

    #[test]
    fn test_rate_monotonic_and_clamped() {
        let mut previous = 0.0;
        for step in 0..2000 {
            let dy = step as f64 * 0.5;
            let rate = scroll_rate(dy, &PARAMS);
            assert!(rate >= previous, "rate decreased at dy = {}", dy);
            assert!(rate <= PARAMS.max_rate);
            assert!(scroll_rate(-dy, &PARAMS) >= -PARAMS.max_rate);
            previous = rate;
        }
        assert_eq!(scroll_rate(10_000.0, &PARAMS), PARAMS.max_rate);
        assert_eq!(scroll_rate(-10_000.0, &PARAMS), -PARAMS.max_rate);
    }

    #[test]
    fn test_accumulate_carries_remainder() {
        let mut acc = StepAccumulator::new();
        let dt = Duration::from_millis(100);

        // 4 steps/s * 0.1s = 0.4 per call
        assert!(acc.advance(4.0, dt).is_empty());
        assert!(acc.advance(4.0, dt).is_empty());
        assert_eq!(acc.advance(4.0, dt), vec![ScrollDirection::Forward]);
        assert!((acc.remainder() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_accumulate_multiple_units_per_call() {
        let mut acc = StepAccumulator::new();
        let emitted = acc.advance(-35.0, Duration::from_millis(100));
        assert_eq!(emitted, vec![ScrollDirection::Backward; 3]);
        assert!((acc.remainder() + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_accumulate_direction_reversal_keeps_remainder() {
        let mut acc = StepAccumulator::new();
        let dt = Duration::from_secs(1);

        assert_eq!(acc.advance(1.5, dt), vec![ScrollDirection::Forward]);
        // 0.5 owed forward, now 2.0 backward -> -1.5 -> one backward unit
        assert_eq!(acc.advance(-2.0, dt), vec![ScrollDirection::Backward]);
        assert!((acc.remainder() + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_rate_is_idle() {
        let mut acc = StepAccumulator::new();
        acc.advance(7.0, Duration::from_millis(50));
        let before = acc.remainder();

        for _ in 0..1000 {
            assert!(acc.advance(0.0, Duration::from_millis(4)).is_empty());
        }
        assert_eq!(acc.remainder(), before);
    }

    #[test]
    fn test_no_drift_over_mixed_sequence() {
        let mut acc = StepAccumulator::new();
        let rates = [9.6, -3.2, 60.0, 0.0, -60.0, 0.7, -0.7, 12.5, -45.1, 33.3];
        let dts = [1, 4, 16, 17, 33, 250];

        let mut expected = 0.0;
        let mut emitted = 0i64;
        for i in 0..500 {
            let rate = rates[i % rates.len()];
            let dt = Duration::from_millis(dts[i % dts.len()]);
            expected += rate * dt.as_secs_f64();
            emitted += signed_count(&acc.advance(rate, dt));

            assert!((expected - emitted as f64).abs() < 1.0 + 1e-9, "drift at call {}", i);
            assert!(acc.remainder() > -1.0 && acc.remainder() < 1.0);
        }
    }

    #[test]
    fn test_one_second_at_sixty_hz() {
        let mut acc = StepAccumulator::new();
        let rate = scroll_rate(540.0 - 500.0, &PARAMS);
        let period = Duration::from_secs_f64(1.0 / 60.0);

        let forward: usize = (0..60).map(|_| acc.advance(rate, period).len()).sum();
        assert!(forward == 9 || forward == 10, "got {}", forward);

        // Deterministic given the same inputs
        let mut again = StepAccumulator::new();
        let repeat: usize = (0..60).map(|_| again.advance(rate, period).len()).sum();
        assert_eq!(forward, repeat);
    }
}
