/// Animation clock: turns elapsed time into a rotation angle
use std::f64::consts::TAU;

use crate::error::{PipelineError, Result};

/// Angle in radians after `now_seconds` of a rotation that completes one
/// revolution every `period_seconds`.
///
/// The result is not wrapped: `tick(period, period)` is exactly 2π. A zero
/// period is a configuration error rather than an infinite angle. A negative
/// period spins the other way.
pub fn tick(now_seconds: f64, period_seconds: f64) -> Result<f32> {
    validate_period(period_seconds)?;
    if !now_seconds.is_finite() {
        return Err(PipelineError::config(format!(
            "time sample {} is not finite",
            now_seconds
        )));
    }
    Ok((now_seconds / period_seconds * TAU) as f32)
}

pub(crate) fn validate_period(period_seconds: f64) -> Result<()> {
    if period_seconds == 0.0 || !period_seconds.is_finite() {
        return Err(PipelineError::config(format!(
            "rotation period {} must be finite and non-zero",
            period_seconds
        )));
    }
    Ok(())
}

/// Per-frame animation state, threaded through the frame loop by value.
///
/// The epoch is the first time sample seen. Elapsed time never decreases,
/// so a host timestamp that jumps backwards simply holds the angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    period_seconds: f64,
    epoch: Option<f64>,
    elapsed: f64,
}

impl AnimationState {
    pub fn new(period_seconds: f64) -> Result<Self> {
        validate_period(period_seconds)?;
        Ok(Self {
            period_seconds,
            epoch: None,
            elapsed: 0.0,
        })
    }

    /// Consume a host timestamp and return the next state.
    pub fn advance(self, now_seconds: f64) -> Result<Self> {
        if !now_seconds.is_finite() {
            return Err(PipelineError::config(format!(
                "time sample {} is not finite",
                now_seconds
            )));
        }
        let epoch = self.epoch.unwrap_or(now_seconds);
        let elapsed = (now_seconds - epoch).max(self.elapsed);
        Ok(Self {
            epoch: Some(epoch),
            elapsed,
            ..self
        })
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn period(&self) -> f64 {
        self.period_seconds
    }

    /// Current angle wrapped to [0, 2π)
    pub fn angle(&self) -> f32 {
        // Reduce to one period in f64 first so long runs keep f32 precision
        let phase = self.elapsed % self.period_seconds;
        // period and elapsed are validated on construction and advance
        let wrapped = tick(phase, self.period_seconds)
            .unwrap_or(0.0)
            .rem_euclid(std::f32::consts::TAU);
        // rounding can land exactly on 2π
        if wrapped >= std::f32::consts::TAU {
            0.0
        } else {
            wrapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_full_period_is_one_revolution() {
        assert_eq!(tick(5.0, 5.0).unwrap(), TAU);
        assert_eq!(tick(0.25, 0.25).unwrap(), TAU);
    }

    #[test]
    fn test_time_zero_is_angle_zero() {
        assert_eq!(tick(0.0, 5.0).unwrap(), 0.0);
    }

    #[test]
    fn test_tick_is_not_wrapped() {
        let angle = tick(9.0, 6.0).unwrap();
        assert!((angle - 3.0 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_zero_period_is_invalid() {
        assert!(matches!(
            tick(1.0, 0.0),
            Err(PipelineError::InvalidConfiguration(_))
        ));
        assert!(AnimationState::new(0.0).is_err());
        assert!(AnimationState::new(f64::INFINITY).is_err());
        assert!(tick(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_negative_period_spins_backwards() {
        let angle = tick(1.0, -4.0).unwrap();
        assert!((angle + PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_state_starts_at_first_sample() {
        let state = AnimationState::new(6.0).unwrap();
        let state = state.advance(1234.5).unwrap();
        assert_eq!(state.elapsed(), 0.0);
        assert_eq!(state.angle(), 0.0);

        let state = state.advance(1234.5 + 1.5).unwrap();
        assert!((state.angle() - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_state_angle_wraps() {
        let state = AnimationState::new(2.0)
            .unwrap()
            .advance(0.0)
            .unwrap()
            .advance(2.0)
            .unwrap();
        assert!(state.angle().abs() < 1e-6);

        let state = state.advance(5.0).unwrap();
        assert!((state.angle() - PI).abs() < 1e-5);
        assert!(state.angle() >= 0.0 && state.angle() < TAU);
    }

    #[test]
    fn test_state_time_never_runs_backwards() {
        let state = AnimationState::new(6.0)
            .unwrap()
            .advance(10.0)
            .unwrap()
            .advance(13.0)
            .unwrap();
        let rewound = state.advance(11.0).unwrap();
        assert_eq!(rewound.elapsed(), 3.0);
        assert_eq!(rewound.angle(), state.angle());
    }

    #[test]
    fn test_state_angle_agrees_with_tick() {
        let state = AnimationState::new(6.0).unwrap().advance(0.0).unwrap();
        for now in [0.5, 2.0, 4.75] {
            let advanced = state.advance(now).unwrap();
            assert!((advanced.angle() - tick(now, 6.0).unwrap()).abs() < 1e-6);
        }

        // Many revolutions in, the phase is still exact
        let late = state.advance(600_000.0 + 1.5).unwrap();
        assert!((late.angle() - PI / 2.0).abs() < 1e-4);

        let backwards = AnimationState::new(-4.0)
            .unwrap()
            .advance(0.0)
            .unwrap()
            .advance(1.0)
            .unwrap();
        assert!((backwards.angle() - 1.5 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_repeated_sample_gives_same_angle() {
        let state = AnimationState::new(3.0).unwrap().advance(0.0).unwrap();
        let a = state.advance(1.0).unwrap();
        let b = a.advance(1.0).unwrap();
        assert_eq!(a.angle(), b.angle());
    }
}
