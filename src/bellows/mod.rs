//! Bellows pressure from lid motion.
//!
//! The lid angle sensor fires at an irregular rate. Each sample becomes an
//! angular speed, which is smoothed and pumped into a leaky "air reservoir":
//!
//! ```text
//!   raw      = |angle - previous| / dt                 (clamped)
//!   velocity = s · raw + (1 - s) · velocity
//!   pressure = pressure · e^(-dt/τ) + k · velocity · min(dt, 0.1 s)  (clamped to [0, 1])
//! ```
//!
//! Between samples the reservoir only leaks, so the pressure at any later time
//! can be computed without touching the estimator ([`PressureEstimator::pressure_at`]).
//! That is how a lid that stopped moving, and stopped reporting, still bleeds
//! down to silence.

use std::time::Instant;

/// Longest interval credited to the rise term. After a long silence the stale
/// smoothed velocity must not pump a burst of air in one step.
const MAX_RISE_INTERVAL_SECS: f32 = 0.1;

/// Pressure estimator tuning.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureConfig {
    /// Exponential smoothing factor for angular velocity (0..1, higher = more responsive)
    pub smoothing: f32,
    /// Pressure gained per degree of lid travel
    pub rise_gain: f32,
    /// Leak time constant τ in seconds
    pub decay_secs: f32,
    /// Raw angular speeds above this (deg/s) are treated as sensor glitches and clamped
    pub max_velocity: f32,
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.3,
            rise_gain: 0.02,
            decay_secs: 0.8,
            max_velocity: 2_000.0,
        }
    }
}

impl PressureConfig {
    /// Force every field into a usable range.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
        Self {
            smoothing: finite_or(self.smoothing, defaults.smoothing).clamp(0.0, 1.0),
            rise_gain: finite_or(self.rise_gain, defaults.rise_gain).max(0.0),
            decay_secs: finite_or(self.decay_secs, defaults.decay_secs).max(1e-3),
            max_velocity: finite_or(self.max_velocity, defaults.max_velocity).max(0.0),
        }
    }
}

/// Apply `elapsed` seconds of reservoir leak to `pressure`.
#[inline]
pub fn decayed(pressure: f32, elapsed: f32, decay_secs: f32) -> f32 {
    if elapsed <= 0.0 {
        return pressure;
    }
    (pressure * (-elapsed / decay_secs).exp()).clamp(0.0, 1.0)
}

/// Turns lid angle samples into smoothed velocity and bellows pressure.
///
/// Never allocates, never blocks.
#[derive(Debug, Clone)]
pub struct PressureEstimator {
    config: PressureConfig,
    previous: Option<(f32, Instant)>,
    velocity: f32,
    pressure: f32,
}

impl PressureEstimator {
    pub fn new(config: PressureConfig) -> Self {
        Self {
            config: config.sanitized(),
            previous: None,
            velocity: 0.0,
            pressure: 0.0,
        }
    }

    /// Feed one angle sample (degrees) taken at `now`.
    ///
    /// Returns `false` when the sample was rejected and state is unchanged:
    /// non-finite angle, a timestamp earlier than the previous sample, or a
    /// zero interval. The first sample only records the angle.
    pub fn update(&mut self, angle: f32, now: Instant) -> bool {
        if !angle.is_finite() {
            return false;
        }

        let Some((previous_angle, previous_time)) = self.previous else {
            self.previous = Some((angle, now));
            return true;
        };

        if now <= previous_time {
            return false;
        }
        let dt = now.duration_since(previous_time).as_secs_f32();
        if dt <= 0.0 {
            return false;
        }

        let raw = ((angle - previous_angle).abs() / dt).min(self.config.max_velocity);
        let s = self.config.smoothing;
        self.velocity = (s * raw + (1.0 - s) * self.velocity).max(0.0);

        let leaked = decayed(self.pressure, dt, self.config.decay_secs);
        let rise = self.config.rise_gain * self.velocity * dt.min(MAX_RISE_INTERVAL_SECS);
        self.pressure = (leaked + rise).clamp(0.0, 1.0);

        self.previous = Some((angle, now));
        true
    }

    /// Smoothed angular speed in degrees per second.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Pressure as of the last accepted sample.
    pub fn pressure(&self) -> f32 {
        self.pressure
    }

    /// Pressure at `now`, including the leak since the last accepted sample.
    pub fn pressure_at(&self, now: Instant) -> f32 {
        match self.previous {
            Some((_, stamp)) => decayed(
                self.pressure,
                now.saturating_duration_since(stamp).as_secs_f32(),
                self.config.decay_secs,
            ),
            None => self.pressure,
        }
    }

    /// Time of the last accepted sample.
    pub fn last_update(&self) -> Option<Instant> {
        self.previous.map(|(_, stamp)| stamp)
    }

    pub fn config(&self) -> &PressureConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.velocity = 0.0;
        self.pressure = 0.0;
    }
}

impl Default for PressureEstimator {
    fn default() -> Self {
        Self::new(PressureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Sweep the lid at `deg_per_step` every 50 ms for `steps` samples.
    fn pump(est: &mut PressureEstimator, t0: Instant, steps: u64, deg_per_step: f32) -> Instant {
        let mut angle = 90.0;
        let mut t = t0;
        for i in 0..steps {
            t = t0 + ms(50 * i);
            est.update(angle, t);
            angle += deg_per_step;
        }
        t
    }

    #[test]
    fn first_sample_has_zero_velocity() {
        let mut est = PressureEstimator::default();
        assert!(est.update(45.0, Instant::now()));
        assert_eq!(est.velocity(), 0.0);
        assert_eq!(est.pressure(), 0.0);
    }

    #[test]
    fn motion_raises_pressure_and_velocity() {
        let mut est = PressureEstimator::default();
        pump(&mut est, Instant::now(), 20, 5.0);
        assert!(est.velocity() > 80.0 && est.velocity() <= 100.0);
        assert!(est.pressure() > 0.5);
    }

    #[test]
    fn zero_and_negative_intervals_are_rejected() {
        let mut est = PressureEstimator::default();
        let t0 = Instant::now();
        let last = pump(&mut est, t0, 5, 5.0);
        let (velocity, pressure) = (est.velocity(), est.pressure());

        assert!(!est.update(200.0, last));
        assert!(!est.update(10.0, last - ms(10)));
        assert!(!est.update(f32::NAN, last + ms(10)));
        assert_eq!(est.velocity(), velocity);
        assert_eq!(est.pressure(), pressure);
        assert_eq!(est.last_update(), Some(last));
    }

    #[test]
    fn pressure_stays_in_unit_range_under_abuse() {
        let mut est = PressureEstimator::default();
        let t0 = Instant::now();
        let angles = [0.0, 360.0, -720.0, 1e9, -1e9, 0.0, 180.0, f32::INFINITY, 5.0];
        let mut t = t0;
        for (i, &angle) in angles.iter().cycle().take(200).enumerate() {
            // Mix of tiny, zero, backwards and huge steps.
            t = match i % 4 {
                0 => t + Duration::from_nanos(1),
                1 => t,
                2 => t.checked_sub(ms(3)).unwrap_or(t),
                _ => t + Duration::from_secs(30),
            };
            est.update(angle, t);
            assert!((0.0..=1.0).contains(&est.pressure()));
            assert!(est.velocity() >= 0.0 && est.velocity().is_finite());
        }
    }

    #[test]
    fn pressure_bleeds_to_zero_without_input() {
        let mut est = PressureEstimator::default();
        let last = pump(&mut est, Instant::now(), 20, 5.0);
        let tau = est.config().decay_secs;

        let later = last + Duration::from_secs_f32(tau * 6.0);
        assert!(est.pressure_at(later) < 0.01);
        // Reading does not mutate.
        assert!(est.pressure() > 0.5);
    }

    #[test]
    fn long_gap_decays_before_new_motion_counts() {
        let mut est = PressureEstimator::default();
        let last = pump(&mut est, Instant::now(), 20, 5.0);

        est.update(185.0, last + Duration::from_secs(10));
        // 10 s of leak, then at most one short interval of rise.
        assert!(est.pressure() < 0.2);
    }

    #[test]
    fn still_lid_lets_velocity_settle() {
        let mut est = PressureEstimator::default();
        let last = pump(&mut est, Instant::now(), 20, 5.0);
        let angle = 90.0 + 5.0 * 19.0;
        for i in 1..=40 {
            est.update(angle, last + ms(50 * i));
        }
        assert!(est.velocity() < 0.1);
    }
}
