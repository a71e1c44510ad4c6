//! Timbre controls shared between the control thread and the audio thread.
//!
//! Each control is an `f32` stored as its bit pattern in an `AtomicU32`, so the
//! render loop reads the latest value without locking. Values are clamped on
//! the way in; whatever is stored is always in range.

use std::sync::atomic::{AtomicU32, Ordering};

/// Lock-free `f32` cell.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Timbre values for one render quantum.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimbreSnapshot {
    /// One-pole low-pass coefficient (higher = brighter)
    pub lpf_alpha: f32,
    /// Level of the detuned chorus copy
    pub chorus_mix: f32,
    /// Level of the octave-up copy
    pub octave_up_mix: f32,
}

impl TimbreSnapshot {
    pub const DEFAULT_LPF_ALPHA: f32 = 0.08;
    pub const DEFAULT_CHORUS_MIX: f32 = 0.35;
    pub const DEFAULT_OCTAVE_UP_MIX: f32 = 0.0;

    /// Build a snapshot, clamping every value into [0, 1].
    pub fn new(lpf_alpha: f32, chorus_mix: f32, octave_up_mix: f32) -> Self {
        Self {
            lpf_alpha: clamp_unit(lpf_alpha),
            chorus_mix: clamp_unit(chorus_mix),
            octave_up_mix: clamp_unit(octave_up_mix),
        }
    }

    /// Open the filter in proportion to bellows pressure.
    ///
    /// `alpha' = clamp(alpha * (1 + amount * pressure))`
    pub fn brightened(self, pressure: f32, amount: f32) -> Self {
        Self {
            lpf_alpha: clamp_unit(self.lpf_alpha * (1.0 + amount * pressure)),
            ..self
        }
    }
}

impl Default for TimbreSnapshot {
    fn default() -> Self {
        Self {
            lpf_alpha: Self::DEFAULT_LPF_ALPHA,
            chorus_mix: Self::DEFAULT_CHORUS_MIX,
            octave_up_mix: Self::DEFAULT_OCTAVE_UP_MIX,
        }
    }
}

/// Clamp into [0, 1]. NaN maps to 0.
#[inline]
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Timbre controls, written by a single control thread and read by the renderer.
#[derive(Debug)]
pub struct TimbreParameters {
    lpf_alpha: AtomicF32,
    chorus_mix: AtomicF32,
    octave_up_mix: AtomicF32,
}

impl TimbreParameters {
    pub fn new(initial: TimbreSnapshot) -> Self {
        let initial = TimbreSnapshot::new(initial.lpf_alpha, initial.chorus_mix, initial.octave_up_mix);
        Self {
            lpf_alpha: AtomicF32::new(initial.lpf_alpha),
            chorus_mix: AtomicF32::new(initial.chorus_mix),
            octave_up_mix: AtomicF32::new(initial.octave_up_mix),
        }
    }

    pub fn set_lpf_alpha(&self, value: f32) {
        self.lpf_alpha.store(clamp_unit(value));
    }

    pub fn set_chorus_mix(&self, value: f32) {
        self.chorus_mix.store(clamp_unit(value));
    }

    pub fn set_octave_up_mix(&self, value: f32) {
        self.octave_up_mix.store(clamp_unit(value));
    }

    pub fn lpf_alpha(&self) -> f32 {
        self.lpf_alpha.load()
    }

    pub fn chorus_mix(&self) -> f32 {
        self.chorus_mix.load()
    }

    pub fn octave_up_mix(&self) -> f32 {
        self.octave_up_mix.load()
    }

    pub fn snapshot(&self) -> TimbreSnapshot {
        TimbreSnapshot {
            lpf_alpha: self.lpf_alpha(),
            chorus_mix: self.chorus_mix(),
            octave_up_mix: self.octave_up_mix(),
        }
    }
}

impl Default for TimbreParameters {
    fn default() -> Self {
        Self::new(TimbreSnapshot::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_round_trip_in_range_values() {
        let params = TimbreParameters::default();
        params.set_lpf_alpha(0.42);
        params.set_chorus_mix(0.1);
        params.set_octave_up_mix(0.75);

        assert_eq!(params.lpf_alpha(), 0.42);
        assert_eq!(params.chorus_mix(), 0.1);
        assert_eq!(params.octave_up_mix(), 0.75);
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let params = TimbreParameters::default();
        params.set_lpf_alpha(1.5);
        params.set_chorus_mix(-0.2);
        params.set_octave_up_mix(f32::NAN);

        assert_eq!(params.snapshot(), TimbreSnapshot::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn defaults_match_reed_organ_voicing() {
        let snapshot = TimbreParameters::default().snapshot();
        assert_eq!(snapshot.lpf_alpha, 0.08);
        assert_eq!(snapshot.chorus_mix, 0.35);
        assert_eq!(snapshot.octave_up_mix, 0.0);
    }

    #[test]
    fn brightening_is_clamped() {
        let snapshot = TimbreSnapshot::new(0.6, 0.2, 0.0);
        assert_eq!(snapshot.brightened(0.0, 0.5).lpf_alpha, 0.6);
        assert!((snapshot.brightened(0.5, 0.5).lpf_alpha - 0.75).abs() < 1e-6);
        assert_eq!(snapshot.brightened(1.0, 2.0).lpf_alpha, 1.0);
    }
}
