use crate::bellows::PressureConfig;
use crate::synth::timbre::{clamp_unit, TimbreSnapshot};

/// Construction-time settings for an [`Engine`](super::Engine).
///
/// Built from `Default` and chained `with_*` setters. Every setter clamps its
/// value into a usable range; nothing here can fail.
///
/// ```
/// use lid_harmonium::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_sample_rate(44_100.0)
///     .with_max_voices(8)
///     .with_pressure_floor(0.2);
/// assert_eq!(config.max_voices, 8);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Polyphony (fixed pool size)
    pub max_voices: usize,
    pub attack_secs: f32,
    pub release_secs: f32,
    /// Release used by all-notes-off and stop
    pub fast_release_secs: f32,
    pub chorus_detune_cents: f32,
    pub pressure: PressureConfig,
    /// Lowest effective pressure; 0 lets held notes fall silent with the bellows
    pub pressure_floor: f32,
    /// How much pressure opens the low-pass (0 = none)
    pub brightness_tracking: f32,
    /// Gain before the final `tanh` clip
    pub output_gain: f32,
    /// Initial timbre controls
    pub timbre: TimbreSnapshot,
}

impl EngineConfig {
    pub const MAX_VOICES: usize = 64;

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = positive_or(sample_rate, Self::default().sample_rate).clamp(8_000.0, 384_000.0);
        self
    }

    pub fn with_max_voices(mut self, voices: usize) -> Self {
        self.max_voices = voices.clamp(1, Self::MAX_VOICES);
        self
    }

    pub fn with_attack(mut self, secs: f32) -> Self {
        self.attack_secs = time_or(secs, Self::default().attack_secs);
        self
    }

    pub fn with_release(mut self, secs: f32) -> Self {
        self.release_secs = time_or(secs, Self::default().release_secs);
        self
    }

    pub fn with_fast_release(mut self, secs: f32) -> Self {
        self.fast_release_secs = time_or(secs, Self::default().fast_release_secs);
        self
    }

    pub fn with_chorus_detune(mut self, cents: f32) -> Self {
        self.chorus_detune_cents = if cents.is_finite() { cents.clamp(-100.0, 100.0) } else { 0.0 };
        self
    }

    pub fn with_pressure(mut self, pressure: PressureConfig) -> Self {
        self.pressure = pressure.sanitized();
        self
    }

    pub fn with_pressure_floor(mut self, floor: f32) -> Self {
        self.pressure_floor = clamp_unit(floor);
        self
    }

    pub fn with_brightness_tracking(mut self, amount: f32) -> Self {
        self.brightness_tracking = if amount.is_finite() { amount.clamp(0.0, 4.0) } else { 0.0 };
        self
    }

    pub fn with_output_gain(mut self, gain: f32) -> Self {
        self.output_gain = if gain.is_finite() { gain.clamp(0.0, 4.0) } else { 0.0 };
        self
    }

    pub fn with_timbre(mut self, timbre: TimbreSnapshot) -> Self {
        self.timbre = TimbreSnapshot::new(timbre.lpf_alpha, timbre.chorus_mix, timbre.octave_up_mix);
        self
    }

    /// Run every field back through its setter.
    ///
    /// Public fields (or a deserialized config) can hold anything; the engine
    /// only ever sees the sanitized form.
    pub fn sanitized(self) -> Self {
        Self::default()
            .with_sample_rate(self.sample_rate)
            .with_max_voices(self.max_voices)
            .with_attack(self.attack_secs)
            .with_release(self.release_secs)
            .with_fast_release(self.fast_release_secs)
            .with_chorus_detune(self.chorus_detune_cents)
            .with_pressure(self.pressure)
            .with_pressure_floor(self.pressure_floor)
            .with_brightness_tracking(self.brightness_tracking)
            .with_output_gain(self.output_gain)
            .with_timbre(self.timbre)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 12,
            attack_secs: 0.02,
            release_secs: 0.12,
            fast_release_secs: 0.03,
            chorus_detune_cents: 7.0,
            pressure: PressureConfig::default(),
            pressure_floor: 0.0,
            brightness_tracking: 0.5,
            output_gain: 0.3,
            timbre: TimbreSnapshot::default(),
        }
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

// Envelope times: 1 ms to 10 s
fn time_or(secs: f32, fallback: f32) -> f32 {
    positive_or(secs, fallback).clamp(0.001, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_sanitized() {
        assert_eq!(EngineConfig::default().sanitized(), EngineConfig::default());
    }

    #[test]
    fn setters_clamp() {
        let config = EngineConfig::default()
            .with_max_voices(0)
            .with_pressure_floor(1.5)
            .with_attack(-1.0)
            .with_sample_rate(f32::NAN);
        assert_eq!(config.max_voices, 1);
        assert_eq!(config.pressure_floor, 1.0);
        assert_eq!(config.attack_secs, 0.02);
        assert_eq!(config.sample_rate, 48_000.0);
    }

    #[test]
    fn sanitize_repairs_public_fields() {
        let mut config = EngineConfig::default();
        config.max_voices = 10_000;
        config.release_secs = 0.0;
        config.timbre.lpf_alpha = 3.0;

        let config = config.sanitized();
        assert_eq!(config.max_voices, EngineConfig::MAX_VOICES);
        assert_eq!(config.release_secs, 0.12);
        assert_eq!(config.timbre.lpf_alpha, 1.0);
    }
}
