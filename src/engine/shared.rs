//! State shared between the control thread and the render thread.
//!
//! Everything here is a plain atomic: the renderer never waits on the control
//! thread and vice versa.
//!
//! | field                 | writer   | reader   |
//! | --------------------- | -------- | -------- |
//! | `running`, `epoch`    | control  | render   |
//! | `pressure` (packed)   | control  | render   |
//! | `timbre`              | control  | render   |
//! | `slots[i]`            | render   | control  |

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use crate::synth::timbre::{AtomicF32, TimbreParameters, TimbreSnapshot};

/// Render-side progress of one voice slot.
#[derive(Debug)]
pub struct VoiceSlotStatus {
    finished_generation: AtomicU32,
    level: AtomicF32,
}

impl VoiceSlotStatus {
    fn new() -> Self {
        Self {
            finished_generation: AtomicU32::new(0),
            level: AtomicF32::new(0.0),
        }
    }

    /// Last generation whose voice fell silent.
    pub fn finished_generation(&self) -> u32 {
        self.finished_generation.load(Ordering::Acquire)
    }

    pub fn mark_finished(&self, generation: u32) {
        self.level.store(0.0);
        self.finished_generation.store(generation, Ordering::Release);
    }

    /// Envelope level at the end of the last rendered quantum.
    pub fn level(&self) -> f32 {
        self.level.load()
    }

    pub fn set_level(&self, level: f32) {
        self.level.store(level);
    }
}

#[derive(Debug)]
pub struct SharedState {
    running: AtomicBool,
    epoch: AtomicU32,
    /// High 32 bits: pressure f32 bits. Low 32 bits: update stamp in ms since `origin`.
    pressure: AtomicU64,
    timbre: TimbreParameters,
    slots: Box<[VoiceSlotStatus]>,
    origin: Instant,
}

impl SharedState {
    pub fn new(voices: usize, timbre: TimbreSnapshot) -> Self {
        Self {
            running: AtomicBool::new(false),
            epoch: AtomicU32::new(0),
            pressure: AtomicU64::new(0),
            timbre: TimbreParameters::new(timbre),
            slots: (0..voices).map(|_| VoiceSlotStatus::new()).collect(),
            origin: Instant::now(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Start a new lifecycle epoch and return it.
    pub fn bump_epoch(&self) -> u32 {
        self.epoch.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    pub fn timbre(&self) -> &TimbreParameters {
        &self.timbre
    }

    pub fn slot(&self, index: usize) -> &VoiceSlotStatus {
        &self.slots[index]
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Publish the pressure produced by an estimator update at `stamp`.
    ///
    /// Value and stamp travel in one word, so a reader never pairs a new
    /// pressure with an old stamp.
    pub fn publish_pressure(&self, pressure: f32, stamp: Instant) {
        let packed = ((pressure.to_bits() as u64) << 32) | self.millis(stamp) as u64;
        self.pressure.store(packed, Ordering::Release);
    }

    /// Last published pressure and the seconds elapsed between its stamp and `now`.
    pub fn pressure_since(&self, now: Instant) -> (f32, f32) {
        let packed = self.pressure.load(Ordering::Acquire);
        let pressure = f32::from_bits((packed >> 32) as u32);
        let stamp = packed as u32;

        let elapsed_ms = self.millis(now).wrapping_sub(stamp);
        // `now` earlier than the stamp shows up as a huge wrapped value.
        let elapsed_ms = if elapsed_ms > u32::MAX / 2 { 0 } else { elapsed_ms };

        (pressure, elapsed_ms as f32 / 1000.0)
    }

    fn millis(&self, instant: Instant) -> u32 {
        // Truncation wraps after ~49 days; differences stay correct.
        instant.saturating_duration_since(self.origin).as_millis() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pressure_round_trips_with_elapsed_time() {
        let shared = SharedState::new(4, TimbreSnapshot::default());
        let stamp = Instant::now() + Duration::from_millis(100);
        shared.publish_pressure(0.75, stamp);

        let (pressure, elapsed) = shared.pressure_since(stamp + Duration::from_millis(250));
        assert_eq!(pressure, 0.75);
        assert!((elapsed - 0.25).abs() < 0.002);
    }

    #[test]
    fn reading_before_stamp_reports_no_elapsed_time() {
        let shared = SharedState::new(1, TimbreSnapshot::default());
        let stamp = Instant::now() + Duration::from_secs(1);
        shared.publish_pressure(0.5, stamp);

        let (_, elapsed) = shared.pressure_since(stamp - Duration::from_millis(500));
        assert_eq!(elapsed, 0.0);
    }

    #[test]
    fn epoch_bumps_are_sequential() {
        let shared = SharedState::new(1, TimbreSnapshot::default());
        assert_eq!(shared.epoch(), 0);
        assert_eq!(shared.bump_epoch(), 1);
        assert_eq!(shared.bump_epoch(), 2);
        assert_eq!(shared.epoch(), 2);
    }

    #[test]
    fn slot_completion_is_visible() {
        let shared = SharedState::new(2, TimbreSnapshot::default());
        shared.slot(1).set_level(0.4);
        assert_eq!(shared.slot(1).level(), 0.4);

        shared.slot(1).mark_finished(7);
        assert_eq!(shared.slot(1).finished_generation(), 7);
        assert_eq!(shared.slot(1).level(), 0.0);
    }
}
