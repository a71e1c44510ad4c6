//! Engine controller: lifecycle, note entry points and parameter access.
//!
//! ```text
//!   host (UI / sensor thread)            audio callback
//!   ─────────────────────────            ──────────────
//!   Engine ── VoiceCommand ring ───────▶ PolySynth
//!     │                                     │
//!     └──────── SharedState (atomics) ◀─────┘
//! ```
//!
//! [`Engine::new`] returns both halves. The `Engine` stays with the control
//! context; the [`PolySynth`] moves into the audio callback. Nothing the
//! engine does waits on the renderer, and its accessors never allocate, so a
//! UI may poll them every frame.

pub mod config;
pub mod shared;

use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rtrb::RingBuffer;

pub use config::EngineConfig;

use crate::{
    bellows::PressureEstimator,
    io::{keyboard::ActiveNoteSet, midi::MAX_MIDI_NOTE, BellowsView, KeyEvent},
    synth::{poly::PolySynth, pool::VoicePool},
};
use shared::SharedState;

/// Minimum capacity of the voice command ring.
const MIN_COMMAND_QUEUE: usize = 64;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

pub struct Engine {
    config: EngineConfig,
    pool: VoicePool,
    estimator: PressureEstimator,
    shared: Arc<SharedState>,
}

impl Engine {
    /// Build the control half and the render half of a new engine.
    ///
    /// The engine starts stopped; until [`start_engine`](Self::start_engine)
    /// the synth renders silence.
    pub fn new(config: EngineConfig) -> (Self, PolySynth) {
        let config = config.sanitized();
        let shared = Arc::new(SharedState::new(config.max_voices, config.timbre));
        let (tx, rx) = RingBuffer::new(MIN_COMMAND_QUEUE.max(8 * config.max_voices));

        let synth = PolySynth::new(&config, rx, shared.clone());
        let engine = Self {
            config,
            pool: VoicePool::new(tx, shared.clone()),
            estimator: PressureEstimator::new(config.pressure),
            shared,
        };
        (engine, synth)
    }

    /// Stopped → Running. Calling it while running changes nothing.
    ///
    /// Starting clears all control state (voice bindings, bellows pressure)
    /// and opens a new lifecycle epoch, which makes the renderer drop its
    /// phase, filter and envelope state before the next quantum.
    pub fn start_engine(&mut self) {
        if self.is_engine_running() {
            return;
        }
        let epoch = self.shared.bump_epoch();
        self.pool.reset();
        self.estimator.reset();
        self.shared.publish_pressure(0.0, Instant::now());
        self.shared.set_running(true);
        debug!("engine started (epoch {epoch}, {} voices)", self.pool.capacity());
    }

    /// Running → Stopped, releasing every voice with the fast release first.
    pub fn stop_engine(&mut self) {
        if !self.is_engine_running() {
            return;
        }
        self.pool.release_all(true);
        self.shared.set_running(false);
        debug!("engine stopped");
    }

    pub fn note_on(&mut self, note: u8) {
        if note > MAX_MIDI_NOTE {
            return;
        }
        if !self.is_engine_running() {
            debug!("note on {note} ignored while stopped");
            return;
        }
        self.pool.allocate(note);
    }

    pub fn note_off(&mut self, note: u8) {
        if note > MAX_MIDI_NOTE || !self.is_engine_running() {
            return;
        }
        self.pool.release(note);
    }

    /// Release every sounding voice with the fast release.
    pub fn all_notes_off(&mut self) {
        if !self.is_engine_running() {
            return;
        }
        self.pool.release_all(true);
    }

    /// Feed a lid angle sample (degrees), stamped with the current time.
    pub fn update_with_lid_angle(&mut self, angle: f32) {
        self.update_with_lid_angle_at(angle, Instant::now());
    }

    /// Feed a lid angle sample taken at `now`. Out-of-order or non-finite
    /// samples are dropped.
    pub fn update_with_lid_angle_at(&mut self, angle: f32, now: Instant) {
        if self.estimator.update(angle, now) {
            self.shared.publish_pressure(self.estimator.pressure(), now);
        }
    }

    /// Forward a keyboard view event to [`note_on`](Self::note_on) / [`note_off`](Self::note_off).
    pub fn handle_key_event(&mut self, event: KeyEvent) {
        let Some(note) = event.midi_note() else {
            return;
        };
        if event.down {
            self.note_on(note);
        } else {
            self.note_off(note);
        }
    }

    pub fn is_engine_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn state(&self) -> EngineState {
        if self.is_engine_running() {
            EngineState::Running
        } else {
            EngineState::Stopped
        }
    }

    /// Smoothed lid speed in degrees per second.
    pub fn current_velocity(&self) -> f32 {
        self.estimator.velocity()
    }

    /// Bellows pressure right now, including the leak since the last sample.
    pub fn current_pressure(&self) -> f32 {
        self.pressure_at(Instant::now())
    }

    pub fn pressure_at(&self, now: Instant) -> f32 {
        self.estimator.pressure_at(now)
    }

    /// Voices that are not idle, releasing ones included.
    pub fn active_note_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn active_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.pool.active_notes()
    }

    pub fn active_note_set(&self) -> ActiveNoteSet {
        self.pool.active_notes().collect()
    }

    /// Voice slot currently bound to `note`.
    pub fn voice_slot(&self, note: u8) -> Option<usize> {
        self.pool.slot_of(note)
    }

    pub fn bellows_view(&self, dots: usize) -> BellowsView {
        BellowsView::new(self.current_pressure(), dots)
    }

    // Timbre controls. One control-context writer; values are clamped to [0, 1].

    pub fn set_lpf_alpha(&mut self, value: f32) {
        self.shared.timbre().set_lpf_alpha(value);
    }

    pub fn lpf_alpha(&self) -> f32 {
        self.shared.timbre().lpf_alpha()
    }

    pub fn set_chorus_mix(&mut self, value: f32) {
        self.shared.timbre().set_chorus_mix(value);
    }

    pub fn chorus_mix(&self) -> f32 {
        self.shared.timbre().chorus_mix()
    }

    pub fn set_octave_up_mix(&mut self, value: f32) {
        self.shared.timbre().set_octave_up_mix(value);
    }

    pub fn octave_up_mix(&self) -> f32 {
        self.shared.timbre().octave_up_mix()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
