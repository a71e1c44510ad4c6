use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Attack/Release Envelope
=======================

A reed organ has no decay stage: while the key is down and air flows, the reed
speaks at full strength. The envelope therefore only has to fade a voice in
and out without clicks.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0). This multiplies
              the filtered voice signal.

  stage       Which phase of the envelope we're in: Idle, Attacking, Sustaining
              or Releasing.

  gate        note_on starts Attacking, note_off starts Releasing from wherever
              we are.


The Shape
---------

  Level
    1.0 ┐     ╱‾‾‾‾‾‾‾‾‾‾‾‾‾‾╲
        │    ╱                ╲
        │   ╱                  ╲
    0.0 └──╱────────────────────╲──→ Time
         Attacking  Sustaining  Releasing


Retrigger Without Clicks
------------------------

Attack ramps up from the CURRENT level, not from zero. A repeated note-on for
a key that is still releasing, or a voice stolen for a new note, continues
from where it is:

    1.0 ┐  ╱‾‾‾╲      ╱‾‾‾‾
        │ ╱     ╲    ╱
        │╱       ╲__╱   ← note_on while releasing
    0.0 └──────────────────→

Release snapshots its starting level and interpolates linearly to exactly 0
over a fixed number of samples. The fast release used by all-notes-off is the
same ramp with a shorter duration; it only ever shortens an ongoing release.


State Machine
-------------

    ┌──────┐ note_on  ┌───────────┐ level=1  ┌────────────┐
    │ Idle │ ───────→ │ Attacking │ ───────→ │ Sustaining │
    └──────┘          └───────────┘          └────────────┘
       ↑                    │ note_off              │ note_off
       │                    ↓                       │
       │   level=0    ┌───────────┐                 │
       └───────────── │ Releasing │ ←───────────────┘
                      └───────────┘
*/

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,       // Silent, voice can be reused
    Attacking,  // Ramping up to 1.0
    Sustaining, // Holding 1.0 while the key is down
    Releasing,  // Ramping down to 0
}

pub struct Envelope {
    attack_time: f32,  // seconds to ramp 0 → 1
    release_time: f32, // seconds to ramp current → 0

    stage: EnvelopeState,
    level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new() -> Self {
        Self::ar(0.02, 0.12)
    }

    pub fn ar(attack: f32, release: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            release_time: release.max(MIN_TIME),

            stage: EnvelopeState::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Gate high: ramp up from the current level.
    pub fn note_on(&mut self, _ctx: &RenderCtx) {
        self.stage = if self.level >= 1.0 {
            EnvelopeState::Sustaining
        } else {
            EnvelopeState::Attacking
        };
        self.release_elapsed_samples = 0;
    }

    /// Gate low: start the release phase from the current level.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        self.begin_release(self.release_time, ctx);
    }

    /// Gate low with an explicit release time.
    ///
    /// Used for all-notes-off. An ongoing release is only replaced if the new
    /// one would finish sooner.
    pub fn note_off_with(&mut self, release_time: f32, ctx: &RenderCtx) {
        self.begin_release(release_time.max(MIN_TIME), ctx);
    }

    fn begin_release(&mut self, release_time: f32, ctx: &RenderCtx) {
        if self.stage == EnvelopeState::Idle {
            return;
        }

        let total = (release_time * ctx.sample_rate).round().max(1.0) as u32;

        if self.stage == EnvelopeState::Releasing {
            let remaining = self
                .release_total_samples
                .saturating_sub(self.release_elapsed_samples);
            if total >= remaining {
                return;
            }
        }

        self.release_start_level = self.level;
        self.release_total_samples = total;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Releasing;
    }

    /// Advance the envelope by one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self, ctx: &RenderCtx) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attacking => {
                self.level += 1.0 / (self.attack_time * ctx.sample_rate);

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeState::Sustaining;
                }
            }

            EnvelopeState::Sustaining => {
                self.level = 1.0;
            }

            EnvelopeState::Releasing => {
                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(ctx);
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
        self.release_total_samples = 1;
        self.release_elapsed_samples = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0)
    }

    fn render_samples(env: &mut Envelope, samples: usize) {
        let ctx = ctx();
        for _ in 0..samples {
            env.next_sample(&ctx);
        }
    }

    #[test]
    fn attack_reaches_sustain() {
        let mut env = Envelope::ar(0.01, 0.1);
        env.note_on(&ctx());
        render_samples(&mut env, 11);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_eq!(env.state(), EnvelopeState::Sustaining);
    }

    #[test]
    fn release_falls_back_to_idle() {
        let release = 0.03;
        let mut env = Envelope::ar(0.01, release);
        env.note_on(&ctx());
        render_samples(&mut env, 20);

        env.note_off(&ctx());
        assert_eq!(env.state(), EnvelopeState::Releasing);
        render_samples(&mut env, (release * SAMPLE_RATE) as usize);

        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn retrigger_continues_from_current_level() {
        let mut env = Envelope::ar(0.01, 0.1);
        env.note_on(&ctx());
        render_samples(&mut env, 20);
        env.note_off(&ctx());
        render_samples(&mut env, 50);

        let before = env.level();
        assert!(before > 0.3 && before < 0.7);

        env.note_on(&ctx());
        let after = env.next_sample(&ctx());
        assert!(after > before, "retrigger must ramp up from {before}, got {after}");
        assert!(after - before <= 0.11);
    }

    #[test]
    fn fast_release_only_shortens() {
        let mut env = Envelope::ar(0.001, 0.1);
        env.note_on(&ctx());
        render_samples(&mut env, 5);

        env.note_off_with(0.01, &ctx());
        render_samples(&mut env, 10);
        assert_eq!(env.state(), EnvelopeState::Idle);

        let mut env = Envelope::ar(0.001, 0.01);
        env.note_on(&ctx());
        render_samples(&mut env, 5);
        env.note_off(&ctx());
        // A longer "fast" release must not extend the ongoing one.
        env.note_off_with(0.5, &ctx());
        render_samples(&mut env, 10);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn note_off_while_idle_is_ignored() {
        let mut env = Envelope::new();
        env.note_off(&ctx());
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert!(!env.is_active());
    }

    #[test]
    fn release_steps_are_bounded() {
        let mut env = Envelope::ar(0.001, 0.05);
        env.note_on(&ctx());
        render_samples(&mut env, 5);
        env.note_off(&ctx());

        let mut previous = env.level();
        for _ in 0..60 {
            let level = env.next_sample(&ctx());
            assert!(previous - level <= 1.0 / 50.0 + 1e-6);
            previous = level;
        }
    }
}
