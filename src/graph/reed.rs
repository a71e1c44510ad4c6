use crate::dsp::{envelope::Envelope, filter::OnePole, oscillator::ReedOscillator};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Reed Voice Chain
================

One voice of the harmonium. Three reed oscillators feed a single low-pass
filter and an amplitude envelope:

    fundamental (f)       ─┐
    chorus (f · 2^(c/1200)) ─┼─ weighted sum ─→ one-pole LPF ─→ × envelope ─→ out
    octave-up (2f)        ─┘

    raw = (fund + chorusMix · chorus + octaveUpMix · octave) / (1 + chorusMix + octaveUpMix)

Dividing by the total weight keeps the loudness steady when the mix controls
move, so turning up the chorus thickens the sound instead of boosting it.

Chorus
------

The chorus copy runs a few cents sharp. Against the fundamental it beats
slowly (about 1 Hz at middle C for 7 cents), which is the gentle shimmer of a
double-reed harmonium stop.

Retrigger and Restart
---------------------

A note_on on an Idle voice starts from a clean slate: phases and filter memory
are zeroed. A note_on on a sounding voice (same key again, or a stolen voice)
keeps phases running and only re-enters the attack from the current level,
so the waveform never jumps.
*/

/// Default chorus detune in cents.
pub const DEFAULT_CHORUS_CENTS: f32 = 7.0;

pub struct ReedNode {
    fundamental: ReedOscillator,
    chorus: ReedOscillator,
    octave: ReedOscillator,
    filter: OnePole,
    env: Envelope,
    chorus_ratio: f32,
    fast_release: f32,
    /// (frequency, sample_rate) the oscillators are currently tuned for
    tuned: (f32, f32),
}

impl ReedNode {
    pub fn new() -> Self {
        Self::with_envelope(0.02, 0.12, 0.03)
    }

    /// Create a reed voice with explicit attack, release and fast-release times (seconds).
    pub fn with_envelope(attack: f32, release: f32, fast_release: f32) -> Self {
        Self {
            fundamental: ReedOscillator::new(),
            chorus: ReedOscillator::new(),
            octave: ReedOscillator::new(),
            filter: OnePole::new(1.0),
            env: Envelope::ar(attack, release),
            chorus_ratio: cents_to_ratio(DEFAULT_CHORUS_CENTS),
            fast_release,
            tuned: (0.0, 0.0),
        }
    }

    /// Set the chorus copy's detune in cents.
    pub fn with_chorus_detune(mut self, cents: f32) -> Self {
        self.chorus_ratio = cents_to_ratio(cents.clamp(-100.0, 100.0));
        self.tuned = (0.0, 0.0);
        self
    }

    /// Previous output of the voice's low-pass filter.
    pub fn filter_state(&self) -> f32 {
        self.filter.state()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.env
    }

    fn tune(&mut self, ctx: &RenderCtx) {
        if self.tuned == (ctx.frequency, ctx.sample_rate) {
            return;
        }
        let f = ctx.frequency;
        let sr = ctx.sample_rate;
        self.fundamental.set_frequency(f, sr);
        self.chorus.set_frequency(f * self.chorus_ratio, sr);
        self.octave.set_frequency(2.0 * f, sr);
        self.tuned = (f, sr);
    }
}

impl Default for ReedNode {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

impl GraphNode for ReedNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.tune(ctx);
        self.filter.set_alpha(ctx.timbre.lpf_alpha);

        let chorus_mix = ctx.timbre.chorus_mix;
        let octave_mix = ctx.timbre.octave_up_mix;
        let norm = 1.0 / (1.0 + chorus_mix + octave_mix);

        for sample in out.iter_mut() {
            let fund = self.fundamental.next_sample();
            let chorus = self.chorus.next_sample();
            let octave = self.octave.next_sample();

            let raw = (fund + chorus_mix * chorus + octave_mix * octave) * norm;
            let filtered = self.filter.next_sample(raw);

            *sample = filtered * self.env.next_sample(ctx);
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        if !self.env.is_active() {
            self.reset();
        }
        self.env.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    fn note_off_fast(&mut self, ctx: &RenderCtx) {
        self.env.note_off_with(self.fast_release, ctx);
    }

    fn reset(&mut self) {
        self.fundamental.reset();
        self.chorus.reset();
        self.octave.reset();
        self.filter.reset();
        self.env.reset();
    }

    fn get_envelope_level(&self) -> Option<f32> {
        Some(self.env.level())
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::EnvelopeState;
    use crate::synth::timbre::TimbreSnapshot;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn ctx(timbre: TimbreSnapshot) -> RenderCtx {
        RenderCtx::from_note(SAMPLE_RATE, 60).with_timbre(timbre)
    }

    fn energy(buffer: &[f32]) -> f32 {
        buffer.iter().map(|x| x * x).sum::<f32>() / buffer.len() as f32
    }

    #[test]
    fn idle_voice_is_silent() {
        let mut node = ReedNode::new();
        let mut buffer = vec![1.0; 256];
        node.render_block(&mut buffer, &ctx(TimbreSnapshot::default()));
        assert!(buffer.iter().all(|&s| s == 0.0));
        assert!(!node.is_active());
    }

    #[test]
    fn note_on_produces_finite_bounded_signal() {
        let mut node = ReedNode::new();
        let ctx = ctx(TimbreSnapshot::default());
        node.note_on(&ctx);

        let mut buffer = vec![0.0; 4096];
        node.render_block(&mut buffer, &ctx);

        assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
        assert!(energy(&buffer[2048..]) > 1e-4);
        assert_eq!(node.envelope().state(), EnvelopeState::Sustaining);
    }

    #[test]
    fn brighter_alpha_has_more_high_frequency_energy() {
        let dark = TimbreSnapshot::new(0.02, 0.0, 0.0);
        let bright = TimbreSnapshot::new(0.9, 0.0, 0.0);

        let render = |timbre: TimbreSnapshot| {
            let mut node = ReedNode::new();
            let ctx = ctx(timbre);
            node.note_on(&ctx);
            let mut buffer = vec![0.0; 4096];
            node.render_block(&mut buffer, &ctx);
            // First difference emphasises upper partials.
            let diff: Vec<f32> = buffer[2048..].windows(2).map(|w| w[1] - w[0]).collect();
            energy(&diff)
        };

        assert!(render(bright) > render(dark) * 4.0);
    }

    #[test]
    fn release_returns_to_idle_and_reset_clears_filter() {
        let mut node = ReedNode::with_envelope(0.005, 0.01, 0.002);
        let ctx = ctx(TimbreSnapshot::default());
        node.note_on(&ctx);
        let mut buffer = vec![0.0; 1024];
        node.render_block(&mut buffer, &ctx);

        node.note_off(&ctx);
        node.render_block(&mut buffer, &ctx);
        assert!(!node.is_active());
        assert_eq!(buffer[1023], 0.0);

        node.reset();
        assert_eq!(node.filter_state(), 0.0);
    }

    #[test]
    fn fast_release_is_shorter() {
        let mut node = ReedNode::with_envelope(0.001, 0.5, 0.005);
        let ctx = ctx(TimbreSnapshot::default());
        node.note_on(&ctx);
        let mut buffer = vec![0.0; 256];
        node.render_block(&mut buffer, &ctx);

        node.note_off_fast(&ctx);
        node.render_block(&mut buffer, &ctx);
        assert!(!node.is_active());
    }
}
