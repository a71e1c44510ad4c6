use std::f32::consts::TAU;

/*
Reed Oscillator
===============

A free reed vibrating in an air stream produces a rich but not harsh
spectrum: a strong fundamental and a series of partials falling off roughly
like 1/n. We build that tone additively from a fixed partial table.

Phase
-----

Phase is kept in CYCLES, wrapped to [0, 1):

    phase += frequency / sample_rate
    if phase >= 1.0 { phase -= 1.0 }

Every partial is an integer multiple of the fundamental, so sin(2π·k·phase) is
identical just before and just after a wrap. The waveform is therefore
continuous across wraps and the wrap can never click.

Band Limiting
-------------

A partial at or above ~0.45 × sample_rate would fold back (alias) into the
audible range. We drop them:

    partials = min(REED_PARTIALS.len(), floor(0.45 × sample_rate / frequency))

An octave-up copy of a very high note may end up with zero partials; it is
then silent, which is the correct band-limited result.

Evaluating Partials Cheaply
---------------------------

Instead of one sin() per partial we use the Chebyshev recurrence:

    sin((k+1)θ) = 2·cos(θ)·sin(kθ) − sin((k−1)θ)

one sin_cos() per sample per oscillator, then a multiply-add per partial.
*/

/// Relative partial amplitudes of the reed tone (fundamental first).
pub const REED_PARTIALS: [f32; 8] = [1.0, 0.72, 0.5, 0.38, 0.27, 0.19, 0.13, 0.09];

/// Highest partial frequency kept, as a fraction of the sample rate.
pub const PARTIAL_CEILING: f32 = 0.45;

/// Wrapped phase accumulator measured in cycles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Phasor {
    phase: f32,
}

impl Phasor {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Return the current phase, then advance by `increment` cycles.
    #[inline]
    pub fn advance(&mut self, increment: f32) -> f32 {
        let current = self.phase;
        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        current
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Band-limited additive reed waveform.
#[derive(Debug, Clone, Copy)]
pub struct ReedWave {
    partials: usize,
    norm: f32,
}

impl ReedWave {
    pub fn for_frequency(frequency: f32, sample_rate: f32) -> Self {
        let partials = if frequency > 0.0 && frequency.is_finite() {
            ((PARTIAL_CEILING * sample_rate) / frequency).floor() as usize
        } else {
            0
        };
        let partials = partials.min(REED_PARTIALS.len());
        let norm = 1.0 / REED_PARTIALS.iter().sum::<f32>();

        Self { partials, norm }
    }

    pub fn partials(&self) -> usize {
        self.partials
    }

    /// Evaluate the waveform at `phase` (in cycles).
    #[inline]
    pub fn eval(&self, phase: f32) -> f32 {
        if self.partials == 0 {
            return 0.0;
        }

        let (s1, c1) = (TAU * phase).sin_cos();
        let two_cos = 2.0 * c1;

        let mut prev = 0.0;
        let mut current = s1;
        let mut sum = REED_PARTIALS[0] * s1;

        for &amplitude in &REED_PARTIALS[1..self.partials] {
            let next = two_cos * current - prev;
            prev = current;
            current = next;
            sum += amplitude * current;
        }

        sum * self.norm
    }
}

/// A reed waveform driven by its own phase accumulator.
pub struct ReedOscillator {
    phasor: Phasor,
    increment: f32,
    wave: ReedWave,
}

impl ReedOscillator {
    pub fn new() -> Self {
        Self {
            phasor: Phasor::new(),
            increment: 0.0,
            wave: ReedWave::for_frequency(0.0, 1.0),
        }
    }

    /// Retune without touching phase, so a pitch change stays continuous.
    pub fn set_frequency(&mut self, frequency: f32, sample_rate: f32) {
        self.increment = frequency / sample_rate;
        self.wave = ReedWave::for_frequency(frequency, sample_rate);
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let phase = self.phasor.advance(self.increment);
        self.wave.eval(phase)
    }

    pub fn render(&mut self, destination: &mut [f32]) {
        for sample in destination.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn phase(&self) -> f32 {
        self.phasor.phase()
    }

    pub fn reset(&mut self) {
        self.phasor.reset();
    }
}

impl Default for ReedOscillator {
    fn default() -> Self {
        Self::new()
    }
}
