/*
One-Pole Low-Pass
=================

The simplest recursive filter: each output sample moves a fraction `alpha`
of the way from the previous output toward the new input.

    y[n] = alpha * x[n] + (1 - alpha) * y[n-1]
         = y[n-1] + alpha * (x[n] - y[n-1])

| alpha | behaviour                               |
| ----- | --------------------------------------- |
| 0.0   | output frozen at the last value          |
| 0.08  | dark, reedy (roughly 600 Hz at 48 kHz)   |
| 1.0   | no filtering, output = input             |

The -3 dB point is approximately

    fc ≈ alpha * sample_rate / (2π)      (for small alpha)

so a higher alpha yields a brighter tone. The slope is a gentle 6 dB/octave,
which softens upper reed partials without hollowing out the sound.

The only state is `y[n-1]`. Resetting it to zero is what makes a restarted
voice begin from silence instead of from a stale value.
*/

pub struct OnePole {
    state: f32, // y[n-1]
    alpha: f32,
}

impl OnePole {
    pub fn new(alpha: f32) -> Self {
        Self {
            state: 0.0,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32) -> f32 {
        self.state += self.alpha * (input - self.state);
        self.state
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Previous output sample.
    pub fn state(&self) -> f32 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}
