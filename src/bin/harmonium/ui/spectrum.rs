//! Spectrum widget
//!
//! Hann-windowed FFT of the scope window, folded into log-spaced bands. Each
//! band shows the loudest FFT bin it covers, so reed partials stay visible
//! between band centres.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const BANDS: usize = 64;
const LOW_HZ: f32 = 50.0;
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin range `[start, end)` of each band
    bands: Vec<(usize, usize)>,
    /// (log10 of band centre in Hz, level in dB)
    data: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(len: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(len);
        let window = (0..len)
            .map(|i| {
                let phase = i as f32 / (len.max(2) - 1) as f32;
                0.5 - 0.5 * (std::f32::consts::TAU * phase).cos()
            })
            .collect();

        let half = (len / 2).max(1);
        let high = (sample_rate / 2.0).min(16_000.0).max(LOW_HZ * 2.0);
        let ratio = high / LOW_HZ;
        let bin_of = |hz: f32| ((hz * len as f32 / sample_rate) as usize).min(half - 1);

        let mut bands = Vec::with_capacity(BANDS);
        let mut data = Vec::with_capacity(BANDS);
        for band in 0..BANDS {
            let lo = LOW_HZ * ratio.powf(band as f32 / BANDS as f32);
            let hi = LOW_HZ * ratio.powf((band + 1) as f32 / BANDS as f32);
            let start = bin_of(lo);
            bands.push((start, bin_of(hi).max(start + 1)));
            data.push((((lo * hi).sqrt() as f64).log10(), FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); len],
            bands,
            data,
        }
    }

    /// Analyse `samples`; ignored unless it is exactly one window long.
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }
        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = 2.0 / self.window.len() as f32;
        for (&(start, end), (_, level)) in self.bands.iter().zip(self.data.iter_mut()) {
            let peak = self.scratch[start..end]
                .iter()
                .map(|c| c.norm() * norm)
                .fold(0.0f32, f32::max);
            *level = (20.0 * (peak.max(1e-6) as f64).log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.data
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, data: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let (low, high) = match (data.first(), data.last()) {
        (Some(&(low, _)), Some(&(high, _))) => (low, high),
        _ => (1.0, 4.0),
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([low, high])
                .labels(vec!["100", "1k", "10k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
