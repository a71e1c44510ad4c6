//! Benchmarks for the band-limited reed oscillator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use lid_harmonium::dsp::oscillator::ReedOscillator;

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    // Low notes keep every partial; high notes drop most of them.
    for (name, freq) in [("reed_c2", 65.41), ("reed_c4", 261.63), ("reed_c7", 2093.0)] {
        for &size in BLOCK_SIZES {
            let mut buffer = vec![0.0f32; size];
            let mut osc = ReedOscillator::new();
            osc.set_frequency(freq, 48_000.0);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| osc.render(black_box(&mut buffer)))
            });
        }
    }

    group.finish();
}
