//! Benchmarks for the one-pole low-pass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use lid_harmonium::dsp::filter::OnePole;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let mut buffer = input.clone();
        let mut filter = OnePole::new(0.08);

        group.bench_with_input(BenchmarkId::new("one_pole", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
