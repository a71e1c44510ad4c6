//! Benchmarks for the attack/release envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use lid_harmonium::dsp::envelope::Envelope;
use lid_harmonium::graph::node::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Long attack so every iteration stays in the ramp
        let mut env = Envelope::ar(10.0, 0.12);
        env.note_on(&ctx);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), black_box(&ctx)))
        });

        let mut env = Envelope::ar(0.001, 0.12);
        env.note_on(&ctx);
        for _ in 0..200 {
            env.next_sample(&ctx);
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), black_box(&ctx)))
        });

        let mut env = Envelope::ar(0.001, 10.0);
        env.note_on(&ctx);
        for _ in 0..200 {
            env.next_sample(&ctx);
        }
        env.note_off(&ctx);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| env.render(black_box(&mut buffer), black_box(&ctx)))
        });
    }

    group.finish();
}
