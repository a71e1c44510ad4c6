//! Benchmarks for a single reed voice chain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use lid_harmonium::graph::{GraphNode, ReedNode, RenderCtx};
use lid_harmonium::synth::timbre::TimbreSnapshot;

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    let plain = RenderCtx::from_note(48_000.0, 60).with_timbre(TimbreSnapshot::new(0.08, 0.0, 0.0));
    let full = RenderCtx::from_note(48_000.0, 60).with_timbre(TimbreSnapshot::new(0.3, 0.35, 0.5));

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, ctx) in [("reed_plain", &plain), ("reed_chorus_octave", &full)] {
            let mut node = ReedNode::new();
            node.note_on(ctx);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| node.render_block(black_box(&mut buffer), black_box(ctx)))
            });
        }
    }

    group.finish();
}
