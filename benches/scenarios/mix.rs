//! Benchmarks for the full render loop with many held notes.

use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion};
use lid_harmonium::{Engine, EngineConfig};

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/mix");

    for voices in [1usize, 4, 12] {
        for &size in BLOCK_SIZES {
            // A floor keeps the voices audible without pumping the lid.
            let config = EngineConfig::default().with_pressure_floor(0.8);
            let (mut engine, mut synth) = Engine::new(config);
            engine.start_engine();
            for i in 0..voices {
                engine.note_on(48 + 3 * i as u8);
            }

            let mut buffer = vec![0.0f32; size];
            let start = Instant::now();
            let block = Duration::from_secs_f32(size as f32 / 48_000.0);
            let mut blocks = 0u32;

            group.bench_with_input(
                BenchmarkId::new(format!("poly_{voices}_voices"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        synth.process_at(black_box(&mut buffer), start + block * blocks);
                        blocks = blocks.wrapping_add(1);
                    })
                },
            );
        }
    }

    group.finish();
}
