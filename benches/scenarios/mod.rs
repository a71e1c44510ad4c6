//! Scenario benchmarks: one reed voice, and the whole engine.

mod mix;
mod voices;

pub use mix::bench_mix;
pub use voices::bench_voices;
