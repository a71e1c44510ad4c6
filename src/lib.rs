pub mod bellows; // Lid motion → bellows pressure
pub mod dsp;
pub mod engine; // Control-side lifecycle, notes, parameters
pub mod graph; // Per-voice signal chain
pub mod io;
pub mod runtime; // Audio device output
pub mod synth; // Voice management and polyphony

pub use engine::{Engine, EngineConfig, EngineState};
pub use synth::poly::PolySynth;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
