//! Audio device output.
//!
//! Opens the default `cpal` output device and drives a [`PolySynth`](crate::PolySynth)
//! from its callback:
//!
//! ```ignore
//! use lid_harmonium::{runtime::OutputDevice, Engine, EngineConfig};
//!
//! fn main() -> color_eyre::Result<()> {
//!     let device = OutputDevice::default_output()?;
//!     let config = EngineConfig::default().with_sample_rate(device.sample_rate());
//!     let (mut engine, synth) = Engine::new(config);
//!     let _output = device.open(synth, None)?;
//!     engine.start_engine();
//!     // ... feed lid angles and notes ...
//!     Ok(())
//! }
//! ```

mod output;

pub use output::{AudioOutput, OutputDevice};
