//! Low-level DSP primitives used by the per-voice signal chain.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the signal math;
//! `graph` layers note events and parameter snapshots on top.

/// Attack/sustain/release envelope generator.
pub mod envelope;
/// One-pole low-pass filter.
pub mod filter;
/// Phase accumulator and band-limited reed waveform.
pub mod oscillator;

pub use envelope::EnvelopeState;
