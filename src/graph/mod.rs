//! Per-voice signal chain.
//!
//! Graph nodes wrap the low-level DSP primitives with what a voice needs:
//! note gate events, a per-quantum parameter snapshot and block rendering.

/// Core traits shared by all graph nodes.
pub mod node;
/// The harmonium reed voice: oscillators → chorus/octave mix → low-pass → envelope.
pub mod reed;

pub use node::{GraphNode, RenderCtx};
pub use reed::ReedNode;
