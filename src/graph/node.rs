use crate::{io::midi::midi_note_to_freq, synth::timbre::TimbreSnapshot};

/// Context passed to graph nodes during rendering
///
/// Contains information about what to render:
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - frequency: Pitch to render (Hz)
/// - timbre: Control-rate timbre parameters for this quantum
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub timbre: TimbreSnapshot,
}

impl RenderCtx {
    /// Create context from MIDI note
    pub fn from_note(sample_rate: f32, note: u8) -> Self {
        Self::from_freq(sample_rate, midi_note_to_freq(note))
    }

    /// Create context from direct frequency
    pub fn from_freq(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            timbre: TimbreSnapshot::default(),
        }
    }

    pub fn with_timbre(self, timbre: TimbreSnapshot) -> Self {
        Self { timbre, ..self }
    }
}

/// Core trait for per-voice audio processing nodes
///
/// Nodes render audio and respond to note gate events.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Triggered when a note starts (or is retriggered)
    fn note_on(&mut self, _ctx: &RenderCtx) {}

    /// Triggered when a note is released
    fn note_off(&mut self, _ctx: &RenderCtx) {}

    /// Release as quickly as possible without clicking.
    ///
    /// Defaults to the regular release.
    fn note_off_fast(&mut self, ctx: &RenderCtx) {
        self.note_off(ctx);
    }

    /// Return all state (phase, filter memory, envelope) to silence.
    fn reset(&mut self) {}

    fn get_envelope_level(&self) -> Option<f32> {
        None
    }

    /// Check if this node is still producing sound
    ///
    /// Used by voice management to know when a voice can be freed.
    fn is_active(&self) -> bool {
        true
    }
}
