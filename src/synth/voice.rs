use crate::graph::node::{GraphNode, RenderCtx};
use crate::synth::timbre::TimbreSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Silent, available
    Active,    // Key down: attacking or sustaining
    Releasing, // Key released, envelope in release phase
}

/// A single render-side voice that can play any GraphNode
///
/// Owned by the render thread. Binding decisions arrive as commands; the voice
/// only advances phase, filter and envelope state.
pub struct Voice<T: GraphNode> {
    note: u8,
    generation: u32,
    state: VoiceState,
    sample_rate: f32,
    graph: T,
}

impl<T: GraphNode> Voice<T> {
    pub fn new(graph: T, sample_rate: f32) -> Self {
        Self {
            note: 0,
            generation: 0,
            state: VoiceState::Free,
            sample_rate,
            graph,
        }
    }

    fn ctx(&self, timbre: TimbreSnapshot) -> RenderCtx {
        RenderCtx::from_note(self.sample_rate, self.note).with_timbre(timbre)
    }

    pub fn start(&mut self, note: u8, generation: u32, timbre: TimbreSnapshot) {
        self.note = note;
        self.generation = generation;
        self.state = VoiceState::Active;

        let ctx = self.ctx(timbre);
        self.graph.note_on(&ctx);
    }

    /// Release the voice; `fast` selects the short panic release.
    pub fn release(&mut self, fast: bool, timbre: TimbreSnapshot) {
        if self.state == VoiceState::Free {
            return;
        }
        self.state = VoiceState::Releasing;

        let ctx = self.ctx(timbre);
        if fast {
            self.graph.note_off_fast(&ctx);
        } else {
            self.graph.note_off(&ctx);
        }
    }

    /// Render into `out`. Returns the generation that fell silent during this block, if any.
    pub fn render(&mut self, out: &mut [f32], timbre: TimbreSnapshot) -> Option<u32> {
        if self.state == VoiceState::Free {
            out.fill(0.0);
            return None;
        }

        let ctx = self.ctx(timbre);
        self.graph.render_block(out, &ctx);

        if !self.graph.is_active() {
            let finished = self.generation;
            self.free();
            return Some(finished);
        }
        None
    }

    /// Silence immediately and clear all DSP state.
    pub fn hard_reset(&mut self) {
        self.graph.reset();
        self.free();
    }

    fn free(&mut self) {
        self.state = VoiceState::Free;
        self.note = 0;
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn get_envelope_level(&self) -> Option<f32> {
        self.graph.get_envelope_level()
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn graph(&self) -> &T {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ReedNode;

    #[test]
    fn lifecycle_reports_finished_generation() {
        let mut voice = Voice::new(ReedNode::with_envelope(0.001, 0.002, 0.001), 48_000.0);
        let timbre = TimbreSnapshot::default();
        let mut buffer = vec![0.0; 256];

        voice.start(60, 3, timbre);
        assert_eq!(voice.render(&mut buffer, timbre), None);
        assert_eq!(voice.state(), VoiceState::Active);

        voice.release(false, timbre);
        assert_eq!(voice.state(), VoiceState::Releasing);
        assert_eq!(voice.render(&mut buffer, timbre), Some(3));
        assert!(voice.is_free());
    }

    #[test]
    fn free_voice_renders_silence() {
        let mut voice = Voice::new(ReedNode::new(), 48_000.0);
        let mut buffer = vec![0.5; 64];
        voice.release(true, TimbreSnapshot::default());
        assert_eq!(voice.render(&mut buffer, TimbreSnapshot::default()), None);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn hard_reset_clears_dsp_state() {
        let mut voice = Voice::new(ReedNode::new(), 48_000.0);
        let timbre = TimbreSnapshot::default();
        let mut buffer = vec![0.0; 512];
        voice.start(64, 1, timbre);
        voice.render(&mut buffer, timbre);

        voice.hard_reset();
        assert!(voice.is_free());
        assert_eq!(voice.get_envelope_level(), Some(0.0));
        assert_eq!(voice.graph().filter_state(), 0.0);
    }
}
