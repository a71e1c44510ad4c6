//! Render loop: the audio-thread half of the engine.
//!
//! Each quantum the synth
//!   1. picks up lifecycle resets and queued voice commands,
//!   2. renders every sounding voice and sums them,
//!   3. scales the sum by the bellows pressure (smoothed per sample),
//!   4. applies the start/stop fade, output gain and a `tanh` safety clip.
//!
//! A new lifecycle epoch (a restart) never cuts sounding voices. The renderer
//! fades `run_gain` to zero first, leaving the new epoch's commands queued,
//! then resets every voice and picks the queue up again.
//!
//! Nothing here allocates, locks or logs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rtrb::Consumer;

use crate::{
    bellows,
    engine::{shared::SharedState, EngineConfig},
    graph::ReedNode,
    io::interleave::copy_mono_to_channels,
    synth::{
        message::{CommandReceiver, VoiceCommand},
        timbre::TimbreSnapshot,
        voice::Voice,
    },
    MAX_BLOCK_SIZE,
};

/// Time constant of the per-sample pressure gain smoother (seconds).
const PRESSURE_SMOOTHING_SECS: f32 = 0.01;

pub struct PolySynth<R: CommandReceiver = Consumer<VoiceCommand>> {
    voices: Vec<Voice<ReedNode>>,
    rx: R,
    shared: Arc<SharedState>,
    temp_buffer: Vec<f32>,
    mix_buffer: Vec<f32>,
    sample_rate: f32,
    seen_epoch: u32,
    /// Epoch waiting for the fade-out before voices are reset
    restart: Option<u32>,
    /// First command of the pending epoch, popped before the restart was known
    stashed: Option<VoiceCommand>,

    run_gain: f32,
    run_step: f32,
    pressure_gain: f32,
    pressure_coeff: f32,

    decay_secs: f32,
    pressure_floor: f32,
    brightness_tracking: f32,
    output_gain: f32,
}

impl<R: CommandReceiver> PolySynth<R> {
    pub(crate) fn new(config: &EngineConfig, rx: R, shared: Arc<SharedState>) -> Self {
        let sample_rate = config.sample_rate;
        let voices = (0..config.max_voices)
            .map(|_| {
                let node = ReedNode::with_envelope(
                    config.attack_secs,
                    config.release_secs,
                    config.fast_release_secs,
                )
                .with_chorus_detune(config.chorus_detune_cents);
                Voice::new(node, sample_rate)
            })
            .collect();

        Self {
            voices,
            rx,
            seen_epoch: shared.epoch(),
            restart: None,
            stashed: None,
            shared,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
            mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
            sample_rate,

            run_gain: 0.0,
            run_step: 1.0 / (config.fast_release_secs * sample_rate).max(1.0),
            pressure_gain: 0.0,
            pressure_coeff: 1.0 - (-1.0 / (PRESSURE_SMOOTHING_SECS * sample_rate)).exp(),

            decay_secs: config.pressure.decay_secs,
            pressure_floor: config.pressure_floor,
            brightness_tracking: config.brightness_tracking,
            output_gain: config.output_gain,
        }
    }

    /// Fill `out` (mono) with the next samples, using the current time for pressure decay.
    pub fn process(&mut self, out: &mut [f32]) {
        self.process_at(out, Instant::now());
    }

    /// Fill `out` (mono) as if the first sample plays at `now`.
    pub fn process_at(&mut self, out: &mut [f32], now: Instant) {
        let mut offset = 0usize;
        for block in out.chunks_mut(MAX_BLOCK_SIZE) {
            let at = now + Duration::from_secs_f32(offset as f32 / self.sample_rate);
            self.render_block(block, at);
            offset += block.len();
        }
    }

    /// Fill an interleaved buffer of `channels` channels, same signal on every channel.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) {
        self.process_interleaved_at(data, channels, Instant::now());
    }

    pub fn process_interleaved_at(&mut self, data: &mut [f32], channels: usize, now: Instant) {
        let channels = channels.max(1);
        let total_frames = data.len() / channels;
        let mut frames_written = 0;

        while frames_written < total_frames {
            let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
            let at = now + Duration::from_secs_f32(frames_written as f32 / self.sample_rate);

            let mut block = std::mem::take(&mut self.mix_buffer);
            self.render_block(&mut block[..frames], at);

            let start = frames_written * channels;
            copy_mono_to_channels(&block[..frames], &mut data[start..start + frames * channels], channels);
            self.mix_buffer = block;

            frames_written += frames;
        }
        // Trailing partial frame, if the host handed us one.
        data[total_frames * channels..].fill(0.0);
    }

    /// Voices currently producing sound, as seen by the render thread.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current smoothed pressure gain applied to the mix.
    pub fn pressure_gain(&self) -> f32 {
        self.pressure_gain
    }

    fn render_block(&mut self, out: &mut [f32], now: Instant) {
        let base_timbre = self.shared.timbre().snapshot();
        self.sync_commands(base_timbre);

        let running = self.shared.is_running();
        let run_target = if running && self.restart.is_none() { 1.0 } else { 0.0 };
        if run_target == 0.0 && self.run_gain <= 0.0 {
            if self.voices.iter().any(|v| !v.is_free()) {
                self.reset_voices();
            }
            out.fill(0.0);
            return;
        }

        let (published, elapsed) = self.shared.pressure_since(now);
        let pressure = bellows::decayed(published, elapsed, self.decay_secs);
        let target = pressure.max(self.pressure_floor).clamp(0.0, 1.0);
        let timbre = base_timbre.brightened(target, self.brightness_tracking);

        let len = out.len();
        out.fill(0.0);
        for (slot, voice) in self.voices.iter_mut().enumerate() {
            if voice.is_free() {
                continue;
            }
            let temp = &mut self.temp_buffer[..len];
            if let Some(finished) = voice.render(temp, timbre) {
                self.shared.slot(slot).mark_finished(finished);
            } else {
                self.shared
                    .slot(slot)
                    .set_level(voice.get_envelope_level().unwrap_or(0.0));
            }
            for (o, v) in out.iter_mut().zip(temp.iter()) {
                *o += v;
            }
        }

        for sample in out.iter_mut() {
            self.pressure_gain += self.pressure_coeff * (target - self.pressure_gain);
            self.run_gain = step_toward(self.run_gain, run_target, self.run_step);

            let scaled = *sample * self.pressure_gain * self.run_gain * self.output_gain;
            *sample = scaled.tanh();
        }

        if self.run_gain <= 0.0 {
            match self.restart.take() {
                Some(epoch) => self.finish_restart(epoch),
                None if !running => self.reset_voices(),
                None => {}
            }
        }
    }

    /// Follow lifecycle epochs and apply queued commands of the current one.
    ///
    /// Older-epoch commands are dropped. While a restart is pending nothing
    /// more is popped, so the new epoch's commands wait in the ring.
    fn sync_commands(&mut self, timbre: TimbreSnapshot) {
        let epoch = self.shared.epoch();
        if is_newer(epoch, self.seen_epoch) {
            self.begin_restart(epoch);
        }
        if self.run_gain <= 0.0 {
            if let Some(epoch) = self.restart.take() {
                self.finish_restart(epoch);
            }
        }

        while self.restart.is_none() {
            let Some(command) = self.stashed.take().or_else(|| self.rx.pop()) else {
                break;
            };
            let epoch = command.epoch();
            if is_newer(epoch, self.seen_epoch) {
                self.begin_restart(epoch);
                if self.restart.is_some() {
                    self.stashed = Some(command);
                    break;
                }
            } else if epoch != self.seen_epoch {
                continue;
            }
            self.apply(command, timbre);
        }
    }

    /// Reset for `epoch` now if nothing is audible, otherwise after the fade-out.
    fn begin_restart(&mut self, epoch: u32) {
        let epoch = match self.restart {
            Some(pending) if is_newer(pending, epoch) => pending,
            _ => epoch,
        };
        if self.run_gain > 0.0 && self.voices.iter().any(|v| !v.is_free()) {
            self.restart = Some(epoch);
        } else {
            self.restart = None;
            self.finish_restart(epoch);
        }
    }

    fn finish_restart(&mut self, epoch: u32) {
        self.reset_voices();
        self.seen_epoch = epoch;
    }

    fn apply(&mut self, command: VoiceCommand, timbre: TimbreSnapshot) {
        match command {
            VoiceCommand::Start {
                slot,
                note,
                generation,
                ..
            } => {
                if let Some(voice) = self.voices.get_mut(slot) {
                    voice.start(note, generation, timbre);
                }
            }
            VoiceCommand::Release {
                slot, generation, ..
            } => {
                if let Some(voice) = self.voices.get_mut(slot) {
                    if voice.is_active() && voice.generation() == generation {
                        voice.release(false, timbre);
                    }
                }
            }
            VoiceCommand::ReleaseAll { fast, .. } => {
                for voice in self.voices.iter_mut().filter(|v| v.is_active()) {
                    voice.release(fast, timbre);
                }
            }
        }
    }

    /// Silence every voice, clear its DSP state and report it finished.
    fn reset_voices(&mut self) {
        for (slot, voice) in self.voices.iter_mut().enumerate() {
            let generation = voice.generation();
            voice.hard_reset();
            self.shared.slot(slot).mark_finished(generation);
        }
    }
}

#[inline]
fn is_newer(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

#[inline]
fn step_toward(value: f32, target: f32, step: f32) -> f32 {
    if value < target {
        (value + step).min(target)
    } else {
        (value - step).max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_comparison_wraps() {
        assert!(is_newer(1, 0));
        assert!(is_newer(0, u32::MAX));
        assert!(!is_newer(5, 5));
        assert!(!is_newer(4, 5));
    }

    #[test]
    fn step_toward_stops_at_target() {
        assert_eq!(step_toward(0.95, 1.0, 0.1), 1.0);
        assert_eq!(step_toward(0.05, 0.0, 0.1), 0.0);
        assert!((step_toward(0.5, 0.0, 0.1) - 0.4).abs() < 1e-6);
    }
}
