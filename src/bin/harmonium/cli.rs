use clap::Parser;

use lid_harmonium::{io::KeyRange, synth::timbre::TimbreSnapshot, EngineConfig};

/// Play a reed organ from the terminal. Arrow keys pump the bellows.
#[derive(Debug, Parser)]
#[command(name = "harmonium", version, about)]
pub struct Args {
    /// Number of voices
    #[arg(long, default_value_t = 12)]
    pub voices: usize,

    /// Lowest bellows pressure; raise it to keep held notes audible without pumping
    #[arg(long, default_value_t = 0.0)]
    pub pressure_floor: f32,

    /// Low-pass coefficient (0..1, higher is brighter)
    #[arg(long, default_value_t = TimbreSnapshot::DEFAULT_LPF_ALPHA)]
    pub lpf_alpha: f32,

    /// Chorus mix (0..1)
    #[arg(long, default_value_t = TimbreSnapshot::DEFAULT_CHORUS_MIX)]
    pub chorus: f32,

    /// Octave-up mix (0..1)
    #[arg(long, default_value_t = TimbreSnapshot::DEFAULT_OCTAVE_UP_MIX)]
    pub octave: f32,

    /// How much pressure brightens the tone
    #[arg(long, default_value_t = 0.5)]
    pub brightness: f32,

    /// Lowest note of the on-screen keyboard
    #[arg(long, default_value_t = 60)]
    pub low: u8,

    /// Highest note of the on-screen keyboard
    #[arg(long, default_value_t = 84)]
    pub high: u8,

    /// Draw the bellows dots with plain filled circles
    #[arg(long)]
    pub plain_dots: bool,
}

impl Args {
    pub fn engine_config(&self, sample_rate: f32) -> EngineConfig {
        EngineConfig::default()
            .with_sample_rate(sample_rate)
            .with_max_voices(self.voices)
            .with_pressure_floor(self.pressure_floor)
            .with_brightness_tracking(self.brightness)
            .with_timbre(TimbreSnapshot::new(self.lpf_alpha, self.chorus, self.octave))
    }

    pub fn key_range(&self) -> KeyRange {
        KeyRange::new(self.low, self.high)
    }
}
