use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use log::{error, info};
use rtrb::Producer;

use crate::PolySynth;

/// The host's default output device and its preferred stream config.
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl OutputDevice {
    pub fn default_output() -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        Ok(Self { device, config })
    }

    /// Sample rate the engine must be configured with.
    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate().0 as f32
    }

    pub fn channels(&self) -> usize {
        self.config.channels() as usize
    }

    pub fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown device".to_string())
    }

    /// Start streaming `synth` to this device.
    ///
    /// `scope`, when given, receives the rendered mono signal for display. It
    /// is filled with `push` only; samples are dropped when the reader lags.
    pub fn open(self, synth: PolySynth, scope: Option<Producer<f32>>) -> EyreResult<AudioOutput> {
        AudioOutput::open(self, synth, scope)
    }
}

/// A playing output stream. Audio stops when this is dropped.
pub struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: f32,
    channels: usize,
}

impl AudioOutput {
    pub fn open(
        device: OutputDevice,
        mut synth: PolySynth,
        mut scope: Option<Producer<f32>>,
    ) -> EyreResult<Self> {
        let sample_rate = device.sample_rate();
        let channels = device.channels();
        if (synth.sample_rate() - sample_rate).abs() > 0.5 {
            return Err(eyre!(
                "synth runs at {} Hz but the device expects {} Hz",
                synth.sample_rate(),
                sample_rate
            ));
        }

        let name = device.name();
        let stream = device
            .device
            .build_output_stream(
                &device.config.into(),
                move |data: &mut [f32], _| {
                    synth.process_interleaved(data, channels);
                    if let Some(scope) = scope.as_mut() {
                        for &sample in data.iter().step_by(channels.max(1)) {
                            if scope.push(sample).is_err() {
                                break;
                            }
                        }
                    }
                },
                |err| error!("audio stream error: {err}"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;
        info!("audio output on {name}: {sample_rate} Hz, {channels} channels");

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}
