//! CPAL audio backend
//!
//! Opens a single f32 output stream on the configured (or default) device.
//! The audio callback owns the `RealtimeMixer` outright, so no lock is shared
//! with the control side.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::backend::{AudioBackend, AudioStream};
use super::config::AudioConfig;
use super::device::{find_device_by_id, get_default_device};
use super::error::{AudioError, AudioResult};
use crate::engine::RealtimeMixer;

/// CPAL output stream handle
///
/// Keeps the stream alive. Drop this to stop audio.
pub struct CpalAudioStream {
    _stream: Stream,
    sample_rate: u32,
    buffer_size: u32,
}

impl AudioStream for CpalAudioStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn buffer_size(&self) -> u32 {
        self.buffer_size
    }
}

/// Backend that plays through CPAL
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    config: AudioConfig,
}

impl CpalBackend {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }
}

impl AudioBackend for CpalBackend {
    fn open(&mut self, mixer: RealtimeMixer, sample_rate: u32) -> AudioResult<Box<dyn AudioStream>> {
        let device = match &self.config.device {
            Some(id) => find_device_by_id(id)?,
            None => get_default_device()?,
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Using audio device: {}", device_name);

        let supported = get_output_config(&device, sample_rate)?;
        let buffer_size = self.config.buffer_size.as_frames();

        let stream_config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: CpalBufferSize::Fixed(buffer_size),
        };

        log::info!(
            "Audio config: {} channels, {}Hz, {} frames (~{:.1}ms latency)",
            stream_config.channels,
            sample_rate,
            buffer_size,
            self.config.buffer_size.latency_ms(sample_rate)
        );

        let stream = build_output_stream(&device, &stream_config, mixer)?;
        stream
            .play()
            .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

        log::info!("Audio stream started");

        Ok(Box::new(CpalAudioStream {
            _stream: stream,
            sample_rate,
            buffer_size,
        }))
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

/// Pick an f32, at-least-stereo config that runs at `sample_rate`
fn get_output_config(device: &cpal::Device, sample_rate: u32) -> AudioResult<cpal::SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();

    if supported_configs.is_empty() {
        return Err(AudioError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let float_stereo: Vec<_> = supported_configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .collect();

    if float_stereo.is_empty() {
        let formats: Vec<String> = supported_configs
            .iter()
            .map(|c| format!("{:?}x{}", c.sample_format(), c.channels()))
            .collect();
        return Err(AudioError::UnsupportedFormat(format!(
            "need f32 stereo output, device offers {}",
            formats.join(", ")
        )));
    }

    let best = float_stereo
        .iter()
        .filter(|c| (c.min_sample_rate().0..=c.max_sample_rate().0).contains(&sample_rate))
        // Fewest channels first: plain stereo beats multichannel layouts
        .min_by_key(|c| c.channels())
        .ok_or_else(|| AudioError::UnsupportedSampleRate {
            requested: sample_rate,
            supported: float_stereo
                .iter()
                .map(|c| format!("{}-{}Hz", c.min_sample_rate().0, c.max_sample_rate().0))
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    Ok((*best).clone().with_sample_rate(cpal::SampleRate(sample_rate)))
}

fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut mixer: RealtimeMixer,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                mixer.fill_interleaved(data, channels);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}
