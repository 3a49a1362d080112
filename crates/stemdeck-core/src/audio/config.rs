//! Audio backend configuration
//!
//! Device selection and buffer settings for the output stream.

use serde::{Deserialize, Serialize};

/// Largest block the mixer pre-allocates (frames)
///
/// Hardware buffers larger than this are rendered in consecutive chunks.
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Largest fixed block size accepted for the output stream (frames)
pub const MAX_STREAM_BUFFER_SIZE: u32 = 512;

/// Smallest fixed block size accepted for the output stream (frames)
pub const MIN_STREAM_BUFFER_SIZE: u32 = 64;

/// Default buffer size when no preference is specified (frames)
/// 256 frames @ 44.1kHz = ~5.8ms
pub const DEFAULT_BUFFER_SIZE: u32 = 256;

/// Buffer size used for low-latency mode (frames, ~2.9ms @ 44.1kHz)
pub const LOW_LATENCY_BUFFER_SIZE: u32 = 128;

/// Preferred buffer size for the output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferSize {
    /// Use the engine default (256 frames)
    #[default]
    Default,
    /// Request a specific buffer size in frames, clamped to 64..=512
    Fixed(u32),
    /// Smallest block that is still stable on most systems
    LowLatency,
}

impl BufferSize {
    /// Block size in frames that will be requested from the device
    pub fn as_frames(&self) -> u32 {
        match self {
            BufferSize::Default => DEFAULT_BUFFER_SIZE,
            BufferSize::Fixed(frames) => {
                (*frames).clamp(MIN_STREAM_BUFFER_SIZE, MAX_STREAM_BUFFER_SIZE)
            }
            BufferSize::LowLatency => LOW_LATENCY_BUFFER_SIZE,
        }
    }

    /// Calculate latency in milliseconds for a given sample rate
    pub fn latency_ms(&self, sample_rate: u32) -> f32 {
        (self.as_frames() as f32 / sample_rate as f32) * 1000.0
    }
}

/// Audio device identifier
///
/// Includes both the device name and the host backend (ALSA, CoreAudio, ...)
/// so a device can be picked from a specific host when several are available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device name as reported by the system
    pub name: String,
    /// Audio host identifier (e.g., "ALSA", "CoreAudio")
    /// If None, every host is searched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
        }
    }

    /// Get a display label that includes the host if available
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

/// Configuration for the audio backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device (None = system default)
    pub device: Option<DeviceId>,

    /// Preferred buffer size
    pub buffer_size: BufferSize,
}

impl AudioConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            buffer_size: BufferSize::LowLatency,
            ..Default::default()
        }
    }

    /// Set the output device
    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(device);
        self
    }

    /// Set the buffer size
    pub fn with_buffer_size(mut self, buffer_size: BufferSize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_frames() {
        assert_eq!(BufferSize::Default.as_frames(), 256);
        assert_eq!(BufferSize::Fixed(32).as_frames(), 64);
        assert_eq!(BufferSize::Fixed(300).as_frames(), 300);
        assert_eq!(BufferSize::Fixed(4096).as_frames(), 512);
        assert!(BufferSize::LowLatency.as_frames() <= MAX_STREAM_BUFFER_SIZE);
    }

    #[test]
    fn test_latency_ms() {
        let latency = BufferSize::Fixed(441).latency_ms(44100);
        assert!((latency - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_device_label() {
        assert_eq!(DeviceId::new("hw:0,0").display_label(), "hw:0,0");
        assert_eq!(DeviceId::with_host("hw:0,0", "ALSA").display_label(), "[ALSA] hw:0,0");
    }

    #[test]
    fn test_config_yaml_defaults() {
        let config: AudioConfig = serde_yaml::from_str("buffer_size: !Fixed 128\n").unwrap();
        assert_eq!(config.buffer_size, BufferSize::Fixed(128));
        assert!(config.device.is_none());
    }
}
