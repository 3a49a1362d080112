//! Engine configuration
//!
//! ```yaml
//! sample_rate: 44100
//! audio:
//!   device: { name: "hw:0,0", host: ALSA }
//!   buffer_size: Default
//! stems:
//!   root: data/separated/htdemucs
//!   separator: "demucs --name htdemucs --out data {input}"
//! mixer:
//!   ceiling: 0.95
//!   volume_epsilon: 0.001
//! effects:
//!   quality: default
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path};

use serde::{Deserialize, Serialize};

use crate::audio::AudioConfig;
use crate::effects::StretchQuality;
use crate::engine::MixerSettings;
use crate::stems::StemSourceConfig;
use crate::types::SAMPLE_RATE;

/// Offline effects settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub quality: StretchQuality,
}

/// Everything a `StemEngine` needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rate stems are loaded at and the output stream runs at
    pub sample_rate: u32,
    pub audio: AudioConfig,
    pub stems: StemSourceConfig,
    pub mixer: MixerSettings,
    pub effects: EffectsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            audio: AudioConfig::default(),
            stems: StemSourceConfig::default(),
            mixer: MixerSettings::default(),
            effects: EffectsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::BufferSize;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.audio.buffer_size.as_frames(), 256);
        assert_eq!(config.stems.root, PathBuf::from("data/separated/htdemucs"));
        assert_eq!(config.mixer.ceiling, 0.95);
        assert_eq!(config.mixer.volume_epsilon, 0.001);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "stems:\n  separator: demucs --out data {input}\nmixer:\n  ceiling: 0.8\naudio:\n  buffer_size: LowLatency\neffects:\n  quality: cheaper\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.stems.root, PathBuf::from("data/separated/htdemucs"));
        assert_eq!(config.stems.separator.as_deref(), Some("demucs --out data {input}"));
        assert_eq!(config.mixer.ceiling, 0.8);
        assert_eq!(config.mixer.volume_epsilon, 0.001);
        assert_eq!(config.audio.buffer_size, BufferSize::LowLatency);
        assert_eq!(config.effects.quality, StretchQuality::Cheaper);
    }
}
