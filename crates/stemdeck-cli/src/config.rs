//! Player configuration
//!
//! Stored as YAML, by default at `~/.config/stemdeck/config.yaml`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stemdeck_core::config::{default_config_path, EngineConfig};

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Root configuration of the terminal player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Engine settings (sample rate, device, stem folder, mixer)
    pub engine: EngineConfig,
    /// Quiet period before a speed/pitch change is rendered
    pub effects_debounce_ms: u64,
    /// Interval of the position display refresh
    pub position_poll_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            effects_debounce_ms: 500,
            position_poll_ms: 100,
        }
    }
}

impl PlayerConfig {
    pub fn effects_debounce(&self) -> Duration {
        Duration::from_millis(self.effects_debounce_ms)
    }

    /// Poll interval, never below 10 ms
    pub fn position_poll(&self) -> Duration {
        Duration::from_millis(self.position_poll_ms.max(10))
    }
}

/// Default config location
pub fn default_config_file() -> PathBuf {
    default_config_path(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdeck_core::config::{load_config, save_config};

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.effects_debounce(), Duration::from_millis(500));
        assert_eq!(config.position_poll(), Duration::from_millis(100));
        assert_eq!(config.engine.sample_rate, 44100);
    }

    #[test]
    fn test_nested_engine_section() {
        let yaml = "effects_debounce_ms: 250\nengine:\n  mixer:\n    ceiling: 0.9\n";
        let config: PlayerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.effects_debounce_ms, 250);
        assert_eq!(config.position_poll_ms, 100);
        assert_eq!(config.engine.mixer.ceiling, 0.9);
    }

    #[test]
    fn test_poll_interval_floor() {
        let config = PlayerConfig {
            position_poll_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.position_poll(), Duration::from_millis(10));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = PlayerConfig::default();
        config.engine.stems.separator = Some("demucs --name htdemucs --out data {input}".to_string());

        save_config(&config, &path).unwrap();
        let loaded: PlayerConfig = load_config(&path);
        assert_eq!(loaded, config);
    }
}
