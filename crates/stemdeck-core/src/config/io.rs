//! YAML configuration loading and saving

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a YAML config, falling back to defaults
///
/// A missing file yields `T::default()`. An unreadable or invalid file is
/// logged and also yields the defaults, so a broken config never prevents
/// playback.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("Failed to read config {}: {}, using defaults", path.display(), e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Failed to parse config {}: {}, using defaults", path.display(), e);
            T::default()
        }
    }
}

/// Save a config as YAML, creating parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config file {}", path.display()))?;

    log::info!("Saved config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct DeckSettings {
        gain: f32,
        label: String,
    }

    impl Default for DeckSettings {
        fn default() -> Self {
            Self {
                gain: 1.0,
                label: "deck".to_string(),
            }
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config: DeckSettings = load_config(Path::new("/nonexistent/stemdeck/config.yaml"));
        assert_eq!(config, DeckSettings::default());
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "gain: [not, a, number]").unwrap();

        let config: DeckSettings = load_config(&path);
        assert_eq!(config, DeckSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "gain: 0.5\n").unwrap();

        let config: DeckSettings = load_config(&path);
        assert_eq!(config.gain, 0.5);
        assert_eq!(config.label, "deck");
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = DeckSettings {
            gain: 1.5,
            label: "left".to_string(),
        };
        save_config(&config, &path).unwrap();

        let loaded: DeckSettings = load_config(&path);
        assert_eq!(loaded, config);
    }
}
