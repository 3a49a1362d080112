//! Standard locations of stemdeck files

use std::path::PathBuf;

/// Application folder name under the platform config dir
const APP_DIR: &str = "stemdeck";

/// Default config directory
///
/// Returns `~/.config/stemdeck` on Linux and the platform equivalent elsewhere.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default path of a config file inside the config directory
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_app_specific() {
        assert!(default_config_dir().ends_with("stemdeck"));
    }

    #[test]
    fn test_config_path_includes_filename() {
        let path = default_config_path("config.yaml");
        assert!(path.ends_with("stemdeck/config.yaml"));
    }
}
