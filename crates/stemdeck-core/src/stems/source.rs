//! Locating the stem files of a song
//!
//! Stems are produced by an external separator that writes one WAV per stem
//! into `<root>/<song_id>/`. `SeparatedDirSource` resolves that layout and can
//! optionally run the separator when a song has not been split yet.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use super::error::{LoadError, LoadResult};
use crate::types::{Stem, NUM_STEMS};

/// Placeholder replaced by the song path in the separator command line
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Where the stems of one song live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemLocation {
    /// File base name of the song, without extension
    pub song_id: String,
    /// Folder the stems were looked up in
    pub dir: PathBuf,
    /// Existing stem files, indexed by `Stem::index()`
    pub files: [Option<PathBuf>; NUM_STEMS],
}

impl StemLocation {
    /// Number of stem files that exist
    pub fn file_count(&self) -> usize {
        self.files.iter().flatten().count()
    }
}

/// Resolves a song path to its stem files
pub trait StemSource: Send + Sync {
    /// Locate the stems of `song_path`
    ///
    /// Fails with `MissingStems` when not a single stem file exists.
    fn locate(&self, song_path: &Path) -> LoadResult<StemLocation>;
}

/// Configuration of the separated-stems directory layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StemSourceConfig {
    /// Root folder holding one sub-folder per song
    pub root: PathBuf,
    /// Separator command run when a song folder is missing, e.g.
    /// `demucs --name htdemucs --out data {input}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

impl Default for StemSourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/separated/htdemucs"),
            separator: None,
        }
    }
}

/// Derive the song id (file base name without extension)
pub fn song_id_for(song_path: &Path) -> LoadResult<String> {
    song_path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LoadError::InvalidSongPath(song_path.to_path_buf()))
}

/// Stem source for `<root>/<song_id>/{vocals,drums,bass,other}.wav`
#[derive(Debug, Clone)]
pub struct SeparatedDirSource {
    root: PathBuf,
    separator: Option<String>,
}

impl SeparatedDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            separator: None,
        }
    }

    pub fn from_config(config: &StemSourceConfig) -> Self {
        Self {
            root: config.root.clone(),
            separator: config.separator.clone(),
        }
    }

    /// Run `command` to split songs whose folder does not exist yet
    pub fn with_separator(mut self, command: impl Into<String>) -> Self {
        self.separator = Some(command.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run_separator(&self, command: &str, song_path: &Path) -> LoadResult<()> {
        let song = song_path.to_string_lossy();
        let mut args: Vec<String> = command
            .split_whitespace()
            .map(|token| token.replace(INPUT_PLACEHOLDER, &song))
            .collect();
        if !command.contains(INPUT_PLACEHOLDER) {
            args.push(song.to_string());
        }
        if args.is_empty() {
            return Err(LoadError::Separation {
                command: command.to_string(),
                reason: "empty command".to_string(),
            });
        }

        let program = args.remove(0);
        log::info!("Separating stems: {} {}", program, args.join(" "));

        let status = Command::new(&program)
            .args(&args)
            .status()
            .map_err(|e| LoadError::Separation {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(LoadError::Separation {
                command: command.to_string(),
                reason: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}

impl StemSource for SeparatedDirSource {
    fn locate(&self, song_path: &Path) -> LoadResult<StemLocation> {
        let song_id = song_id_for(song_path)?;
        let dir = self.root.join(&song_id);

        if !dir.is_dir() {
            if let Some(command) = &self.separator {
                self.run_separator(command, song_path)?;
            }
        }

        let files = Stem::ALL.map(|stem| {
            let path = dir.join(stem.file_name());
            path.is_file().then_some(path)
        });

        let location = StemLocation { song_id, dir, files };
        if location.file_count() == 0 {
            return Err(LoadError::MissingStems {
                song_id: location.song_id,
                dir: location.dir,
            });
        }

        log::debug!(
            "Found {} stem files for '{}' in {}",
            location.file_count(),
            location.song_id,
            location.dir.display()
        );
        Ok(location)
    }
}
