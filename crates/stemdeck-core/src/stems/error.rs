//! Stem loading error types

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Stem;

/// Errors that can occur while locating, decoding or assembling stems
#[derive(Error, Debug)]
pub enum LoadError {
    /// The song path has no usable file name
    #[error("Invalid song path: {0}")]
    InvalidSongPath(PathBuf),

    /// No stem file exists for the song
    #[error("No stem files found for '{song_id}' in {}", .dir.display())]
    MissingStems { song_id: String, dir: PathBuf },

    /// The separator command could not produce the stem folder
    #[error("Stem separation failed ({command}): {reason}")]
    Separation { command: String, reason: String },

    /// A stem file could not be decoded
    #[error("Failed to decode {stem} stem {}: {reason}", .path.display())]
    Decode {
        stem: Stem,
        path: PathBuf,
        reason: String,
    },

    /// A stem file decoded to zero frames
    #[error("{stem} stem {} contains no audio", .path.display())]
    EmptyStem { stem: Stem, path: PathBuf },

    /// Sample rate conversion failed for a stem
    #[error("Failed to resample {stem} stem from {from}Hz to {to}Hz: {reason}")]
    Resample {
        stem: Stem,
        from: u32,
        to: u32,
        reason: String,
    },

    /// Every present stem file was skipped
    #[error("No stems were successfully loaded for '{}': {}", .song_id, describe_skipped(.skipped))]
    NoStemsLoaded {
        song_id: String,
        skipped: Vec<SkippedStem>,
    },

    /// Filesystem error
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for stem loading
pub type LoadResult<T> = Result<T, LoadError>;

/// A stem file that was present but could not be used
#[derive(Debug)]
pub struct SkippedStem {
    pub stem: Stem,
    pub error: LoadError,
}

fn describe_skipped(skipped: &[SkippedStem]) -> String {
    skipped
        .iter()
        .map(|s| s.error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
