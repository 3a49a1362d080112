//! Engine error types

use thiserror::Error;

use crate::audio::AudioError;
use crate::effects::EffectsError;
use crate::stems::LoadError;

/// Errors surfaced by the `StemEngine` control surface
#[derive(Error, Debug)]
pub enum EngineError {
    /// Loading a song's stems failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Applying speed/pitch failed
    #[error(transparent)]
    Effects(#[from] EffectsError),

    /// The output stream could not be opened
    #[error("Hardware stream error: {0}")]
    HardwareStream(#[from] AudioError),

    /// Operation needs a loaded song
    #[error("No song loaded")]
    NoSongLoaded,

    /// A background thread could not be started
    #[error("Failed to spawn {name} thread: {source}")]
    Thread {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
