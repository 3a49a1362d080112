//! Offline effects error types

use thiserror::Error;

use crate::types::Stem;

/// Errors that can occur while transforming a stem set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectsError {
    /// Speed ratio is not a positive finite number
    #[error("Invalid speed ratio {0} (must be finite and greater than 0)")]
    InvalidSpeed(f64),

    /// There is nothing to transform
    #[error("No stems loaded")]
    NoStemsLoaded,

    /// The DSP collaborator failed on a stem
    #[error("Processing {stem} stem failed: {reason}")]
    Dsp { stem: Stem, reason: String },

    /// Every transformed stem came out empty
    #[error("Transform produced no audio")]
    EmptyOutput,

    /// The background effects thread is gone
    #[error("Effects worker disconnected")]
    WorkerDisconnected,
}

/// Failure reported by a `StemDsp` implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DspError(pub String);

impl From<String> for DspError {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

/// Result type for effects operations
pub type EffectsResult<T> = Result<T, EffectsError>;
