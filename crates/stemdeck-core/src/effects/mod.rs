//! Offline speed and pitch effects
//!
//! Effects are rendered once over whole stems, never in the audio callback.
//! The result replaces the playing stem set wholesale.

mod error;
mod processor;
mod timestretch;
mod worker;

pub use error::{DspError, EffectsError, EffectsResult};
pub use processor::{OfflineEffectsProcessor, StemDsp};
pub use timestretch::{SignalsmithDsp, StretchQuality, TimeStretcher};
pub use worker::{EffectsRequest, EffectsWorker, EffectsWorkerResult};

/// Speed and pitch applied to a song
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Playback speed, 1.0 = unchanged, 2.0 = twice as fast
    pub speed_ratio: f64,
    /// Transposition in semitones, 0 = unchanged
    pub pitch_semitones: i32,
}

impl EffectParams {
    pub fn new(speed_ratio: f64, pitch_semitones: i32) -> Self {
        Self {
            speed_ratio,
            pitch_semitones,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.speed_ratio == 1.0 && self.pitch_semitones == 0
    }

    /// Reject non-finite or non-positive speeds
    pub fn validate(&self) -> EffectsResult<()> {
        if self.speed_ratio.is_finite() && self.speed_ratio > 0.0 {
            Ok(())
        } else {
            Err(EffectsError::InvalidSpeed(self.speed_ratio))
        }
    }
}

impl Default for EffectParams {
    fn default() -> Self {
        Self::new(1.0, 0)
    }
}
