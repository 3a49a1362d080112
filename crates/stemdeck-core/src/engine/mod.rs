//! Playback engine
//!
//! - **StemEngine**: control surface for one song/deck
//! - **RealtimeMixer**: runs inside the audio callback
//! - **PlaybackState**: lock-free state shared between the two
//! - **Crossfader**: master gains for a pair of decks

mod crossfade;
mod engine;
mod error;
pub mod gc;
mod mixer;
mod state;
mod transport;
mod volume;

pub use crossfade::{crossfade_gains, Crossfader};
pub use engine::StemEngine;
pub use error::{EngineError, EngineResult};
pub use mixer::{MixerSettings, RealtimeMixer};
pub use state::{clamp_volume, PlaybackState, StemSlot, MAX_VOLUME, MIN_VOLUME};
pub use transport::TransportController;
pub use volume::VolumeController;
