//! stemdeck-core: synchronized multi-stem playback
//!
//! Loads the four separated stems of a song (vocals, drums, bass, other),
//! mixes them in real time with per-stem gains, and renders offline speed and
//! pitch changes.
//!
//! ```ignore
//! use stemdeck_core::audio::CpalBackend;
//! use stemdeck_core::config::EngineConfig;
//! use stemdeck_core::engine::StemEngine;
//! use stemdeck_core::types::Stem;
//!
//! let config = EngineConfig::default();
//! let mut engine = StemEngine::new(&config, Box::new(CpalBackend::new(config.audio.clone())));
//! engine.load_song_stems("songs/track.mp3".as_ref())?;
//! engine.set_volume(Stem::Vocals, 0.0);
//! engine.start_playback()?;
//! ```

pub mod audio;
pub mod config;
pub mod effects;
pub mod engine;
pub mod stems;
pub mod types;

pub use engine::{EngineError, EngineResult, StemEngine};
pub use types::{Stem, StereoBuffer, StereoSample, NUM_STEMS, SAMPLE_RATE};
