//! Per-stem mute on top of the engine's stem volumes
//!
//! Muting remembers the stem's volume and sets it to zero; unmuting restores
//! it. Setting a volume explicitly forgets the remembered value.

use stemdeck_core::types::{Stem, NUM_STEMS};
use stemdeck_core::StemEngine;

#[derive(Debug, Default, Clone)]
pub struct MuteState {
    saved: [Option<f32>; NUM_STEMS],
}

impl MuteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_muted(&self, stem: Stem) -> bool {
        self.saved[stem.index()].is_some()
    }

    /// Toggle one stem; returns whether it is muted afterwards
    pub fn toggle(&mut self, engine: &StemEngine, stem: Stem) -> bool {
        match self.saved[stem.index()].take() {
            Some(volume) => {
                engine.set_volume(stem, volume);
                false
            }
            None => {
                self.saved[stem.index()] = Some(engine.volume(stem));
                engine.set_volume(stem, 0.0);
                true
            }
        }
    }

    /// Unmute everything when every stem is muted, otherwise mute the stems
    /// still playing; returns whether all stems are muted afterwards
    pub fn toggle_all(&mut self, engine: &StemEngine) -> bool {
        let all_muted = Stem::ALL.iter().all(|&stem| self.is_muted(stem));
        for stem in Stem::ALL {
            if self.is_muted(stem) == all_muted {
                self.toggle(engine, stem);
            }
        }
        !all_muted
    }

    /// Explicit volume change: applies it and clears the mute
    pub fn set_volume(&mut self, engine: &StemEngine, stem: Stem, volume: f32) -> f32 {
        self.saved[stem.index()] = None;
        engine.set_volume(stem, volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdeck_core::audio::ManualBackend;
    use stemdeck_core::config::EngineConfig;

    fn engine() -> StemEngine {
        StemEngine::new(&EngineConfig::default(), Box::new(ManualBackend::new()))
    }

    #[test]
    fn test_toggle_restores_volume() {
        let engine = engine();
        let mut mute = MuteState::new();
        engine.set_volume(Stem::Drums, 0.7);

        assert!(mute.toggle(&engine, Stem::Drums));
        assert_eq!(engine.volume(Stem::Drums), 0.0);
        assert!(mute.is_muted(Stem::Drums));

        assert!(!mute.toggle(&engine, Stem::Drums));
        assert_eq!(engine.volume(Stem::Drums), 0.7);
    }

    #[test]
    fn test_toggle_all() {
        let engine = engine();
        let mut mute = MuteState::new();
        engine.set_volume(Stem::Bass, 1.5);
        engine.set_volume(Stem::Vocals, 0.6);
        mute.toggle(&engine, Stem::Vocals);

        // Some stems still playing: those get muted too
        assert!(mute.toggle_all(&engine));
        assert!(Stem::ALL.iter().all(|&s| engine.volume(s) == 0.0 && mute.is_muted(s)));

        // Everything muted: everything comes back, including the stem muted first
        assert!(!mute.toggle_all(&engine));
        assert_eq!(engine.volume(Stem::Vocals), 0.6);
        assert_eq!(engine.volume(Stem::Bass), 1.5);
        assert_eq!(engine.volume(Stem::Other), 1.0);
        assert!(Stem::ALL.iter().all(|&s| !mute.is_muted(s)));
    }

    #[test]
    fn test_explicit_volume_clears_mute() {
        let engine = engine();
        let mut mute = MuteState::new();
        mute.toggle(&engine, Stem::Other);
        assert_eq!(mute.set_volume(&engine, Stem::Other, 0.4), 0.4);
        assert!(!mute.is_muted(Stem::Other));

        mute.toggle(&engine, Stem::Other);
        mute.toggle(&engine, Stem::Other);
        assert_eq!(engine.volume(Stem::Other), 0.4);
    }
}
