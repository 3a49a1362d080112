//! Per-stem and master gain control
//!
//! Gains are written straight into the shared atomics and picked up by the
//! next audio block; nothing is restarted.

use std::sync::Arc;

use super::state::PlaybackState;
use crate::types::{Stem, NUM_STEMS};

pub struct VolumeController {
    state: Arc<PlaybackState>,
}

impl VolumeController {
    pub fn new(state: Arc<PlaybackState>) -> Self {
        Self { state }
    }

    /// Set a stem gain, clamped to `[0, 2]`; returns the stored value
    pub fn set_volume(&self, stem: Stem, value: f32) -> f32 {
        let stored = self.state.set_volume(stem, value);
        log::debug!("{} volume -> {:.2}", stem, stored);
        stored
    }

    /// Set the master gain, clamped to `[0, 2]`; returns the stored value
    pub fn set_master_volume(&self, value: f32) -> f32 {
        let stored = self.state.set_master_volume(value);
        log::debug!("Master volume -> {:.2}", stored);
        stored
    }

    pub fn volume(&self, stem: Stem) -> f32 {
        self.state.volume(stem)
    }

    pub fn master_volume(&self) -> f32 {
        self.state.master_volume()
    }

    /// All stem gains in stem order
    pub fn volumes(&self) -> [f32; NUM_STEMS] {
        Stem::ALL.map(|stem| self.state.volume(stem))
    }
}
