//! Real-time stem mixer
//!
//! `RealtimeMixer` is owned by the audio callback. Per block it:
//!
//! 1. zeroes the block
//! 2. returns silence unless playing with stems installed
//! 3. snapshots the position once
//! 4. adds every audible stem (`volume > epsilon`) scaled by its gain
//! 5. applies the master gain
//! 6. clamps to `[-ceiling, ceiling]`
//! 7. advances the position by the block length
//! 8. wraps to 0 once the end of the song is reached
//!
//! A block that straddles the end of the song is padded with silence; the
//! wrap takes effect on the next block. A panic while mixing turns the
//! block into silence and is counted; playback keeps running.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::state::{PlaybackState, MAX_VOLUME};
use crate::audio::MAX_BUFFER_SIZE;
use crate::stems::StemSet;
use crate::types::StereoSample;

/// Tunables of the mix stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerSettings {
    /// Output clamp, applied symmetrically
    pub ceiling: f32,
    /// Stems at or below this gain are skipped
    pub volume_epsilon: f32,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            ceiling: 0.95,
            volume_epsilon: 0.001,
        }
    }
}

impl MixerSettings {
    /// Settings the callback can use without further checks
    ///
    /// Non-finite values fall back to the defaults and negative ones are
    /// mirrored. The ceiling is capped at full scale, the epsilon at the
    /// highest stem gain.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let ceiling = if self.ceiling.is_finite() {
            self.ceiling.abs().min(1.0)
        } else {
            defaults.ceiling
        };
        let volume_epsilon = if self.volume_epsilon.is_finite() {
            self.volume_epsilon.abs().min(MAX_VOLUME)
        } else {
            defaults.volume_epsilon
        };
        Self {
            ceiling,
            volume_epsilon,
        }
    }
}

/// Produces mixed output blocks from the shared playback state
pub struct RealtimeMixer {
    state: Arc<PlaybackState>,
    settings: MixerSettings,
    /// Pre-allocated mix block, never grows past `MAX_BUFFER_SIZE`
    block: Vec<StereoSample>,
    #[cfg(test)]
    panic_next_block: bool,
}

impl RealtimeMixer {
    /// Mixer over `state`; `settings` are sanitized first
    pub fn new(state: Arc<PlaybackState>, settings: MixerSettings) -> Self {
        let sanitized = settings.sanitized();
        if sanitized != settings {
            log::warn!("Invalid mixer settings {:?}, using {:?}", settings, sanitized);
        }

        Self {
            state,
            settings: sanitized,
            block: Vec::with_capacity(MAX_BUFFER_SIZE),
            #[cfg(test)]
            panic_next_block: false,
        }
    }

    /// Render one block of up to `MAX_BUFFER_SIZE` frames
    ///
    /// Larger requests are truncated; use `fill_interleaved` for device
    /// buffers of arbitrary size.
    pub fn process(&mut self, n_frames: usize) -> &[StereoSample] {
        let n_frames = n_frames.min(MAX_BUFFER_SIZE);
        self.block.clear();
        self.block.resize(n_frames, StereoSample::silence());

        if n_frames == 0 || !self.state.is_playing() {
            return &self.block;
        }

        let stems = self.state.stems();
        let Some(set) = (*stems).as_ref() else {
            return &self.block;
        };

        let frame_count = set.frame_count() as u64;
        let pos = self.state.position();

        let block = &mut self.block;
        let state = &*self.state;
        let settings = self.settings;
        #[cfg(test)]
        let inject_panic = std::mem::take(&mut self.panic_next_block);
        #[cfg(not(test))]
        let inject_panic = false;

        let mixed = catch_unwind(AssertUnwindSafe(|| {
            if inject_panic {
                panic!("injected mixing fault");
            }
            mix_block(block, set, pos, state, settings)
        }));

        match mixed {
            Ok(true) => self.state.mark_clipped(),
            Ok(false) => {}
            Err(_) => {
                self.block.fill(StereoSample::silence());
                self.state.record_fault();
            }
        }

        let mut next = pos + n_frames as u64;
        if next >= frame_count {
            next = 0;
        }
        // A failed exchange means a seek landed during this block; keep it
        self.state.advance_position(pos, next);

        // `stems` drops here; if it was the last reference the set is
        // handed to the collector thread instead of being freed
        &self.block
    }

    /// Fill an interleaved device buffer with `channels` channels
    ///
    /// Left/right go to the first two channels, extra channels get silence.
    /// Buffers longer than `MAX_BUFFER_SIZE` frames are rendered in chunks.
    pub fn fill_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        for chunk in data.chunks_mut(MAX_BUFFER_SIZE * channels) {
            let n_frames = chunk.len() / channels;
            let samples = self.process(n_frames);

            for (frame, sample) in chunk.chunks_exact_mut(channels).zip(samples) {
                frame[0] = sample.left;
                if channels > 1 {
                    frame[1] = sample.right;
                }
                for ch in frame.iter_mut().skip(2) {
                    *ch = 0.0;
                }
            }
        }
    }
}

/// Steps 4-6: sum audible stems, master gain, clamp
///
/// Returns whether the clamp changed any sample. Stems of a `StemSet` are
/// padded to its frame count, so the slices below are always in range.
fn mix_block(
    block: &mut [StereoSample],
    set: &StemSet,
    pos: u64,
    state: &PlaybackState,
    settings: MixerSettings,
) -> bool {
    let frame_count = set.frame_count();
    let n_frames = block.len();

    if pos < frame_count as u64 {
        let pos = pos as usize;
        let to_copy = n_frames.min(frame_count - pos);

        for (stem, buffer) in set.present() {
            let volume = state.volume(stem);
            if volume <= settings.volume_epsilon {
                continue;
            }

            let source = &buffer.as_slice()[pos..pos + to_copy];
            for (out, &sample) in block.iter_mut().zip(source) {
                *out += sample * volume;
            }
        }
    }

    let master = state.master_volume();
    let mut clipped = false;
    for sample in block.iter_mut() {
        *sample *= master;
        clipped |= sample.clamp_to(settings.ceiling);
    }

    clipped
}
