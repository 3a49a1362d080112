//! Loaded per-stem audio with a common length
//!
//! A `StemSet` is immutable once built. The effects processor produces a new
//! set instead of mutating one, and the engine swaps whole sets.

use crate::types::{Stem, StereoBuffer, NUM_STEMS};

/// How a stem set came to be
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Provenance {
    /// Decoded straight from the stem files
    #[default]
    Original,
    /// Produced by the offline effects processor
    Transformed { speed_ratio: f64, pitch_semitones: i32 },
}

/// Per-stem buffers sharing one sample rate and one frame count
///
/// Every present stem holds exactly `frame_count` stereo frames.
#[derive(Debug, Clone)]
pub struct StemSet {
    stems: [Option<StereoBuffer>; NUM_STEMS],
    sample_rate: u32,
    frame_count: usize,
    provenance: Provenance,
}

impl StemSet {
    /// Build a set, zero-padding every stem at its tail to the longest one
    ///
    /// Returns None when no stem is present or every stem is empty.
    pub fn from_buffers(
        mut stems: [Option<StereoBuffer>; NUM_STEMS],
        sample_rate: u32,
        provenance: Provenance,
    ) -> Option<Self> {
        let frame_count = stems.iter().flatten().map(StereoBuffer::len).max()?;
        if frame_count == 0 {
            return None;
        }

        for buffer in stems.iter_mut().flatten() {
            if buffer.len() < frame_count {
                buffer.resize(frame_count);
            }
        }

        Some(Self {
            stems,
            sample_rate,
            frame_count,
            provenance,
        })
    }

    /// Audio of one stem, if present
    #[inline]
    pub fn stem(&self, stem: Stem) -> Option<&StereoBuffer> {
        self.stems[stem.index()].as_ref()
    }

    pub fn has_stem(&self, stem: Stem) -> bool {
        self.stems[stem.index()].is_some()
    }

    /// Present stems in fixed order
    pub fn present(&self) -> impl Iterator<Item = (Stem, &StereoBuffer)> {
        Stem::ALL
            .into_iter()
            .filter_map(move |stem| self.stem(stem).map(|buffer| (stem, buffer)))
    }

    /// Identifiers of the present stems
    pub fn present_stems(&self) -> Vec<Stem> {
        self.present().map(|(stem, _)| stem).collect()
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate as f64
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Borrow all stem slots, absent ones included
    pub fn slots(&self) -> &[Option<StereoBuffer>; NUM_STEMS] {
        &self.stems
    }
}
