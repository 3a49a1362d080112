//! Common types for Stemdeck
//!
//! Fundamental audio types shared by the loader, the effects processor and the
//! real-time mixer: stem identifiers, stereo samples and stereo buffers.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Engine sample rate (44.1kHz). Stems are resampled to this rate on load.
pub const SAMPLE_RATE: u32 = 44100;

/// Number of stems per song (Vocals, Drums, Bass, Other)
pub const NUM_STEMS: usize = 4;

/// Audio sample type (32-bit float for processing and output)
pub type Sample = f32;

/// Stem identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Stem {
    Vocals = 0,
    Drums = 1,
    Bass = 2,
    Other = 3,
}

impl Stem {
    /// Get all stems in order
    pub const ALL: [Stem; NUM_STEMS] = [Stem::Vocals, Stem::Drums, Stem::Bass, Stem::Other];

    /// Index into per-stem arrays
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name as used by the separator for stem files (`vocals.wav`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Stem::Vocals => "vocals",
            Stem::Drums => "drums",
            Stem::Bass => "bass",
            Stem::Other => "other",
        }
    }

    /// File name of this stem inside a separated song folder
    pub fn file_name(&self) -> String {
        format!("{}.wav", self.name())
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown stem name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown stem '{0}' (expected vocals, drums, bass or other)")]
pub struct UnknownStem(pub String);

impl FromStr for Stem {
    type Err = UnknownStem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stem::ALL
            .into_iter()
            .find(|stem| stem.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStem(s.to_string()))
    }
}

/// A single stereo sample (left and right channels)
///
/// Uses `#[repr(C)]` to ensure predictable memory layout: [left, right].
/// This enables zero-copy conversion between `&[StereoSample]` and `&[f32]`
/// (interleaved format) using bytemuck, which is what the stretcher consumes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo sample
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent stereo sample
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono sample (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Clamp both channels into `[-ceiling, ceiling]`
    ///
    /// `ceiling` must be finite and non-negative. NaN or infinite channels
    /// become silence. Returns true if either channel was changed.
    #[inline]
    pub fn clamp_to(&mut self, ceiling: Sample) -> bool {
        let left = clamp_channel(&mut self.left, ceiling);
        let right = clamp_channel(&mut self.right, ceiling);
        left | right
    }

    /// Get the peak amplitude (max of abs(left), abs(right))
    #[inline]
    pub fn peak(&self) -> Sample {
        self.left.abs().max(self.right.abs())
    }
}

#[inline]
fn clamp_channel(value: &mut Sample, ceiling: Sample) -> bool {
    if !value.is_finite() {
        *value = 0.0;
        true
    } else if value.abs() > ceiling {
        *value = value.clamp(-ceiling, ceiling);
        true
    } else {
        false
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

impl std::ops::MulAssign<Sample> for StereoSample {
    #[inline]
    fn mul_assign(&mut self, factor: Sample) {
        self.left *= factor;
        self.right *= factor;
    }
}

/// A buffer of stereo samples
///
/// The primary audio buffer type: stem audio, mix blocks and stretcher
/// workspaces are all `StereoBuffer`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    samples: Vec<StereoSample>,
}

impl StereoBuffer {
    /// Create a new buffer with the specified capacity (in stereo samples)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer from interleaved samples with any channel count
    ///
    /// Mono is duplicated to both channels; channels beyond the second are
    /// dropped. A trailing partial frame is ignored.
    pub fn from_interleaved(interleaved: &[Sample], channels: usize) -> Self {
        let samples = match channels {
            0 => Vec::new(),
            1 => interleaved.iter().map(|&s| StereoSample::mono(s)).collect(),
            n => interleaved
                .chunks_exact(n)
                .map(|frame| StereoSample::new(frame[0], frame[1]))
                .collect(),
        };
        Self { samples }
    }

    /// Create a buffer from separate left and right channel slices
    pub fn from_channels(left: &[Sample], right: &[Sample]) -> Self {
        assert_eq!(left.len(), right.len(), "Channel lengths must match");
        let samples = left
            .iter()
            .zip(right.iter())
            .map(|(&l, &r)| StereoSample::new(l, r))
            .collect();
        Self { samples }
    }

    /// Create a buffer from an existing Vec of StereoSamples
    pub fn from_vec(samples: Vec<StereoSample>) -> Self {
        Self { samples }
    }

    /// Get the number of stereo samples in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Current capacity in stereo samples
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Resize the buffer, filling with silence if growing
    pub fn resize(&mut self, new_len: usize) {
        self.samples.resize(new_len, StereoSample::silence());
    }

    /// Set the working length of a pre-allocated buffer (real-time safe)
    ///
    /// Must not exceed capacity. Fills any newly exposed elements with silence.
    #[inline]
    pub fn set_len_from_capacity(&mut self, new_len: usize) {
        let current_len = self.samples.len();
        if new_len > current_len {
            debug_assert!(
                new_len <= self.samples.capacity(),
                "set_len_from_capacity called with len > capacity"
            );
            self.samples.resize(new_len, StereoSample::silence());
        } else {
            self.samples.truncate(new_len);
        }
    }

    /// Fill the buffer with silence
    pub fn fill_silence(&mut self) {
        self.samples.fill(StereoSample::silence());
    }

    /// Get a slice of the samples
    #[inline]
    pub fn as_slice(&self) -> &[StereoSample] {
        &self.samples
    }

    /// Get a mutable slice of the samples
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [StereoSample] {
        &mut self.samples
    }

    /// Get a zero-copy view of samples as interleaved f32 [L, R, L, R, ...]
    #[inline]
    pub fn as_interleaved(&self) -> &[Sample] {
        bytemuck::cast_slice(&self.samples)
    }

    /// Get a zero-copy mutable view of samples as interleaved f32 [L, R, L, R, ...]
    #[inline]
    pub fn as_interleaved_mut(&mut self) -> &mut [Sample] {
        bytemuck::cast_slice_mut(&mut self.samples)
    }

    /// Split into separate left and right channel vectors
    pub fn to_channels(&self) -> (Vec<Sample>, Vec<Sample>) {
        self.samples.iter().map(|s| (s.left, s.right)).unzip()
    }

    /// Get an iterator over the samples
    pub fn iter(&self) -> impl Iterator<Item = &StereoSample> {
        self.samples.iter()
    }

    /// Get a mutable iterator over the samples
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut StereoSample> {
        self.samples.iter_mut()
    }

    /// Get the peak amplitude in the buffer
    pub fn peak(&self) -> Sample {
        self.samples.iter().map(|s| s.peak()).fold(0.0, Sample::max)
    }
}

impl Index<usize> for StereoBuffer {
    type Output = StereoSample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl IndexMut<usize> for StereoBuffer {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.samples[index]
    }
}

/// Transport state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_sample_operations() {
        let a = StereoSample::new(1.0, 2.0);
        let b = StereoSample::new(0.5, 0.5);

        let sum = a + b;
        assert_eq!(sum.left, 1.5);
        assert_eq!(sum.right, 2.5);

        let scaled = a * 0.5;
        assert_eq!(scaled.left, 0.5);
        assert_eq!(scaled.right, 1.0);
    }

    #[test]
    fn test_clamp_reports_clipping() {
        let mut loud = StereoSample::new(2.25, -0.1);
        assert!(loud.clamp_to(0.95));
        assert_eq!(loud, StereoSample::new(0.95, -0.1));

        let mut quiet = StereoSample::new(0.5, -0.5);
        assert!(!quiet.clamp_to(0.95));
    }

    #[test]
    fn test_clamp_silences_non_finite() {
        let mut broken = StereoSample::new(f32::NAN, 0.25);
        assert!(broken.clamp_to(0.95));
        assert_eq!(broken, StereoSample::new(0.0, 0.25));

        let mut blown = StereoSample::new(f32::NEG_INFINITY, f32::INFINITY);
        assert!(blown.clamp_to(0.95));
        assert_eq!(blown, StereoSample::silence());
    }

    #[test]
    fn test_from_interleaved_stereo() {
        let buffer = StereoBuffer::from_interleaved(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2);

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer[0], StereoSample::new(1.0, 2.0));
        assert_eq!(buffer[2], StereoSample::new(5.0, 6.0));
    }

    #[test]
    fn test_from_interleaved_mono_and_surround() {
        let mono = StereoBuffer::from_interleaved(&[0.25, -0.5], 1);
        assert_eq!(mono.as_slice(), &[StereoSample::mono(0.25), StereoSample::mono(-0.5)]);

        // 3 channels: keep the first two, drop the trailing partial frame
        let surround = StereoBuffer::from_interleaved(&[1.0, 2.0, 9.0, 3.0, 4.0, 9.0, 5.0], 3);
        assert_eq!(surround.as_slice(), &[StereoSample::new(1.0, 2.0), StereoSample::new(3.0, 4.0)]);
    }

    #[test]
    fn test_interleaved_view_is_zero_copy_layout() {
        let buffer = StereoBuffer::from_channels(&[1.0, 3.0], &[2.0, 4.0]);
        assert_eq!(buffer.as_interleaved(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_stem_names_round_trip() {
        assert_eq!(Stem::ALL.len(), NUM_STEMS);
        for stem in Stem::ALL {
            assert_eq!(stem.name().parse::<Stem>(), Ok(stem));
            assert_eq!(Stem::ALL[stem.index()], stem);
        }
        assert_eq!("Drums".parse::<Stem>(), Ok(Stem::Drums));
        assert!("guitar".parse::<Stem>().is_err());
        assert_eq!(Stem::Bass.file_name(), "bass.wav");
    }
}
