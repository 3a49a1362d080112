//! Time-stretching and pitch shifting via signalsmith-stretch
//!
//! Whole-buffer transforms run offline: the input is fed through the
//! stretcher in fixed output chunks and the stretcher latency is trimmed from
//! the front so the result lines up with the source.

use serde::{Deserialize, Serialize};
use signalsmith_stretch::Stretch;

use super::error::DspError;
use super::processor::StemDsp;
use crate::types::{StereoBuffer, StereoSample};

/// Number of channels (stereo)
const CHANNELS: u32 = 2;

/// Output frames produced per stretcher call
const OUTPUT_CHUNK_SIZE: usize = 256;

/// Stretcher quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StretchQuality {
    /// signalsmith's default preset
    #[default]
    Default,
    /// 30-50% faster, slightly lower quality
    Cheaper,
}

/// Thin wrapper around one signalsmith stretcher
///
/// The stretch ratio is implied by the buffer sizes handed to `process`:
/// more input than output speeds up, less slows down.
pub struct TimeStretcher {
    stretcher: Stretch,
}

impl TimeStretcher {
    pub fn new(sample_rate: u32, quality: StretchQuality) -> Self {
        let stretcher = match quality {
            StretchQuality::Default => Stretch::preset_default(CHANNELS, sample_rate),
            StretchQuality::Cheaper => Stretch::preset_cheaper(CHANNELS, sample_rate),
        };
        Self { stretcher }
    }

    /// Transpose by `semitones` (positive = up)
    pub fn set_pitch_semitones(&mut self, semitones: f32) {
        self.stretcher.set_transpose_factor_semitones(semitones, None);
    }

    /// Input latency in samples
    pub fn input_latency(&self) -> usize {
        self.stretcher.input_latency()
    }

    /// Output latency in samples
    pub fn output_latency(&self) -> usize {
        self.stretcher.output_latency()
    }

    /// Stretch `input` into exactly `output.len()` frames
    ///
    /// Both buffers are viewed as interleaved f32 without copying.
    pub fn process(&mut self, input: &StereoBuffer, output: &mut StereoBuffer) {
        let output_interleaved = output.as_interleaved_mut();
        output_interleaved.fill(0.0);
        self.stretcher.process(input.as_interleaved(), output_interleaved);
    }

    /// Stretch a whole buffer offline
    ///
    /// `ratio` is input frames per output frame. The result has exactly
    /// `ceil(len / ratio)` frames, aligned with the source.
    pub fn stretch_buffer(&mut self, source: &StereoBuffer, ratio: f64) -> StereoBuffer {
        if source.is_empty() {
            return StereoBuffer::default();
        }

        let total_output_len = (source.len() as f64 / ratio).ceil() as usize;
        let latency = (self.input_latency() as f64 / ratio).round() as usize + self.output_latency();
        let wanted = latency + total_output_len;

        let mut output: Vec<StereoSample> = Vec::with_capacity(wanted);

        // Workspaces sized once; chunks only move the working length
        let max_input_chunk = ((OUTPUT_CHUNK_SIZE as f64) * ratio).ceil() as usize + 1;
        let mut input_workspace = StereoBuffer::with_capacity(max_input_chunk);
        let mut output_workspace = StereoBuffer::with_capacity(OUTPUT_CHUNK_SIZE);

        let source_slice = source.as_slice();
        let mut input_pos = 0usize;
        let mut fractional_input = 0.0f64;

        while output.len() < wanted {
            let output_chunk_len = OUTPUT_CHUNK_SIZE.min(wanted - output.len());

            fractional_input += output_chunk_len as f64 * ratio;
            let input_chunk_len = fractional_input.floor() as usize;
            fractional_input -= input_chunk_len as f64;

            // Past the end of the source the stretcher is fed silence
            input_workspace.set_len_from_capacity(input_chunk_len);
            input_workspace.fill_silence();
            let start = input_pos.min(source.len());
            let end = (input_pos + input_chunk_len).min(source.len());
            input_workspace.as_mut_slice()[..end - start].copy_from_slice(&source_slice[start..end]);
            input_pos += input_chunk_len;

            output_workspace.set_len_from_capacity(output_chunk_len);
            self.process(&input_workspace, &mut output_workspace);

            output.extend_from_slice(output_workspace.as_slice());
        }

        output.drain(..latency);
        StereoBuffer::from_vec(output)
    }
}

/// Default DSP collaborator backed by signalsmith-stretch
///
/// A fresh stretcher is built per call so stems can be processed in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalsmithDsp {
    quality: StretchQuality,
}

impl SignalsmithDsp {
    pub fn new(quality: StretchQuality) -> Self {
        Self { quality }
    }
}

impl StemDsp for SignalsmithDsp {
    fn pitch_shift(&self, input: &StereoBuffer, sample_rate: u32, semitones: i32) -> Result<StereoBuffer, DspError> {
        if semitones == 0 {
            return Ok(input.clone());
        }
        let mut stretcher = TimeStretcher::new(sample_rate, self.quality);
        stretcher.set_pitch_semitones(semitones as f32);
        Ok(stretcher.stretch_buffer(input, 1.0))
    }

    fn time_stretch(&self, input: &StereoBuffer, sample_rate: u32, speed_ratio: f64) -> Result<StereoBuffer, DspError> {
        if !speed_ratio.is_finite() || speed_ratio <= 0.0 {
            return Err(DspError(format!("invalid speed ratio {}", speed_ratio)));
        }
        if speed_ratio == 1.0 {
            return Ok(input.clone());
        }
        let mut stretcher = TimeStretcher::new(sample_rate, self.quality);
        Ok(stretcher.stretch_buffer(input, speed_ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, freq: f32) -> StereoBuffer {
        StereoBuffer::from_vec(
            (0..len)
                .map(|i| StereoSample::mono((2.0 * std::f32::consts::PI * freq * i as f32 / 44100.0).sin() * 0.5))
                .collect(),
        )
    }

    /// Count positive-going zero crossings of the left channel
    fn zero_crossings(buffer: &StereoBuffer) -> usize {
        buffer
            .as_slice()
            .windows(2)
            .filter(|w| w[0].left <= 0.0 && w[1].left > 0.0)
            .count()
    }

    #[test]
    fn test_stretcher_has_latency() {
        let stretcher = TimeStretcher::new(44100, StretchQuality::Default);
        assert!(stretcher.input_latency() > 0);
        assert!(stretcher.output_latency() > 0);
    }

    #[test]
    fn test_double_speed_halves_length() {
        let input = sine(44100, 440.0);
        let output = SignalsmithDsp::default().time_stretch(&input, 44100, 2.0).unwrap();
        assert_eq!(output.len(), 22050);
    }

    #[test]
    fn test_half_speed_doubles_length() {
        let input = sine(10000, 440.0);
        let output = SignalsmithDsp::new(StretchQuality::Cheaper)
            .time_stretch(&input, 44100, 0.5)
            .unwrap();
        assert_eq!(output.len(), 20000);
    }

    #[test]
    fn test_pitch_shift_keeps_length_and_raises_frequency() {
        let input = sine(44100, 220.0);
        let output = SignalsmithDsp::default().pitch_shift(&input, 44100, 12).unwrap();
        assert_eq!(output.len(), input.len());

        // One octave up roughly doubles the crossings in the steady middle part
        let middle = |b: &StereoBuffer| StereoBuffer::from_vec(b.as_slice()[11025..33075].to_vec());
        let ratio = zero_crossings(&middle(&output)) as f64 / zero_crossings(&middle(&input)) as f64;
        assert!((1.8..2.2).contains(&ratio), "crossing ratio {ratio}");
    }

    #[test]
    fn test_identity_is_passthrough() {
        let input = sine(1000, 440.0);
        let dsp = SignalsmithDsp::default();
        assert_eq!(dsp.pitch_shift(&input, 44100, 0).unwrap(), input);
        assert_eq!(dsp.time_stretch(&input, 44100, 1.0).unwrap(), input);
        assert!(dsp.time_stretch(&input, 44100, 0.0).is_err());
    }
}
