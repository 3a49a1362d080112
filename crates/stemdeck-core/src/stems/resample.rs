//! Sample rate conversion using rubato

use rubato::{FftFixedIn, Resampler};

use crate::types::StereoBuffer;

/// Input frames per resampler call
const CHUNK_SIZE: usize = 1024;

/// FFT sub-chunks (balance between quality and speed)
const SUB_CHUNKS: usize = 2;

/// Resample a stereo buffer from `from_rate` to `to_rate`
///
/// The resampler's output delay is removed, so the result lines up with the
/// input and holds `round(len * to_rate / from_rate)` frames.
pub fn resample_stereo(input: &StereoBuffer, from_rate: u32, to_rate: u32) -> Result<StereoBuffer, String> {
    if from_rate == to_rate || input.is_empty() {
        return Ok(input.clone());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(format!("invalid sample rates {} -> {}", from_rate, to_rate));
    }

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, SUB_CHUNKS, 2)
            .map_err(|e| e.to_string())?;

    let (left, right) = input.to_channels();
    let input_frames = input.len();
    let expected = (input_frames as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let delay = resampler.output_delay();
    let wanted = delay + expected;

    let mut out_left = Vec::with_capacity(wanted + CHUNK_SIZE * 2);
    let mut out_right = Vec::with_capacity(wanted + CHUNK_SIZE * 2);
    let mut chunk = vec![Vec::with_capacity(CHUNK_SIZE); 2];
    let mut pos = 0usize;

    while out_left.len() < wanted {
        let needed = resampler.input_frames_next();
        let start = pos.min(input_frames);
        let available = (input_frames - start).min(needed);

        for (channel, source) in chunk.iter_mut().zip([&left, &right]) {
            channel.clear();
            channel.extend_from_slice(&source[start..start + available]);
            // zero-pad past the end of the input to flush the filter
            channel.resize(needed, 0.0);
        }
        pos += needed;

        let output = resampler.process(&chunk, None).map_err(|e| e.to_string())?;
        out_left.extend_from_slice(&output[0]);
        out_right.extend_from_slice(&output[1]);
    }

    let range = delay..wanted;
    Ok(StereoBuffer::from_channels(&out_left[range.clone()], &out_right[range]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;

    fn sine(len: usize, freq: f32, rate: u32) -> StereoBuffer {
        StereoBuffer::from_vec(
            (0..len)
                .map(|i| StereoSample::mono((2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin() * 0.5))
                .collect(),
        )
    }

    #[test]
    fn test_same_rate_is_passthrough() {
        let input = sine(1000, 440.0, 44100);
        assert_eq!(resample_stereo(&input, 44100, 44100).unwrap(), input);
    }

    #[test]
    fn test_downsample_length() {
        let input = sine(48000, 440.0, 48000);
        let output = resample_stereo(&input, 48000, 44100).unwrap();
        assert_eq!(output.len(), 44100);
        // Energy is preserved for an in-band tone
        assert!(output.peak() > 0.4 && output.peak() < 0.6);
    }

    #[test]
    fn test_upsample_short_input() {
        let input = sine(100, 440.0, 22050);
        let output = resample_stereo(&input, 22050, 44100).unwrap();
        assert_eq!(output.len(), 200);
    }
}
