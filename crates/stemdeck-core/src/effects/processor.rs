//! Offline speed/pitch transform of a whole stem set

use std::sync::Arc;

use rayon::prelude::*;

use super::error::{DspError, EffectsError, EffectsResult};
use super::timestretch::SignalsmithDsp;
use super::EffectParams;
use crate::stems::{Provenance, StemSet};
use crate::types::{Stem, StereoBuffer, NUM_STEMS};

/// Numeric pitch/tempo transform of one stereo buffer
///
/// Implementations must not change the channel layout. `time_stretch` with
/// `speed_ratio` r yields roughly `len / r` frames; `pitch_shift` keeps the
/// length.
pub trait StemDsp: Send + Sync {
    fn pitch_shift(&self, input: &StereoBuffer, sample_rate: u32, semitones: i32) -> Result<StereoBuffer, DspError>;

    fn time_stretch(&self, input: &StereoBuffer, sample_rate: u32, speed_ratio: f64) -> Result<StereoBuffer, DspError>;
}

/// Applies speed and pitch to every stem of a set
///
/// Always works from the set it is given; the engine hands it the original
/// stems so effects never stack.
#[derive(Clone)]
pub struct OfflineEffectsProcessor {
    dsp: Arc<dyn StemDsp>,
}

impl OfflineEffectsProcessor {
    pub fn new(dsp: Arc<dyn StemDsp>) -> Self {
        Self { dsp }
    }

    /// Transform `original` into a new set
    ///
    /// Identity parameters hand back the same set without any DSP work.
    pub fn transform(&self, original: &Arc<StemSet>, params: EffectParams) -> EffectsResult<Arc<StemSet>> {
        params.validate()?;
        if params.is_identity() {
            return Ok(Arc::clone(original));
        }

        let sample_rate = original.sample_rate();
        log::info!(
            "Applying effects: speed {:.2}x, pitch {:+} semitones ({} frames)",
            params.speed_ratio,
            params.pitch_semitones,
            original.frame_count()
        );

        let results: Vec<EffectsResult<Option<StereoBuffer>>> = original
            .slots()
            .par_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.as_ref()
                    .map(|buffer| self.process_stem(Stem::ALL[idx], buffer, sample_rate, params))
                    .transpose()
            })
            .collect();

        let mut stems: [Option<StereoBuffer>; NUM_STEMS] = Default::default();
        for (slot, result) in stems.iter_mut().zip(results) {
            *slot = result?;
        }

        let provenance = Provenance::Transformed {
            speed_ratio: params.speed_ratio,
            pitch_semitones: params.pitch_semitones,
        };
        let transformed = StemSet::from_buffers(stems, sample_rate, provenance).ok_or(EffectsError::EmptyOutput)?;

        log::info!(
            "Effects applied: {} -> {} frames",
            original.frame_count(),
            transformed.frame_count()
        );
        Ok(Arc::new(transformed))
    }

    /// Pitch first, then tempo
    fn process_stem(
        &self,
        stem: Stem,
        input: &StereoBuffer,
        sample_rate: u32,
        params: EffectParams,
    ) -> EffectsResult<StereoBuffer> {
        let dsp_error = |e: DspError| EffectsError::Dsp {
            stem,
            reason: e.0,
        };

        let shifted = if params.pitch_semitones != 0 {
            Some(self.dsp.pitch_shift(input, sample_rate, params.pitch_semitones).map_err(dsp_error)?)
        } else {
            None
        };
        let pitched = shifted.as_ref().unwrap_or(input);

        if params.speed_ratio != 1.0 {
            self.dsp.time_stretch(pitched, sample_rate, params.speed_ratio).map_err(dsp_error)
        } else {
            Ok(pitched.clone())
        }
    }
}

impl Default for OfflineEffectsProcessor {
    fn default() -> Self {
        Self::new(Arc::new(SignalsmithDsp::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;
    use std::sync::Mutex;

    /// Records every call; pitch marks its output by adding 1.0 and the
    /// stretch drops or repeats frames
    #[derive(Default)]
    struct RecordingDsp {
        calls: Mutex<Vec<(&'static str, f32, usize)>>,
    }

    impl StemDsp for RecordingDsp {
        fn pitch_shift(&self, input: &StereoBuffer, _: u32, _: i32) -> Result<StereoBuffer, DspError> {
            self.calls.lock().unwrap().push(("pitch", input[0].left, input.len()));
            Ok(StereoBuffer::from_vec(
                input.iter().map(|s| *s + StereoSample::mono(1.0)).collect(),
            ))
        }

        fn time_stretch(&self, input: &StereoBuffer, _: u32, speed_ratio: f64) -> Result<StereoBuffer, DspError> {
            self.calls.lock().unwrap().push(("stretch", input[0].left, input.len()));
            let len = (input.len() as f64 / speed_ratio).ceil() as usize;
            Ok(StereoBuffer::from_vec(
                (0..len).map(|i| input[((i as f64 * speed_ratio) as usize).min(input.len() - 1)]).collect(),
            ))
        }
    }

    struct FailingDsp;

    impl StemDsp for FailingDsp {
        fn pitch_shift(&self, _: &StereoBuffer, _: u32, _: i32) -> Result<StereoBuffer, DspError> {
            Err(DspError("boom".to_string()))
        }

        fn time_stretch(&self, _: &StereoBuffer, _: u32, _: f64) -> Result<StereoBuffer, DspError> {
            Err(DspError("boom".to_string()))
        }
    }

    /// Vocals at 0.125, bass at 0.25, drums and other missing
    fn set(len: usize) -> Arc<StemSet> {
        let vocals = StereoBuffer::from_vec(vec![StereoSample::mono(0.125); len]);
        let bass = StereoBuffer::from_vec(vec![StereoSample::mono(0.25); len]);
        Arc::new(StemSet::from_buffers([Some(vocals), None, Some(bass), None], 44100, Provenance::Original).unwrap())
    }

    #[test]
    fn test_identity_returns_same_set() {
        let dsp = Arc::new(RecordingDsp::default());
        let processor = OfflineEffectsProcessor::new(dsp.clone());
        let original = set(1000);

        let result = processor.transform(&original, EffectParams::default()).unwrap();
        assert!(Arc::ptr_eq(&original, &result));
        assert!(dsp.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pitch_runs_before_stretch() {
        let dsp = Arc::new(RecordingDsp::default());
        let processor = OfflineEffectsProcessor::new(dsp.clone());

        let result = processor.transform(&set(1000), EffectParams::new(2.0, 3)).unwrap();
        assert_eq!(result.frame_count(), 500);
        assert_eq!(
            result.provenance(),
            Provenance::Transformed {
                speed_ratio: 2.0,
                pitch_semitones: 3
            }
        );
        assert!(!result.has_stem(Stem::Drums));

        let calls = dsp.calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        for value in [0.125f32, 0.25] {
            // Each stem is pitched at full length, then its pitched output is stretched
            let pitch = calls.iter().position(|c| *c == ("pitch", value, 1000)).unwrap();
            let stretch = calls.iter().position(|c| *c == ("stretch", value + 1.0, 1000)).unwrap();
            assert!(pitch < stretch);
        }
        assert_eq!(result.stem(Stem::Vocals).unwrap()[0].left, 1.125);
        assert_eq!(result.stem(Stem::Bass).unwrap()[0].left, 1.25);
    }

    #[test]
    fn test_invalid_speed_is_rejected() {
        let processor = OfflineEffectsProcessor::new(Arc::new(RecordingDsp::default()));
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = processor.transform(&set(10), EffectParams::new(speed, 0)).unwrap_err();
            assert!(matches!(err, EffectsError::InvalidSpeed(_)));
        }
    }

    #[test]
    fn test_dsp_failure_names_the_stem() {
        let processor = OfflineEffectsProcessor::new(Arc::new(FailingDsp));
        let err = processor.transform(&set(10), EffectParams::new(1.0, 2)).unwrap_err();
        assert!(matches!(err, EffectsError::Dsp { .. }));
    }
}
