//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stemdeck_core::audio::ManualBackend;
use stemdeck_core::effects::{DspError, OfflineEffectsProcessor, StemDsp};
use stemdeck_core::engine::{MixerSettings, StemEngine};
use stemdeck_core::stems::{SeparatedDirSource, StemLoader};
use stemdeck_core::types::{Stem, StereoBuffer};

pub const RATE: u32 = 44100;

/// Folder of separated stems plus a fake song path pointing at it
pub struct Fixture {
    pub root: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    /// Write `<root>/<song>/<stem>.wav` with a constant stereo value
    pub fn write_stem(&self, song: &str, stem: Stem, frames: usize, value: f32) -> PathBuf {
        self.write_stem_with(song, stem, frames, RATE, |_| value)
    }

    /// Write a stem whose sample at frame `i` is `f(i)` on both channels
    pub fn write_stem_with(
        &self,
        song: &str,
        stem: Stem,
        frames: usize,
        rate: u32,
        f: impl Fn(usize) -> f32,
    ) -> PathBuf {
        let dir = self.root.path().join(song);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(stem.file_name());

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            let v = f(i);
            writer.write_sample(v).unwrap();
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    pub fn song_path(&self, song: &str) -> PathBuf {
        Path::new("/music").join(format!("{song}.mp3"))
    }

    pub fn loader(&self) -> StemLoader {
        StemLoader::new(Arc::new(SeparatedDirSource::new(self.root.path())), RATE)
    }

    /// Engine on a manual backend with a deterministic DSP
    pub fn engine(&self) -> (StemEngine, ManualBackend) {
        self.engine_with_dsp(Arc::new(NearestNeighbourDsp))
    }

    pub fn engine_with_dsp(&self, dsp: Arc<dyn StemDsp>) -> (StemEngine, ManualBackend) {
        let backend = ManualBackend::new();
        let engine = StemEngine::from_parts(
            self.loader(),
            OfflineEffectsProcessor::new(dsp),
            Box::new(backend.clone()),
            MixerSettings::default(),
        );
        (engine, backend)
    }
}

/// Exact, predictable stand-in for the phase vocoder
///
/// Stretching picks the nearest source frame; pitch shifting leaves the
/// audio untouched.
pub struct NearestNeighbourDsp;

impl StemDsp for NearestNeighbourDsp {
    fn pitch_shift(&self, input: &StereoBuffer, _: u32, _: i32) -> Result<StereoBuffer, DspError> {
        Ok(input.clone())
    }

    fn time_stretch(&self, input: &StereoBuffer, _: u32, speed_ratio: f64) -> Result<StereoBuffer, DspError> {
        let len = (input.len() as f64 / speed_ratio).ceil() as usize;
        let last = input.len().saturating_sub(1);
        Ok(StereoBuffer::from_vec(
            (0..len)
                .map(|i| input[((i as f64 * speed_ratio) as usize).min(last)])
                .collect(),
        ))
    }
}

/// DSP that brings down whichever thread runs it
pub struct CrashingDsp;

impl StemDsp for CrashingDsp {
    fn pitch_shift(&self, _: &StereoBuffer, _: u32, _: i32) -> Result<StereoBuffer, DspError> {
        panic!("dsp crashed");
    }

    fn time_stretch(&self, _: &StereoBuffer, _: u32, _: f64) -> Result<StereoBuffer, DspError> {
        panic!("dsp crashed");
    }
}

/// Largest absolute sample in a block
pub fn peak(block: &[stemdeck_core::types::StereoSample]) -> f32 {
    block.iter().map(|s| s.peak()).fold(0.0, f32::max)
}
