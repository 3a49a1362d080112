//! Helpers shared by the player tests: songs on disk and engines without a
//! sound card

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stemdeck_core::audio::ManualBackend;
use stemdeck_core::effects::{DspError, OfflineEffectsProcessor, StemDsp};
use stemdeck_core::engine::MixerSettings;
use stemdeck_core::stems::{SeparatedDirSource, StemLoader};
use stemdeck_core::types::StereoBuffer;
use stemdeck_core::StemEngine;

pub const RATE: u32 = 44100;

/// Repeats/drops frames; no pitch change
pub struct NearestDsp;

impl StemDsp for NearestDsp {
    fn pitch_shift(&self, input: &StereoBuffer, _: u32, _: i32) -> Result<StereoBuffer, DspError> {
        Ok(input.clone())
    }

    fn time_stretch(&self, input: &StereoBuffer, _: u32, speed_ratio: f64) -> Result<StereoBuffer, DspError> {
        let len = (input.len() as f64 / speed_ratio).ceil() as usize;
        let frames = (0..len)
            .map(|i| input[((i as f64 * speed_ratio) as usize).min(input.len() - 1)])
            .collect();
        Ok(StereoBuffer::from_vec(frames))
    }
}

/// Writes `<root>/<song>/vocals.wav` at a constant 0.25 and returns a song
/// path that resolves to it
pub fn write_song(root: &Path, song: &str, frames: usize) -> PathBuf {
    let dir = root.join(song);
    std::fs::create_dir_all(&dir).unwrap();
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(dir.join("vocals.wav"), spec).unwrap();
    for _ in 0..frames * 2 {
        writer.write_sample(0.25f32).unwrap();
    }
    writer.finalize().unwrap();
    PathBuf::from(format!("/music/{song}.flac"))
}

/// Engine reading stems from `root`, rendering into the returned backend
pub fn engine(root: &Path) -> (StemEngine, ManualBackend) {
    let backend = ManualBackend::new();
    let engine = StemEngine::from_parts(
        StemLoader::new(Arc::new(SeparatedDirSource::new(root)), RATE),
        OfflineEffectsProcessor::new(Arc::new(NearestDsp)),
        Box::new(backend.clone()),
        MixerSettings::default(),
    );
    (engine, backend)
}
