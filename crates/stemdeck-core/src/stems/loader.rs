//! Stem loading: locate, decode, resample, pad
//!
//! Stems are decoded in parallel. A stem that fails to decode or is empty is
//! skipped with a warning; loading only fails when no stem could be used.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use super::decode::decode_file;
use super::error::{LoadError, LoadResult, SkippedStem};
use super::resample::resample_stereo;
use super::source::{SeparatedDirSource, StemSource, StemSourceConfig};
use super::stem_set::{Provenance, StemSet};
use crate::types::{Stem, StereoBuffer, NUM_STEMS};

/// Result of a successful load
#[derive(Debug)]
pub struct LoadedStems {
    /// File base name of the song
    pub song_id: String,
    /// Folder the stems were read from
    pub dir: PathBuf,
    /// Padded stems at the engine rate
    pub stems: StemSet,
    /// Stem files that were present but unusable
    pub skipped: Vec<SkippedStem>,
}

/// Reads the stems of a song into a `StemSet`
#[derive(Clone)]
pub struct StemLoader {
    source: Arc<dyn StemSource>,
    sample_rate: u32,
}

impl StemLoader {
    /// Create a loader producing stems at `sample_rate`
    pub fn new(source: Arc<dyn StemSource>, sample_rate: u32) -> Self {
        Self { source, sample_rate }
    }

    /// Loader for the separated-stems folder layout
    pub fn from_config(config: &StemSourceConfig, sample_rate: u32) -> Self {
        Self::new(Arc::new(SeparatedDirSource::from_config(config)), sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Load every available stem of `song_path`
    pub fn load(&self, song_path: &Path) -> LoadResult<LoadedStems> {
        let location = self.source.locate(song_path)?;
        log::info!(
            "Loading {} stems for '{}' from {}",
            location.file_count(),
            location.song_id,
            location.dir.display()
        );

        let results: Vec<Option<LoadResult<StereoBuffer>>> = location
            .files
            .par_iter()
            .enumerate()
            .map(|(idx, path)| {
                path.as_deref()
                    .map(|path| load_stem(Stem::ALL[idx], path, self.sample_rate))
            })
            .collect();

        let mut buffers: [Option<StereoBuffer>; NUM_STEMS] = Default::default();
        let mut skipped = Vec::new();

        for ((slot, stem), result) in buffers.iter_mut().zip(Stem::ALL).zip(results) {
            match result {
                Some(Ok(buffer)) => {
                    log::debug!("Loaded {} stem: {} frames", stem, buffer.len());
                    *slot = Some(buffer);
                }
                Some(Err(error)) => {
                    log::warn!("Skipping {} stem: {}", stem, error);
                    skipped.push(SkippedStem { stem, error });
                }
                None => log::debug!("No {} stem for '{}'", stem, location.song_id),
            }
        }

        let Some(stems) = StemSet::from_buffers(buffers, self.sample_rate, Provenance::Original) else {
            return Err(LoadError::NoStemsLoaded {
                song_id: location.song_id,
                skipped,
            });
        };

        log::info!(
            "Loaded '{}': {} stems, {} frames ({:.1}s)",
            location.song_id,
            stems.present().count(),
            stems.frame_count(),
            stems.duration_seconds()
        );

        Ok(LoadedStems {
            song_id: location.song_id,
            dir: location.dir,
            stems,
            skipped,
        })
    }
}

/// Decode one stem file into stereo at the engine rate
fn load_stem(stem: Stem, path: &Path, sample_rate: u32) -> LoadResult<StereoBuffer> {
    let decoded = decode_file(path).map_err(|reason| LoadError::Decode {
        stem,
        path: path.to_path_buf(),
        reason,
    })?;

    let buffer = StereoBuffer::from_interleaved(&decoded.samples, decoded.channels);
    if buffer.is_empty() {
        return Err(LoadError::EmptyStem {
            stem,
            path: path.to_path_buf(),
        });
    }

    if decoded.sample_rate == sample_rate {
        return Ok(buffer);
    }

    log::debug!(
        "Resampling {} stem from {}Hz to {}Hz",
        stem,
        decoded.sample_rate,
        sample_rate
    );
    resample_stereo(&buffer, decoded.sample_rate, sample_rate).map_err(|reason| LoadError::Resample {
        stem,
        from: decoded.sample_rate,
        to: sample_rate,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StereoSample;
    use std::fs;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize, value: f32) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames * channels as usize {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn loader(root: &Path) -> StemLoader {
        StemLoader::new(Arc::new(SeparatedDirSource::new(root)), 44100)
    }

    #[test]
    fn test_mono_stem_is_duplicated() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("mono");
        fs::create_dir_all(&dir).unwrap();
        write_wav(&dir.join("vocals.wav"), 1, 44100, 500, 0.25);

        let loaded = loader(root.path()).load(Path::new("mono.mp3")).unwrap();
        let vocals = loaded.stems.stem(Stem::Vocals).unwrap();
        assert_eq!(vocals.len(), 500);
        assert_eq!(vocals[0], StereoSample::new(0.25, 0.25));
    }

    #[test]
    fn test_broken_and_empty_stems_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("partial");
        fs::create_dir_all(&dir).unwrap();
        write_wav(&dir.join("drums.wav"), 2, 44100, 1000, 0.1);
        write_wav(&dir.join("bass.wav"), 2, 44100, 0, 0.0);
        fs::write(dir.join("other.wav"), b"garbage").unwrap();

        let loaded = loader(root.path()).load(Path::new("partial.wav")).unwrap();
        assert_eq!(loaded.stems.present_stems(), vec![Stem::Drums]);
        assert_eq!(loaded.skipped.len(), 2);
        // a header-only file is either empty or rejected by the decoder
        assert!(loaded.skipped.iter().any(|s| s.stem == Stem::Bass));
        assert!(loaded
            .skipped
            .iter()
            .any(|s| s.stem == Stem::Other && matches!(s.error, LoadError::Decode { .. })));
    }

    #[test]
    fn test_all_stems_unusable_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("vocals.wav"), b"garbage").unwrap();
        write_wav(&dir.join("drums.wav"), 2, 44100, 0, 0.0);

        let err = loader(root.path()).load(Path::new("broken.wav")).unwrap_err();
        match err {
            LoadError::NoStemsLoaded { song_id, skipped } => {
                assert_eq!(song_id, "broken");
                assert_eq!(skipped.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_foreign_rate_is_resampled() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("hires");
        fs::create_dir_all(&dir).unwrap();
        write_wav(&dir.join("bass.wav"), 2, 48000, 4800, 0.2);
        write_wav(&dir.join("other.wav"), 2, 44100, 1000, 0.2);

        let loaded = loader(root.path()).load(Path::new("hires.wav")).unwrap();
        assert_eq!(loaded.stems.sample_rate(), 44100);
        assert_eq!(loaded.stems.frame_count(), 4410);
        assert_eq!(loaded.stems.stem(Stem::Other).unwrap().len(), 4410);
    }
}
