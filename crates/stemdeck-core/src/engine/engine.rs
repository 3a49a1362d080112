//! `StemEngine`: the control surface of one deck
//!
//! Owns the shared playback state, the transport, the loader and the effects
//! processor of a single song. Engines hold no global state, so several can
//! play side by side.

use std::path::Path;
use std::sync::Arc;

use super::error::{EngineError, EngineResult};
use super::mixer::MixerSettings;
use super::state::PlaybackState;
use super::transport::TransportController;
use super::volume::VolumeController;
use crate::audio::AudioBackend;
use crate::config::EngineConfig;
use crate::effects::{
    EffectParams, EffectsError, EffectsRequest, EffectsWorker, OfflineEffectsProcessor, SignalsmithDsp,
};
use crate::stems::{SkippedStem, StemLoader, StemSet};
use crate::types::{PlayState, Stem};

/// The song currently loaded into an engine
struct LoadedSong {
    song_id: String,
    /// Untransformed stems; every effect is rendered from these
    original: Arc<StemSet>,
    skipped: Vec<SkippedStem>,
}

pub struct StemEngine {
    state: Arc<PlaybackState>,
    transport: TransportController,
    volumes: VolumeController,
    loader: StemLoader,
    processor: OfflineEffectsProcessor,
    worker: Option<EffectsWorker>,
    song: Option<LoadedSong>,
    params: EffectParams,
    /// Parameters sent to the worker and not yet installed
    pending: Option<EffectParams>,
    /// Bumped on load, cleanup and superseding applies; stale worker results are discarded
    generation: u64,
}

impl StemEngine {
    /// Engine with the default signalsmith DSP and the configured stem layout
    pub fn new(config: &EngineConfig, backend: Box<dyn AudioBackend>) -> Self {
        Self::from_parts(
            StemLoader::from_config(&config.stems, config.sample_rate),
            OfflineEffectsProcessor::new(Arc::new(SignalsmithDsp::new(config.effects.quality))),
            backend,
            config.mixer,
        )
    }

    /// Engine assembled from explicit collaborators
    ///
    /// The output stream runs at the loader's sample rate.
    pub fn from_parts(
        loader: StemLoader,
        processor: OfflineEffectsProcessor,
        backend: Box<dyn AudioBackend>,
        settings: MixerSettings,
    ) -> Self {
        let state = Arc::new(PlaybackState::new());
        let transport = TransportController::new(Arc::clone(&state), backend, settings, loader.sample_rate());
        let volumes = VolumeController::new(Arc::clone(&state));

        Self {
            state,
            transport,
            volumes,
            loader,
            processor,
            worker: None,
            song: None,
            params: EffectParams::default(),
            pending: None,
            generation: 0,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────

    /// Load the stems of `song_path` and return the song id
    ///
    /// Stops playback, installs the new stems at position 0 and resets
    /// speed/pitch. The engine stays stopped. On failure the previous song
    /// remains loaded and playable.
    pub fn load_song_stems(&mut self, song_path: &Path) -> EngineResult<String> {
        let loaded = self.loader.load(song_path).inspect_err(|e| {
            log::error!("Failed to load {}: {}", song_path.display(), e);
        })?;

        self.stop_playback();

        let original = Arc::new(loaded.stems);
        self.state.install(Some(Arc::clone(&original)));
        self.state.set_position(0);
        self.params = EffectParams::default();
        self.pending = None;
        self.generation += 1;

        if !loaded.skipped.is_empty() {
            log::warn!(
                "'{}' loaded without {} stem(s)",
                loaded.song_id,
                loaded.skipped.len()
            );
        }

        let song_id = loaded.song_id.clone();
        self.song = Some(LoadedSong {
            song_id: loaded.song_id,
            original,
            skipped: loaded.skipped,
        });
        Ok(song_id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Effects
    // ─────────────────────────────────────────────────────────────────────

    /// Apply speed and pitch synchronously
    ///
    /// Renders from the original stems, installs the result at position 0 and
    /// resumes playback if it was running, also when the transform fails.
    /// Any outstanding background transform is superseded.
    pub fn apply_effects(&mut self, speed_ratio: f64, pitch_semitones: i32) -> EngineResult<()> {
        let params = EffectParams::new(speed_ratio, pitch_semitones);
        params.validate()?;
        let original = self.original()?;

        if self.pending.take().is_some() {
            self.generation += 1;
        }

        let was_playing = self.is_playing();
        self.stop_playback();

        let transformed = self.processor.transform(&original, params);
        if let Ok(set) = &transformed {
            self.install_transformed(Arc::clone(set), params);
        }

        let restarted = if was_playing { self.start_playback() } else { Ok(()) };

        match transformed {
            Ok(_) => restarted,
            Err(e) => {
                log::warn!("Keeping previous stems: {}", e);
                if let Err(restart) = restarted {
                    log::error!("Failed to resume playback: {}", restart);
                }
                Err(e.into())
            }
        }
    }

    /// Queue speed and pitch on the background worker
    ///
    /// Playback continues with the current stems until `poll_effects`
    /// installs the result.
    pub fn request_effects(&mut self, speed_ratio: f64, pitch_semitones: i32) -> EngineResult<()> {
        let params = EffectParams::new(speed_ratio, pitch_semitones);
        params.validate()?;
        let original = self.original()?;

        if self.worker.is_none() {
            let worker = EffectsWorker::spawn(self.processor.clone()).map_err(|source| EngineError::Thread {
                name: "effects-worker",
                source,
            })?;
            self.worker = Some(worker);
        }

        let request = EffectsRequest {
            generation: self.generation,
            original,
            params,
        };
        if let Some(worker) = &self.worker {
            if let Err(e) = worker.request(request) {
                // Dead thread; the next request spawns a fresh one
                self.worker = None;
                self.pending = None;
                return Err(e.into());
            }
        }
        self.pending = Some(params);
        Ok(())
    }

    /// Install finished background transforms (non-blocking)
    ///
    /// Returns the outcome of the newest result for the current song, or None
    /// when nothing relevant arrived. A worker that died is reported once and
    /// dropped, which clears the pending request.
    pub fn poll_effects(&mut self) -> Option<EngineResult<EffectParams>> {
        let mut outcome = None;

        loop {
            let Some(worker) = &self.worker else {
                break;
            };
            let reply = match worker.try_recv() {
                Ok(Some(reply)) => reply,
                Ok(None) => break,
                Err(e) => {
                    log::error!("Effects worker stopped: {}", e);
                    self.worker = None;
                    self.pending = None;
                    outcome = Some(Err(e.into()));
                    break;
                }
            };
            if reply.generation != self.generation {
                log::debug!("Discarding effects result for a previous song");
                continue;
            }
            if self.pending == Some(reply.params) {
                self.pending = None;
            }

            outcome = Some(match reply.result {
                Ok(set) => {
                    let was_playing = self.is_playing();
                    self.stop_playback();
                    self.install_transformed(set, reply.params);
                    let restarted = if was_playing { self.start_playback() } else { Ok(()) };
                    restarted.map(|_| reply.params)
                }
                Err(e) => Err(e.into()),
            });
        }

        outcome
    }

    /// Whether a background transform is still outstanding
    pub fn effects_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Go back to the untransformed stems
    pub fn reset_effects(&mut self) -> EngineResult<()> {
        self.apply_effects(1.0, 0)
    }

    fn original(&self) -> EngineResult<Arc<StemSet>> {
        self.song
            .as_ref()
            .map(|song| Arc::clone(&song.original))
            .ok_or(EngineError::Effects(EffectsError::NoStemsLoaded))
    }

    fn install_transformed(&mut self, set: Arc<StemSet>, params: EffectParams) {
        self.state.install(Some(set));
        self.state.set_position(0);
        self.params = params;
        log::info!(
            "Installed stems at speed {:.2}x, pitch {:+} ({:.1}s)",
            params.speed_ratio,
            params.pitch_semitones,
            self.get_duration_seconds()
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────

    /// Open the output stream and start playing
    pub fn start_playback(&mut self) -> EngineResult<()> {
        if self.song.is_none() {
            return Err(EngineError::NoSongLoaded);
        }
        self.transport.start().inspect_err(|e| {
            log::error!("Failed to start playback: {}", e);
        })?;
        Ok(())
    }

    pub fn stop_playback(&mut self) {
        self.transport.stop();
    }

    /// Seek; returns the clamped position in seconds
    pub fn set_position_seconds(&self, seconds: f64) -> f64 {
        let frames = self.transport.seek(seconds);
        frames as f64 / self.transport.sample_rate() as f64
    }

    pub fn get_position_seconds(&self) -> f64 {
        self.transport.position_seconds()
    }

    pub fn get_duration_seconds(&self) -> f64 {
        self.transport.duration_seconds()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn play_state(&self) -> PlayState {
        self.transport.play_state()
    }

    pub fn latency_ms(&self) -> Option<f32> {
        self.transport.latency_ms()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Gains
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_volume(&self, stem: Stem, value: f32) -> f32 {
        self.volumes.set_volume(stem, value)
    }

    pub fn set_master_volume(&self, value: f32) -> f32 {
        self.volumes.set_master_volume(value)
    }

    pub fn volume(&self, stem: Stem) -> f32 {
        self.volumes.volume(stem)
    }

    pub fn master_volume(&self) -> f32 {
        self.volumes.master_volume()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn song_id(&self) -> Option<&str> {
        self.song.as_ref().map(|song| song.song_id.as_str())
    }

    pub fn effect_params(&self) -> EffectParams {
        self.params
    }

    /// Stems present in the loaded song
    pub fn loaded_stems(&self) -> Vec<Stem> {
        self.song
            .as_ref()
            .map(|song| song.original.present_stems())
            .unwrap_or_default()
    }

    /// Stem files that were present but could not be loaded
    pub fn skipped_stems(&self) -> &[SkippedStem] {
        self.song
            .as_ref()
            .map(|song| song.skipped.as_slice())
            .unwrap_or(&[])
    }

    /// Currently installed (possibly transformed) stems
    pub fn current_stems(&self) -> Option<Arc<StemSet>> {
        (*self.state.stems()).clone()
    }

    /// Whether output was clamped since the last call
    pub fn take_clip_indicator(&self) -> bool {
        self.state.take_clipped()
    }

    /// Number of audio blocks replaced by silence after a mixing fault
    pub fn callback_faults(&self) -> u64 {
        self.state.faults()
    }

    /// Stop playback and release the song and the worker (idempotent)
    pub fn cleanup(&mut self) {
        self.stop_playback();
        if self.song.take().is_some() {
            log::info!("Engine cleaned up");
        }
        self.state.install(None);
        self.state.set_position(0);
        self.params = EffectParams::default();
        self.pending = None;
        self.worker = None;
        self.generation += 1;
    }
}

impl Drop for StemEngine {
    fn drop(&mut self) {
        self.cleanup();
    }
}
