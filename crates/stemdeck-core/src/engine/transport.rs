//! Transport: start/stop, seeking and position queries
//!
//! Playing means an output stream is open. `start` opens one through the
//! backend and hands it a fresh `RealtimeMixer`; `stop` drops it.

use std::sync::Arc;

use super::mixer::{MixerSettings, RealtimeMixer};
use super::state::PlaybackState;
use crate::audio::{AudioBackend, AudioResult, AudioStream};
use crate::types::PlayState;

pub struct TransportController {
    state: Arc<PlaybackState>,
    backend: Box<dyn AudioBackend>,
    stream: Option<Box<dyn AudioStream>>,
    settings: MixerSettings,
    sample_rate: u32,
}

impl TransportController {
    pub fn new(
        state: Arc<PlaybackState>,
        backend: Box<dyn AudioBackend>,
        settings: MixerSettings,
        sample_rate: u32,
    ) -> Self {
        Self {
            state,
            backend,
            stream: None,
            settings,
            sample_rate,
        }
    }

    pub fn play_state(&self) -> PlayState {
        if self.stream.is_some() {
            PlayState::Playing
        } else {
            PlayState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.play_state() == PlayState::Playing
    }

    /// Open the output stream and start playing (no-op when playing)
    ///
    /// On failure the transport stays stopped.
    pub fn start(&mut self) -> AudioResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let mixer = RealtimeMixer::new(Arc::clone(&self.state), self.settings);
        let stream = self.backend.open(mixer, self.sample_rate)?;
        self.state.set_playing(true);

        log::info!(
            "Playback started via {} ({} frames, ~{:.1}ms)",
            self.backend.name(),
            stream.buffer_size(),
            stream.latency_ms()
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop playing and close the stream (no-op when stopped)
    pub fn stop(&mut self) {
        self.state.set_playing(false);
        if self.stream.take().is_some() {
            log::info!("Playback stopped at {:.2}s", self.position_seconds());
        }
    }

    /// Move the playhead, clamped to `[0, frame_count - 1]`
    ///
    /// Negative or NaN positions go to 0; with nothing loaded the position
    /// is 0. Returns the frame that was stored.
    pub fn seek(&self, seconds: f64) -> u64 {
        let frame_count = self.state.frame_count() as u64;
        let frames = if frame_count == 0 || seconds.is_nan() || seconds <= 0.0 {
            0
        } else {
            // `as` saturates, so +inf lands on the last frame
            ((seconds * self.sample_rate as f64) as u64).min(frame_count - 1)
        };

        self.state.set_position(frames);
        log::debug!("Seek to {:.3}s -> frame {}", seconds, frames);
        frames
    }

    pub fn position_frames(&self) -> u64 {
        self.state.position()
    }

    pub fn position_seconds(&self) -> f64 {
        self.state.position() as f64 / self.sample_rate as f64
    }

    pub fn duration_seconds(&self) -> f64 {
        self.state.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output latency of the open stream
    pub fn latency_ms(&self) -> Option<f32> {
        self.stream.as_ref().map(|s| s.latency_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ManualBackend;
    use crate::stems::{Provenance, StemSet};
    use crate::types::{StereoBuffer, StereoSample};

    fn transport(frames: usize) -> (TransportController, ManualBackend, Arc<PlaybackState>) {
        let state = Arc::new(PlaybackState::new());
        let set = StemSet::from_buffers(
            [None, Some(StereoBuffer::from_vec(vec![StereoSample::mono(0.1); frames])), None, None],
            44100,
            Provenance::Original,
        )
        .unwrap();
        state.install(Some(Arc::new(set)));
        let backend = ManualBackend::new();
        let transport = TransportController::new(
            state.clone(),
            Box::new(backend.clone()),
            MixerSettings::default(),
            44100,
        );
        (transport, backend, state)
    }

    #[test]
    fn test_start_stop_are_idempotent() {
        let (mut transport, backend, state) = transport(44100);
        transport.start().unwrap();
        transport.start().unwrap();
        assert_eq!(backend.open_count(), 1);
        assert!(state.is_playing());
        assert!(backend.is_open());

        transport.stop();
        transport.stop();
        assert_eq!(transport.play_state(), PlayState::Stopped);
        assert!(!state.is_playing());
        assert!(!backend.is_open());
    }

    #[test]
    fn test_failed_start_stays_stopped() {
        let (mut transport, backend, state) = transport(100);
        backend.fail_next_open();
        assert!(transport.start().is_err());
        assert_eq!(transport.play_state(), PlayState::Stopped);
        assert!(!state.is_playing());

        transport.start().unwrap();
        assert!(transport.is_playing());
    }

    #[test]
    fn test_seek_clamps() {
        let (transport, _, _) = transport(44100);
        assert_eq!(transport.seek(0.5), 22050);
        assert_eq!(transport.seek(-3.0), 0);
        assert_eq!(transport.seek(f64::NAN), 0);
        assert_eq!(transport.seek(10.0), 44099);
        assert_eq!(transport.seek(f64::INFINITY), 44099);
        assert!((transport.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_without_stems() {
        let state = Arc::new(PlaybackState::new());
        let transport = TransportController::new(
            state,
            Box::new(ManualBackend::new()),
            MixerSettings::default(),
            44100,
        );
        assert_eq!(transport.seek(3.0), 0);
        assert_eq!(transport.duration_seconds(), 0.0);
    }
}
