//! Hardware-free backend driven by the caller
//!
//! `ManualBackend` hands its "stream" to whoever holds a clone of the backend:
//! `render` pulls one block from the mixer exactly like a device callback
//! would. Used for offline rendering and for exercising the engine in tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::backend::{AudioBackend, AudioStream};
use super::config::DEFAULT_BUFFER_SIZE;
use super::error::{AudioError, AudioResult};
use crate::engine::RealtimeMixer;
use crate::types::StereoSample;

#[derive(Default)]
struct ManualShared {
    mixer: Mutex<Option<RealtimeMixer>>,
    opened: AtomicUsize,
    fail_next: AtomicBool,
}

impl ManualShared {
    fn mixer(&self) -> MutexGuard<'_, Option<RealtimeMixer>> {
        self.mixer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Backend whose callback is invoked by hand
#[derive(Clone, Default)]
pub struct ManualBackend {
    shared: Arc<ManualShared>,
}

impl ManualBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one callback of `n_frames`; None when no stream is open
    pub fn render(&self, n_frames: usize) -> Option<Vec<StereoSample>> {
        self.shared
            .mixer()
            .as_mut()
            .map(|mixer| mixer.process(n_frames).to_vec())
    }

    /// Whether a stream is currently open
    pub fn is_open(&self) -> bool {
        self.shared.mixer().is_some()
    }

    /// Number of streams opened so far
    pub fn open_count(&self) -> usize {
        self.shared.opened.load(Ordering::Relaxed)
    }

    /// Make the next `open` fail like an unavailable device
    pub fn fail_next_open(&self) {
        self.shared.fail_next.store(true, Ordering::Relaxed);
    }
}

impl AudioBackend for ManualBackend {
    fn open(&mut self, mixer: RealtimeMixer, sample_rate: u32) -> AudioResult<Box<dyn AudioStream>> {
        if self.shared.fail_next.swap(false, Ordering::Relaxed) {
            return Err(AudioError::NoDefaultDevice("manual backend told to fail".to_string()));
        }

        *self.shared.mixer() = Some(mixer);
        self.shared.opened.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ManualStream {
            shared: Arc::clone(&self.shared),
            sample_rate,
        }))
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}

struct ManualStream {
    shared: Arc<ManualShared>,
    sample_rate: u32,
}

impl AudioStream for ManualStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn buffer_size(&self) -> u32 {
        DEFAULT_BUFFER_SIZE
    }
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        self.shared.mixer().take();
    }
}
