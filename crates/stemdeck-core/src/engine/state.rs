//! Playback state shared between the control side and the audio callback
//!
//! Everything here is lock-free: plain atomics for scalars and a basedrop
//! `SharedCell` for the current stem set. The callback never blocks on the
//! control side and the control side never waits for the callback.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use atomic_float::AtomicF32;
use basedrop::{Shared, SharedCell};

use super::gc::gc_handle;
use crate::stems::StemSet;
use crate::types::{Stem, NUM_STEMS};

/// Lowest accepted gain
pub const MIN_VOLUME: f32 = 0.0;

/// Highest accepted gain (+6 dB)
pub const MAX_VOLUME: f32 = 2.0;

/// Clamp a requested gain into `[MIN_VOLUME, MAX_VOLUME]`; non-finite input
/// becomes silence
#[inline]
pub fn clamp_volume(value: f32) -> f32 {
    if !value.is_finite() {
        MIN_VOLUME
    } else {
        value.clamp(MIN_VOLUME, MAX_VOLUME)
    }
}

/// Stem set slot as seen by the callback
pub type StemSlot = Option<Arc<StemSet>>;

/// State shared by one engine and its audio callback
pub struct PlaybackState {
    /// Currently installed stems
    stems: SharedCell<StemSlot>,
    is_playing: AtomicBool,
    position: AtomicU64,
    master_volume: AtomicF32,
    volumes: [AtomicF32; NUM_STEMS],
    /// Raised by the callback when the clamp changed a sample
    clipped: AtomicBool,
    /// Blocks replaced by silence after a mixing fault
    faults: AtomicU64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            stems: SharedCell::new(Shared::new(&gc_handle(), None)),
            is_playing: AtomicBool::new(false),
            position: AtomicU64::new(0),
            master_volume: AtomicF32::new(1.0),
            volumes: std::array::from_fn(|_| AtomicF32::new(1.0)),
            clipped: AtomicBool::new(false),
            faults: AtomicU64::new(0),
        }
    }

    // ── Stem set ──────────────────────────────────────────────────────────

    /// Take a consistent reference to the current stems
    ///
    /// Cloning a `Shared` only bumps a refcount, so this is safe on the
    /// audio thread.
    #[inline]
    pub fn stems(&self) -> Shared<StemSlot> {
        self.stems.get()
    }

    /// Swap in a new stem set (control side only, allocates)
    pub fn install(&self, stems: StemSlot) {
        self.stems.set(Shared::new(&gc_handle(), stems));
    }

    /// Frame count of the installed set, 0 when nothing is loaded
    pub fn frame_count(&self) -> usize {
        let stems = self.stems();
        (*stems).as_ref().map_or(0, |set| set.frame_count())
    }

    // ── Transport ─────────────────────────────────────────────────────────

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::Acquire)
    }

    pub fn set_playing(&self, playing: bool) {
        self.is_playing.store(playing, Ordering::Release);
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Acquire)
    }

    pub fn set_position(&self, frames: u64) {
        self.position.store(frames, Ordering::Release);
    }

    /// Move the position from `expected` to `next` unless someone else
    /// (a seek) changed it in the meantime
    #[inline]
    pub fn advance_position(&self, expected: u64, next: u64) -> bool {
        self.position
            .compare_exchange(expected, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    // ── Gains ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn volume(&self, stem: Stem) -> f32 {
        self.volumes[stem.index()].load(Ordering::Relaxed)
    }

    /// Store a clamped gain, returning the stored value
    pub fn set_volume(&self, stem: Stem, value: f32) -> f32 {
        let value = clamp_volume(value);
        self.volumes[stem.index()].store(value, Ordering::Relaxed);
        value
    }

    #[inline]
    pub fn master_volume(&self) -> f32 {
        self.master_volume.load(Ordering::Relaxed)
    }

    pub fn set_master_volume(&self, value: f32) -> f32 {
        let value = clamp_volume(value);
        self.master_volume.store(value, Ordering::Relaxed);
        value
    }

    // ── Indicators ────────────────────────────────────────────────────────

    #[inline]
    pub fn mark_clipped(&self) {
        self.clipped.store(true, Ordering::Relaxed);
    }

    /// Read and clear the clip indicator
    pub fn take_clipped(&self) -> bool {
        self.clipped.swap(false, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}
