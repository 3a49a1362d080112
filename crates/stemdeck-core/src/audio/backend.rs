//! Audio backend abstraction
//!
//! The engine opens one output stream per playback session through an
//! `AudioBackend`. The returned `AudioStream` keeps the hardware connection
//! alive; dropping it closes the stream.

use super::error::AudioResult;
use crate::engine::RealtimeMixer;

/// Open hardware output connection
pub trait AudioStream {
    /// Sample rate the stream runs at
    fn sample_rate(&self) -> u32;

    /// Block size in frames as negotiated with the device
    fn buffer_size(&self) -> u32;

    /// One-way output latency in milliseconds
    fn latency_ms(&self) -> f32 {
        (self.buffer_size() as f32 / self.sample_rate() as f32) * 1000.0
    }
}

/// Factory for output streams
pub trait AudioBackend {
    /// Open a stream at `sample_rate` that pulls its audio from `mixer`
    ///
    /// The mixer moves into the audio callback. A device that cannot run at
    /// `sample_rate` is an error; no resampling happens at this stage.
    fn open(&mut self, mixer: RealtimeMixer, sample_rate: u32) -> AudioResult<Box<dyn AudioStream>>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}
