//! Audio output
//!
//! The engine talks to hardware through the `AudioBackend` trait:
//!
//! - **CpalBackend**: cross-platform device output
//! - **ManualBackend**: no hardware, blocks are pulled by the caller
//!
//! The backend's callback owns the `RealtimeMixer`; the control side only
//! touches the shared atomics.

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;
mod manual_backend;

pub use backend::{AudioBackend, AudioStream};
pub use config::{
    AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, LOW_LATENCY_BUFFER_SIZE, MAX_BUFFER_SIZE,
    MAX_STREAM_BUFFER_SIZE, MIN_STREAM_BUFFER_SIZE,
};
pub use cpal_backend::{CpalAudioStream, CpalBackend};
pub use device::{find_device_by_id, get_default_device, get_output_devices, OutputDevice};
pub use error::{AudioError, AudioResult};
pub use manual_backend::ManualBackend;
