//! Audio subsystem
//!
//! The playback worker only talks to the traits defined here:
//! - [`AudioBackend`]: device enumeration, source opening, stream opening
//! - [`AudioSource`]: pull-based decoded PCM (interleaved f32)
//! - [`OutputStream`]: blocking push-based sink for one device
//!
//! Production implementations are [`decoder::SymphoniaSource`] and
//! [`output::CpalBackend`]; tests supply scripted in-memory backends.

pub mod decoder;
pub mod devices;
pub mod output;

pub use decoder::SymphoniaSource;
pub use devices::resolve_device;
pub use output::CpalBackend;

use crate::error::Result;
use std::path::Path;

/// One output device as seen in the flattened enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Position in the enumeration; stable for the lifetime of the backend
    pub index: usize,
    pub name: String,
    /// Audio host API name (e.g. "ALSA", "WASAPI")
    pub host: String,
}

/// Which device an output stream should open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// System default output (the monitor)
    Default,
    /// Device by enumeration index (the routed output)
    Device(usize),
}

/// Shape of an output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per write
    pub chunk_frames: usize,
}

/// Decoded audio, read sequentially
pub trait AudioSource: Send {
    /// Native sample rate of the source
    fn sample_rate(&self) -> u32;

    /// Channel count of the source
    fn channels(&self) -> u16;

    /// Length in frames, when the container reports it
    fn total_frames(&self) -> Option<u64>;

    /// Read up to `max_frames` interleaved frames into `out` (cleared first).
    ///
    /// Returns the number of frames read; 0 means the source is exhausted.
    fn read_frames(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<usize>;
}

/// An open output stream on one device
pub trait OutputStream {
    /// Queue interleaved samples, blocking until the device accepted them
    fn write(&mut self, samples: &[f32]) -> Result<()>;

    /// Let queued audio drain, then release the device
    fn close(self: Box<Self>) -> Result<()>;

    /// Release the device immediately, discarding queued audio
    fn abort(self: Box<Self>) -> Result<()>;
}

/// Host audio system
pub trait AudioBackend: Send + Sync {
    /// Enumerate output devices across all hosts
    fn output_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a file as a decoded source
    fn open_source(&self, path: &Path) -> Result<Box<dyn AudioSource>>;

    /// Open an output stream; called on the playback worker thread
    fn open_output(&self, target: OutputTarget, spec: StreamSpec) -> Result<Box<dyn OutputStream>>;
}
