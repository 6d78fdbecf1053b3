//! Playback device abstraction
//!
//! The mixer never decodes or outputs audio itself. It drives one looping
//! source per channel through these traits; decoding, resampling and output
//! belong to whatever implements them.
//!
//! Implementations:
//! - [`memory::MemoryDevice`]: records every call, with failure injection
//! - [`logging::LoggingDevice`]: checks sources on disk and traces calls

pub mod logging;
pub mod memory;

pub use logging::LoggingDevice;
pub use memory::{DeviceCall, MemoryDevice};

use thiserror::Error;

/// Errors raised at the device boundary
///
/// Never surfaced to mixer callers: the owning channel degrades to a silent
/// placeholder instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Source could not be located or opened
    #[error("source '{0}' could not be opened")]
    SourceUnavailable(String),

    /// A call on an open source failed
    #[error("device call '{operation}' failed for '{source_id}': {reason}")]
    CallFailed {
        source_id: String,
        operation: &'static str,
        reason: String,
    },
}

/// An open, looping audio source
pub trait SourceHandle: Send + Sync {
    /// Set output gain (0.0-1.0)
    fn set_gain(&mut self, gain: f32) -> Result<(), DeviceError>;

    /// Start or resume looping playback
    fn play(&mut self) -> Result<(), DeviceError>;

    /// Pause playback, keeping the position
    fn pause(&mut self) -> Result<(), DeviceError>;

    /// Seek back to the start of the loop
    fn rewind_to_start(&mut self) -> Result<(), DeviceError>;

    /// Release the source; no other call follows
    fn dispose(&mut self) -> Result<(), DeviceError>;
}

/// Opens looping sources by identifier
pub trait PlaybackDevice: Send + Sync {
    fn open(&self, source: &str) -> Result<Box<dyn SourceHandle>, DeviceError>;
}
