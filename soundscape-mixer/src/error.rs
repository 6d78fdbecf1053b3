//! Error types for soundscape-mixer
//!
//! Only `UnknownChannel` and `UnknownPreset` ever reach mixer callers.
//! Device failures are absorbed by the owning channel, and out-of-range
//! volumes are clamped rather than rejected.

use crate::device::DeviceError;
use thiserror::Error;

/// Main error type for soundscape-mixer
#[derive(Error, Debug)]
pub enum Error {
    /// Channel id not registered with the mixer
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Preset name not in the catalogue
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Playback source unavailable; the channel keeps working silently
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(#[from] DeviceError),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),
}

/// Convenience Result type using soundscape-mixer Error
pub type Result<T> = std::result::Result<T, Error>;
