//! Ambient soundscape mixer
//!
//! Mixes a fixed set of looping ambient channels under a master volume,
//! with eased fades on enable/disable and atomic preset switching.
//!
//! [`MixEngine`] is the control surface; audio output goes through the
//! [`device::PlaybackDevice`] trait.

pub mod api;
pub mod device;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::MixEngine;
