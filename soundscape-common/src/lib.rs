//! # Soundscape Common Library
//!
//! Shared code for the soundscape mixer:
//! - Error types
//! - Mixer event types and the EventBus
//! - Fade curve definitions and calculations
//! - TOML configuration (channel catalogue, presets, fade timing)

pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
