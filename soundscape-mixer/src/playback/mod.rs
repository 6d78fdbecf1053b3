//! Mixing core: channels, fades and the engine that drives them

pub mod channel;
pub mod engine;
pub mod fader;
pub mod state;

pub use channel::Channel;
pub use engine::MixEngine;
pub use fader::{FadeJob, FadeScheduler};
pub use state::{ChannelSnapshot, MixerSnapshot, MixerState};
