//! Mixer state
//!
//! The authoritative record of the desired mix: every channel plus the
//! master volume. Only the mixer core writes to it.

use super::channel::{clamp_volume, Channel};
use serde::Serialize;
use std::collections::HashMap;

/// Channel set and master volume
#[derive(Debug)]
pub struct MixerState {
    /// Declaration order
    channels: Vec<Channel>,
    index: HashMap<String, usize>,
    master_volume: u8,
}

impl MixerState {
    /// Build from channels in declaration order
    ///
    /// A later channel with an already-seen id is dropped.
    pub fn new(channels: Vec<Channel>, master_volume: i32) -> Self {
        let mut unique = Vec::with_capacity(channels.len());
        let mut index = HashMap::new();
        for channel in channels {
            if index.contains_key(channel.id()) {
                continue;
            }
            index.insert(channel.id().to_string(), unique.len());
            unique.push(channel);
        }

        Self {
            channels: unique,
            index,
            master_volume: clamp_volume(master_volume),
        }
    }

    /// Channels in declaration order
    pub fn channels(&self) -> impl Iterator<Item = &Channel> + '_ {
        self.channels.iter()
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut Channel> + '_ {
        self.channels.iter_mut()
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.index.get(id).map(|&i| &self.channels[i])
    }

    pub fn channel_mut(&mut self, id: &str) -> Option<&mut Channel> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.channels[i]),
            None => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn master_volume(&self) -> u8 {
        self.master_volume
    }

    /// Store a clamped master volume; returns (old, new)
    ///
    /// Gains of enabled channels must be recomputed by the caller in the
    /// same critical section.
    pub fn set_master_volume(&mut self, volume: i32) -> (u8, u8) {
        let old = self.master_volume;
        self.master_volume = clamp_volume(volume);
        (old, self.master_volume)
    }

    /// Settled gain of one channel
    pub fn effective_gain(&self, id: &str) -> Option<f32> {
        self.channel(id).map(|c| c.effective_gain(self.master_volume))
    }

    /// Ids of enabled channels, in declaration order
    pub fn enabled_ids(&self) -> Vec<String> {
        self.channels()
            .filter(|c| c.is_enabled())
            .map(|c| c.id().to_string())
            .collect()
    }

    /// Release every device handle
    pub fn dispose_all(&mut self) {
        for channel in self.channels_mut() {
            channel.dispose();
        }
    }
}

/// Immutable view of one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSnapshot {
    pub id: String,
    pub volume: u8,
    pub enabled: bool,
    /// Settled gain: (volume/100)*(master/100), 0.0 while disabled
    pub effective_gain: f32,
    /// Gain currently on the device (differs from effective_gain mid-fade)
    pub output_gain: f32,
    /// False for silent placeholders
    pub available: bool,
    pub fading: bool,
}

/// Immutable view of the whole mix, taken under one lock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixerSnapshot {
    pub master_volume: u8,
    pub channels: Vec<ChannelSnapshot>,
}

impl MixerSnapshot {
    pub fn channel(&self, id: &str) -> Option<&ChannelSnapshot> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn enabled_ids(&self) -> Vec<&str> {
        self.channels
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.id.as_str())
            .collect()
    }
}
