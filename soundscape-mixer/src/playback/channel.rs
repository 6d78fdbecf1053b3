//! Mixer channel
//!
//! One looping sound: its device handle, volume and enabled flag. The
//! effective gain is never stored; it is derived from volume, enabled and
//! the master volume on demand.
//!
//! A channel without a handle is a placeholder. It still tracks volume and
//! enabled for the UI but never touches a device. A channel becomes a
//! placeholder when its source fails to open, or permanently when any later
//! device call fails.

use crate::device::{DeviceError, PlaybackDevice, SourceHandle};
use crate::error::Error;
use tracing::{debug, warn};

/// Highest channel or master volume
pub const MAX_VOLUME: u8 = 100;

/// Clamp a user-supplied volume into 0-100
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, MAX_VOLUME as i32) as u8
}

/// Settled output gain for a volume pair, clamped to [0, 1]
pub fn effective_gain(volume: u8, master_volume: u8) -> f32 {
    let gain = (volume as f32 / 100.0) * (master_volume as f32 / 100.0);
    gain.clamp(0.0, 1.0)
}

/// State change produced by `Channel::set_enabled`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enabled,
    Disabled,
}

pub struct Channel {
    id: String,
    source: String,
    volume: u8,
    enabled: bool,
    handle: Option<Box<dyn SourceHandle>>,
    /// Last gain successfully pushed to the device
    output_gain: f32,
    /// Device playback running (stays true through a fade-out)
    playing: bool,
    degraded: Option<DeviceError>,
}

impl Channel {
    /// Open the channel's source on `device`
    ///
    /// An open failure is logged and leaves a placeholder channel.
    pub fn open(id: &str, source: &str, volume: i32, device: &dyn PlaybackDevice) -> Self {
        let handle = match device.open(source) {
            Ok(handle) => {
                debug!("Channel '{}' opened source '{}'", id, source);
                Some(handle)
            }
            Err(e) => {
                warn!(
                    "Channel '{}' is a silent placeholder: {}",
                    id,
                    Error::DeviceUnavailable(e)
                );
                None
            }
        };

        Self {
            id: id.to_string(),
            source: source.to_string(),
            volume: clamp_volume(volume),
            enabled: false,
            handle,
            output_gain: 0.0,
            playing: false,
            degraded: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a device handle is attached
    pub fn is_available(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Gain the device was last set to
    pub fn output_gain(&self) -> f32 {
        self.output_gain
    }

    /// Settled gain under `master_volume`; 0.0 while disabled
    pub fn effective_gain(&self, master_volume: u8) -> f32 {
        if self.enabled {
            effective_gain(self.volume, master_volume)
        } else {
            0.0
        }
    }

    /// Store a clamped volume and return it
    ///
    /// Pushing the new gain is the mixer's job, since it depends on the
    /// master volume and any fade in flight.
    pub fn set_volume(&mut self, volume: i32) -> u8 {
        self.volume = clamp_volume(volume);
        self.volume
    }

    /// Flip the enabled flag; `None` if unchanged
    ///
    /// State only. The fade that follows is started with
    /// [`Channel::start_output`] / [`Channel::begin_stop`].
    pub fn set_enabled(&mut self, enabled: bool) -> Option<Transition> {
        if self.enabled == enabled {
            return None;
        }
        self.enabled = enabled;
        Some(if enabled {
            Transition::Enabled
        } else {
            Transition::Disabled
        })
    }

    /// Make the source audible-ready and return the fade-in start gain
    ///
    /// A stopped source starts playing at gain 0. A source still sounding
    /// from an interrupted fade-out keeps playing from its current gain.
    /// Placeholders return `None`.
    pub fn start_output(&mut self) -> Option<f32> {
        if !self.is_available() {
            return None;
        }
        if !self.playing {
            self.push_gain(0.0);
            self.device_call("play", |h| h.play());
            if !self.is_available() {
                return None;
            }
            self.playing = true;
        }
        Some(self.output_gain)
    }

    /// Fade-out start gain, or `None` if nothing is sounding
    pub fn begin_stop(&self) -> Option<f32> {
        if self.is_available() && self.playing {
            Some(self.output_gain)
        } else {
            None
        }
    }

    /// Pause and rewind after a completed fade-out
    pub fn stop_output(&mut self) {
        if !self.playing {
            return;
        }
        self.device_call("pause", |h| h.pause());
        self.device_call("rewind_to_start", |h| h.rewind_to_start());
        self.playing = false;
    }

    /// Push a gain to the device, clamped to [0, 1]
    pub fn push_gain(&mut self, gain: f32) {
        let gain = if gain.is_finite() { gain.clamp(0.0, 1.0) } else { 0.0 };
        if self.device_call("set_gain", |h| h.set_gain(gain)) {
            self.output_gain = gain;
        }
    }

    /// Take the device failure that degraded this channel, if any since the
    /// last call
    pub fn take_degraded(&mut self) -> Option<DeviceError> {
        self.degraded.take()
    }

    /// Release the device handle; later calls are no-ops
    pub fn dispose(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.dispose() {
                warn!("Channel '{}' failed to dispose its source: {}", self.id, e);
            }
            self.playing = false;
            self.output_gain = 0.0;
        }
    }

    /// Run one device call; on failure drop the handle for good
    ///
    /// Returns true when the call reached the device and succeeded.
    fn device_call<F>(&mut self, operation: &'static str, call: F) -> bool
    where
        F: FnOnce(&mut dyn SourceHandle) -> Result<(), DeviceError>,
    {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };

        match call(handle.as_mut()) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Channel '{}' degraded to placeholder after failed {}: {}",
                    self.id, operation, e
                );
                if let Some(mut handle) = self.handle.take() {
                    let _ = handle.dispose();
                }
                self.playing = false;
                self.output_gain = 0.0;
                self.degraded = Some(e);
                false
            }
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("volume", &self.volume)
            .field("enabled", &self.enabled)
            .field("available", &self.is_available())
            .field("output_gain", &self.output_gain)
            .field("playing", &self.playing)
            .finish()
    }
}
