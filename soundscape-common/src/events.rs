//! Event types for the soundscape event system
//!
//! Provides mixer change notifications and the EventBus that carries them
//! to subscribers (UI bindings, SSE clients, tests).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Direction of a completed fade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeDirection {
    /// Gain ramped up after the channel was enabled
    In,
    /// Gain ramped down to silence after the channel was disabled
    Out,
}

/// Mixer event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MixerEvent {
    /// A channel's enabled flag, volume or effective gain changed
    ///
    /// Triggers:
    /// - SSE: Update the channel's toggle and slider
    ChannelChanged {
        /// Channel id (e.g. "rain")
        channel_id: String,
        /// Whether the channel should be audible
        enabled: bool,
        /// Channel volume (0-100)
        volume: u8,
        /// Settled output gain (0.0-1.0), 0.0 while disabled
        effective_gain: f32,
        /// When the change happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Master volume changed
    ///
    /// Every enabled channel's effective gain changes with it; no per-channel
    /// events are emitted for that recomputation.
    MasterVolumeChanged {
        /// Previous master volume (0-100)
        old_volume: u8,
        /// New master volume (0-100)
        new_volume: u8,
        /// When volume changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A preset was applied as the new mix
    PresetApplied {
        /// Catalogue name, None for ad-hoc entry lists
        preset_name: Option<String>,
        /// Channels enabled by the preset
        enabled_channels: Vec<String>,
        /// When the preset was applied
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A channel's fade ran to completion
    FadeCompleted {
        /// Channel id
        channel_id: String,
        /// Fade direction
        direction: FadeDirection,
        /// Gain left on the device
        final_gain: f32,
        /// When the fade finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A channel lost its playback source and became a silent placeholder
    ChannelDegraded {
        /// Channel id
        channel_id: String,
        /// Device error description
        error: String,
        /// When the channel degraded
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl MixerEvent {
    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            MixerEvent::ChannelChanged { .. } => "ChannelChanged",
            MixerEvent::MasterVolumeChanged { .. } => "MasterVolumeChanged",
            MixerEvent::PresetApplied { .. } => "PresetApplied",
            MixerEvent::FadeCompleted { .. } => "FadeCompleted",
            MixerEvent::ChannelDegraded { .. } => "ChannelDegraded",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for mixer events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the mixer)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
///
/// # Examples
///
/// ```
/// use soundscape_common::events::{EventBus, MixerEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(MixerEvent::MasterVolumeChanged {
///     old_volume: 70,
///     new_volume: 40,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<MixerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging subscribers
    ///   start dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MixerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MixerEvent,
    ) -> Result<usize, broadcast::error::SendError<MixerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MixerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
