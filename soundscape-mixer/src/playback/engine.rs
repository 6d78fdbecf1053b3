//! Mix engine façade
//!
//! Applies mixer operations to [`MixerState`], recomputes gains, drives the
//! [`FadeScheduler`] and publishes change events.
//!
//! # Concurrency
//!
//! State and scheduler live together behind one `RwLock`. Every mutating
//! operation and every scheduler tick takes the write lock, so mutations are
//! serialized with gain updates: a tick never observes half of an operation.
//! `query_state` takes the read lock and copies everything in one pass.
//!
//! Operations never wait for fades. The ticker task samples the scheduler at
//! the configured rate and pushes gains to the devices.

use super::channel::{clamp_volume, Channel, Transition};
use super::fader::{FadeAction, FadeJob, FadeScheduler};
use super::state::{ChannelSnapshot, MixerSnapshot, MixerState};
use crate::device::PlaybackDevice;
use crate::error::{Error, Result};
use soundscape_common::config::{FadeConfig, MixerConfig, PresetConfig, PresetEntry};
use soundscape_common::events::{EventBus, FadeDirection, MixerEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Events buffered per subscriber before it lags
const EVENT_CAPACITY: usize = 256;

/// Mixer state plus the fades acting on it
struct MixerCore {
    state: MixerState,
    scheduler: FadeScheduler,
    fade: FadeConfig,
}

impl MixerCore {
    fn set_enabled(&mut self, id: &str, enabled: bool, now: Instant, events: &EventBus) -> Result<()> {
        let channel = self
            .state
            .channel_mut(id)
            .ok_or_else(|| Error::UnknownChannel(id.to_string()))?;

        if let Some(transition) = channel.set_enabled(enabled) {
            self.begin_transition(id, transition, now);
            self.emit_channel(id, events);
        }
        self.collect_degradations(events);
        Ok(())
    }

    /// Start the fade that follows an enabled flag change
    fn begin_transition(&mut self, id: &str, transition: Transition, now: Instant) {
        let master = self.state.master_volume();
        let Some(channel) = self.state.channel_mut(id) else {
            return;
        };

        let job = match transition {
            Transition::Enabled => {
                let target = channel.effective_gain(master);
                channel.start_output().map(|from| {
                    FadeJob::fade_in(id, from, target, self.fade.fade_in(), self.fade.fade_in_curve, now)
                })
            }
            Transition::Disabled => channel.begin_stop().map(|from| {
                FadeJob::fade_out(id, from, self.fade.fade_out(), self.fade.fade_out_curve, now)
            }),
        };

        match job {
            Some(job) => {
                debug!(
                    "Fade {:?} for '{}': {:.3} -> {:.3}",
                    job.direction(),
                    id,
                    job.from(),
                    job.to()
                );
                if self.scheduler.schedule(job).is_some() {
                    debug!("Preempted in-flight fade for '{}'", id);
                }
            }
            None => {
                self.scheduler.cancel(id);
            }
        }
    }

    /// Bring an enabled channel's device gain to its effective gain, no fade
    ///
    /// A fade-in in flight never sounds louder than the new gain: a lower
    /// target is pushed at once and ends the ramp, a higher one restarts the
    /// ramp from the current gain over the time it had left.
    fn apply_gain(&mut self, id: &str, now: Instant) {
        let master = self.state.master_volume();
        let Some(channel) = self.state.channel_mut(id) else {
            return;
        };
        if !channel.is_enabled() {
            return;
        }

        let target = channel.effective_gain(master);
        let in_flight = self
            .scheduler
            .job(id)
            .map(|job| (job.direction(), job.remaining(now)));

        match in_flight {
            Some((FadeDirection::In, remaining)) => {
                let current = channel.output_gain();
                if target <= current {
                    self.scheduler.cancel(id);
                    channel.push_gain(target);
                } else {
                    self.scheduler.schedule(FadeJob::fade_in(
                        id,
                        current,
                        target,
                        remaining,
                        self.fade.fade_in_curve,
                        now,
                    ));
                }
            }
            // Fade-outs only run on disabled channels, filtered out above
            Some((FadeDirection::Out, _)) => {}
            None => {
                if channel.is_playing() {
                    channel.push_gain(target);
                }
            }
        }
    }

    fn set_volume(&mut self, id: &str, volume: i32, now: Instant, events: &EventBus) -> Result<u8> {
        let channel = self
            .state
            .channel_mut(id)
            .ok_or_else(|| Error::UnknownChannel(id.to_string()))?;

        let old = channel.volume();
        let new = channel.set_volume(volume);
        if old != new {
            self.apply_gain(id, now);
            self.emit_channel(id, events);
        }
        self.collect_degradations(events);
        Ok(new)
    }

    fn set_master(&mut self, volume: i32, now: Instant, events: &EventBus) -> u8 {
        let (old, new) = self.state.set_master_volume(volume);
        if old == new {
            return new;
        }

        let enabled = self.state.enabled_ids();
        for id in &enabled {
            self.apply_gain(id, now);
        }

        events.emit_lossy(MixerEvent::MasterVolumeChanged {
            old_volume: old,
            new_volume: new,
            timestamp: chrono::Utc::now(),
        });
        for id in &enabled {
            self.emit_channel(id, events);
        }
        self.collect_degradations(events);
        new
    }

    fn stop_all(&mut self, now: Instant, events: &EventBus) -> Vec<String> {
        let stopped: Vec<String> = self
            .state
            .channels_mut()
            .filter_map(|c| c.set_enabled(false).map(|_| c.id().to_string()))
            .collect();

        // Same start instant and duration for every fade-out
        for id in &stopped {
            self.begin_transition(id, Transition::Disabled, now);
        }
        for id in &stopped {
            self.emit_channel(id, events);
        }
        self.collect_degradations(events);
        stopped
    }

    fn apply_preset(
        &mut self,
        entries: &[PresetEntry],
        preset_name: Option<&str>,
        now: Instant,
        events: &EventBus,
    ) -> Result<()> {
        if let Some(unknown) = entries.iter().find(|e| !self.state.contains(&e.channel)) {
            return Err(Error::UnknownChannel(unknown.channel.clone()));
        }

        // Later entries for the same channel win
        let targets: HashMap<&str, u8> = entries
            .iter()
            .map(|e| (e.channel.as_str(), clamp_volume(e.volume)))
            .collect();

        // State pass: the whole mix is final before any fade is scheduled
        let mut changes: Vec<(String, Option<Transition>)> = Vec::new();
        for channel in self.state.channels_mut() {
            match targets.get(channel.id()) {
                Some(&volume) => {
                    let old_volume = channel.volume();
                    channel.set_volume(volume as i32);
                    let transition = channel.set_enabled(true);
                    if transition.is_some() || old_volume != volume {
                        changes.push((channel.id().to_string(), transition));
                    }
                }
                None => {
                    if let Some(transition) = channel.set_enabled(false) {
                        changes.push((channel.id().to_string(), Some(transition)));
                    }
                }
            }
        }

        // Fade pass
        for (id, transition) in &changes {
            match transition {
                Some(transition) => self.begin_transition(id, *transition, now),
                // Still enabled: a volume change, applied like set_volume
                None => self.apply_gain(id, now),
            }
        }

        for (id, _) in &changes {
            self.emit_channel(id, events);
        }
        events.emit_lossy(MixerEvent::PresetApplied {
            preset_name: preset_name.map(str::to_string),
            enabled_channels: self.state.enabled_ids(),
            timestamp: chrono::Utc::now(),
        });
        self.collect_degradations(events);
        Ok(())
    }

    /// Advance every fade to `now` and push the gains
    fn tick(&mut self, now: Instant, events: &EventBus) {
        for step in self.scheduler.advance(now) {
            let Some(channel) = self.state.channel_mut(&step.channel_id) else {
                continue;
            };

            channel.push_gain(step.gain);
            trace!("'{}' gain {:.3}", step.channel_id, step.gain);

            if let Some(done) = step.completed {
                if done.action == FadeAction::PauseAndRewind {
                    channel.stop_output();
                }
                debug!("Fade {:?} complete for '{}'", done.direction, step.channel_id);
                events.emit_lossy(MixerEvent::FadeCompleted {
                    channel_id: step.channel_id.clone(),
                    direction: done.direction,
                    final_gain: channel.output_gain(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }
        self.collect_degradations(events);
    }

    /// Publish channels that lost their device since the last check
    fn collect_degradations(&mut self, events: &EventBus) {
        for channel in self.state.channels_mut() {
            if let Some(err) = channel.take_degraded() {
                self.scheduler.cancel(channel.id());
                events.emit_lossy(MixerEvent::ChannelDegraded {
                    channel_id: channel.id().to_string(),
                    error: Error::DeviceUnavailable(err).to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }
    }

    fn emit_channel(&self, id: &str, events: &EventBus) {
        if let Some(channel) = self.state.channel(id) {
            events.emit_lossy(MixerEvent::ChannelChanged {
                channel_id: id.to_string(),
                enabled: channel.is_enabled(),
                volume: channel.volume(),
                effective_gain: channel.effective_gain(self.state.master_volume()),
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn snapshot(&self) -> MixerSnapshot {
        let master = self.state.master_volume();
        MixerSnapshot {
            master_volume: master,
            channels: self
                .state
                .channels()
                .map(|c| ChannelSnapshot {
                    id: c.id().to_string(),
                    volume: c.volume(),
                    enabled: c.is_enabled(),
                    effective_gain: c.effective_gain(master),
                    output_gain: c.output_gain(),
                    available: c.is_available(),
                    fading: self.scheduler.is_active(c.id()),
                })
                .collect(),
        }
    }
}

/// Mix engine - the mixer's public control surface
///
/// One instance owns every channel. Share it behind an `Arc`.
pub struct MixEngine {
    core: Arc<RwLock<MixerCore>>,
    events: Arc<EventBus>,
    presets: Vec<PresetConfig>,
    tick_interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl MixEngine {
    /// Create the engine, opening one source per configured channel
    ///
    /// Sources that fail to open become silent placeholders. Fades do not
    /// advance until [`MixEngine::start`] is called (or [`MixEngine::tick`]
    /// is driven by hand).
    pub fn new(config: &MixerConfig, device: &dyn PlaybackDevice) -> Self {
        let channels: Vec<Channel> = config
            .channels
            .iter()
            .map(|c| Channel::open(&c.id, &c.source, c.volume, device))
            .collect();

        let state = MixerState::new(channels, config.master_volume);
        let placeholders = state.channels().filter(|c| !c.is_available()).count();
        info!(
            "Mix engine created: {} channels ({} placeholders), master {}",
            state.channels().count(),
            placeholders,
            state.master_volume()
        );

        Self {
            core: Arc::new(RwLock::new(MixerCore {
                state,
                scheduler: FadeScheduler::new(),
                fade: config.fade.clone(),
            })),
            events: Arc::new(EventBus::new(EVENT_CAPACITY)),
            presets: config.presets.clone(),
            tick_interval: config.fade.tick_interval(),
            ticker: Mutex::new(None),
        }
    }

    /// Start the fade ticker task
    ///
    /// Calling start while the ticker runs is a no-op.
    pub async fn start(&self) {
        let mut ticker = self.ticker.lock().await;
        if ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let core = Arc::clone(&self.core);
        let events = Arc::clone(&self.events);
        let period = self.tick_interval;
        *ticker = Some(tokio::spawn(async move {
            let mut tick = interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                core.write().await.tick(Instant::now(), &events);
            }
        }));
        info!("Fade ticker started ({:?} per tick)", period);
    }

    /// Stop the fade ticker; fades in flight freeze until restarted
    pub async fn stop(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.abort();
            info!("Fade ticker stopped");
        }
    }

    /// Advance fades to the current instant
    ///
    /// For embedders that drive their own loop instead of [`MixEngine::start`].
    pub async fn tick(&self) {
        self.core.write().await.tick(Instant::now(), &self.events);
    }

    /// Flip a channel on or off; returns the new enabled flag
    pub async fn toggle(&self, channel_id: &str) -> Result<bool> {
        let mut core = self.core.write().await;
        let enabled = !core
            .state
            .channel(channel_id)
            .ok_or_else(|| Error::UnknownChannel(channel_id.to_string()))?
            .is_enabled();

        core.set_enabled(channel_id, enabled, Instant::now(), &self.events)?;
        info!(
            "Channel '{}' {}",
            channel_id,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(enabled)
    }

    /// Set a channel's enabled flag; no-op if unchanged
    pub async fn set_enabled(&self, channel_id: &str, enabled: bool) -> Result<()> {
        self.core
            .write()
            .await
            .set_enabled(channel_id, enabled, Instant::now(), &self.events)
    }

    /// Set a channel's volume (clamped to 0-100); applies without a fade
    pub async fn set_volume(&self, channel_id: &str, volume: i32) -> Result<u8> {
        let stored = self
            .core
            .write()
            .await
            .set_volume(channel_id, volume, Instant::now(), &self.events)?;
        info!("Channel '{}' volume {}", channel_id, stored);
        Ok(stored)
    }

    /// Set the master volume (clamped to 0-100); applies without a fade
    pub async fn set_master(&self, volume: i32) -> u8 {
        let stored = self
            .core
            .write()
            .await
            .set_master(volume, Instant::now(), &self.events);
        info!("Master volume {}", stored);
        stored
    }

    /// Disable every channel, each fading out on its own
    pub async fn stop_all(&self) {
        let stopped = self
            .core
            .write()
            .await
            .stop_all(Instant::now(), &self.events);
        info!("Stopped {} channels", stopped.len());
    }

    /// Switch the whole mix to `entries`
    ///
    /// Channels named in `entries` end up enabled at the given volumes, all
    /// others disabled, before this returns. An unknown channel rejects the
    /// whole preset without changing anything.
    pub async fn apply_preset(&self, entries: &[PresetEntry]) -> Result<()> {
        self.core
            .write()
            .await
            .apply_preset(entries, None, Instant::now(), &self.events)?;
        info!("Applied preset with {} entries", entries.len());
        Ok(())
    }

    /// Apply a preset from the configured catalogue
    pub async fn apply_named_preset(&self, name: &str) -> Result<()> {
        let preset = self
            .presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))?;

        self.core
            .write()
            .await
            .apply_preset(&preset.entries, Some(&preset.name), Instant::now(), &self.events)?;
        info!("Applied preset '{}'", preset.name);
        Ok(())
    }

    /// Preset catalogue
    pub fn presets(&self) -> &[PresetConfig] {
        &self.presets
    }

    /// Consistent copy of the whole mix
    pub async fn query_state(&self) -> MixerSnapshot {
        self.core.read().await.snapshot()
    }

    /// Subscribe to mixer change events
    pub fn subscribe(&self) -> broadcast::Receiver<MixerEvent> {
        self.events.subscribe()
    }

    /// Stop the ticker and release every device handle
    pub async fn shutdown(&self) {
        self.stop().await;
        let mut core = self.core.write().await;
        core.scheduler.clear();
        core.state.dispose_all();
        info!("Mix engine shut down");
    }
}
