//! In-memory playback device
//!
//! Records every call it receives so callers can inspect the exact gain
//! trace each source was driven through. Sources can be configured to fail
//! on open, or to fail every call after opening.

use super::{DeviceError, PlaybackDevice, SourceHandle};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Open(String),
    SetGain(String, f32),
    Play(String),
    Pause(String),
    Rewind(String),
    Dispose(String),
}

impl DeviceCall {
    /// Source the call was made for
    pub fn source(&self) -> &str {
        match self {
            DeviceCall::Open(s)
            | DeviceCall::SetGain(s, _)
            | DeviceCall::Play(s)
            | DeviceCall::Pause(s)
            | DeviceCall::Rewind(s)
            | DeviceCall::Dispose(s) => s,
        }
    }
}

#[derive(Debug, Default)]
struct DeviceLog {
    calls: Vec<DeviceCall>,
    missing: HashSet<String>,
    failing: HashSet<String>,
}

/// Playback device that keeps everything in memory
///
/// Cloning shares the same call log.
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    log: Arc<Mutex<DeviceLog>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail for `source`
    pub fn with_missing_source(self, source: &str) -> Self {
        self.lock().missing.insert(source.to_string());
        self
    }

    /// Make every call on an opened `source` fail
    pub fn fail_calls_for(&self, source: &str) {
        self.lock().failing.insert(source.to_string());
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls for one source, in order
    pub fn calls_for(&self, source: &str) -> Vec<DeviceCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.source() == source)
            .cloned()
            .collect()
    }

    /// Gain values pushed to one source, in order
    pub fn gains_for(&self, source: &str) -> Vec<f32> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DeviceCall::SetGain(s, gain) if s == source => Some(*gain),
                _ => None,
            })
            .collect()
    }

    /// Last gain pushed to one source
    pub fn last_gain(&self, source: &str) -> Option<f32> {
        self.gains_for(source).last().copied()
    }

    /// Forget recorded calls (failure settings are kept)
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, DeviceLog> {
        // A panicking test thread must not hide the log from the others
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PlaybackDevice for MemoryDevice {
    fn open(&self, source: &str) -> Result<Box<dyn SourceHandle>, DeviceError> {
        let mut log = self.lock();
        if log.missing.contains(source) {
            return Err(DeviceError::SourceUnavailable(source.to_string()));
        }
        log.calls.push(DeviceCall::Open(source.to_string()));
        Ok(Box::new(MemorySource {
            source: source.to_string(),
            device: self.clone(),
        }))
    }
}

struct MemorySource {
    source: String,
    device: MemoryDevice,
}

impl MemorySource {
    fn record(&self, operation: &'static str, call: DeviceCall) -> Result<(), DeviceError> {
        let mut log = self.device.lock();
        if log.failing.contains(&self.source) {
            return Err(DeviceError::CallFailed {
                source_id: self.source.clone(),
                operation,
                reason: "injected failure".to_string(),
            });
        }
        log.calls.push(call);
        Ok(())
    }
}

impl SourceHandle for MemorySource {
    fn set_gain(&mut self, gain: f32) -> Result<(), DeviceError> {
        self.record("set_gain", DeviceCall::SetGain(self.source.clone(), gain))
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        self.record("play", DeviceCall::Play(self.source.clone()))
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.record("pause", DeviceCall::Pause(self.source.clone()))
    }

    fn rewind_to_start(&mut self) -> Result<(), DeviceError> {
        self.record("rewind_to_start", DeviceCall::Rewind(self.source.clone()))
    }

    fn dispose(&mut self) -> Result<(), DeviceError> {
        self.record("dispose", DeviceCall::Dispose(self.source.clone()))
    }
}
