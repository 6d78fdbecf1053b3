//! Tracing playback device
//!
//! Stand-in output used by the `soundscape-mixer` binary. A source opens only
//! if its file exists under the sounds folder (when one is configured); every
//! call on an open source is traced instead of rendered.

use super::{DeviceError, PlaybackDevice, SourceHandle};
use std::path::PathBuf;
use tracing::{debug, trace};

/// Device that validates sources on disk and logs every call
#[derive(Debug, Clone, Default)]
pub struct LoggingDevice {
    sounds_folder: Option<PathBuf>,
}

impl LoggingDevice {
    pub fn new(sounds_folder: Option<PathBuf>) -> Self {
        Self { sounds_folder }
    }

    fn resolve(&self, source: &str) -> Result<PathBuf, DeviceError> {
        match &self.sounds_folder {
            Some(folder) => {
                let path = folder.join(source);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(DeviceError::SourceUnavailable(path.display().to_string()))
                }
            }
            None => Ok(PathBuf::from(source)),
        }
    }
}

impl PlaybackDevice for LoggingDevice {
    fn open(&self, source: &str) -> Result<Box<dyn SourceHandle>, DeviceError> {
        let path = self.resolve(source)?;
        debug!("Opened looping source {}", path.display());
        Ok(Box::new(LoggingSource {
            name: source.to_string(),
            disposed: false,
        }))
    }
}

struct LoggingSource {
    name: String,
    disposed: bool,
}

impl LoggingSource {
    fn check(&self, operation: &'static str) -> Result<(), DeviceError> {
        if self.disposed {
            return Err(DeviceError::CallFailed {
                source_id: self.name.clone(),
                operation,
                reason: "source already disposed".to_string(),
            });
        }
        Ok(())
    }
}

impl SourceHandle for LoggingSource {
    fn set_gain(&mut self, gain: f32) -> Result<(), DeviceError> {
        self.check("set_gain")?;
        trace!("{}: gain {:.3}", self.name, gain);
        Ok(())
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        self.check("play")?;
        debug!("{}: play", self.name);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.check("pause")?;
        debug!("{}: pause", self.name);
        Ok(())
    }

    fn rewind_to_start(&mut self) -> Result<(), DeviceError> {
        self.check("rewind_to_start")?;
        debug!("{}: rewind", self.name);
        Ok(())
    }

    fn dispose(&mut self) -> Result<(), DeviceError> {
        self.check("dispose")?;
        self.disposed = true;
        debug!("{}: disposed", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_opens_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("rain.mp3"), b"loop").unwrap();

        let device = LoggingDevice::new(Some(dir.path().to_path_buf()));
        assert!(device.open("rain.mp3").is_ok());
        assert!(matches!(
            device.open("wind.mp3"),
            Err(DeviceError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_without_folder_accepts_any_source() {
        let device = LoggingDevice::new(None);
        let mut handle = device.open("anything.ogg").unwrap();
        assert!(handle.play().is_ok());
        assert!(handle.dispose().is_ok());
        assert!(handle.set_gain(0.5).is_err(), "calls after dispose fail");
    }
}
