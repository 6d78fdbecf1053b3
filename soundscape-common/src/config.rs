//! Configuration loading and config file resolution
//!
//! The mixer is configured from a single TOML file. Every field has a
//! built-in default, so a missing file yields the stock six-channel
//! soundscape with its preset catalogue.
//!
//! Config file resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. `soundscape/config.toml` in the user config directory
//! 4. Built-in defaults (no file)

use crate::fade_curves::FadeCurve;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SOUNDSCAPE_CONFIG";

/// Lowest tick rate that still sounds smooth
pub const MIN_TICK_RATE_HZ: u32 = 30;

/// Highest tick rate; keeps the tick interval well above zero
pub const MAX_TICK_RATE_HZ: u32 = 1000;

/// Longest fade accepted from configuration
const MAX_FADE_SECS: f64 = 60.0;

/// Complete mixer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Initial master volume (0-100)
    pub master_volume: i32,

    /// Folder holding the looping sound files (optional)
    pub sounds_folder: Option<PathBuf>,

    /// Fade timing
    pub fade: FadeConfig,

    /// Channel catalogue, in display order
    pub channels: Vec<ChannelConfig>,

    /// Preset catalogue, in display order
    pub presets: Vec<PresetConfig>,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Fade timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Fade-in duration when a channel is enabled
    pub fade_in_secs: f64,

    /// Fade-out duration when a channel is disabled
    pub fade_out_secs: f64,

    /// Scheduler tick rate (raised to 30 Hz if lower)
    pub tick_rate_hz: u32,

    /// Curve for rising gain
    pub fade_in_curve: FadeCurve,

    /// Curve for falling gain
    pub fade_out_curve: FadeCurve,
}

/// One channel of the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Stable channel id (e.g. "rain")
    pub id: String,

    /// Source identifier handed to the playback device
    pub source: String,

    /// Initial channel volume (0-100)
    #[serde(default = "default_channel_volume")]
    pub volume: i32,
}

/// A named preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetConfig {
    /// Display name
    pub name: String,

    /// Channels enabled by the preset and their volumes
    #[serde(default)]
    pub entries: Vec<PresetEntry>,
}

/// One (channel, volume) pair of a preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetEntry {
    /// Channel id
    pub channel: String,

    /// Channel volume; clamped to 0-100 when applied
    pub volume: i32,
}

impl PresetEntry {
    pub fn new(channel: impl Into<String>, volume: i32) -> Self {
        Self {
            channel: channel.into(),
            volume,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

fn default_channel_volume() -> i32 {
    50
}

/// The six stock sounds, in declaration order
const DEFAULT_CHANNELS: [&str; 6] = ["rain", "wind", "waves", "forest", "coffee", "piano"];

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            master_volume: 70,
            sounds_folder: None,
            fade: FadeConfig::default(),
            channels: DEFAULT_CHANNELS
                .iter()
                .map(|id| ChannelConfig {
                    id: id.to_string(),
                    source: format!("{}.mp3", id),
                    volume: default_channel_volume(),
                })
                .collect(),
            presets: default_presets(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_presets() -> Vec<PresetConfig> {
    let preset = |name: &str, entries: &[(&str, i32)]| PresetConfig {
        name: name.to_string(),
        entries: entries
            .iter()
            .map(|(channel, volume)| PresetEntry::new(*channel, *volume))
            .collect(),
    };

    vec![
        preset("Rainy Café", &[("rain", 60), ("coffee", 40)]),
        preset("Seaside", &[("waves", 70), ("wind", 30)]),
        preset("Deep Forest", &[("forest", 65), ("rain", 20)]),
        preset("Quiet Study", &[("piano", 45), ("rain", 25)]),
    ]
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_in_secs: 1.8,
            fade_out_secs: 1.0,
            tick_rate_hz: 60,
            fade_in_curve: FadeCurve::Exponential,
            fade_out_curve: FadeCurve::Logarithmic,
        }
    }
}

impl FadeConfig {
    /// Fade-in duration
    pub fn fade_in(&self) -> Duration {
        secs_to_duration(self.fade_in_secs)
    }

    /// Fade-out duration
    pub fn fade_out(&self) -> Duration {
        secs_to_duration(self.fade_out_secs)
    }

    /// Interval between scheduler ticks
    pub fn tick_interval(&self) -> Duration {
        let hz = self.tick_rate_hz.clamp(MIN_TICK_RATE_HZ, MAX_TICK_RATE_HZ);
        Duration::from_secs_f64(1.0 / hz as f64)
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs.min(MAX_FADE_SECS))
    } else {
        Duration::ZERO
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 5790 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl MixerConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded mixer configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MixerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file and load it, falling back to built-in defaults
    ///
    /// A missing file is not an error; a file that exists but fails to parse
    /// or validate is.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg, std::env::var(CONFIG_ENV_VAR).ok().as_deref()) {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check catalogue consistency
    ///
    /// - Channel ids are non-empty and unique
    /// - Preset names are unique
    /// - Presets only reference catalogue channels
    /// - Fade durations are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for channel in &self.channels {
            if channel.id.trim().is_empty() {
                return Err(Error::Config("channel id must not be empty".to_string()));
            }
            if !ids.insert(channel.id.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate channel id '{}'",
                    channel.id
                )));
            }
        }

        let mut names = HashSet::new();
        for preset in &self.presets {
            if !names.insert(preset.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate preset name '{}'",
                    preset.name
                )));
            }
            if let Some(entry) = preset.entries.iter().find(|e| !ids.contains(e.channel.as_str())) {
                return Err(Error::Config(format!(
                    "preset '{}' references unknown channel '{}'",
                    preset.name, entry.channel
                )));
            }
        }

        for (name, secs) in [
            ("fade_in_secs", self.fade.fade_in_secs),
            ("fade_out_secs", self.fade.fade_out_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(Error::Config(format!("{} must be a non-negative number", name)));
            }
        }

        Ok(())
    }

    /// Look up a preset by display name
    pub fn preset(&self, name: &str) -> Option<&PresetConfig> {
        self.presets.iter().find(|p| p.name == name)
    }
}

/// Config file resolution
///
/// 1. Command-line argument
/// 2. Environment variable value
/// 3. User config directory (`soundscape/config.toml`) if present
pub fn resolve_config_path(cli_arg: Option<&Path>, env_value: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("soundscape").join("config.toml"))
        .filter(|p| p.exists())
}
