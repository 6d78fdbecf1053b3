//! Tests for mixer configuration loading
//!
//! Covers:
//! - Missing config files fall back to built-in defaults
//! - Partial TOML files keep defaults for omitted fields
//! - Catalogue validation (duplicate ids, unknown preset channels)
//! - Config path resolution through the environment variable
//!
//! Tests that manipulate SOUNDSCAPE_CONFIG are marked #[serial].

use serial_test::serial;
use soundscape_common::config::{MixerConfig, PresetEntry, CONFIG_ENV_VAR};
use soundscape_common::{Error, FadeCurve};
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = write_config(
        r#"
master_volume = 55

[fade]
fade_in_secs = 2.5
"#,
    );

    let config = MixerConfig::load(file.path()).expect("config should load");
    assert_eq!(config.master_volume, 55);
    assert_eq!(config.fade.fade_in(), Duration::from_millis(2500));
    assert_eq!(config.fade.fade_out(), Duration::from_secs(1));
    assert_eq!(config.fade.fade_out_curve, FadeCurve::Logarithmic);
    assert_eq!(config.channels.len(), 6, "channel catalogue stays at defaults");
    assert_eq!(config.server.port, 5790);
}

#[test]
fn test_custom_catalogue_and_presets() {
    let file = write_config(
        r#"
sounds_folder = "/srv/sounds"

[fade]
fade_in_curve = "cosine"

[[channels]]
id = "rain"
source = "rain-loop.ogg"
volume = 80

[[channels]]
id = "fire"
source = "fire.ogg"

[[presets]]
name = "Cabin"
entries = [{ channel = "rain", volume = 30 }, { channel = "fire", volume = 90 }]
"#,
    );

    let config = MixerConfig::load(file.path()).expect("config should load");
    assert_eq!(config.fade.fade_in_curve, FadeCurve::SCurve);
    assert_eq!(config.channels.len(), 2);
    assert_eq!(config.channels[0].volume, 80);
    assert_eq!(config.channels[1].volume, 50, "omitted volume uses default");

    let cabin = config.preset("Cabin").expect("preset present");
    assert_eq!(
        cabin.entries,
        vec![PresetEntry::new("rain", 30), PresetEntry::new("fire", 90)]
    );
}

#[test]
fn test_duplicate_channel_rejected() {
    let result = MixerConfig::from_toml_str(
        r#"
[[channels]]
id = "rain"
source = "a.ogg"

[[channels]]
id = "rain"
source = "b.ogg"
"#,
    );

    assert!(matches!(result, Err(Error::Config(_))), "got {:?}", result);
}

#[test]
fn test_preset_with_unknown_channel_rejected() {
    let result = MixerConfig::from_toml_str(
        r#"
[[presets]]
name = "Storm"
entries = [{ channel = "thunder", volume = 80 }]
"#,
    );

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("thunder"), "message: {}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let result = MixerConfig::from_toml_str("master_volume = [not a number");
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
#[serial]
fn test_env_var_points_at_config() {
    let file = write_config("master_volume = 33\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = MixerConfig::load_or_default(None).expect("config should load");
    assert_eq!(config.master_volume, 33);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = MixerConfig::load_or_default(Some(&missing)).expect("defaults");
    assert_eq!(config, MixerConfig::default());
}
