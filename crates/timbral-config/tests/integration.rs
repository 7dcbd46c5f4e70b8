//! Integration tests for timbral-config.
//!
//! These tests exercise file round-trips through a temporary directory.

use tempfile::TempDir;
use timbral_config::{ConfigError, MelodyFile, Settings, ValidationError};
use timbral_core::{Melody, TimedEvent};

#[test]
fn settings_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("settings.toml");

    let mut settings = Settings::default();
    settings.segmentation.min_decibel = -30.0;
    settings.render.enable_sustain = false;
    settings.save(&path).unwrap();

    assert!(path.is_file());
    assert_eq!(Settings::load(&path).unwrap(), settings);
}

#[test]
fn resolve_prefers_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[render]\nseed = 99\n").unwrap();

    let (settings, source) = Settings::resolve(Some(&path)).unwrap();
    assert_eq!(settings.render.seed, 99);
    assert_eq!(source.as_deref(), Some(path.as_path()));
}

#[test]
fn resolve_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[analysis]\npartials = 0\n").unwrap();

    let err = Settings::resolve(Some(&path)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::Zero(ref f)) if f == "analysis.partials"
    ));
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn melody_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("melody.toml");
    let melody = Melody::new(
        vec![
            TimedEvent::new(60, 0.8, 0, 500),
            TimedEvent::new(64, 0.6, 500, 500),
            TimedEvent::new(67, 0.4, 1000, 1000),
        ],
        2500,
    );

    MelodyFile::from(&melody).save(&path).unwrap();
    let loaded = MelodyFile::load(&path).unwrap();
    loaded.validate().unwrap();
    assert_eq!(loaded.to_melody(), melody);
}
