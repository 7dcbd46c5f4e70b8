//! Melody files.
//!
//! A melody is stored as an array of event tables:
//!
//! ```toml
//! length_ms = 2000
//!
//! [[events]]
//! note = 60
//! amplitude = 0.8
//! start_ms = 0
//! length_ms = 500
//! ```
//!
//! `length_ms` may be omitted; the melody then ends with its last event.

use std::path::Path;

use serde::{Deserialize, Serialize};
use timbral_core::{Melody, TimedEvent};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_melody};

/// One event as written in a melody file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    /// Note number (69 = A4).
    pub note: i32,
    /// Linear amplitude in [0, 1].
    pub amplitude: f32,
    /// Onset in milliseconds.
    pub start_ms: u32,
    /// Duration in milliseconds.
    pub length_ms: u32,
}

impl From<&TimedEvent> for EventEntry {
    fn from(event: &TimedEvent) -> Self {
        Self {
            note: event.note_number,
            amplitude: event.amplitude,
            start_ms: event.start_ms,
            length_ms: event.length_ms,
        }
    }
}

/// Serialized melody.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MelodyFile {
    /// Total length in milliseconds.
    #[serde(default)]
    pub length_ms: u32,
    /// Events in any order.
    #[serde(default)]
    pub events: Vec<EventEntry>,
}

impl From<&Melody> for MelodyFile {
    fn from(melody: &Melody) -> Self {
        Self {
            length_ms: melody.length_ms(),
            events: melody.events().iter().map(EventEntry::from).collect(),
        }
    }
}

impl MelodyFile {
    /// Convert to a [`Melody`]; events are sorted and the length extended to
    /// cover them.
    pub fn to_melody(&self) -> Melody {
        Melody::new(
            self.events
                .iter()
                .map(|e| TimedEvent::new(e.note, e.amplitude, e.start_ms, e.length_ms))
                .collect(),
            self.length_ms,
        )
    }

    /// Check event values; see [`validate_melody`].
    pub fn validate(&self) -> ValidationResult<()> {
        validate_melody(self)
    }

    /// Load a melody file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a melody from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the melody, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
