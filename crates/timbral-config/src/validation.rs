//! Settings and melody validation.
//!
//! Validation collects every problem instead of stopping at the first, so a
//! user fixing a settings file sees all of them at once.
//!
//! # Example
//!
//! ```rust
//! use timbral_config::{Settings, ValidationError};
//!
//! let mut settings = Settings::default();
//! assert!(settings.validate().is_ok());
//!
//! settings.render.sample_rate = 0;
//! assert_eq!(
//!     settings.validate(),
//!     Err(ValidationError::Zero("render.sample_rate".to_string()))
//! );
//! ```

use std::str::FromStr;

use thiserror::Error;
use timbral_analysis::Window;

use crate::melody_file::MelodyFile;
use crate::settings::Settings;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A count, size or rate is zero.
    #[error("'{0}' must not be zero")]
    Zero(String),

    /// Value outside its allowed range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted field name.
        field: String,
        /// The offending value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Two bounds in the wrong order.
    #[error("'{low}' must be below '{high}'")]
    Inverted {
        /// Field that should hold the lower bound.
        low: String,
        /// Field that should hold the upper bound.
        high: String,
    },

    /// Window name not recognized.
    #[error("unknown window '{0}'")]
    UnknownWindow(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Accumulates issues while checking one document.
#[derive(Default)]
struct Issues(Vec<ValidationError>);

impl Issues {
    fn nonzero(&mut self, field: &str, value: u64) {
        if value == 0 {
            self.0.push(ValidationError::Zero(field.to_string()));
        }
    }

    fn range(&mut self, field: &str, value: f64, min: f64, max: f64) {
        if !(min..=max).contains(&value) {
            self.0.push(ValidationError::OutOfRange {
                field: field.to_string(),
                value,
                min,
                max,
            });
        }
    }

    fn ordered(&mut self, low: &str, low_value: f64, high: &str, high_value: f64) {
        if low_value >= high_value {
            self.0.push(ValidationError::Inverted {
                low: low.to_string(),
                high: high.to_string(),
            });
        }
    }

    fn finish(mut self) -> ValidationResult<()> {
        match self.0.len() {
            0 => Ok(()),
            1 => Err(self.0.remove(0)),
            _ => Err(ValidationError::Multiple(self.0)),
        }
    }
}

/// Check every section of `settings`.
pub fn validate_settings(settings: &Settings) -> ValidationResult<()> {
    let mut issues = Issues::default();

    let seg = &settings.segmentation;
    issues.range(
        "segmentation.min_decibel",
        f64::from(seg.min_decibel),
        -200.0,
        0.0,
    );

    let an = &settings.analysis;
    issues.nonzero("analysis.fft_size", an.fft_size as u64);
    issues.nonzero("analysis.hop_size", an.hop_size as u64);
    if an.hop_size > an.fft_size {
        issues.0.push(ValidationError::Inverted {
            low: "analysis.hop_size".to_string(),
            high: "analysis.fft_size".to_string(),
        });
    }
    if Window::from_str(&an.window).is_err() {
        issues.0.push(ValidationError::UnknownWindow(an.window.clone()));
    }
    issues.range(
        "analysis.min_frequency",
        f64::from(an.min_frequency),
        1.0,
        20_000.0,
    );
    issues.ordered(
        "analysis.min_frequency",
        f64::from(an.min_frequency),
        "analysis.max_frequency",
        f64::from(an.max_frequency),
    );
    issues.nonzero("analysis.partials", an.partials as u64);

    let r = &settings.render;
    issues.nonzero("render.sample_rate", u64::from(r.sample_rate));
    issues.range("render.ceiling", f64::from(r.ceiling), 1e-6, 1.0);
    issues.range("render.headroom_db", f64::from(r.headroom_db), 0.0, 120.0);
    issues.range("render.pass_split", f64::from(r.pass_split), 0.0, 1.0);

    issues.finish()
}

/// Check a melody file: amplitudes in [0, 1].
pub fn validate_melody(melody: &MelodyFile) -> ValidationResult<()> {
    let mut issues = Issues::default();
    for (i, event) in melody.events.iter().enumerate() {
        issues.range(
            &format!("events[{i}].amplitude"),
            f64::from(event.amplitude),
            0.0,
            1.0,
        );
    }
    issues.finish()
}

/// Check a render window given as fractions of the melody length.
pub fn validate_time_window(start: f32, end: f32) -> ValidationResult<()> {
    let mut issues = Issues::default();
    issues.range("start", f64::from(start), 0.0, 1.0);
    issues.range("end", f64::from(end), 0.0, 1.0);
    issues.ordered("start", f64::from(start), "end", f64::from(end));
    issues.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melody_file::EventEntry;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_settings(&Settings::default()), Ok(()));
    }

    #[test]
    fn all_issues_are_reported() {
        let mut s = Settings::default();
        s.analysis.min_frequency = 3000.0;
        s.analysis.window = "triangle".to_string();
        s.render.pass_split = 1.5;

        let Err(ValidationError::Multiple(errors)) = validate_settings(&s) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::UnknownWindow("triangle".to_string())));
        assert!(errors.contains(&ValidationError::Inverted {
            low: "analysis.min_frequency".to_string(),
            high: "analysis.max_frequency".to_string(),
        }));
    }

    #[test]
    fn hop_larger_than_frame() {
        let mut s = Settings::default();
        s.analysis.hop_size = s.analysis.fft_size * 2;
        assert!(matches!(
            validate_settings(&s),
            Err(ValidationError::Inverted { .. })
        ));
    }

    #[test]
    fn melody_amplitudes() {
        let melody = MelodyFile {
            length_ms: 0,
            events: vec![
                EventEntry {
                    note: 60,
                    amplitude: 0.5,
                    start_ms: 0,
                    length_ms: 10,
                },
                EventEntry {
                    note: 62,
                    amplitude: 1.5,
                    start_ms: 10,
                    length_ms: 10,
                },
            ],
        };
        let err = validate_melody(&melody).unwrap_err();
        assert_eq!(
            err.to_string(),
            "'events[1].amplitude' value 1.5 out of range [0, 1]"
        );
    }

    #[test]
    fn time_window() {
        assert!(validate_time_window(0.0, 1.0).is_ok());
        assert!(validate_time_window(0.5, 0.5).is_err());
        assert!(matches!(
            validate_time_window(0.8, 0.2),
            Err(ValidationError::Inverted { .. })
        ));
        assert!(matches!(
            validate_time_window(-0.1, 2.0),
            Err(ValidationError::Multiple(_))
        ));
    }
}
