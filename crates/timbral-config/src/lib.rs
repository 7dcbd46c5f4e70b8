//! Configuration and melody files for timbral.
//!
//! # Features
//!
//! - **Settings**: Segmentation, analysis and render parameters in one TOML file
//! - **Melody files**: Transcribed or hand-written melodies as TOML event lists
//! - **Validation**: Every out-of-range value reported at once
//! - **Paths**: Platform-specific config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use timbral_config::{MelodyFile, Settings};
//!
//! let settings = Settings::load("settings.toml").unwrap();
//! settings.validate().unwrap();
//!
//! let melody = MelodyFile::load("melody.toml").unwrap().to_melody();
//! let segmenter = settings.segmentation.segmenter();
//! ```

mod error;
mod melody_file;
mod settings;

/// Platform-specific configuration paths.
pub mod paths;

/// Settings and melody validation.
pub mod validation;

pub use error::ConfigError;
pub use melody_file::{EventEntry, MelodyFile};
pub use paths::{default_settings_path, ensure_user_config_dir, user_config_dir};
pub use settings::{AnalysisSettings, RenderSettings, SegmentationSettings, Settings};
pub use validation::{
    ValidationError, ValidationResult, validate_melody, validate_settings, validate_time_window,
};
