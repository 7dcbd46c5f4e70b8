//! Pipeline settings stored as TOML.
//!
//! Every field has a default, so a settings file only needs the values it
//! changes:
//!
//! ```toml
//! [segmentation]
//! min_decibel = -35.0
//!
//! [render]
//! enable_sustain = false
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use timbral_analysis::{FeatureExtractor, OnsetSegmenter, SpectralPitchEstimator, Window};
use timbral_synth::{CompositorSettings, RenderRequest, TimeWindow};

use crate::error::ConfigError;
use crate::paths::default_settings_path;
use crate::validation::{ValidationResult, validate_settings};

/// Onset segmentation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Activity threshold in dBFS.
    pub min_decibel: f32,
    /// Shortest reported event.
    pub min_length_ms: u32,
    /// Longest gap bridged inside one event.
    pub max_silence_ms: u32,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            min_decibel: -40.0,
            min_length_ms: 50,
            max_silence_ms: 100,
        }
    }
}

impl SegmentationSettings {
    /// Segmenter configured with these values.
    pub fn segmenter(&self) -> OnsetSegmenter {
        OnsetSegmenter::new(self.min_decibel, self.min_length_ms, self.max_silence_ms)
    }
}

/// Pitch estimation and note analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Analysis frame length in samples.
    pub fft_size: usize,
    /// Frame spacing for note features.
    pub hop_size: usize,
    /// Window name (see [`Window`]).
    pub window: String,
    /// Lowest detectable fundamental in Hz.
    pub min_frequency: f32,
    /// Highest detectable fundamental in Hz.
    pub max_frequency: f32,
    /// Harmonics tracked per note.
    pub partials: usize,
    /// Length of the captured attack.
    pub transient_ms: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            hop_size: 1024,
            window: Window::Hann.name().to_string(),
            min_frequency: 40.0,
            max_frequency: 2000.0,
            partials: 16,
            transient_ms: 30,
        }
    }
}

impl AnalysisSettings {
    /// Parsed window, falling back to Hann for an unknown name.
    ///
    /// Run [`Settings::validate`] first to reject unknown names instead.
    pub fn window(&self) -> Window {
        Window::from_str(&self.window).unwrap_or_default()
    }

    /// Pitch estimator configured with these values.
    pub fn pitch_estimator(&self) -> SpectralPitchEstimator {
        SpectralPitchEstimator::new(self.fft_size, self.min_frequency, self.max_frequency)
    }

    /// Feature extractor configured with these values.
    pub fn feature_extractor(&self) -> FeatureExtractor {
        FeatureExtractor::new(
            self.fft_size,
            self.hop_size,
            self.window(),
            self.partials,
            self.transient_ms,
        )
    }
}

/// Rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output sample rate.
    pub sample_rate: u32,
    /// Global peak ceiling (linear).
    pub ceiling: f32,
    /// Margin below the ceiling in dB.
    pub headroom_db: f32,
    /// Tail fade in milliseconds.
    pub fade_ms: u32,
    /// Progress share of the per-pitch pass.
    pub pass_split: f32,
    /// Let notes ring past their nominal length.
    pub enable_sustain: bool,
    /// Seed for synthesized phases.
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        let compositor = CompositorSettings::default();
        let request = RenderRequest::default();
        Self {
            sample_rate: request.sample_rate,
            ceiling: compositor.ceiling,
            headroom_db: compositor.headroom_db,
            fade_ms: compositor.fade_ms,
            pass_split: compositor.pass_split,
            enable_sustain: request.enable_sustain,
            seed: request.seed,
        }
    }
}

impl RenderSettings {
    /// Compositor settings from these values.
    pub fn compositor_settings(&self) -> CompositorSettings {
        CompositorSettings {
            ceiling: self.ceiling,
            headroom_db: self.headroom_db,
            fade_ms: self.fade_ms,
            pass_split: self.pass_split,
        }
    }

    /// Render request for `window` using these values.
    pub fn request(&self, window: TimeWindow) -> RenderRequest {
        RenderRequest {
            window,
            sample_rate: self.sample_rate,
            enable_sustain: self.enable_sustain,
            seed: self.seed,
        }
    }
}

/// All pipeline settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Onset segmentation.
    pub segmentation: SegmentationSettings,
    /// Pitch and feature analysis.
    pub analysis: AnalysisSettings,
    /// Melody rendering.
    pub render: RenderSettings,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save settings to a TOML file, creating parent directories.
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

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check all values; see [`validate_settings`].
    pub fn validate(&self) -> ValidationResult<()> {
        validate_settings(self)
    }

    /// Settings for a run: `explicit` if given, else the user settings file
    /// if it exists, else defaults. The result is validated.
    ///
    /// Returns the settings and the file they came from.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Some(default_settings_path()).filter(|p| p.is_file()),
        };
        let settings = match &path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        settings.validate()?;
        Ok((settings, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let s = Settings::from_toml(
            r#"
            [segmentation]
            min_decibel = -35.0

            [render]
            enable_sustain = false
            "#,
        )
        .unwrap();
        assert_eq!(s.segmentation.min_decibel, -35.0);
        assert_eq!(s.segmentation.max_silence_ms, 100);
        assert!(!s.render.enable_sustain);
        assert_eq!(s.render.sample_rate, 44100);
        assert_eq!(s.analysis, AnalysisSettings::default());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn toml_round_trip() {
        let mut s = Settings::default();
        s.analysis.window = "blackman-harris".to_string();
        s.render.seed = 42;
        let back = Settings::from_toml(&s.to_toml().unwrap()).unwrap();
        assert_eq!(back, s);
        assert_eq!(back.analysis.window(), Window::BlackmanHarris);
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = Settings::from_toml("[render]\nsample_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn builds_pipeline_parts() {
        let s = Settings::default();
        assert_eq!(s.segmentation.segmenter(), OnsetSegmenter::default());
        assert_eq!(s.render.compositor_settings(), CompositorSettings::default());
        let req = s.render.request(TimeWindow::new(0.1, 0.9));
        assert_eq!(req.sample_rate, 44100);
        assert_eq!(req.window, TimeWindow::new(0.1, 0.9));
        assert_eq!(s.analysis.pitch_estimator().frame_size(), 4096);
    }
}
