//! Timbral Analysis - from a raw recording to timed, pitched events
//!
//! This crate provides the analysis half of the pipeline:
//!
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`onset`] - Onset/offset segmentation of a sample buffer
//! - [`pitch`] - Fundamental frequency estimation
//! - [`transcribe`](mod@transcribe) - Segmentation + pitch assignment into a [`Melody`](timbral_core::Melody)
//! - [`features`] - Per-note partial, noise and attack features used to build note models
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use timbral_analysis::{OnsetSegmenter, SpectralPitchEstimator, Window, transcribe};
//! use timbral_core::CancelToken;
//!
//! // 1. Load a recording (external)
//! let buffer = load_recording();
//!
//! // 2. Segment and assign pitches
//! let melody = transcribe(
//!     &buffer,
//!     &OnsetSegmenter::new(-40.0, 50, 100),
//!     &SpectralPitchEstimator::default(),
//!     Window::Hann,
//!     &CancelToken::new(),
//! )?;
//!
//! for event in melody.events() {
//!     println!("note {} at {} ms", event.note_number, event.start_ms);
//! }
//! ```

pub mod features;
pub mod fft;
pub mod onset;
pub mod pitch;
pub mod transcribe;

// Re-export main types
pub use features::{FeatureExtractor, NoteFeatures, PartialTrack};
pub use fft::{Fft, Window};
pub use onset::{OnsetSegmenter, Segment, segment, segment_with_threshold};
pub use pitch::{PitchEstimator, SpectralPitchEstimator};
pub use transcribe::transcribe;
