//! Timbral Synth - note models, pitch interpolation and melody rendering
//!
//! This crate turns analysed recordings into playable instruments and renders
//! melodies with them.
//!
//! # Core Components
//!
//! ## Note Models
//!
//! - [`NoteModel`] - One pitch: length plus optional sinusoid, transient and noise parts
//! - [`Component`] - Render / interpolate / attenuate capability of the three parts
//! - [`SinusoidModel`], [`TransientModel`], [`NoiseModel`]
//!
//! ## Instruments
//!
//! - [`Instrument`] - Sparse pitch → model mapping
//! - [`InstrumentBuilder`] - Builds an instrument from a recording and its melody
//! - [`note_at`] - Model for any pitch, interpolated between recorded neighbors
//!
//! ```rust
//! use timbral_core::CancelToken;
//! use timbral_synth::{Instrument, NoteModel};
//!
//! let mut instrument = Instrument::new();
//! instrument.add_note(40, NoteModel::new(1000)).unwrap();
//! instrument.add_note(60, NoteModel::new(2000)).unwrap();
//!
//! let note = instrument.note_at(50, &CancelToken::new()).unwrap().unwrap();
//! assert_eq!(note.length_ms, 1500);
//! ```
//!
//! ## Rendering
//!
//! - [`Compositor`] - Two-pass melody renderer with loudness normalization
//! - [`RenderRequest`] / [`TimeWindow`] - What to render
//! - [`CompositorSettings`] - Ceiling, headroom and fade
//!
//! ```rust,ignore
//! use timbral_core::{CancelToken, Progress};
//! use timbral_synth::{Compositor, RenderRequest};
//!
//! let output = Compositor::default().render(
//!     &melody,
//!     &instrument,
//!     &RenderRequest::default(),
//!     &mut Progress::new(),
//!     &CancelToken::new(),
//! )?;
//! ```

pub mod builder;
pub mod compositor;
pub mod instrument;
pub mod model;
pub mod note_synth;

pub use builder::InstrumentBuilder;
pub use compositor::{Compositor, CompositorSettings, RenderRequest, TimeWindow};
pub use instrument::{Instrument, InstrumentError};
pub use model::{Component, NoiseModel, NoteModel, Partial, SinusoidModel, TransientModel};
pub use note_synth::{Bracket, note_at};
