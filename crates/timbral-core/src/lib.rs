//! Timbral Core - shared primitives for the spectral instrument pipeline
//!
//! This crate holds the small, dependency-light building blocks that the
//! analysis and synthesis crates agree on. Nothing in here knows about FFTs or
//! note models; it only describes audio, time and the control signals that run
//! alongside long computations.
//!
//! # Core Abstractions
//!
//! ## Audio and Time
//!
//! - [`SampleBuffer`] - Mono `f32` PCM samples paired with an effective sample rate
//! - [`TimedEvent`] - Immutable pitched event (note number, amplitude, start, length)
//! - [`Melody`] - Start-ordered events plus a total length that always covers them
//!
//! ## Control Signals
//!
//! - [`CancelToken`] / [`Cancelled`] - Cooperative cancellation polled at item boundaries
//! - [`Progress`] / [`ProgressScope`] - Hierarchical progress reporting
//! - [`PhaseRng`] - Deterministic, injectable pseudo-random source for phase selection
//!
//! ## Utilities
//!
//! - Level conversions: [`db_to_linear`], [`linear_to_db`]
//! - Pitch conversions: [`note_to_frequency`], [`note_from_frequency`]
//! - Time conversions: [`ms_to_samples`], [`samples_to_ms`]
//! - [`lerp`], [`clamp`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! timbral-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use timbral_core::{CancelToken, Melody, Progress, TimedEvent};
//!
//! let melody = Melody::new(
//!     vec![
//!         TimedEvent::new(64, 0.8, 500, 250),
//!         TimedEvent::new(60, 0.5, 0, 500),
//!     ],
//!     0,
//! );
//! assert_eq!(melody.events()[0].note_number, 60);
//! assert_eq!(melody.length_ms(), 750);
//!
//! let cancel = CancelToken::new();
//! let mut reported = Vec::new();
//! let mut sink = |ratio: f32| reported.push(ratio);
//! let mut progress = Progress::with_sink(&mut sink);
//! {
//!     let mut scope = progress.scope(1.0, melody.len());
//!     for _ in melody.events() {
//!         cancel.check().unwrap();
//!         scope.step();
//!     }
//! }
//! assert!((progress.ratio() - 1.0).abs() < 1e-6);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod buffer;
pub mod cancel;
pub mod event;
pub mod math;
pub mod progress;
pub mod rng;

// Re-export main types at crate root
pub use buffer::SampleBuffer;
pub use cancel::{CancelToken, Cancelled};
pub use event::{Melody, TimedEvent};
pub use math::{
    clamp, db_to_linear, lerp, linear_to_db, ms_to_samples, note_from_frequency,
    note_to_frequency, samples_to_ms,
};
pub use progress::{Progress, ProgressScope, ProgressSink};
pub use rng::PhaseRng;
