//! Note models for arbitrary pitches.
//!
//! [`note_at`] returns the stored model when the pitch was recorded, and
//! otherwise builds one between the two nearest recorded pitches:
//!
//! 1. **Bracket** - in the sorted note list, `a` is the first note from the
//!    low end that is ≥ the target and `b` the first from the high end that is
//!    ≤ the target. Both indices are clamped into range, so a target outside
//!    the recorded span collapses to `a == b` on the nearest end.
//! 2. **Ratio** - `(target − a) / (b − a)`, or 0 when `a == b`.
//! 3. **Transpose and blend** - each source is scaled by
//!    `f(target) / f(source)` and the components are interpolated by the
//!    ratio. Length is `round(lerp(a.length, b.length, ratio))`.
//!
//! A component present on only one side is kept: it is transposed alone and
//! attenuated by that side's weight (`1 − ratio` for `a`, `ratio` for `b`).

use std::borrow::Cow;

use timbral_core::{CancelToken, Cancelled, lerp, note_to_frequency};

use crate::instrument::Instrument;
use crate::model::{Component, NoteModel};

/// Smallest frequency ratio a source is transposed by.
const MIN_SCALE: f32 = 1e-6;

/// The two recorded pitches a target is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// First source note.
    pub a: i32,
    /// Second source note.
    pub b: i32,
    /// Blend position, 0 at `a`.
    pub ratio: f32,
}

impl Bracket {
    /// Locate `target` among ascending `notes`. `None` for an empty list.
    pub fn locate(notes: &[i32], target: i32) -> Option<Self> {
        let last = notes.len().checked_sub(1)?;
        let a_index = notes.iter().position(|&n| n >= target).unwrap_or(last);
        let b_index = notes.iter().rposition(|&n| n <= target).unwrap_or(0);
        let (a, b) = (notes[a_index], notes[b_index]);
        let ratio = if a == b {
            0.0
        } else {
            (target - a) as f32 / (b - a) as f32
        };
        Some(Self { a, b, ratio })
    }

    /// Returns `true` when both sources are the same note.
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }
}

impl Instrument {
    /// Model for `note`; see [`note_at`].
    pub fn note_at(
        &self,
        note: i32,
        cancel: &CancelToken,
    ) -> Result<Option<Cow<'_, NoteModel>>, Cancelled> {
        note_at(self, note, cancel)
    }
}

/// Model for `note`, borrowed when recorded and synthesized otherwise.
///
/// Returns `Ok(None)` only for an empty instrument. The instrument is never
/// modified; callers that want to keep a synthesized model add it themselves.
pub fn note_at<'a>(
    instrument: &'a Instrument,
    note: i32,
    cancel: &CancelToken,
) -> Result<Option<Cow<'a, NoteModel>>, Cancelled> {
    if let Some(model) = instrument.get(note) {
        return Ok(Some(Cow::Borrowed(model)));
    }
    let Some(bracket) = Bracket::locate(&instrument.note_numbers(), note) else {
        return Ok(None);
    };
    let (Some(a), Some(b)) = (instrument.get(bracket.a), instrument.get(bracket.b)) else {
        return Ok(None);
    };

    let target = note_to_frequency(note);
    let scale_a = transposition(target, note_to_frequency(bracket.a));
    let scale_b = transposition(target, note_to_frequency(bracket.b));
    let ratio = bracket.ratio;

    tracing::debug!(
        note,
        a = bracket.a,
        b = bracket.b,
        ratio,
        degenerate = bracket.is_degenerate(),
        "synthesizing note"
    );

    let length_ms = if bracket.is_degenerate() {
        a.length_ms
    } else {
        lerp(a.length_ms as f32, b.length_ms as f32, ratio)
            .round()
            .max(0.0) as u32
    };

    Ok(Some(Cow::Owned(NoteModel {
        length_ms,
        sinusoid: blend(a.sinusoid.as_ref(), b.sinusoid.as_ref(), ratio, scale_a, scale_b, cancel)?,
        transient: blend(a.transient.as_ref(), b.transient.as_ref(), ratio, scale_a, scale_b, cancel)?,
        noise: blend(a.noise.as_ref(), b.noise.as_ref(), ratio, scale_a, scale_b, cancel)?,
    })))
}

/// Frequency ratio from `source` to `target` Hz.
///
/// Ratios that are not finite or not above `MIN_SCALE` (targets far outside
/// the audible range) collapse to 0, which every component renders as silence.
fn transposition(target: f32, source: f32) -> f32 {
    let scale = target / source;
    if scale.is_finite() && scale > MIN_SCALE {
        scale
    } else {
        0.0
    }
}

/// Interpolate one component slot.
fn blend<C: Component>(
    a: Option<&C>,
    b: Option<&C>,
    ratio: f32,
    scale_a: f32,
    scale_b: f32,
    cancel: &CancelToken,
) -> Result<Option<C>, Cancelled> {
    match (a, b) {
        (Some(a), Some(b)) => C::interpolate(a, b, ratio, scale_a, scale_b, cancel).map(Some),
        (Some(a), None) => {
            let mut only = C::interpolate(a, a, 0.0, scale_a, scale_a, cancel)?;
            only.attenuate(1.0 - ratio);
            Ok(Some(only))
        }
        (None, Some(b)) => {
            let mut only = C::interpolate(b, b, 0.0, scale_b, scale_b, cancel)?;
            only.attenuate(ratio);
            Ok(Some(only))
        }
        (None, None) => Ok(None),
    }
}
