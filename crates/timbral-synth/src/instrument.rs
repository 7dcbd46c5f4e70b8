//! Sparse pitch → note model mapping.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::NoteModel;

/// Errors from editing an [`Instrument`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstrumentError {
    /// A model is already stored for this note number.
    #[error("note {0} already has a model")]
    NoteExists(i32),
}

/// Note models keyed by note number.
///
/// Only recorded pitches are stored; anything in between is produced on
/// demand by [`note_at`](crate::note_at). Keys iterate in ascending order.
///
/// An instrument is read-only while it is being synthesized from. Adding or
/// removing notes during a render is the caller's responsibility to prevent,
/// for example by rendering from a clone or holding a lock around both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instrument {
    notes: BTreeMap<i32, NoteModel>,
}

impl Instrument {
    /// Create an empty instrument.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `model` for `note`, refusing to overwrite.
    pub fn add_note(&mut self, note: i32, model: NoteModel) -> Result<(), InstrumentError> {
        if self.notes.contains_key(&note) {
            return Err(InstrumentError::NoteExists(note));
        }
        self.notes.insert(note, model);
        Ok(())
    }

    /// Store `model` for `note`, returning the model it replaced.
    pub fn replace_note(&mut self, note: i32, model: NoteModel) -> Option<NoteModel> {
        self.notes.insert(note, model)
    }

    /// Remove the model for `note`.
    pub fn remove_note(&mut self, note: i32) -> Option<NoteModel> {
        self.notes.remove(&note)
    }

    /// Model stored for exactly `note`.
    pub fn get(&self, note: i32) -> Option<&NoteModel> {
        self.notes.get(&note)
    }

    /// Recorded note numbers, ascending.
    pub fn note_numbers(&self) -> Vec<i32> {
        self.notes.keys().copied().collect()
    }

    /// Iterate `(note, model)` pairs in ascending note order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &NoteModel)> {
        self.notes.iter().map(|(&n, m)| (n, m))
    }

    /// Number of recorded pitches.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns `true` if no pitch is recorded.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
