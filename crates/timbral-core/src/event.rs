//! Timed pitched events and melodies.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// One pitched event on a millisecond timeline.
///
/// Events are plain values: they are created by segmentation or loaded from a
/// melody file and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// Pitch index keying the instrument's note map.
    pub note_number: i32,
    /// Linear amplitude in [0, 1].
    pub amplitude: f32,
    /// Onset time in milliseconds.
    pub start_ms: u32,
    /// Nominal (symbolic) duration in milliseconds.
    pub length_ms: u32,
}

impl TimedEvent {
    /// Create an event. The amplitude is clamped into [0, 1].
    pub fn new(note_number: i32, amplitude: f32, start_ms: u32, length_ms: u32) -> Self {
        Self {
            note_number,
            amplitude: amplitude.clamp(0.0, 1.0),
            start_ms,
            length_ms,
        }
    }

    /// Time at which the nominal duration ends.
    #[inline]
    pub fn end_ms(&self) -> u32 {
        self.start_ms.saturating_add(self.length_ms)
    }

    /// Returns `true` if the event sounds anywhere inside `[start_ms, end_ms)`.
    ///
    /// Zero-length events count when their onset falls inside the range.
    pub fn overlaps(&self, start_ms: u32, end_ms: u32) -> bool {
        if self.length_ms == 0 {
            return self.start_ms >= start_ms && self.start_ms < end_ms;
        }
        self.start_ms < end_ms && self.end_ms() > start_ms
    }
}

/// Start-ordered events plus a total length.
///
/// Invariant: `length_ms >= max(event.end_ms())` over all events. Construction
/// and [`push`](Self::push) extend the length as needed, so the invariant
/// cannot be broken through this API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Melody {
    events: Vec<TimedEvent>,
    length_ms: u32,
}

impl Melody {
    /// Build a melody from events in any order.
    ///
    /// Events are stably sorted by start time, and `length_ms` is raised to
    /// cover the last event if it is too short.
    pub fn new(mut events: Vec<TimedEvent>, length_ms: u32) -> Self {
        events.sort_by_key(|e| e.start_ms);
        let covered = events.iter().map(TimedEvent::end_ms).max().unwrap_or(0);
        Self {
            events,
            length_ms: length_ms.max(covered),
        }
    }

    /// Insert an event, keeping start order (after existing equal starts).
    pub fn push(&mut self, event: TimedEvent) {
        let idx = self.events.partition_point(|e| e.start_ms <= event.start_ms);
        self.events.insert(idx, event);
        self.length_ms = self.length_ms.max(event.end_ms());
    }

    /// Events in ascending start order.
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Total length in milliseconds.
    pub fn length_ms(&self) -> u32 {
        self.length_ms
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the melody has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Distinct note numbers in ascending order.
    pub fn note_numbers(&self) -> Vec<i32> {
        let mut notes: Vec<i32> = self.events.iter().map(|e| e.note_number).collect();
        notes.sort_unstable();
        notes.dedup();
        notes
    }
}
