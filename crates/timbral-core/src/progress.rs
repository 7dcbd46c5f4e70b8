//! Hierarchical progress reporting.
//!
//! A [`Progress`] accumulates a completion ratio in [0, 1] and forwards every
//! change to an optional [`ProgressSink`]. Work is described as nested
//! [`ProgressScope`]s: a scope owns a share of its parent and divides it
//! evenly between a known number of items. Each completed item advances the
//! total by exactly its share.
//!
//! Scopes mutably borrow their parent, so a narrower step size only exists
//! while the scope is alive; dropping it restores the parent's granularity
//! without any bookkeeping. The accumulated total is always the sum of the
//! steps that actually completed.
//!
//! ```rust
//! use timbral_core::Progress;
//!
//! let mut progress = Progress::new();
//! {
//!     // 80% of the task is split across 4 items
//!     let mut render = progress.scope(0.8, 4);
//!     render.step();
//!     {
//!         // the second item has 2 sub-steps
//!         let mut item = render.subdivide(2);
//!         item.step();
//!         item.step();
//!     }
//! }
//! assert!((progress.ratio() - 0.4).abs() < 1e-6);
//! ```

/// Receiver for progress updates.
///
/// Implemented for every `FnMut(f32)`, so a closure can be passed directly.
pub trait ProgressSink {
    /// Called with the new accumulated ratio in [0, 1].
    fn report(&mut self, ratio: f32);
}

impl<F: FnMut(f32)> ProgressSink for F {
    fn report(&mut self, ratio: f32) {
        self(ratio);
    }
}

/// Root progress accumulator.
#[derive(Default)]
pub struct Progress<'a> {
    done: f32,
    sink: Option<&'a mut dyn ProgressSink>,
}

impl core::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Progress")
            .field("done", &self.done)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl<'a> Progress<'a> {
    /// Create a tracker without a sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker that reports every change to `sink`.
    pub fn with_sink(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            done: 0.0,
            sink: Some(sink),
        }
    }

    /// Accumulated ratio in [0, 1].
    pub fn ratio(&self) -> f32 {
        self.done
    }

    /// Open a scope owning `share` of the whole task, split into `items` steps.
    pub fn scope(&mut self, share: f32, items: usize) -> ProgressScope<'_, 'a> {
        ProgressScope::new(self, share, items)
    }

    fn advance(&mut self, amount: f32) {
        self.done = (self.done + amount).clamp(0.0, 1.0);
        if let Some(sink) = &mut self.sink {
            sink.report(self.done);
        }
    }
}

/// A share of a [`Progress`] divided into equal steps.
pub struct ProgressScope<'p, 'a> {
    progress: &'p mut Progress<'a>,
    step: f32,
    remaining: usize,
}

impl core::fmt::Debug for ProgressScope<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressScope")
            .field("step", &self.step)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'p, 'a> ProgressScope<'p, 'a> {
    fn new(progress: &'p mut Progress<'a>, share: f32, items: usize) -> Self {
        let step = if items == 0 {
            0.0
        } else {
            share.max(0.0) / items as f32
        };
        Self {
            progress,
            step,
            remaining: items,
        }
    }

    /// Size of one step as a fraction of the whole task.
    pub fn step_size(&self) -> f32 {
        self.step
    }

    /// Mark one item complete. Calls beyond the item count are ignored.
    pub fn step(&mut self) {
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        self.progress.advance(self.step);
    }

    /// Split the next item into `items` sub-steps.
    ///
    /// The returned scope stands in for one [`step`](Self::step): completing
    /// all of its sub-steps advances the total by exactly one item's share.
    pub fn subdivide(&mut self, items: usize) -> ProgressScope<'_, 'a> {
        let share = if self.remaining == 0 { 0.0 } else { self.step };
        self.remaining = self.remaining.saturating_sub(1);
        ProgressScope::new(self.progress, share, items)
    }

    /// Current accumulated ratio of the root tracker.
    pub fn ratio(&self) -> f32 {
        self.progress.ratio()
    }
}
