//! Cooperative cancellation.
//!
//! A [`CancelToken`] is shared between the caller (typically a UI or a Ctrl-C
//! handler) and a long-running computation. The computation polls
//! [`CancelToken::check`] at item boundaries and propagates [`Cancelled`] with
//! `?`. Polling is never per-sample. Item boundaries nest: the compositor
//! polls per pitch and per event, and the sub-model `render`/`interpolate`
//! implementations it calls poll again per partial, frame or rank.
//!
//! [`Cancelled`] is an abort signal, not a fault: callers should report it as
//! "stopped", not as an error.

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use core::sync::atomic::{AtomicBool, Ordering};

/// Signal returned when a computation observed a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cancelled;

impl core::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "operation cancelled")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Cancelled {}

/// Shared cancellation flag.
///
/// Clones observe the same flag. The token is `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Checkpoint: `Err(Cancelled)` if cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::debug!("cancellation observed at checkpoint");
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn token_crosses_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
