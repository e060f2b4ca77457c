#![forbid(unsafe_code)]

//! Cooperative cancellation for in-flight content requests.
//!
//! Each request owns a [`CancellationSource`]; the transport receives a
//! [`CancellationToken`] derived from it and polls
//! [`CancellationToken::is_cancelled`] at its own suspension points.
//! Aborting the source makes the fetch fail with a distinguishable
//! cancellation error, which the request lifecycle treats as the expected
//! outcome of its own teardown rather than escalating it.
//!
//! Dropping the source does **not** cancel outstanding tokens — teardown
//! is always an explicit [`CancellationSource::cancel`] call, so a request
//! context going out of scope cannot silently abort a fetch that another
//! path still expects to observe.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheap, cloneable token observing one request's cancellation state.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Whether cancellation has been requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// The control handle that triggers cancellation.
#[derive(Debug)]
pub struct CancellationSource {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSource {
    /// Create a new source with an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Obtain a token observing this source's state.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Signal cancellation. All derived tokens observe it immediately.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has already been requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}
