#![forbid(unsafe_code)]

//! Single-flight request lifecycle bookkeeping.
//!
//! At most one [`RequestContext`] exists at a time. Beginning a new
//! request always terminates the previous one first; terminating aborts
//! the cancellation token so the transport fails with a distinguishable
//! cancellation error instead of delivering a stale result. Completions
//! are matched by [`RequestTicket`] — a late result whose ticket no longer
//! matches is ignored and can never mutate the card stack.
//!
//! # Invariants
//!
//! 1. `terminate()` is idempotent: safe with no active request, and the
//!    token is aborted at most once.
//! 2. A context taken via [`RequestManager::take_if`] or terminated via
//!    [`RequestManager::terminate`] is gone; its ticket never matches
//!    again.
//! 3. The timeout deadline belongs to exactly one context; after
//!    teardown, [`RequestManager::timed_out`] is `false`.

use web_time::{Duration, Instant};

use cardflow_core::history::HistoryEntry;
use cardflow_core::pending::Pending;

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::fetcher::FetchError;

/// Identifies one request attempt. Stale tickets are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

/// How a completed load was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A new card was pushed.
    NewCard,
    /// The current card's content was replaced in place.
    Reloaded,
}

/// Bookkeeping for the single in-flight content request.
#[derive(Debug)]
pub struct RequestContext {
    ticket: RequestTicket,
    url: String,
    fragment: Option<String>,
    effect: String,
    link_text: Option<String>,
    new_instance: bool,
    deadline: Instant,
    source: CancellationSource,
    done: Pending<LoadOutcome, FetchError>,
}

impl RequestContext {
    #[inline]
    #[must_use]
    pub fn ticket(&self) -> RequestTicket {
        self.ticket
    }

    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn effect(&self) -> &str {
        &self.effect
    }

    #[inline]
    #[must_use]
    pub fn link_text(&self) -> Option<&str> {
        self.link_text.as_deref()
    }

    /// Whether this load pushes a new card (as opposed to reloading the
    /// current one).
    #[inline]
    #[must_use]
    pub fn is_new_instance(&self) -> bool {
        self.new_instance
    }

    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.source.token()
    }

    /// The caller-facing completion handle.
    #[must_use]
    pub fn done(&self) -> Pending<LoadOutcome, FetchError> {
        self.done.clone()
    }

    /// Abort the token (idempotent) and reject the completion handle.
    pub fn abort(self, error: FetchError) {
        if !self.source.is_cancelled() {
            self.source.cancel();
        }
        self.done.reject(error);
    }
}

/// Owner of the single in-flight request.
#[derive(Debug, Default)]
pub struct RequestManager {
    active: Option<RequestContext>,
    next_ticket: u64,
}

impl RequestManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The reload rule: a fetch re-targets the current card when the top
    /// history entry carries the same URL and an equal-or-absent fragment.
    /// Decided from the shape of existing history, never from fetch
    /// results.
    #[must_use]
    pub fn is_reload(top_entry: Option<&HistoryEntry>, url: &str, fragment: Option<&str>) -> bool {
        top_entry.is_some_and(|entry| entry.matches_location(url, fragment))
    }

    /// Begin a new request. Any previous request must have been terminated
    /// by the caller (the navigator tears it down first so it can also
    /// revert progress feedback and indicators).
    #[allow(clippy::too_many_arguments)]
    pub fn begin(
        &mut self,
        url: &str,
        fragment: Option<&str>,
        effect: &str,
        link_text: Option<&str>,
        new_instance: bool,
        timeout: Duration,
        now: Instant,
    ) -> &RequestContext {
        if let Some(prev) = self.active.take() {
            prev.abort(FetchError::Cancelled);
        }

        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;

        tracing::debug!(
            target: "cardflow.request",
            url,
            ?ticket,
            new_instance,
            timeout_ms = timeout.as_millis() as u64,
            "request started"
        );

        self.active.insert(RequestContext {
            ticket,
            url: url.to_string(),
            fragment: fragment.map(str::to_string),
            effect: effect.to_string(),
            link_text: link_text.map(str::to_string),
            new_instance,
            deadline: now + timeout,
            source: CancellationSource::new(),
            done: Pending::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<&RequestContext> {
        self.active.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `ticket` still names the in-flight request.
    #[must_use]
    pub fn matches(&self, ticket: RequestTicket) -> bool {
        self.active.as_ref().is_some_and(|c| c.ticket == ticket)
    }

    /// Whether the active request's deadline has passed.
    #[must_use]
    pub fn timed_out(&self, now: Instant) -> bool {
        self.active.as_ref().is_some_and(|c| now >= c.deadline)
    }

    /// Take the context for completion, only if `ticket` still matches.
    pub fn take_if(&mut self, ticket: RequestTicket) -> Option<RequestContext> {
        if self.matches(ticket) {
            self.active.take()
        } else {
            None
        }
    }

    /// Tear down the active request, aborting its token. Idempotent.
    ///
    /// The returned context lets the caller finish its own cleanup
    /// (progress feedback, loading indicator); its token is already
    /// aborted and its completion handle rejected with
    /// [`FetchError::Cancelled`].
    pub fn terminate(&mut self) -> Option<RequestContext> {
        let ctx = self.active.take()?;
        tracing::debug!(target: "cardflow.request", ticket = ?ctx.ticket, "terminating request");
        if !ctx.source.is_cancelled() {
            ctx.source.cancel();
        }
        ctx.done.reject(FetchError::Cancelled);
        Some(ctx)
    }
}
