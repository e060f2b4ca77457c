#![forbid(unsafe_code)]

//! Single-threaded completion handles.
//!
//! Every engine operation that finishes in a later callback turn hands the
//! caller a [`Pending`]: a cheap, cloneable handle that is eventually
//! resolved or rejected by the engine. The engine is single-threaded and
//! cooperative, so the handle is `Rc`-based and never crosses threads.
//!
//! Settling is idempotent — once settled, further resolve/reject calls are
//! ignored. Transition completion relies on this as its second double-fire
//! guard (the first being the transition context itself being consumed).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Settlement status of a [`Pending`] handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    Pending,
    Resolved,
    Rejected,
}

enum State<T, E> {
    Pending,
    Resolved(T),
    Rejected(E),
}

/// A cloneable handle to an operation that completes later.
pub struct Pending<T, E> {
    inner: Rc<RefCell<State<T, E>>>,
}

impl<T, E> Pending<T, E> {
    /// Create an unsettled handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(State::Pending)),
        }
    }

    /// Resolve the operation. Returns `false` if already settled (the call
    /// is ignored).
    pub fn resolve(&self, value: T) -> bool {
        let mut state = self.inner.borrow_mut();
        if matches!(*state, State::Pending) {
            *state = State::Resolved(value);
            true
        } else {
            false
        }
    }

    /// Reject the operation. Returns `false` if already settled (the call
    /// is ignored).
    pub fn reject(&self, err: E) -> bool {
        let mut state = self.inner.borrow_mut();
        if matches!(*state, State::Pending) {
            *state = State::Rejected(err);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn status(&self) -> PendingStatus {
        match *self.inner.borrow() {
            State::Pending => PendingStatus::Pending,
            State::Resolved(_) => PendingStatus::Resolved,
            State::Rejected(_) => PendingStatus::Rejected,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status() == PendingStatus::Pending
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }
}

impl<T: Clone, E: Clone> Pending<T, E> {
    /// The settled outcome, if any.
    #[must_use]
    pub fn result(&self) -> Option<Result<T, E>> {
        match &*self.inner.borrow() {
            State::Pending => None,
            State::Resolved(v) => Some(Ok(v.clone())),
            State::Rejected(e) => Some(Err(e.clone())),
        }
    }
}

impl<T, E> Clone for Pending<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for Pending<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Pending<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_pending() {
        let p: Pending<(), ()> = Pending::new();
        assert_eq!(p.status(), PendingStatus::Pending);
        assert!(p.is_pending());
        assert!(p.result().is_none());
    }

    #[test]
    fn resolve_settles_all_clones() {
        let p: Pending<u32, ()> = Pending::new();
        let observer = p.clone();
        assert!(p.resolve(7));
        assert_eq!(observer.status(), PendingStatus::Resolved);
        assert_eq!(observer.result(), Some(Ok(7)));
    }

    #[test]
    fn reject_settles() {
        let p: Pending<(), &str> = Pending::new();
        assert!(p.reject("boom"));
        assert_eq!(p.result(), Some(Err("boom")));
    }

    #[test]
    fn double_settle_is_ignored() {
        let p: Pending<u32, &str> = Pending::new();
        assert!(p.resolve(1));
        assert!(!p.resolve(2));
        assert!(!p.reject("late"));
        assert_eq!(p.result(), Some(Ok(1)));
    }

    #[test]
    fn debug_shows_status() {
        let p: Pending<(), ()> = Pending::new();
        assert!(format!("{p:?}").contains("Pending"));
    }
}
