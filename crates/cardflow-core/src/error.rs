#![forbid(unsafe_code)]

//! Cardflow error model.
//!
//! # Design Principles
//!
//! 1. **Result everywhere** — no panics in engine paths.
//! 2. **Domain-specific errors** — each subsystem has its own typed error
//!    so callers can match on what matters and let the rest propagate.
//! 3. **Expected races are not application errors** — a rejected
//!    navigation during rapid repeated input is a normal outcome and is
//!    logged at debug, never error.

use std::fmt;

/// Effect grammar errors.
///
/// These are configuration bugs (a bad effect string baked into the host),
/// not runtime conditions — they surface to the caller as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectError {
    /// The two primary transition categories cannot be combined in one
    /// effect string.
    Conflict {
        first: &'static str,
        second: &'static str,
    },
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { first, second } => {
                write!(f, "`{first}` and `{second}` effects cannot be used together")
            }
        }
    }
}

impl std::error::Error for EffectError {}

/// Navigation entry-point errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavError {
    /// A transition is currently playing; the operation was rejected
    /// without touching the in-flight transition's state.
    TransitionInProgress,
    /// The effect string is malformed.
    Effect(EffectError),
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransitionInProgress => {
                write!(f, "navigation blocked: a transition is currently playing")
            }
            Self::Effect(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for NavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Effect(err) => Some(err),
            Self::TransitionInProgress => None,
        }
    }
}

impl From<EffectError> for NavError {
    fn from(err: EffectError) -> Self {
        Self::Effect(err)
    }
}

/// Progress value arithmetic errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressError {
    /// Accumulating `delta` would push the value past the 100 ceiling.
    /// The current value is left untouched.
    OutOfRange { current: f64, delta: f64 },
    /// The value already sits at the ceiling; there is nothing to
    /// complete.
    AlreadyComplete { value: f64 },
}

impl fmt::Display for ProgressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { current, delta } => write!(
                f,
                "accumulated value {} exceeds the maximum of 100",
                current + delta
            ),
            Self::AlreadyComplete { value } => {
                write!(f, "cannot complete: progress value is already at {value}")
            }
        }
    }
}

impl std::error::Error for ProgressError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_error_display() {
        let err = EffectError::Conflict {
            first: "panel-shift",
            second: "panel-slide",
        };
        let msg = err.to_string();
        assert!(msg.contains("panel-shift"));
        assert!(msg.contains("panel-slide"));
    }

    #[test]
    fn nav_error_wraps_effect_error() {
        let err: NavError = EffectError::Conflict {
            first: "panel-shift",
            second: "panel-slide",
        }
        .into();
        assert!(matches!(err, NavError::Effect(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn transition_in_progress_has_no_source() {
        assert!(std::error::Error::source(&NavError::TransitionInProgress).is_none());
    }

    #[test]
    fn progress_error_display() {
        let err = ProgressError::OutOfRange {
            current: 85.0,
            delta: 30.0,
        };
        assert!(err.to_string().contains("115"));
        let err = ProgressError::AlreadyComplete { value: 100.0 };
        assert!(err.to_string().contains("100"));
    }
}
