#![forbid(unsafe_code)]

//! The visual effect driver seam.
//!
//! The navigator never touches geometry or rendering. It asks a
//! [`VisualEffectDriver`] to *resolve* a requested effect into what will
//! actually render for the target card, tells it when to begin and finish
//! the transition, and pushes the stack depth so the host can toggle
//! non-root chrome.
//!
//! Completion travels the other way: the host observes its own finished
//! visual transitions and delivers them as [`TransitionSignal`]s. The
//! navigator filters signals by `(source, property)` so unrelated visual
//! changes cannot complete a transition:
//!
//! | category      | qualifying signal                  |
//! |---------------|------------------------------------|
//! | `panel-shift` | container, transform               |
//! | `panel-slide` | incoming card, transform           |
//! | `cross-fade`  | outgoing card, opacity             |

use cardflow_core::card::CardId;
use cardflow_core::effect::{Direction, EffectSpec, TransitionKinds};

/// What the driver's geometry probe says will actually render.
///
/// The probe may drop a requested direction (a pure cross-fade has no
/// observable offset) and decides the rendered category set; only the
/// probe result is recorded in action history and used for transform
/// math — requested token and rendered capability can disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedTransition {
    pub kinds: TransitionKinds,
    pub direction: Option<Direction>,
}

impl ResolvedTransition {
    /// Whether any animated category renders. When nothing does, the
    /// transition completes synchronously.
    #[inline]
    #[must_use]
    pub fn is_animated(&self) -> bool {
        !self.kinds.is_empty()
    }
}

/// Where a completion signal originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    /// The pane container (film-track movement).
    Container,
    /// One card panel.
    Card(CardId),
}

/// Which animated property finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalProperty {
    Transform,
    Opacity,
}

/// One finished visual transition, delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionSignal {
    pub source: SignalSource,
    pub property: SignalProperty,
}

/// The visual side of card transitions. Host-supplied.
pub trait VisualEffectDriver {
    /// Geometry probe: what will actually render for `card` under the
    /// requested `effect`.
    fn resolve(&mut self, card: CardId, effect: &EffectSpec) -> ResolvedTransition;

    /// Apply initial transforms; the animation starts here.
    fn begin(&mut self, transition: &ResolvedTransition, incoming: CardId);

    /// Clear transforms once the transition completed.
    fn finish(&mut self, transition: &ResolvedTransition, incoming: CardId);

    /// Reflect the current non-root stack depth on the host.
    fn set_depth(&mut self, depth: usize);
}

/// Driver that renders nothing: every effect resolves to no categories,
/// so transitions complete synchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDriver;

impl VisualEffectDriver for NullDriver {
    fn resolve(&mut self, _card: CardId, _effect: &EffectSpec) -> ResolvedTransition {
        ResolvedTransition::default()
    }

    fn begin(&mut self, _transition: &ResolvedTransition, _incoming: CardId) {}

    fn finish(&mut self, _transition: &ResolvedTransition, _incoming: CardId) {}

    fn set_depth(&mut self, _depth: usize) {}
}

/// Driver whose probe reports exactly what was requested. Useful for
/// hosts whose styling renders every category, and for tests that need
/// asynchronous completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoDriver {
    depth: usize,
}

impl EchoDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent depth pushed by the navigator.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl VisualEffectDriver for EchoDriver {
    fn resolve(&mut self, _card: CardId, effect: &EffectSpec) -> ResolvedTransition {
        // A direction is only observable when something actually moves.
        let direction = if effect.kinds.is_empty() {
            None
        } else {
            effect.direction
        };
        ResolvedTransition {
            kinds: effect.kinds,
            direction,
        }
    }

    fn begin(&mut self, _transition: &ResolvedTransition, _incoming: CardId) {}

    fn finish(&mut self, _transition: &ResolvedTransition, _incoming: CardId) {}

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
    }
}
