#![forbid(unsafe_code)]

//! Navigation history records.
//!
//! Two parallel histories back the card stack:
//!
//! - [`HistoryEntry`] — one per card, append-only until popped. The entry
//!   count always equals the stack size outside an in-flight transition.
//! - [`ActionRecord`] — one per *forward* push, recording the rendered
//!   effect so back navigation can replay it in the opposite direction.
//!   The record count is always `stack size - 1` (the root has no action).

use crate::card::CardId;
use crate::effect::{Direction, TransitionKinds};

/// A navigation event describing where a card's content came from.
///
/// Carried into [`HistoryEntry`] when the card is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryEvent {
    pub url: Option<String>,
    pub fragment: Option<String>,
    pub title: Option<String>,
}

/// One history entry per card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: Option<String>,
    pub fragment: Option<String>,
    pub title: Option<String>,
    /// The card this entry describes.
    pub card: CardId,
}

impl HistoryEntry {
    /// Entry for a card with no remote source (programmatic push, root).
    #[must_use]
    pub fn local(card: CardId, title: Option<String>) -> Self {
        Self {
            url: None,
            fragment: None,
            title,
            card,
        }
    }

    /// Entry built from a navigation event.
    #[must_use]
    pub fn from_event(event: HistoryEvent, card: CardId) -> Self {
        Self {
            url: event.url,
            fragment: event.fragment,
            title: event.title,
            card,
        }
    }

    /// Reload rule: a fetch of `url` + `fragment` targets this entry's
    /// card (rather than a new card) when the URL matches and the fragment
    /// is equal or absent.
    #[must_use]
    pub fn matches_location(&self, url: &str, fragment: Option<&str>) -> bool {
        if self.url.as_deref() != Some(url) {
            return false;
        }
        match fragment {
            None => true,
            Some(f) => self.fragment.as_deref() == Some(f),
        }
    }
}

/// Per-push record of the rendered effect, enabling symmetric reverse
/// playback on back navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionRecord {
    pub kinds: TransitionKinds,
    pub direction: Option<Direction>,
}

impl ActionRecord {
    /// Rebuild an effect string from this record.
    ///
    /// With `opposite`, the direction is flipped so the reverse navigation
    /// mirrors the forward one.
    #[must_use]
    pub fn to_effect_string(&self, opposite: bool) -> String {
        let mut parts = self.kinds.tokens();
        let direction = self.direction.map(|d| if opposite { d.opposite() } else { d });
        if let Some(d) = direction {
            parts.push(d.token());
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }
}
