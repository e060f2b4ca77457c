#![forbid(unsafe_code)]

//! Effect grammar: transition categories and directions.
//!
//! An effect string is a whitespace-separated token list selecting a
//! transition category set and an optional compass direction, e.g.
//! `"panel-shift west"`. The two primary categories are mutually
//! exclusive; combining them is a configuration bug, not a runtime
//! condition.
//!
//! Parsing yields the *requested* effect. What actually renders is decided
//! by the visual effect driver's geometry probe — a direction token with no
//! observable offset (a pure cross-fade, say) resolves to no direction.

use bitflags::bitflags;

use crate::error::EffectError;

/// Token for the film-track style category: the whole pane strip moves.
pub const TOKEN_SHIFT: &str = "panel-shift";
/// Token for the slide-over category: the incoming card covers the stack.
pub const TOKEN_SLIDE: &str = "panel-slide";
/// Token for the opacity cross-fade category.
pub const TOKEN_FADE: &str = "cross-fade";

bitflags! {
    /// Transition categories a rendered effect can combine.
    ///
    /// `SHIFT` and `SLIDE` never co-occur in a *requested* effect (that is
    /// an [`EffectError::Conflict`]); either may combine with `FADE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransitionKinds: u8 {
        /// Container-level transform (film-track).
        const SHIFT = 1 << 0;
        /// Incoming-card transform (slide-over).
        const SLIDE = 1 << 1;
        /// Outgoing-card opacity fade.
        const FADE  = 1 << 2;
    }
}

impl TransitionKinds {
    /// Tokens for the set, in canonical order.
    #[must_use]
    pub fn tokens(self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(Self::SHIFT) {
            out.push(TOKEN_SHIFT);
        }
        if self.contains(Self::SLIDE) {
            out.push(TOKEN_SLIDE);
        }
        if self.contains(Self::FADE) {
            out.push(TOKEN_FADE);
        }
        out
    }
}

/// Primitive movement axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Compass direction of a directional transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions, for token scanning.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The effect-string token for this direction.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        }
    }

    /// Parse a direction token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "north" => Some(Self::North),
            "east" => Some(Self::East),
            "south" => Some(Self::South),
            "west" => Some(Self::West),
            _ => None,
        }
    }

    /// The axis this direction moves along.
    #[must_use]
    pub fn axis(self) -> Axis {
        match self {
            Self::North | Self::South => Axis::Y,
            Self::East | Self::West => Axis::X,
        }
    }

    /// The opposite direction, used for reverse playback on back
    /// navigation.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }
}

/// A parsed effect descriptor: requested categories plus an optional
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectSpec {
    pub kinds: TransitionKinds,
    pub direction: Option<Direction>,
}

impl EffectSpec {
    /// The empty effect: no categories, no direction.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether this effect selects nothing.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.kinds.is_empty() && self.direction.is_none()
    }

    /// Parse a whitespace-separated effect token list.
    ///
    /// - An empty string or the literal `none` parses to [`EffectSpec::none`].
    /// - `panel-shift` and `panel-slide` together are an
    ///   [`EffectError::Conflict`], regardless of order or surrounding
    ///   whitespace.
    /// - A second direction token is ignored with a warning; the first wins.
    /// - Unrecognized tokens are ignored with a warning.
    pub fn parse(effect: &str) -> Result<Self, EffectError> {
        let trimmed = effect.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::none());
        }

        let lowered = trimmed.to_ascii_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        if tokens.contains(&TOKEN_SHIFT) && tokens.contains(&TOKEN_SLIDE) {
            return Err(EffectError::Conflict {
                first: TOKEN_SHIFT,
                second: TOKEN_SLIDE,
            });
        }

        let mut spec = Self::none();
        for token in tokens {
            if let Some(direction) = Direction::from_token(token) {
                if spec.direction.is_none() {
                    spec.direction = Some(direction);
                } else {
                    tracing::warn!(
                        target: "cardflow.effect",
                        token,
                        "direction token used more than once, ignoring"
                    );
                }
            } else {
                match token {
                    TOKEN_SHIFT => spec.kinds |= TransitionKinds::SHIFT,
                    TOKEN_SLIDE => spec.kinds |= TransitionKinds::SLIDE,
                    TOKEN_FADE => spec.kinds |= TransitionKinds::FADE,
                    _ => {
                        tracing::warn!(
                            target: "cardflow.effect",
                            token,
                            effect,
                            "unrecognized effect token"
                        );
                    }
                }
            }
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_none_parse_to_nothing() {
        assert!(EffectSpec::parse("").unwrap().is_none());
        assert!(EffectSpec::parse("none").unwrap().is_none());
        assert_eq!(EffectSpec::parse("  none  ").unwrap(), EffectSpec::none());
    }

    #[test]
    fn single_category() {
        let spec = EffectSpec::parse("panel-shift").unwrap();
        assert_eq!(spec.kinds, TransitionKinds::SHIFT);
        assert_eq!(spec.direction, None);
    }

    #[test]
    fn category_with_direction() {
        let spec = EffectSpec::parse("panel-slide west").unwrap();
        assert_eq!(spec.kinds, TransitionKinds::SLIDE);
        assert_eq!(spec.direction, Some(Direction::West));
    }

    #[test]
    fn fade_combines_with_shift() {
        let spec = EffectSpec::parse("panel-shift cross-fade north").unwrap();
        assert_eq!(spec.kinds, TransitionKinds::SHIFT | TransitionKinds::FADE);
        assert_eq!(spec.direction, Some(Direction::North));
    }

    #[test]
    fn conflict_detected_in_any_order() {
        for s in [
            "panel-shift panel-slide",
            "panel-slide panel-shift",
            "  panel-slide   cross-fade panel-shift ",
        ] {
            assert!(
                matches!(EffectSpec::parse(s), Err(EffectError::Conflict { .. })),
                "expected conflict for {s:?}"
            );
        }
    }

    #[test]
    fn no_conflict_without_both_primaries() {
        assert!(EffectSpec::parse("panel-shift cross-fade").is_ok());
        assert!(EffectSpec::parse("panel-slide cross-fade").is_ok());
        assert!(EffectSpec::parse("cross-fade").is_ok());
    }

    #[test]
    fn second_direction_ignored_first_wins() {
        let spec = EffectSpec::parse("panel-shift north south").unwrap();
        assert_eq!(spec.direction, Some(Direction::North));
    }

    #[test]
    fn unrecognized_tokens_ignored() {
        let spec = EffectSpec::parse("panel-shift sparkle").unwrap();
        assert_eq!(spec.kinds, TransitionKinds::SHIFT);
    }

    #[test]
    fn parsing_is_case_insensitive() {
        let spec = EffectSpec::parse("Panel-Shift WEST").unwrap();
        assert_eq!(spec.kinds, TransitionKinds::SHIFT);
        assert_eq!(spec.direction, Some(Direction::West));
    }

    #[test]
    fn direction_only_is_valid() {
        let spec = EffectSpec::parse("east").unwrap();
        assert!(spec.kinds.is_empty());
        assert_eq!(spec.direction, Some(Direction::East));
    }

    #[test]
    fn opposite_round_trips() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
            assert_eq!(d.axis(), d.opposite().axis());
        }
    }

    #[test]
    fn axes() {
        assert_eq!(Direction::North.axis(), Axis::Y);
        assert_eq!(Direction::South.axis(), Axis::Y);
        assert_eq!(Direction::East.axis(), Axis::X);
        assert_eq!(Direction::West.axis(), Axis::X);
    }

    #[test]
    fn kind_tokens_round_trip() {
        let kinds = TransitionKinds::SLIDE | TransitionKinds::FADE;
        assert_eq!(kinds.tokens(), vec![TOKEN_SLIDE, TOKEN_FADE]);
    }
}
