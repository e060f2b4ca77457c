#![forbid(unsafe_code)]

//! Link activation surface.
//!
//! Link-like elements inside a card are auto-bound unless explicitly
//! excluded. Two reserved destinations trigger built-in commands; any
//! other non-fragment destination fetches as a new card. Hosts classify
//! each activated href here and dispatch the result to the navigator.

/// The built-in command a link activation maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand<'a> {
    /// `#back`: pop one card.
    Back,
    /// `#home`: return to the root card.
    Home,
    /// Fetch the destination as a new card.
    Fetch {
        url: &'a str,
        fragment: Option<&'a str>,
    },
}

/// Classify an activated href.
///
/// Returns `None` when the widget should leave the activation to the
/// host: excluded links, links with an explicit target, empty hrefs, and
/// in-page fragment links other than the two reserved destinations.
#[must_use]
pub fn classify(href: &str, excluded: bool, has_target: bool) -> Option<LinkCommand<'_>> {
    if excluded || has_target || href.is_empty() {
        return None;
    }
    match href {
        "#back" => Some(LinkCommand::Back),
        "#home" => Some(LinkCommand::Home),
        _ if href.starts_with('#') => None,
        _ => {
            let (url, fragment) = match href.split_once('#') {
                Some((url, fragment)) if !fragment.is_empty() => (url, Some(fragment)),
                Some((url, _)) => (url, None),
                None => (href, None),
            };
            Some(LinkCommand::Fetch { url, fragment })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_destinations() {
        assert_eq!(classify("#back", false, false), Some(LinkCommand::Back));
        assert_eq!(classify("#home", false, false), Some(LinkCommand::Home));
    }

    #[test]
    fn plain_url_fetches() {
        assert_eq!(
            classify("https://example.test/a", false, false),
            Some(LinkCommand::Fetch {
                url: "https://example.test/a",
                fragment: None
            })
        );
    }

    #[test]
    fn url_with_fragment_splits() {
        assert_eq!(
            classify("https://example.test/a#intro", false, false),
            Some(LinkCommand::Fetch {
                url: "https://example.test/a",
                fragment: Some("intro")
            })
        );
    }

    #[test]
    fn empty_trailing_fragment_is_dropped() {
        assert_eq!(
            classify("https://example.test/a#", false, false),
            Some(LinkCommand::Fetch {
                url: "https://example.test/a",
                fragment: None
            })
        );
    }

    #[test]
    fn excluded_and_targeted_links_pass_through() {
        assert_eq!(classify("https://example.test/a", true, false), None);
        assert_eq!(classify("https://example.test/a", false, true), None);
    }

    #[test]
    fn other_fragment_links_pass_through() {
        assert_eq!(classify("#section-2", false, false), None);
        assert_eq!(classify("", false, false), None);
    }
}
