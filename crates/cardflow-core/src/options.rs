#![forbid(unsafe_code)]

//! Construction-time navigator options.

use web_time::Duration;

/// Menu-bar chrome style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuBarStyle {
    /// A breadcrumb trail with one entry per card.
    #[default]
    Breadcrumbs,
    /// Back/home buttons plus a single title.
    Navigation,
    /// No menu bar.
    None,
}

impl MenuBarStyle {
    /// Parse an attribute value (`"breadcrumbs"`, `"navigation"`,
    /// anything else disables the bar).
    #[must_use]
    pub fn from_value(value: &str) -> Self {
        match value {
            "breadcrumbs" => Self::Breadcrumbs,
            "navigation" => Self::Navigation,
            _ => Self::None,
        }
    }
}

/// Navigator configuration, set at construction.
///
/// All fields have working defaults; builder methods allow selective
/// overrides, and [`Options::set`] accepts string-keyed attribute pairs
/// for hosts that forward markup attributes verbatim.
#[derive(Debug, Clone)]
pub struct Options {
    /// Auto-bind link-like elements inside cards.
    pub capture_inside_links: bool,
    /// Prefer the activating link's text over the fetched title.
    pub use_link_titles: bool,
    /// Effect applied when an operation passes an empty/`none` effect.
    pub default_effect: Option<String>,
    /// Replay recorded effects with the opposite direction on back
    /// navigation.
    pub reverse_direction_on_back: bool,
    /// Menu-bar chrome style.
    pub menu_bar: MenuBarStyle,
    /// How long a fetch may run before it is terminated.
    pub request_timeout: Duration,
    /// Content fragment selected when the trigger names none.
    pub default_fragment: String,
    /// Cards size themselves to their content (as opposed to a fixed
    /// host-imposed height).
    pub variable_height: bool,
    pub home_button_text: String,
    pub home_button_title: String,
    pub back_button_text: String,
    pub back_button_title: String,
    /// Title of the root card, if any.
    pub title: Option<String>,
    /// Duration of the host's hide/appear feedback transitions; used to
    /// pace progress completion and delayed indicator removal.
    pub feedback_duration: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            capture_inside_links: true,
            use_link_titles: false,
            default_effect: None,
            reverse_direction_on_back: true,
            menu_bar: MenuBarStyle::Breadcrumbs,
            request_timeout: Duration::from_millis(10_000),
            default_fragment: "content".to_string(),
            variable_height: true,
            home_button_text: "Home".to_string(),
            home_button_title: "Go to the Home card".to_string(),
            back_button_text: "Back".to_string(),
            back_button_title: "Go back".to_string(),
            title: None,
            feedback_duration: Duration::from_millis(300),
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn capture_inside_links(mut self, capture: bool) -> Self {
        self.capture_inside_links = capture;
        self
    }

    #[must_use]
    pub fn use_link_titles(mut self, use_titles: bool) -> Self {
        self.use_link_titles = use_titles;
        self
    }

    #[must_use]
    pub fn default_effect(mut self, effect: impl Into<String>) -> Self {
        self.default_effect = Some(effect.into());
        self
    }

    #[must_use]
    pub fn reverse_direction_on_back(mut self, reverse: bool) -> Self {
        self.reverse_direction_on_back = reverse;
        self
    }

    #[must_use]
    pub fn menu_bar(mut self, style: MenuBarStyle) -> Self {
        self.menu_bar = style;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn default_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.default_fragment = fragment.into();
        self
    }

    #[must_use]
    pub fn variable_height(mut self, variable: bool) -> Self {
        self.variable_height = variable;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn feedback_duration(mut self, duration: Duration) -> Self {
        self.feedback_duration = duration;
        self
    }

    /// Apply a string-keyed attribute pair, coercing the raw value the way
    /// forwarded markup attributes arrive (`"true"`/`"false"`/`"null"`,
    /// bare numbers, else text). Returns `false` for unrecognized keys.
    pub fn set(&mut self, key: &str, raw: &str) -> bool {
        match key {
            "capture-inside-links" => self.capture_inside_links = coerce_bool(raw, true),
            "use-link-titles" => self.use_link_titles = coerce_bool(raw, false),
            "default-effect" => {
                self.default_effect = match raw {
                    "" | "null" | "none" => None,
                    other => Some(other.to_string()),
                };
            }
            "reverse-direction-on-back" => {
                self.reverse_direction_on_back = coerce_bool(raw, true);
            }
            "menu-bar" => self.menu_bar = MenuBarStyle::from_value(raw),
            "request-timeout" => {
                if let Some(ms) = coerce_number(raw) {
                    self.request_timeout = Duration::from_millis(ms as u64);
                }
            }
            "default-fragment" => self.default_fragment = raw.to_string(),
            "variable-height" => self.variable_height = coerce_bool(raw, true),
            "home-button-text" => self.home_button_text = raw.to_string(),
            "home-button-title" => self.home_button_title = raw.to_string(),
            "back-button-text" => self.back_button_text = raw.to_string(),
            "back-button-title" => self.back_button_title = raw.to_string(),
            "title" => self.title = Some(raw.to_string()),
            "feedback-duration" => {
                if let Some(ms) = coerce_number(raw) {
                    self.feedback_duration = Duration::from_millis(ms as u64);
                }
            }
            _ => return false,
        }
        true
    }
}

fn coerce_bool(raw: &str, default: bool) -> bool {
    match raw {
        "true" => true,
        "false" | "null" => false,
        _ => default,
    }
}

fn coerce_number(raw: &str) -> Option<f64> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit() || c == '.') {
        raw.parse().ok()
    } else {
        None
    }
}
