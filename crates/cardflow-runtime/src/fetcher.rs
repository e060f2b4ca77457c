#![forbid(unsafe_code)]

//! The content fetcher seam.
//!
//! Transport is the host's concern: the engine hands a URL and a
//! cancellation token to a [`ContentFetcher`] and receives a raw body
//! tagged with one of the three recognized [`ContentKind`]s, or a typed
//! failure. [`load_content`] composes a fetch with content parsing into
//! the `(title, body)` pair a card needs.

use std::collections::HashMap;
use std::fmt;

use crate::cancellation::CancellationToken;
use crate::content::{ParsedContent, parse_content};

/// The recognized content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Structured data (object media type, e.g. JSON).
    Structured,
    /// Markup documents.
    Markup,
    /// Plain text.
    Plain,
}

impl ContentKind {
    /// Map a media type to a content kind.
    ///
    /// Parameters after a `;` are ignored. Anything outside the three
    /// recognized families is an [`FetchError::UnsupportedKind`].
    pub fn from_media_type(media_type: &str) -> Result<Self, FetchError> {
        let media = media_type.trim();
        if media.starts_with("application/json") {
            Ok(Self::Structured)
        } else if media.starts_with("text/html") {
            Ok(Self::Markup)
        } else if media.starts_with("text/plain") {
            Ok(Self::Plain)
        } else {
            Err(FetchError::UnsupportedKind(media.to_string()))
        }
    }
}

/// A fetched body tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent {
    pub kind: ContentKind,
    pub body: String,
}

impl RawContent {
    #[must_use]
    pub fn new(kind: ContentKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// Tag a body by its media type.
    pub fn from_media_type(media_type: &str, body: impl Into<String>) -> Result<Self, FetchError> {
        Ok(Self::new(ContentKind::from_media_type(media_type)?, body))
    }
}

/// Typed fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request's cancellation token was aborted. This is the expected
    /// outcome of request teardown and is recovered locally.
    Cancelled,
    /// Network or parse failure.
    Failed(String),
    /// The response media type is not one of the recognized kinds.
    UnsupportedKind(String),
}

impl FetchError {
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "request was cancelled"),
            Self::Failed(reason) => write!(f, "fetch failed: {reason}"),
            Self::UnsupportedKind(media) => write!(f, "unrecognized content type `{media}`"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Transport seam: retrieve a raw body for a URL.
///
/// Implementations must honor the token: once it reports cancelled, fail
/// with [`FetchError::Cancelled`] instead of producing a result.
pub trait ContentFetcher {
    fn fetch(
        &mut self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<RawContent, FetchError>;
}

/// In-memory fetcher serving a fixed route table. Used by tests and
/// fixtures.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    routes: HashMap<String, RawContent>,
}

impl StaticFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route (builder form).
    #[must_use]
    pub fn route(mut self, url: impl Into<String>, content: RawContent) -> Self {
        self.routes.insert(url.into(), content);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, content: RawContent) {
        self.routes.insert(url.into(), content);
    }
}

impl ContentFetcher for StaticFetcher {
    fn fetch(
        &mut self,
        url: &str,
        token: &CancellationToken,
    ) -> Result<RawContent, FetchError> {
        if token.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Failed(format!("no route for {url}")))
    }
}

/// Fetch `url` and parse the body into a `(title, body)` pair, selecting
/// `fragment` where the kind supports it.
pub fn load_content<F: ContentFetcher>(
    fetcher: &mut F,
    url: &str,
    fragment: Option<&str>,
    token: &CancellationToken,
) -> Result<ParsedContent, FetchError> {
    if token.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    let raw = fetcher.fetch(url, token)?;
    parse_content(&raw, fragment)
}
