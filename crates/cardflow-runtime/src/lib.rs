#![forbid(unsafe_code)]

//! Cardflow runtime: request lifecycle, cancellation, and content parsing.
//!
//! The engine never performs I/O itself. A host supplies a
//! [`ContentFetcher`] (the transport seam) and delivers completions back;
//! this crate owns the bookkeeping around that exchange — the single
//! in-flight [`RequestContext`], its timeout deadline and cancellation
//! token, the reload-vs-new-card decision, and the parsing of the three
//! recognized content kinds into `(title, body)` pairs.

pub mod cancellation;
pub mod content;
pub mod fetcher;
pub mod request;

pub use cancellation::{CancellationSource, CancellationToken};
pub use content::{ParsedContent, parse_content};
pub use fetcher::{ContentFetcher, ContentKind, FetchError, RawContent, StaticFetcher, load_content};
pub use request::{LoadOutcome, RequestContext, RequestManager, RequestTicket};
