#![forbid(unsafe_code)]

//! Cardflow public facade crate.
//!
//! Re-exports the stable surface area: the card navigation engine, its
//! collaborator seams (visual effect driver, content fetcher, menu bars),
//! and the progress tracker. Most applications only need this crate plus
//! a driver and fetcher implementation:
//!
//! ```
//! use cardflow::{CardNavigator, NullDriver, Options};
//! use web_time::Instant;
//!
//! let mut nav = CardNavigator::new(Options::default().title("Home"), NullDriver);
//! nav.push_content("<p>Hello</p>", "Hello", "none", Instant::now()).unwrap();
//! assert_eq!(nav.depth(), 1);
//! ```

// --- Core re-exports -------------------------------------------------------

pub use cardflow_core::card::{Card, CardId, CardStack};
pub use cardflow_core::effect::{Axis, Direction, EffectSpec, TransitionKinds};
pub use cardflow_core::error::{EffectError, NavError, ProgressError};
pub use cardflow_core::history::{ActionRecord, HistoryEntry, HistoryEvent};
pub use cardflow_core::options::{MenuBarStyle, Options};
pub use cardflow_core::pending::{Pending, PendingStatus};
pub use cardflow_core::progress::{ProgressPlan, ProgressState, ProgressTracker};

// --- Runtime re-exports ----------------------------------------------------

pub use cardflow_runtime::cancellation::{CancellationSource, CancellationToken};
pub use cardflow_runtime::content::{ParsedContent, parse_content};
pub use cardflow_runtime::fetcher::{
    ContentFetcher, ContentKind, FetchError, RawContent, StaticFetcher,
};
pub use cardflow_runtime::request::{LoadOutcome, RequestManager, RequestTicket};

// --- Widget re-exports -----------------------------------------------------

pub use cardflow_widgets::driver::{
    EchoDriver, NullDriver, ResolvedTransition, SignalProperty, SignalSource, TransitionSignal,
    VisualEffectDriver,
};
pub use cardflow_widgets::link::{LinkCommand, classify};
pub use cardflow_widgets::menu_bar::{
    BreadcrumbBar, EntryId, MenuBar, MenuCommand, MenuEntry, NavigationBar,
};
pub use cardflow_widgets::navigator::{BackTarget, CardNavigator, LoadHandle};
