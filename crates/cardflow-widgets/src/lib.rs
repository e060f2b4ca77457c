#![forbid(unsafe_code)]

//! Cardflow widgets: the card navigation engine and its collaborator seams.
//!
//! [`CardNavigator`] owns the card stack and history, selects and
//! validates effects, drives the visual effect driver through transition
//! lifecycles, and orchestrates the request lifecycle when new content is
//! needed. The visual side (a [`VisualEffectDriver`] implementation) and
//! the transport side (a `ContentFetcher`) are host-supplied.

pub mod driver;
pub mod link;
pub mod menu_bar;
pub mod navigator;

pub use driver::{
    EchoDriver, NullDriver, ResolvedTransition, SignalProperty, SignalSource, TransitionSignal,
    VisualEffectDriver,
};
pub use link::{LinkCommand, classify};
pub use menu_bar::{BreadcrumbBar, EntryId, MenuBar, MenuCommand, MenuEntry, NavigationBar};
pub use navigator::{BackTarget, CardNavigator, LoadHandle};
