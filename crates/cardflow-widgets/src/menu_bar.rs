#![forbid(unsafe_code)]

//! Menu-bar chrome strategies.
//!
//! Two chromes share one strategy trait: a breadcrumb trail with one entry
//! per card, and a navigation bar with back/home buttons plus a single
//! title. The navigator talks to [`MenuBar`] only; hosts render the
//! concrete state ([`BreadcrumbBar::entries`], [`NavigationBar`] labels).
//!
//! Breadcrumb entries have a small lifecycle of their own: a fetch first
//! creates a *loading* placeholder entry, which is committed (titled,
//! bound to its card) on success or removed after the feedback delay on
//! abort. Entry removal is idempotent — a delayed cleanup may fire after
//! another path already removed the entry.

use ahash::AHashMap;

use cardflow_core::card::CardId;
use cardflow_core::options::Options;

/// Placeholder title shown while a fetch is outstanding.
const LOADING_TITLE: &str = "Loading…";

/// Opaque menu entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// A command issued from the menu bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    /// Back one step.
    Back,
    /// Return to the root card.
    Home,
    /// Re-fetch the current card's source.
    Reload,
    /// Activate one breadcrumb entry.
    Activate(EntryId),
}

/// One breadcrumb entry.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    id: EntryId,
    /// The card this entry refers to, once known.
    pub card: Option<CardId>,
    pub title: String,
    /// Reload destination (`url` or `url#fragment`) for entries created
    /// from a fetch.
    pub target: Option<String>,
    /// Stack depth at creation time; selects the reverse effect when the
    /// entry is activated.
    pub position: usize,
    pub loading: bool,
    pub active: bool,
    pub flash: bool,
}

impl MenuEntry {
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }
}

/// Strategy shared by the two menu chromes.
///
/// The navigation-bar implementation no-ops every per-entry operation;
/// only the title is real chrome there.
pub trait MenuBar {
    /// Add a committed entry for a known card. Returns `None` when the
    /// chrome has no per-entry representation.
    fn add_entry(
        &mut self,
        card: CardId,
        title: &str,
        target: Option<&str>,
        position: usize,
    ) -> Option<EntryId>;

    /// Create the loading placeholder for an outstanding fetch.
    fn begin_loading(&mut self, target: &str, position: usize) -> Option<EntryId>;

    /// Commit a loading entry: clear the loading state and, when given,
    /// retitle it.
    fn commit_loading(&mut self, id: EntryId, title: Option<&str>);

    /// Drop the loading and active marks of an aborted entry.
    fn abort_loading(&mut self, id: EntryId);

    /// Bind an entry to its card once the card exists.
    fn attach_card(&mut self, id: EntryId, card: CardId);

    fn activate(&mut self, id: EntryId);

    fn deactivate_card(&mut self, card: CardId);

    fn set_loading(&mut self, id: EntryId, loading: bool);

    /// Retitle the current entry (breadcrumbs) or the bar (navigation).
    fn set_title(&mut self, title: &str);

    /// Remove an entry. Idempotent.
    fn remove(&mut self, id: EntryId);

    /// Remove the entry bound to `card`. Idempotent.
    fn remove_card(&mut self, card: CardId);

    fn flash(&mut self, id: EntryId);

    fn clear_flash(&mut self, id: EntryId);

    fn current(&self) -> Option<EntryId>;

    fn set_current(&mut self, id: Option<EntryId>);

    fn entry(&self, id: EntryId) -> Option<&MenuEntry>;

    fn entry_for_card(&self, card: CardId) -> Option<EntryId>;

    /// Ordered entries, oldest first. Empty for chromes without entries.
    fn entries(&self) -> &[MenuEntry];

    /// The currently displayed title, if the chrome shows one.
    fn title(&self) -> Option<&str>;
}

// ---------------------------------------------------------------------------
// Breadcrumbs
// ---------------------------------------------------------------------------

/// Breadcrumb trail: one entry per card on the active path.
#[derive(Debug, Default)]
pub struct BreadcrumbBar {
    entries: Vec<MenuEntry>,
    by_card: AHashMap<CardId, EntryId>,
    current: Option<EntryId>,
    next_id: u64,
}

impl BreadcrumbBar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, entry: MenuEntry) -> EntryId {
        let id = entry.id;
        if let Some(card) = entry.card {
            self.by_card.insert(card, id);
        }
        self.entries.push(entry);
        id
    }

    fn next_entry_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut MenuEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

impl MenuBar for BreadcrumbBar {
    fn add_entry(
        &mut self,
        card: CardId,
        title: &str,
        target: Option<&str>,
        position: usize,
    ) -> Option<EntryId> {
        let id = self.next_entry_id();
        Some(self.push(MenuEntry {
            id,
            card: Some(card),
            title: title.to_string(),
            target: target.map(str::to_string),
            position,
            loading: false,
            active: true,
            flash: false,
        }))
    }

    fn begin_loading(&mut self, target: &str, position: usize) -> Option<EntryId> {
        let id = self.next_entry_id();
        Some(self.push(MenuEntry {
            id,
            card: None,
            title: LOADING_TITLE.to_string(),
            target: Some(target.to_string()),
            position,
            loading: true,
            active: true,
            flash: false,
        }))
    }

    fn commit_loading(&mut self, id: EntryId, title: Option<&str>) {
        if let Some(entry) = self.entry_mut(id) {
            entry.loading = false;
            if let Some(title) = title {
                entry.title = title.to_string();
            }
        }
    }

    fn abort_loading(&mut self, id: EntryId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.loading = false;
            entry.active = false;
        }
    }

    fn attach_card(&mut self, id: EntryId, card: CardId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.card = Some(card);
        }
        self.by_card.insert(card, id);
    }

    fn activate(&mut self, id: EntryId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.active = true;
        }
    }

    fn deactivate_card(&mut self, card: CardId) {
        if let Some(id) = self.by_card.get(&card).copied() {
            if let Some(entry) = self.entry_mut(id) {
                entry.active = false;
            }
        }
    }

    fn set_loading(&mut self, id: EntryId, loading: bool) {
        if let Some(entry) = self.entry_mut(id) {
            entry.loading = loading;
        }
    }

    fn set_title(&mut self, title: &str) {
        if let Some(id) = self.current {
            if let Some(entry) = self.entry_mut(id) {
                entry.title = title.to_string();
            }
        }
    }

    fn remove(&mut self, id: EntryId) {
        if let Some(index) = self.entries.iter().position(|e| e.id == id) {
            let entry = self.entries.remove(index);
            if let Some(card) = entry.card {
                self.by_card.remove(&card);
            }
            if self.current == Some(id) {
                self.current = None;
            }
        }
    }

    fn remove_card(&mut self, card: CardId) {
        if let Some(id) = self.by_card.get(&card).copied() {
            self.remove(id);
        }
    }

    fn flash(&mut self, id: EntryId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.flash = true;
        }
    }

    fn clear_flash(&mut self, id: EntryId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.flash = false;
        }
    }

    fn current(&self) -> Option<EntryId> {
        self.current
    }

    fn set_current(&mut self, id: Option<EntryId>) {
        self.current = id;
    }

    fn entry(&self, id: EntryId) -> Option<&MenuEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_for_card(&self, card: CardId) -> Option<EntryId> {
        self.by_card.get(&card).copied()
    }

    fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    fn title(&self) -> Option<&str> {
        let id = self.current?;
        self.entry(id).map(|e| e.title.as_str())
    }
}

// ---------------------------------------------------------------------------
// Navigation bar
// ---------------------------------------------------------------------------

/// Back/home buttons plus a single title.
#[derive(Debug, Default)]
pub struct NavigationBar {
    pub home_text: String,
    pub home_title: String,
    pub back_text: String,
    pub back_title: String,
    title: Option<String>,
}

impl NavigationBar {
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        Self {
            home_text: options.home_button_text.clone(),
            home_title: options.home_button_title.clone(),
            back_text: options.back_button_text.clone(),
            back_title: options.back_button_title.clone(),
            title: options.title.clone(),
        }
    }
}

impl MenuBar for NavigationBar {
    fn add_entry(
        &mut self,
        _card: CardId,
        _title: &str,
        _target: Option<&str>,
        _position: usize,
    ) -> Option<EntryId> {
        None
    }

    fn begin_loading(&mut self, _target: &str, _position: usize) -> Option<EntryId> {
        None
    }

    fn commit_loading(&mut self, _id: EntryId, _title: Option<&str>) {}

    fn abort_loading(&mut self, _id: EntryId) {}

    fn attach_card(&mut self, _id: EntryId, _card: CardId) {}

    fn activate(&mut self, _id: EntryId) {}

    fn deactivate_card(&mut self, _card: CardId) {}

    fn set_loading(&mut self, _id: EntryId, _loading: bool) {}

    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn remove(&mut self, _id: EntryId) {}

    fn remove_card(&mut self, _card: CardId) {}

    fn flash(&mut self, _id: EntryId) {}

    fn clear_flash(&mut self, _id: EntryId) {}

    fn current(&self) -> Option<EntryId> {
        None
    }

    fn set_current(&mut self, _id: Option<EntryId>) {}

    fn entry(&self, _id: EntryId) -> Option<&MenuEntry> {
        None
    }

    fn entry_for_card(&self, _card: CardId) -> Option<EntryId> {
        None
    }

    fn entries(&self) -> &[MenuEntry] {
        &[]
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}
