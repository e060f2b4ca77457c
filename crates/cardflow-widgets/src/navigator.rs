#![forbid(unsafe_code)]

//! The card navigation engine.
//!
//! [`CardNavigator`] owns the card stack and its two histories, selects
//! and validates effects, drives the visual effect driver through the
//! transition lifecycle, and orchestrates the single in-flight content
//! request (timeout, cancellation, progress feedback, loading indicator).
//!
//! Everything is single-threaded and cooperative. Long-running work is a
//! pending operation resumed by host callbacks:
//!
//! - [`CardNavigator::tick`] once per visual frame — drives the request
//!   timeout, progress interpolation, and delayed cleanup (flash
//!   acknowledgments, indicator removal).
//! - [`CardNavigator::handle_signal`] when a visual transition finishes.
//! - [`CardNavigator::complete_request`] when a fetch finishes.
//!
//! # Invariants
//!
//! 1. `Idle → Transitioning → Idle`: at most one transition context, no
//!    nesting. Navigation entry points fail fast with
//!    `TransitionInProgress` while playing.
//! 2. `history.len() == stack.len()` whenever no transition is in flight.
//! 3. `action_history.len() == stack.len() - 1` under the same condition.
//! 4. At most one request context; starting a new one tears the previous
//!    one down synchronously. Stale completions are ignored.
//! 5. Transition completion is idempotent: the context is consumed, and a
//!    duplicate qualifying signal finds nothing to complete.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use web_time::{Duration, Instant};

use cardflow_core::card::{Card, CardId, CardIdGen, CardStack};
use cardflow_core::effect::{EffectSpec, TransitionKinds};
use cardflow_core::error::NavError;
use cardflow_core::history::{ActionRecord, HistoryEntry, HistoryEvent};
use cardflow_core::options::{MenuBarStyle, Options};
use cardflow_core::pending::Pending;
use cardflow_core::progress::{ProgressPlan, ProgressTracker, random_between};
use cardflow_runtime::cancellation::CancellationToken;
use cardflow_runtime::content::parse_content;
use cardflow_runtime::fetcher::{ContentFetcher, FetchError, RawContent};
use cardflow_runtime::request::{LoadOutcome, RequestContext, RequestManager, RequestTicket};

use crate::driver::{SignalProperty, SignalSource, TransitionSignal, VisualEffectDriver};
use crate::link::{LinkCommand, classify};
use crate::menu_bar::{BreadcrumbBar, EntryId, MenuBar, MenuCommand, NavigationBar};

/// Reload acknowledgment flash duration.
const RELOAD_FLASH: Duration = Duration::from_millis(100);
/// Menu-item activation flash duration.
const ENTRY_FLASH: Duration = Duration::from_millis(250);
/// Steps in a generated request-progress plan.
const PLAN_STEPS: usize = 10;

/// Target of a back navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTarget {
    /// N steps down from the top (1 = the card directly beneath).
    Steps(usize),
    /// A specific card.
    Card(CardId),
}

impl From<usize> for BackTarget {
    fn from(steps: usize) -> Self {
        Self::Steps(steps)
    }
}

impl From<CardId> for BackTarget {
    fn from(card: CardId) -> Self {
        Self::Card(card)
    }
}

/// Caller-facing handles for one started load.
#[derive(Debug, Clone)]
pub struct LoadHandle {
    pub ticket: RequestTicket,
    pub done: Pending<LoadOutcome, FetchError>,
    /// Token the transport must honor; aborted on termination/timeout.
    pub token: CancellationToken,
}

/// In-flight transition bookkeeping. Exactly one exists while playing.
#[derive(Debug)]
struct TransitionContext {
    resolved: crate::driver::ResolvedTransition,
    reduce: usize,
    incoming: CardId,
    outgoing: CardId,
    done: Pending<(), NavError>,
}

#[derive(Debug)]
enum DelayedJob {
    RemoveMenuEntry(EntryId),
    ClearReloadFlash,
    ClearEntryFlash(EntryId),
}

#[derive(Debug)]
struct DelayedTask {
    due: Instant,
    job: DelayedJob,
}

/// The navigation/transition engine.
pub struct CardNavigator<D: VisualEffectDriver> {
    options: Options,
    driver: D,
    ids: CardIdGen,
    stack: CardStack,
    active: CardId,
    history: Vec<HistoryEntry>,
    action_history: Vec<ActionRecord>,
    depth: usize,
    playing: bool,
    transition: Option<TransitionContext>,
    requests: RequestManager,
    request_indicator: Option<EntryId>,
    progress: ProgressTracker,
    menu: Option<Box<dyn MenuBar>>,
    tasks: Vec<DelayedTask>,
    reload_flash: bool,
    on_end: Option<Box<dyn FnMut(&Card, &Card)>>,
    rng: SmallRng,
}

impl<D: VisualEffectDriver> std::fmt::Debug for CardNavigator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardNavigator")
            .field("depth", &self.depth)
            .field("playing", &self.playing)
            .field("cards", &self.stack.len())
            .field("history", &self.history.len())
            .field("request_active", &self.requests.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Construction and accessors
// ---------------------------------------------------------------------------

impl<D: VisualEffectDriver> CardNavigator<D> {
    /// Create a navigator with an empty root card.
    pub fn new(options: Options, mut driver: D) -> Self {
        let mut ids = CardIdGen::default();
        let root_id = ids.next_id();
        let mut root = Card::new(root_id, "");
        root.set_active(true);
        root.set_in_transition(true);
        if let Some(title) = &options.title {
            root.set_title(title.clone());
        }

        let mut stack = CardStack::new();
        stack.push_top(root);
        let history = vec![HistoryEntry::local(root_id, options.title.clone())];

        let mut menu: Option<Box<dyn MenuBar>> = match options.menu_bar {
            MenuBarStyle::Breadcrumbs => Some(Box::new(BreadcrumbBar::new())),
            MenuBarStyle::Navigation => Some(Box::new(NavigationBar::from_options(&options))),
            MenuBarStyle::None => None,
        };
        // The root ("titular") entry exists only when the host titled it.
        if options.menu_bar == MenuBarStyle::Breadcrumbs {
            if let (Some(title), Some(bar)) = (&options.title, menu.as_deref_mut()) {
                let id = bar.add_entry(root_id, title, None, 0);
                bar.set_current(id);
            }
        }

        driver.set_depth(0);

        Self {
            options,
            driver,
            ids,
            stack,
            active: root_id,
            history,
            action_history: Vec::new(),
            depth: 0,
            playing: false,
            transition: None,
            requests: RequestManager::new(),
            request_indicator: None,
            progress: ProgressTracker::new(),
            menu,
            tasks: Vec::new(),
            reload_flash: false,
            on_end: None,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Set the root card's content payload (builder form).
    #[must_use]
    pub fn with_root_content(mut self, content: impl Into<String>) -> Self {
        if let Some(root) = self.stack.top_mut() {
            root.set_content(content);
        }
        self
    }

    /// Seed the progress-plan generator (builder form, for deterministic
    /// tests).
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Register the end-of-transition callback, invoked with
    /// `(incoming, outgoing)` card references.
    pub fn on_transition_end(&mut self, callback: impl FnMut(&Card, &Card) + 'static) {
        self.on_end = Some(Box::new(callback));
    }

    /// Current non-root stack depth (0 = root).
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a transition is currently playing.
    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    pub fn stack(&self) -> &CardStack {
        &self.stack
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn action_history(&self) -> &[ActionRecord] {
        &self.action_history
    }

    /// The presented card.
    #[must_use]
    pub fn active_card(&self) -> Option<&Card> {
        self.stack.get(self.active)
    }

    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.stack.get(id)
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressTracker {
        &mut self.progress
    }

    #[must_use]
    pub fn menu(&self) -> Option<&dyn MenuBar> {
        self.menu.as_deref()
    }

    /// The in-flight request, if any.
    #[must_use]
    pub fn active_request(&self) -> Option<&RequestContext> {
        self.requests.active()
    }

    /// Whether the brief reload acknowledgment flash is showing.
    #[inline]
    #[must_use]
    pub fn reload_flash(&self) -> bool {
        self.reload_flash
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

impl<D: VisualEffectDriver> CardNavigator<D> {
    /// Push a new card with the given content and start a transition.
    ///
    /// Terminates any outstanding fetch first. Does not re-check the
    /// playing flag — the checking entry points (`navigate_to_url`,
    /// `go_back`) enforce exclusivity before dispatching here.
    pub fn push_content(
        &mut self,
        content: &str,
        title: &str,
        effect: &str,
        now: Instant,
    ) -> Result<Pending<(), NavError>, NavError> {
        self.push_card(content, title, effect, None, None, now)
    }

    /// Like [`CardNavigator::push_content`], recording a full history
    /// event (source URL and fragment) for the new card.
    pub fn push_content_with_event(
        &mut self,
        content: &str,
        title: &str,
        effect: &str,
        event: HistoryEvent,
        now: Instant,
    ) -> Result<Pending<(), NavError>, NavError> {
        self.push_card(content, title, effect, Some(event), None, now)
    }

    /// Pop 1..N cards back to `target`, replaying `effect`.
    ///
    /// Terminates an active fetch first. Fails with
    /// `TransitionInProgress` while playing; returns `Ok(None)` when the
    /// target is already active or not found.
    pub fn go_back(
        &mut self,
        target: BackTarget,
        effect: &str,
        now: Instant,
    ) -> Result<Option<Pending<(), NavError>>, NavError> {
        tracing::debug!(target: "cardflow.nav", ?target, effect, "go back");

        if self.requests.is_active() {
            self.terminate_request(false, now);
        }
        if self.playing {
            return Err(NavError::TransitionInProgress);
        }

        let index = match target {
            BackTarget::Steps(n) => {
                if self.stack.len() <= n {
                    return Ok(None);
                }
                n
            }
            BackTarget::Card(id) => match self.stack.index_of(id) {
                Some(i) => i,
                None => return Ok(None),
            },
        };

        let Some(target_id) = self.stack.by_index(index).map(Card::id) else {
            return Ok(None);
        };
        if target_id == self.active {
            return Ok(None);
        }

        self.stack.relocate_to_front(target_id);
        self.init_transition(target_id, effect, index, true).map(Some)
    }

    /// Go back exactly one card, replaying the last recorded action.
    pub fn go_back_by_one(
        &mut self,
        now: Instant,
    ) -> Result<Option<Pending<(), NavError>>, NavError> {
        if self.depth == 0 {
            return Ok(None);
        }
        let effect = self.action_history[self.depth - 1]
            .to_effect_string(self.options.reverse_direction_on_back);
        self.go_back(BackTarget::Steps(1), &effect, now)
    }

    /// Close every card above the root, replaying the first recorded
    /// action.
    pub fn go_home(&mut self, now: Instant) -> Result<Option<Pending<(), NavError>>, NavError> {
        if self.depth == 0 {
            return Ok(None);
        }
        let effect =
            self.action_history[0].to_effect_string(self.options.reverse_direction_on_back);
        self.go_back(BackTarget::Steps(self.depth), &effect, now)
    }

    /// Deliver a finished visual transition. Signals are filtered by the
    /// playing transition's category set; anything else is ignored, as is
    /// any signal while idle (the double-fire guard).
    pub fn handle_signal(&mut self, signal: TransitionSignal) {
        if !self.playing {
            return;
        }
        let Some(ctx) = &self.transition else {
            return;
        };
        let kinds = ctx.resolved.kinds;
        let qualifies = match (signal.source, signal.property) {
            (SignalSource::Container, SignalProperty::Transform) => {
                kinds.contains(TransitionKinds::SHIFT)
            }
            (SignalSource::Card(id), SignalProperty::Transform) => {
                kinds.contains(TransitionKinds::SLIDE) && id == ctx.incoming
            }
            (SignalSource::Card(id), SignalProperty::Opacity) => {
                kinds.contains(TransitionKinds::FADE) && id == ctx.outgoing
            }
            _ => false,
        };
        if qualifies {
            tracing::debug!(target: "cardflow.nav", ?signal, "transition completion signal");
            self.complete_transition();
        }
    }

    fn push_card(
        &mut self,
        content: &str,
        title: &str,
        effect: &str,
        event: Option<HistoryEvent>,
        indicator: Option<EntryId>,
        now: Instant,
    ) -> Result<Pending<(), NavError>, NavError> {
        // A fresh programmatic push kills any outstanding fetch; a push
        // dispatched from a completed fetch arrives with its indicator and
        // the request already consumed.
        if indicator.is_none() && self.requests.is_active() {
            self.terminate_request(false, now);
        }

        let id = self.ids.next_id();
        let mut card = Card::new(id, content);
        card.set_title(title);
        self.stack.push_top(card);

        let entry = match event {
            Some(ev) => HistoryEntry::from_event(ev, id),
            None => HistoryEntry::local(id, Some(title.to_string())),
        };
        let target = entry.url.as_ref().map(|url| match &entry.fragment {
            Some(f) => format!("{url}#{f}"),
            None => url.clone(),
        });
        self.history.push(entry);

        match self.options.menu_bar {
            MenuBarStyle::Breadcrumbs => {
                let position = self.depth + 1;
                if let Some(menu) = self.menu.as_deref_mut() {
                    match indicator {
                        Some(ind) => {
                            menu.attach_card(ind, id);
                            menu.activate(ind);
                            menu.set_current(Some(ind));
                        }
                        None => {
                            let eid = menu.add_entry(id, title, target.as_deref(), position);
                            menu.set_current(eid);
                        }
                    }
                }
            }
            MenuBarStyle::Navigation => {
                if let Some(menu) = self.menu.as_deref_mut() {
                    menu.set_title(title);
                }
            }
            MenuBarStyle::None => {}
        }

        self.init_transition(id, effect, 0, false)
    }

    fn init_transition(
        &mut self,
        target: CardId,
        effect: &str,
        reduce: usize,
        relocated: bool,
    ) -> Result<Pending<(), NavError>, NavError> {
        tracing::debug!(target: "cardflow.nav", effect, reduce, relocated, "init transition");

        let requested = effect.trim();
        let effect = if (requested.is_empty() || requested == "none")
            && self.options.default_effect.is_some()
        {
            self.options.default_effect.clone().unwrap_or_default()
        } else {
            requested.to_string()
        };

        let spec = EffectSpec::parse(&effect)?;

        if let Some(card) = self.stack.get_mut(target) {
            card.set_in_transition(true);
        }
        self.playing = true;

        // Only the probe's view of the effect counts from here on: the
        // requested token and the rendered capability can disagree.
        let resolved = self.driver.resolve(target, &spec);
        tracing::debug!(
            target: "cardflow.nav",
            kinds = ?resolved.kinds,
            direction = ?resolved.direction,
            "resolved transition"
        );

        let outgoing = self.active;

        if !relocated {
            self.action_history.push(ActionRecord {
                kinds: resolved.kinds,
                direction: resolved.direction,
            });
            self.depth += 1;
        } else {
            self.depth = self.depth.saturating_sub(reduce);
            let keep = self.action_history.len().saturating_sub(reduce);
            self.action_history.truncate(keep);
            let keep = self.history.len().saturating_sub(reduce);
            self.history.truncate(keep);

            if self.options.menu_bar == MenuBarStyle::Navigation {
                let title = self
                    .stack
                    .get(target)
                    .and_then(|c| c.title().map(str::to_string));
                if let (Some(title), Some(menu)) = (title, self.menu.as_deref_mut()) {
                    menu.set_title(&title);
                }
            }
        }

        self.driver.set_depth(self.depth);
        self.driver.begin(&resolved, target);

        // The covered range loses its transition mark and menu highlight
        // now; the cards themselves are removed on completion.
        if reduce > 0 {
            let mut covered = Vec::with_capacity(reduce);
            for i in 1..=reduce {
                if let Some(card) = self.stack.by_index(i) {
                    covered.push((card.id(), card.is_active()));
                }
            }
            for (card_id, is_on) in covered {
                if !is_on {
                    if let Some(card) = self.stack.get_mut(card_id) {
                        card.set_in_transition(false);
                    }
                }
                if let Some(menu) = self.menu.as_deref_mut() {
                    menu.deactivate_card(card_id);
                }
            }
        }

        let done = Pending::new();
        self.transition = Some(TransitionContext {
            resolved,
            reduce,
            incoming: target,
            outgoing,
            done: done.clone(),
        });

        // Nothing renders: complete synchronously.
        if !resolved.is_animated() {
            self.complete_transition();
        }

        Ok(done)
    }

    /// Idempotent: consumes the transition context; a second call (or a
    /// duplicate signal) finds nothing and returns.
    fn complete_transition(&mut self) {
        let Some(ctx) = self.transition.take() else {
            return;
        };
        tracing::debug!(
            target: "cardflow.nav",
            incoming = %ctx.incoming,
            outgoing = %ctx.outgoing,
            reduce = ctx.reduce,
            "completing transition"
        );

        self.playing = false;

        if let Some(outgoing) = self.stack.get_mut(ctx.outgoing) {
            outgoing.set_active(false);
            outgoing.set_in_transition(false);
        }
        if let Some(top) = self.stack.top_mut() {
            top.set_active(true);
        }

        if let Some(callback) = self.on_end.as_mut() {
            if let (Some(incoming), Some(outgoing)) =
                (self.stack.get(ctx.incoming), self.stack.get(ctx.outgoing))
            {
                callback(incoming, outgoing);
            }
        }

        self.active = ctx.incoming;
        self.driver.finish(&ctx.resolved, ctx.incoming);

        if ctx.reduce > 0 {
            let removed = self.stack.drain_after_top(ctx.reduce);
            for card in removed {
                if let Some(menu) = self.menu.as_deref_mut() {
                    // May already be gone if a terminated request's
                    // delayed cleanup got there first.
                    menu.remove_card(card.id());
                }
            }
        }

        ctx.done.resolve(());
        debug_assert_eq!(self.history.len(), self.stack.len());
    }
}

// ---------------------------------------------------------------------------
// Request lifecycle
// ---------------------------------------------------------------------------

impl<D: VisualEffectDriver> CardNavigator<D> {
    /// Start fetching `url` into a new card (or a reload of the current
    /// one — decided from the top history entry before any fetch).
    ///
    /// The host performs the transport using [`LoadHandle::token`] and
    /// delivers the outcome to [`CardNavigator::complete_request`].
    pub fn navigate_to_url(
        &mut self,
        url: &str,
        fragment: Option<&str>,
        effect: &str,
        link_text: Option<&str>,
        now: Instant,
    ) -> Result<LoadHandle, NavError> {
        self.begin_request(url, fragment, effect, link_text, None, now)
    }

    /// Convenience for synchronous fetchers (tests, fixtures): begin the
    /// request, run the fetch, deliver the completion.
    pub fn load_from<F: ContentFetcher>(
        &mut self,
        fetcher: &mut F,
        url: &str,
        fragment: Option<&str>,
        effect: &str,
        link_text: Option<&str>,
        now: Instant,
    ) -> Result<Pending<LoadOutcome, FetchError>, NavError> {
        let handle = self.navigate_to_url(url, fragment, effect, link_text, now)?;
        let result = fetcher.fetch(url, &handle.token);
        self.complete_request(handle.ticket, result, now);
        Ok(handle.done)
    }

    /// Re-fetch the current card's source URL, replacing its content in
    /// place. Returns `Ok(None)` when the current card has no URL
    /// (programmatic content never reloads).
    pub fn reload(&mut self, now: Instant) -> Result<Option<LoadHandle>, NavError> {
        let Some(entry) = self.history.last() else {
            return Ok(None);
        };
        let Some(url) = entry.url.clone() else {
            return Ok(None);
        };
        let fragment = entry.fragment.clone();
        self.navigate_to_url(&url, fragment.as_deref(), "none", None, now)
            .map(Some)
    }

    /// Deliver a fetch outcome. Stale tickets (a terminated or superseded
    /// request) are ignored and can never mutate the card stack.
    pub fn complete_request(
        &mut self,
        ticket: RequestTicket,
        result: Result<RawContent, FetchError>,
        now: Instant,
    ) {
        let Some(ctx) = self.requests.take_if(ticket) else {
            tracing::debug!(target: "cardflow.nav", ?ticket, "stale fetch completion ignored");
            return;
        };

        let default_fragment = (!self.options.default_fragment.is_empty())
            .then(|| self.options.default_fragment.clone());
        let fragment = ctx.fragment().map(str::to_string).or(default_fragment);

        match result.and_then(|raw| parse_content(&raw, fragment.as_deref())) {
            Ok(parsed) => {
                tracing::debug!(target: "cardflow.nav", url = ctx.url(), "request completed");
                let _ = self.progress.complete(self.options.feedback_duration);

                let title = match (self.options.use_link_titles, ctx.link_text()) {
                    (true, Some(text)) if !text.is_empty() => text.to_string(),
                    _ => parsed.title.clone(),
                };

                let indicator = self.request_indicator.take();
                if self.options.menu_bar == MenuBarStyle::Breadcrumbs {
                    if let (Some(ind), Some(menu)) = (indicator, self.menu.as_deref_mut()) {
                        menu.commit_loading(ind, Some(&title));
                    }
                }

                if ctx.is_new_instance() {
                    let event = HistoryEvent {
                        url: Some(ctx.url().to_string()),
                        fragment: ctx.fragment().map(str::to_string),
                        title: Some(title.clone()),
                    };
                    match self.push_card(&parsed.body, &title, ctx.effect(), Some(event), indicator, now)
                    {
                        Ok(_) => {
                            ctx.done().resolve(LoadOutcome::NewCard);
                        }
                        Err(err) => {
                            tracing::error!(
                                target: "cardflow.nav",
                                error = %err,
                                "push after fetch failed"
                            );
                            ctx.done().reject(FetchError::Failed(err.to_string()));
                        }
                    }
                } else {
                    self.put_content(&parsed.body, &title);
                    self.reload_flash = true;
                    self.tasks.push(DelayedTask {
                        due: now + RELOAD_FLASH,
                        job: DelayedJob::ClearReloadFlash,
                    });
                    ctx.done().resolve(LoadOutcome::Reloaded);
                }
            }
            Err(err) if err.is_cancelled() => {
                // Expected outcome of our own terminate(); recovered here.
                tracing::debug!(target: "cardflow.nav", "fetch cancelled");
                ctx.done().reject(FetchError::Cancelled);
            }
            Err(err) => {
                tracing::error!(
                    target: "cardflow.nav",
                    error = %err,
                    "populate content from url failed"
                );
                let indicator = self.request_indicator.take();
                if let (Some(ind), Some(menu)) = (indicator, self.menu.as_deref_mut()) {
                    menu.abort_loading(ind);
                    self.tasks.push(DelayedTask {
                        due: now + self.options.feedback_duration,
                        job: DelayedJob::RemoveMenuEntry(ind),
                    });
                }
                self.progress.revert();
                ctx.abort(err);
            }
        }
    }

    /// Drive timers: request timeout, progress frames, delayed cleanup.
    /// Call once per visual frame.
    pub fn tick(&mut self, now: Instant) {
        if self.requests.timed_out(now) {
            tracing::debug!(target: "cardflow.nav", "aborting request after timeout");
            self.terminate_request(false, now);
        }

        self.progress.frame(now);

        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].due <= now {
                let task = self.tasks.swap_remove(i);
                self.run_delayed(task.job);
            } else {
                i += 1;
            }
        }
    }

    /// Tear down the in-flight request: clear the deadline, abort the
    /// token, revert progress, and (unless told to leave it) remove the
    /// loading indicator after the feedback delay. Idempotent.
    pub fn terminate_request(&mut self, leave_indicator: bool, now: Instant) {
        if self.requests.terminate().is_none() {
            return;
        }

        let indicator = self.request_indicator.take();
        if let (Some(ind), Some(menu)) = (indicator, self.menu.as_deref_mut()) {
            if leave_indicator {
                menu.set_loading(ind, false);
            } else {
                menu.abort_loading(ind);
                self.tasks.push(DelayedTask {
                    due: now + self.options.feedback_duration,
                    job: DelayedJob::RemoveMenuEntry(ind),
                });
            }
        }

        self.progress.revert();
    }

    fn begin_request(
        &mut self,
        url: &str,
        fragment: Option<&str>,
        effect: &str,
        link_text: Option<&str>,
        indicator: Option<EntryId>,
        now: Instant,
    ) -> Result<LoadHandle, NavError> {
        tracing::debug!(target: "cardflow.nav", url, "populate content from url");

        // An indicator means this is a replay of an already-visible
        // loading entry, not a new interactive trigger.
        if indicator.is_none() && self.playing {
            return Err(NavError::TransitionInProgress);
        }
        if self.requests.is_active() {
            self.terminate_request(false, now);
        }

        let mut new_instance = !RequestManager::is_reload(self.history.last(), url, fragment);

        let mut chosen = indicator;
        if self.options.menu_bar == MenuBarStyle::Breadcrumbs {
            let position = self.depth + 1;
            if let Some(menu) = self.menu.as_deref_mut() {
                match chosen {
                    Some(_) => new_instance = false,
                    None if new_instance => {
                        let target = match fragment {
                            Some(f) => format!("{url}#{f}"),
                            None => url.to_string(),
                        };
                        chosen = menu.begin_loading(&target, position);
                        if chosen.is_some() {
                            menu.set_current(chosen);
                        }
                    }
                    None => chosen = menu.current(),
                }
            }
        }
        self.request_indicator = chosen;

        // Visual feedback: climb a randomized plan toward 90–99% spread
        // over the request timeout.
        let ceiling = random_between(&mut self.rng, 90, 99);
        let plan = ProgressPlan::generate(&mut self.rng, ceiling, PLAN_STEPS);
        let _ = self.progress.plan_to(&plan, self.options.request_timeout);

        let ctx = self.requests.begin(
            url,
            fragment,
            effect,
            link_text,
            new_instance,
            self.options.request_timeout,
            now,
        );
        Ok(LoadHandle {
            ticket: ctx.ticket(),
            done: ctx.done(),
            token: ctx.token(),
        })
    }

    /// Replace the current card's content in place (reload).
    fn put_content(&mut self, content: &str, title: &str) {
        tracing::debug!(target: "cardflow.nav", "putting content");
        if let Some(top) = self.stack.top_mut() {
            top.set_content(content);
            top.set_title(title);
        }
        if let Some(menu) = self.menu.as_deref_mut() {
            menu.set_title(title);
        }
    }

    fn run_delayed(&mut self, job: DelayedJob) {
        match job {
            DelayedJob::RemoveMenuEntry(id) => {
                if let Some(menu) = self.menu.as_deref_mut() {
                    menu.remove(id);
                }
            }
            DelayedJob::ClearReloadFlash => self.reload_flash = false,
            DelayedJob::ClearEntryFlash(id) => {
                if let Some(menu) = self.menu.as_deref_mut() {
                    menu.clear_flash(id);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Activation surface
// ---------------------------------------------------------------------------

impl<D: VisualEffectDriver> CardNavigator<D> {
    /// Dispatch a classified link activation.
    pub fn follow_link(
        &mut self,
        command: LinkCommand<'_>,
        effect: &str,
        link_text: Option<&str>,
        now: Instant,
    ) -> Result<(), NavError> {
        match command {
            LinkCommand::Back => self.go_back_by_one(now).map(|_| ()),
            LinkCommand::Home => self.go_home(now).map(|_| ()),
            LinkCommand::Fetch { url, fragment } => self
                .navigate_to_url(url, fragment, effect, link_text, now)
                .map(|_| ()),
        }
    }

    /// Dispatch a menu-bar command.
    pub fn handle_menu_command(&mut self, command: MenuCommand, now: Instant) -> Result<(), NavError> {
        match command {
            MenuCommand::Back => self.go_back_by_one(now).map(|_| ()),
            MenuCommand::Home => self.go_home(now).map(|_| ()),
            MenuCommand::Reload => self.reload(now).map(|_| ()),
            MenuCommand::Activate(id) => self.activate_entry(id, now).map(|_| ()),
        }
    }

    /// Activate a breadcrumb entry: abort its own pending load, or
    /// navigate back to its card — and, when the entry carries a URL,
    /// reload that card's content with the entry as the loading
    /// indicator.
    pub fn activate_entry(
        &mut self,
        id: EntryId,
        now: Instant,
    ) -> Result<Option<Pending<(), NavError>>, NavError> {
        // The entry is the active request's own loading indicator: this
        // activation is an abort.
        if self.requests.is_active() && self.request_indicator == Some(id) {
            let reload = self.requests.active().is_some_and(|c| !c.is_new_instance());
            self.terminate_request(reload, now);
            if reload {
                if let Some(menu) = self.menu.as_deref_mut() {
                    menu.commit_loading(id, None);
                }
            }
            self.flash_entry(id, now);
            return Ok(None);
        }

        let Some((card, position, target)) = self
            .menu
            .as_deref()
            .and_then(|menu| menu.entry(id))
            .map(|e| (e.card, e.position, e.target.clone()))
        else {
            return Ok(None);
        };
        let title = self
            .menu
            .as_deref()
            .and_then(|menu| menu.entry(id))
            .map(|e| e.title.clone());

        let is_current = self.menu.as_deref().and_then(|m| m.current()) == Some(id);
        let effect = if !is_current && self.action_history.len() > position {
            self.action_history[position].to_effect_string(self.options.reverse_direction_on_back)
        } else {
            "none".to_string()
        };

        let pending = match card {
            Some(card) => self.go_back(BackTarget::Card(card), &effect, now)?,
            None => None,
        };

        // Entries created from a fetch reload their content on activation.
        if let Some(target) = target {
            if let Some(LinkCommand::Fetch { url, fragment }) = classify(&target, false, false) {
                let url = url.to_string();
                let fragment = fragment.map(str::to_string);
                if let Some(menu) = self.menu.as_deref_mut() {
                    menu.set_loading(id, true);
                    menu.set_current(Some(id));
                }
                self.begin_request(
                    &url,
                    fragment.as_deref(),
                    "none",
                    title.as_deref(),
                    Some(id),
                    now,
                )?;
            }
        }

        self.flash_entry(id, now);
        Ok(pending)
    }

    fn flash_entry(&mut self, id: EntryId, now: Instant) {
        if let Some(menu) = self.menu.as_deref_mut() {
            menu.flash(id);
        }
        self.tasks.push(DelayedTask {
            due: now + ENTRY_FLASH,
            job: DelayedJob::ClearEntryFlash(id),
        });
    }
}
