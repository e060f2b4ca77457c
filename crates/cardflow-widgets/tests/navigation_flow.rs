//! End-to-end navigation and request lifecycle scenarios.

use web_time::{Duration, Instant};

use cardflow_core::card::Card;
use cardflow_core::options::Options;
use cardflow_core::progress::ProgressState;
use cardflow_runtime::cancellation::CancellationToken;
use cardflow_runtime::fetcher::{ContentFetcher, ContentKind, FetchError, RawContent, StaticFetcher};
use cardflow_runtime::request::LoadOutcome;
use cardflow_widgets::driver::NullDriver;
use cardflow_widgets::menu_bar::MenuBar;
use cardflow_widgets::navigator::CardNavigator;

const TIMEOUT: Duration = Duration::from_millis(10_000);
const FEEDBACK: Duration = Duration::from_millis(300);

fn nav() -> CardNavigator<NullDriver> {
    CardNavigator::new(Options::default().title("Root"), NullDriver).with_rng_seed(42)
}

fn fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .route(
            "https://example.test/plain",
            RawContent::new(ContentKind::Plain, "Plain Title\nSome body text"),
        )
        .route(
            "https://example.test/json",
            RawContent::new(
                ContentKind::Structured,
                r#"{"title": "Json Title", "content": "<p>From json</p>", "intro": "<p>Intro</p>"}"#,
            ),
        )
        .route(
            "https://example.test/html",
            RawContent::new(
                ContentKind::Markup,
                r#"<html><head><title>Html Title</title></head><body><div id="content"><p>Doc</p></div></body></html>"#,
            ),
        )
}

/// Fetcher that always fails the same way.
struct FailingFetcher(FetchError);

impl ContentFetcher for FailingFetcher {
    fn fetch(
        &mut self,
        _url: &str,
        token: &CancellationToken,
    ) -> Result<RawContent, FetchError> {
        if token.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        Err(self.0.clone())
    }
}

#[test]
fn fetch_pushes_a_new_card() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    let done = nav
        .load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();

    assert_eq!(done.result(), Some(Ok(LoadOutcome::NewCard)));
    assert_eq!(nav.stack().len(), 2);
    assert_eq!(nav.history().len(), 2);
    assert_eq!(nav.active_card().and_then(Card::title), Some("Plain Title"));
    assert_eq!(
        nav.history().last().and_then(|e| e.url.as_deref()),
        Some("https://example.test/plain")
    );
}

#[test]
fn fetch_selects_default_fragment() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(&mut fetcher, "https://example.test/json", None, "none", None, now)
        .unwrap();
    // The default fragment is "content"; the matching field is selected.
    assert_eq!(nav.active_card().map(Card::content), Some("<p>From json</p>"));
    assert_eq!(nav.active_card().and_then(Card::title), Some("Json Title"));
}

#[test]
fn fetch_selects_explicit_fragment() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(
        &mut fetcher,
        "https://example.test/json",
        Some("intro"),
        "none",
        None,
        now,
    )
    .unwrap();
    assert_eq!(nav.active_card().map(Card::content), Some("<p>Intro</p>"));
}

#[test]
fn fetch_markup_extracts_fragment_and_title() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(&mut fetcher, "https://example.test/html", None, "none", None, now)
        .unwrap();
    assert_eq!(nav.active_card().map(Card::content), Some("<p>Doc</p>"));
    assert_eq!(nav.active_card().and_then(Card::title), Some("Html Title"));
}

#[test]
fn refetching_same_location_reloads_in_place() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();
    assert_eq!(nav.stack().len(), 2);

    // Same URL, no fragment: a reload, never a new card.
    let done = nav
        .load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();
    assert_eq!(done.result(), Some(Ok(LoadOutcome::Reloaded)));
    assert_eq!(nav.stack().len(), 2);
    assert_eq!(nav.history().len(), 2);
    assert!(nav.reload_flash());

    // The acknowledgment flash clears shortly after.
    nav.tick(now + Duration::from_millis(101));
    assert!(!nav.reload_flash());
}

#[test]
fn different_fragment_grows_stack() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(
        &mut fetcher,
        "https://example.test/json",
        Some("content"),
        "none",
        None,
        now,
    )
    .unwrap();
    assert_eq!(nav.stack().len(), 2);

    nav.load_from(
        &mut fetcher,
        "https://example.test/json",
        Some("intro"),
        "none",
        None,
        now,
    )
    .unwrap();
    assert_eq!(nav.stack().len(), 3);
}

#[test]
fn reload_command_refetches_current_card() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    // Programmatic cards have no URL: nothing to reload.
    nav.push_content("<p>x</p>", "X", "none", now).unwrap();
    assert!(nav.reload(now).unwrap().is_none());

    nav.load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();
    let handle = nav.reload(now).unwrap().unwrap();
    let result = fetcher.fetch("https://example.test/plain", &handle.token);
    nav.complete_request(handle.ticket, result, now);
    assert_eq!(handle.done.result(), Some(Ok(LoadOutcome::Reloaded)));
}

#[test]
fn timeout_terminates_request_and_late_response_is_ignored() {
    let mut nav = nav();
    let now = Instant::now();

    let handle = nav
        .navigate_to_url("https://example.test/plain", None, "none", None, now)
        .unwrap();
    assert!(nav.active_request().is_some());
    assert!(!handle.token.is_cancelled());

    // The deadline passes: the request is torn down exactly once.
    nav.tick(now + TIMEOUT);
    assert!(nav.active_request().is_none());
    assert!(handle.token.is_cancelled());
    assert_eq!(handle.done.result(), Some(Err(FetchError::Cancelled)));

    // A late response after the timeout must not mutate the card stack.
    let cards = nav.stack().len();
    nav.complete_request(
        handle.ticket,
        Ok(RawContent::new(ContentKind::Plain, "Late\ntoo late")),
        now + TIMEOUT + Duration::from_millis(5),
    );
    assert_eq!(nav.stack().len(), cards);
    assert_eq!(nav.history().len(), cards);
}

#[test]
fn new_request_terminates_previous() {
    let mut nav = nav();
    let now = Instant::now();

    let first = nav
        .navigate_to_url("https://example.test/plain", None, "none", None, now)
        .unwrap();
    let second = nav
        .navigate_to_url("https://example.test/json", None, "none", None, now)
        .unwrap();

    assert!(first.token.is_cancelled());
    assert_eq!(first.done.result(), Some(Err(FetchError::Cancelled)));
    assert!(!second.token.is_cancelled());

    // The first ticket is stale now.
    let cards = nav.stack().len();
    nav.complete_request(
        first.ticket,
        Ok(RawContent::new(ContentKind::Plain, "x")),
        now,
    );
    assert_eq!(nav.stack().len(), cards);
}

#[test]
fn fetch_failure_surfaces_and_cleans_up() {
    let mut nav = nav();
    let mut fetcher = StaticFetcher::new();
    let now = Instant::now();

    let done = nav
        .load_from(&mut fetcher, "https://example.test/missing", None, "none", None, now)
        .unwrap();

    assert!(matches!(done.result(), Some(Err(FetchError::Failed(_)))));
    assert_eq!(nav.stack().len(), 1);
    assert!(nav.active_request().is_none());
    // Progress feedback is being reverted toward zero.
    assert!(nav.progress().is_active());
}

#[test]
fn unsupported_content_kind_is_a_failure() {
    let mut nav = nav();
    let mut fetcher = FailingFetcher(FetchError::UnsupportedKind("image/png".into()));
    let now = Instant::now();

    let done = nav
        .load_from(&mut fetcher, "https://example.test/bin", None, "none", None, now)
        .unwrap();
    assert!(matches!(
        done.result(),
        Some(Err(FetchError::UnsupportedKind(_)))
    ));
    assert_eq!(nav.stack().len(), 1);
}

#[test]
fn progress_runs_plan_during_fetch_and_completes_after() {
    let mut nav = nav();
    let now = Instant::now();

    let handle = nav
        .navigate_to_url("https://example.test/plain", None, "none", None, now)
        .unwrap();
    assert_eq!(nav.progress().state(), ProgressState::Running);

    // Let the plan climb a little.
    nav.tick(now + Duration::from_millis(1));
    nav.tick(now + Duration::from_millis(400));
    let mid = nav.progress().value();
    assert!(mid > 0.0 && mid < 100.0, "mid-plan value was {mid}");

    nav.complete_request(
        handle.ticket,
        Ok(RawContent::new(ContentKind::Plain, "Done\nbody")),
        now + Duration::from_millis(450),
    );
    // Completion animates to exactly 100 over the feedback duration.
    nav.tick(now + Duration::from_millis(451));
    nav.tick(now + Duration::from_millis(460) + FEEDBACK);
    assert_eq!(nav.progress().value(), 100.0);
    assert_eq!(nav.progress().state(), ProgressState::Completed);
}

#[test]
fn breadcrumb_indicator_lifecycle_on_success() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    let handle = nav
        .navigate_to_url("https://example.test/plain", None, "none", None, now)
        .unwrap();
    {
        let menu = nav.menu().unwrap();
        // Root + the loading placeholder.
        assert_eq!(menu.entries().len(), 2);
        let loading = &menu.entries()[1];
        assert!(loading.loading);
        assert_eq!(loading.card, None);
    }

    let result = fetcher.fetch("https://example.test/plain", &handle.token);
    nav.complete_request(handle.ticket, result, now);

    let menu = nav.menu().unwrap();
    let entry = &menu.entries()[1];
    assert!(!entry.loading);
    assert_eq!(entry.title, "Plain Title");
    assert_eq!(entry.card, nav.active_card().map(Card::id));
}

#[test]
fn terminated_request_removes_indicator_after_feedback_delay() {
    let mut nav = nav();
    let now = Instant::now();

    nav.navigate_to_url("https://example.test/plain", None, "none", None, now)
        .unwrap();
    assert_eq!(nav.menu().unwrap().entries().len(), 2);

    nav.terminate_request(false, now);
    // The entry is deactivated immediately but removed only after the
    // feedback delay, so its own hide transition can finish.
    assert_eq!(nav.menu().unwrap().entries().len(), 2);
    assert!(!nav.menu().unwrap().entries()[1].active);

    nav.tick(now + FEEDBACK);
    assert_eq!(nav.menu().unwrap().entries().len(), 1);

    // A second pass over the cleanup is harmless.
    nav.tick(now + FEEDBACK + Duration::from_millis(50));
    assert_eq!(nav.menu().unwrap().entries().len(), 1);
}

#[test]
fn activating_the_loading_entry_aborts_the_request() {
    let mut nav = nav();
    let now = Instant::now();

    let handle = nav
        .navigate_to_url("https://example.test/plain", None, "none", None, now)
        .unwrap();
    let loading_id = nav.menu().unwrap().entries()[1].id();

    nav.activate_entry(loading_id, now).unwrap();
    assert!(nav.active_request().is_none());
    assert!(handle.token.is_cancelled());

    nav.tick(now + FEEDBACK);
    assert_eq!(nav.menu().unwrap().entries().len(), 1);
}

#[test]
fn activating_a_card_entry_navigates_back() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();
    nav.push_content("<p>top</p>", "Top", "none", now).unwrap();
    assert_eq!(nav.depth(), 2);

    let root_entry = nav.menu().unwrap().entries()[0].id();
    nav.activate_entry(root_entry, now).unwrap();
    assert_eq!(nav.depth(), 0);
    assert_eq!(nav.active_card().and_then(Card::title), Some("Root"));
}

#[test]
fn use_link_titles_prefers_link_text() {
    let options = Options::default().title("Root").use_link_titles(true);
    let mut nav = CardNavigator::new(options, NullDriver).with_rng_seed(1);
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(
        &mut fetcher,
        "https://example.test/plain",
        None,
        "none",
        Some("Link Text"),
        now,
    )
    .unwrap();
    assert_eq!(nav.active_card().and_then(Card::title), Some("Link Text"));
}

#[test]
fn navigation_while_fetch_pending_terminates_it() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();
    let handle = nav
        .navigate_to_url("https://example.test/json", None, "none", None, now)
        .unwrap();

    // Going back first terminates the outstanding fetch, then navigates.
    nav.go_back_by_one(now).unwrap().unwrap();
    assert!(handle.token.is_cancelled());
    assert!(nav.active_request().is_none());
    assert_eq!(nav.depth(), 0);
}

#[test]
fn menu_commands_dispatch() {
    use cardflow_widgets::menu_bar::MenuCommand;

    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    nav.load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();
    nav.push_content("<p>b</p>", "B", "none", now).unwrap();
    assert_eq!(nav.depth(), 2);

    nav.handle_menu_command(MenuCommand::Back, now).unwrap();
    assert_eq!(nav.depth(), 1);

    nav.handle_menu_command(MenuCommand::Home, now).unwrap();
    assert_eq!(nav.depth(), 0);

    // Reload at the root: no URL, quietly does nothing.
    nav.handle_menu_command(MenuCommand::Reload, now).unwrap();
    assert!(nav.active_request().is_none());
}

#[test]
fn links_dispatch_through_classification() {
    use cardflow_widgets::link::{LinkCommand, classify};

    let mut nav = nav();
    let now = Instant::now();

    // Reserved destinations map to built-in commands.
    assert_eq!(classify("#home", false, false), Some(LinkCommand::Home));
    nav.push_content("<p>a</p>", "A", "none", now).unwrap();
    nav.follow_link(LinkCommand::Home, "none", None, now).unwrap();
    assert_eq!(nav.depth(), 0);

    // A captured URL becomes a fetch-as-new-card request.
    let command = classify("https://example.test/plain#intro", false, false).unwrap();
    nav.follow_link(command, "none", Some("Link"), now).unwrap();
    let request = nav.active_request().unwrap();
    assert_eq!(request.url(), "https://example.test/plain");
    assert_eq!(request.fragment(), Some("intro"));
}

#[test]
fn full_session_walkthrough() {
    let mut nav = nav();
    let mut fetcher = fetcher();
    let now = Instant::now();

    // Push three cards: one programmatic, two fetched.
    nav.push_content("<p>a</p>", "A", "none", now).unwrap();
    nav.load_from(&mut fetcher, "https://example.test/plain", None, "none", None, now)
        .unwrap();
    nav.load_from(&mut fetcher, "https://example.test/html", None, "none", None, now)
        .unwrap();

    assert_eq!(nav.depth(), 3);
    assert_eq!(nav.stack().len(), 4);
    assert_eq!(nav.history().len(), 4);
    assert_eq!(nav.action_history().len(), 3);
    assert_eq!(nav.menu().unwrap().entries().len(), 4);

    // Back one: the plain-text card is active again.
    nav.go_back_by_one(now).unwrap().unwrap();
    assert_eq!(nav.depth(), 2);
    assert_eq!(nav.active_card().and_then(Card::title), Some("Plain Title"));
    assert_eq!(nav.history().len(), nav.stack().len());

    // Home: only the root survives.
    nav.go_home(now).unwrap().unwrap();
    assert_eq!(nav.depth(), 0);
    assert_eq!(nav.stack().len(), 1);
    assert_eq!(nav.history().len(), 1);
    assert!(nav.action_history().is_empty());
    assert_eq!(nav.menu().unwrap().entries().len(), 1);
    assert_eq!(nav.active_card().and_then(Card::title), Some("Root"));
}
