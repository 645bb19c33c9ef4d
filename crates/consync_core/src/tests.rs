//! Engine-level tests for the fetch state machine and its helpers.

use crate::filter::KeywordFilter;
use crate::models::{ObjectMeta, ResourceObject};
use crate::prune;
use crate::selection::SelectionSet;
use crate::session::FetchSession;
use serde_json::json;
use std::time::Duration;

const REFRESH: Duration = Duration::from_millis(5_000);

fn record(uid: &str, name: &str) -> ResourceObject {
    ResourceObject {
        kind: "ResourceHandle".to_string(),
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: Some("ops".to_string()),
            uid: Some(uid.to_string()),
            ..ObjectMeta::default()
        },
        ..ResourceObject::default()
    }
}

fn uids(items: &[ResourceObject]) -> Vec<&str> {
    items.iter().map(|item| item.uid()).collect()
}

#[test]
fn two_pages_accumulate_until_exhaustion() {
    let mut session = FetchSession::start(None, 10, None);

    let first = session.begin_page().expect("first page authorized");
    assert_eq!(first.cursor, None);
    assert!(!session.can_continue(), "no second request while in flight");

    session.page_received(vec![record("a", "alpha")], Some("c1".to_string()), REFRESH);
    assert!(session.can_continue());
    assert_eq!(session.cursor(), Some("c1"));
    assert!(!session.finished());

    let second = session.begin_page().expect("second page authorized");
    assert_eq!(second.cursor.as_deref(), Some("c1"));

    session.page_received(vec![record("b", "beta")], None, REFRESH);
    assert_eq!(uids(session.items()), vec!["a", "b"]);
    assert!(!session.can_continue());
    assert!(session.finished());
    assert!(session.next_refresh_at().is_some(), "refresh deadline armed");
}

#[test]
fn refresh_merges_in_place_and_appends() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(vec![record("a", "alpha")], Some("c1".to_string()), REFRESH);
    session.page_received(vec![record("b", "beta")], None, REFRESH);

    session.start_refresh();
    assert!(session.refreshing());
    assert!(session.can_continue());
    assert_eq!(session.cursor(), None, "refresh refetches from first page");
    assert_eq!(uids(session.items()), vec!["a", "b"], "items kept during refresh");

    session.page_received(
        vec![record("a", "alpha-renamed"), record("c", "gamma")],
        None,
        REFRESH,
    );
    assert_eq!(uids(session.items()), vec!["a", "b", "c"]);
    assert_eq!(session.items()[0].metadata.name, "alpha-renamed");
    assert!(!session.refreshing());
    assert!(session.finished());
}

#[test]
fn filter_applies_to_full_accumulated_set() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(vec![record("a", "alpha")], Some("c1".to_string()), REFRESH);
    session.page_received(vec![record("b", "beta")], None, REFRESH);

    session.set_filter(Some(
        KeywordFilter::parse("beta").expect("tokens").into_predicate(),
    ));
    assert_eq!(uids(session.filtered_items()), vec!["b"]);

    session.set_filter(None);
    assert_eq!(uids(session.filtered_items()), vec!["a", "b"]);
}

#[test]
fn late_page_after_cancel_changes_nothing() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(vec![record("a", "alpha")], Some("c1".to_string()), REFRESH);
    let cursor_before = session.cursor().map(str::to_string);

    session.token().cancel();
    session.page_received(vec![record("z", "zulu")], None, REFRESH);

    assert_eq!(uids(session.items()), vec!["a"]);
    assert_eq!(session.cursor(), cursor_before.as_deref());
    assert!(!session.finished());
    assert!(session.begin_page().is_none(), "canceled session never fetches");

    // A replacement session starts clean and is unaffected by the stale one.
    let replacement: FetchSession<ResourceObject> = FetchSession::start(None, 10, None);
    assert!(replacement.items().is_empty());
    assert!(!replacement.is_canceled());
}

#[test]
fn duplicate_uid_replaces_instead_of_appending() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(
        vec![record("a", "alpha"), record("a", "alpha-v2")],
        Some("c1".to_string()),
        REFRESH,
    );
    session.page_received(vec![record("a", "alpha-v3")], None, REFRESH);

    assert_eq!(session.items().len(), 1);
    assert_eq!(session.items()[0].metadata.name, "alpha-v3");
}

#[test]
fn filter_purity_is_independent_of_filter_history() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(
        vec![record("a", "alpha"), record("b", "beta"), record("c", "gamma")],
        None,
        REFRESH,
    );

    session.set_filter(Some(Box::new(|item| item.metadata.name.contains('m'))));
    session.set_filter(Some(Box::new(|item| item.metadata.name.starts_with('b'))));
    assert_eq!(uids(session.filtered_items()), vec!["b"]);

    session.set_filter(Some(Box::new(|_| true)));
    assert_eq!(uids(session.filtered_items()), vec!["a", "b", "c"]);
}

#[test]
fn cursor_exhaustion_holds_until_next_refresh() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(vec![record("a", "alpha")], None, REFRESH);

    assert!(!session.can_continue());
    assert!(session.begin_page().is_none());

    session.start_refresh();
    assert!(session.can_continue());
    assert!(session.begin_page().is_some());
}

#[test]
fn grow_limit_only_while_finished_and_never_below_initial() {
    let mut session: FetchSession<ResourceObject> = FetchSession::start(None, 20, None);
    session.grow_limit(30);
    assert_eq!(session.limit(), 20, "fetch in flight, growth ignored");

    session.page_received(vec![record("a", "alpha")], None, REFRESH);
    session.grow_limit(30);
    assert_eq!(session.limit(), 50);
}

#[test]
fn remove_and_update_items_mutate_locally() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(
        vec![record("a", "alpha"), record("b", "beta"), record("c", "gamma")],
        None,
        REFRESH,
    );

    session.remove_items(&["b"]);
    assert_eq!(uids(session.items()), vec!["a", "c"]);

    session.update_items(vec![record("c", "gamma-patched"), record("x", "unknown")]);
    assert_eq!(uids(session.items()), vec!["a", "c"], "unknown uid ignored");
    assert_eq!(session.items()[1].metadata.name, "gamma-patched");

    // A later arrival for a removed uid appends again; positional state was
    // rebuilt when the row was dropped.
    session.start_refresh();
    session.page_received(vec![record("b", "beta")], None, REFRESH);
    assert_eq!(uids(session.items()), vec!["a", "c", "b"]);
}

#[test]
fn selection_does_not_outlive_removed_items() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(vec![record("a", "alpha"), record("b", "beta")], None, REFRESH);

    let mut selection = SelectionSet::new();
    selection.set(session.items().iter().map(|item| item.uid()));
    assert!(selection.is_selected("a"));

    session.remove_items(&["a"]);
    selection.remove(&["a"]);
    assert!(!selection.is_selected("a"));

    // The retain helper covers bulk removals.
    selection.add(["ghost"]);
    selection.retain_known(session.items().iter().map(|item| item.uid()));
    assert!(selection.is_selected("b"));
    assert!(!selection.is_selected("ghost"));
}

#[test]
fn prune_runs_at_ingestion_and_on_local_updates() {
    let mut spec_heavy = record("a", "alpha");
    spec_heavy
        .extra
        .insert("spec".to_string(), json!({"large": "payload"}));

    let mut session = FetchSession::start(None, 10, Some(prune::metadata_only()));
    session.page_received(vec![spec_heavy.clone()], None, REFRESH);
    assert!(session.items()[0].extra.is_empty());

    session.update_items(vec![spec_heavy]);
    assert!(session.items()[0].extra.is_empty());
}

#[test]
fn missing_single_item_finishes_the_session() {
    let mut session: FetchSession<ResourceObject> = FetchSession::start(None, 1, None);

    session.item_received(None, REFRESH);
    assert!(session.items().is_empty());
    assert!(session.finished());
    assert!(!session.can_continue());
    assert!(session.next_refresh_at().is_some());

    // Once the object appears, a refresh cycle picks it up like a page.
    session.start_refresh();
    session.item_received(Some(record("a", "alpha")), REFRESH);
    assert_eq!(uids(session.items()), vec!["a"]);
    assert!(session.finished());
}

#[test]
fn page_failed_keeps_state_and_arms_retry() {
    let mut session = FetchSession::start(None, 10, None);
    session.page_received(vec![record("a", "alpha")], Some("c1".to_string()), REFRESH);

    let request = session.begin_page().expect("authorized");
    assert_eq!(request.cursor.as_deref(), Some("c1"));

    session.page_failed(REFRESH);
    assert_eq!(uids(session.items()), vec!["a"]);
    assert_eq!(session.cursor(), Some("c1"));
    assert!(!session.finished());
    assert!(session.next_refresh_at().is_some(), "next cycle is the retry");
}
