//! Functional tests for reachability and view-model reconciliation.
//!
//! Core guarantees exercised here:
//! - One knowledge base's stats failure never blocks the others; it shows up
//!   as `Unavailable` and is excluded from the vector total.
//! - An unreachable backend swaps in the fallback dataset and, with no
//!   application in the location, selects and records the first one.
//! - A snapshot from a superseded reload is discarded.

use ragdash_client::{ClientError, RagApi};
use ragdash_core::{Application, KbStats, Location, Reachability, StatValue};
use ragdash_engine::{ConsoleConfig, ConsoleSession, Reconciler};
use ragdash_test_utils::{acme, kb_record, FakeApi, ACME, BETA};
use std::sync::Arc;
use std::time::Duration;

fn session(api: &Arc<FakeApi>) -> ConsoleSession {
    let api: Arc<dyn RagApi> = api.clone();
    ConsoleSession::new(api, ConsoleConfig::default())
}

/// Scenario: `kb1` reports 5 docs / 120 chunks while `kb2` stats error out.
#[tokio::test]
async fn acme_snapshot_isolates_the_failed_stats_fetch() {
    let api = Arc::new(acme());
    let session = session(&api).with_location(Location::app(ACME));
    session.refresh().await;

    let state = session.state();
    let snapshot = state.snapshot();
    assert_eq!(snapshot.source, Reachability::Online);
    assert_eq!(snapshot.knowledge_bases.len(), 2);

    let kb1 = snapshot.knowledge_base("acme:kb1").unwrap();
    assert_eq!(kb1.docs, StatValue::Value(5));
    assert_eq!(kb1.chunks, StatValue::Value(120));
    assert_eq!(kb1.text_field, "body");
    assert_eq!(kb1.log, vec!["Top_k 5", "Weight 0.7", "app filter on"]);

    let kb2 = snapshot.knowledge_base("acme:kb2").unwrap();
    assert_eq!(kb2.chunks, StatValue::Unavailable);
    assert_eq!(kb2.docs.to_string(), "-");

    assert_eq!(snapshot.total_vectors, 120);
    assert_eq!(snapshot.selected_kb.as_deref(), Some("acme:kb1"));
}

/// Tenet: N knowledge bases with one failing stats call yield N entries.
#[tokio::test]
async fn fan_out_keeps_every_entry_when_one_fails() {
    let mut api = FakeApi::new().with_app(Application::new("x").with_status("active"));
    for i in 0..6_u64 {
        let key = format!("kb{i}");
        api = api
            .with_kb(kb_record("x", &key))
            .with_stats(&format!("x:{key}"), KbStats::new(i, 10 * (i + 1)));
    }
    api.fail_on("GET /kb/x/kb3/stats", ClientError::Network("reset by peer".into()));

    let reconciler = Reconciler::new(Arc::new(api), &ConsoleConfig::default());
    let snapshot = reconciler.load(Some("x")).await;

    assert_eq!(snapshot.knowledge_bases.len(), 6);
    let unavailable: Vec<_> = snapshot
        .knowledge_bases
        .iter()
        .filter(|kb| kb.chunks.is_unavailable())
        .map(|kb| kb.id.as_str())
        .collect();
    assert_eq!(unavailable, vec!["x:kb3"]);
    assert_eq!(snapshot.total_vectors, 10 + 20 + 30 + 50 + 60);
}

/// Tenet: registry lists are fetched concurrently, stats only for the target app.
#[tokio::test]
async fn stats_are_fetched_for_the_target_app_only() {
    let api = Arc::new(acme());
    let session = session(&api).with_location(Location::app(BETA));
    session.refresh().await;

    let calls = api.calls();
    assert!(calls.contains(&"GET /kb/beta/faq/stats".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("GET /kb/acme/")));
    assert_eq!(api.call_count("GET /ingestion/logs"), 1);

    let state = session.state();
    assert_eq!(state.snapshot().ingestion_raw.len(), 1);
    assert_eq!(state.snapshot().ingestion[0].title, "DONE faq");
}

/// Scenario: no application in the location selects the first registered one.
#[tokio::test]
async fn online_default_app_rewrites_location() {
    let api = Arc::new(acme());
    let session = session(&api);
    session.refresh().await;

    let state = session.state();
    assert_eq!(state.location(), &Location::app(ACME));
    assert_eq!(state.snapshot().app_id(), Some(ACME));
}

/// Scenario: probe fails and the location names no application.
#[tokio::test]
async fn offline_selects_first_fallback_app_and_rewrites_location() {
    let api = Arc::new(acme());
    api.go_offline();
    let session = session(&api);
    session.refresh().await;

    let state = session.state();
    assert_eq!(state.source(), Reachability::Offline);
    assert_eq!(state.location(), &Location::app("support-bot"));
    assert_eq!(state.snapshot().apps.len(), 3);
    assert_eq!(state.snapshot().total_vectors, 2048 + 730);
    assert_eq!(state.snapshot().ingestion_raw.len(), 4);
    assert_eq!(api.call_count("GET /app/list"), 0);
}

/// Tenet: offline keeps an explicit application from the location.
#[tokio::test]
async fn offline_respects_location_app() {
    let api = Arc::new(acme());
    api.go_offline();
    let session = session(&api).with_location(Location::app("legal-search"));
    session.refresh().await;

    let state = session.state();
    assert_eq!(state.location(), &Location::app("legal-search"));
    assert_eq!(state.snapshot().knowledge_bases.len(), 1);
    assert_eq!(state.snapshot().total_vectors, 960);
}

/// Tenet: a reachability transition rebuilds the view from scratch.
#[tokio::test]
async fn coming_back_online_replaces_fallback_data() {
    let api = Arc::new(acme());
    api.go_offline();
    let session = session(&api).with_location(Location::app(ACME));
    session.refresh().await;
    assert_eq!(session.state().source(), Reachability::Offline);
    assert!(session.state().snapshot().knowledge_bases.is_empty());

    api.go_online();
    session.refresh().await;
    let state = session.state();
    assert_eq!(state.source(), Reachability::Online);
    assert_eq!(state.snapshot().knowledge_bases.len(), 2);
}

/// Tenet: results tagged with an older generation never overwrite newer ones.
#[tokio::test]
async fn stale_snapshot_is_discarded() {
    let api = Arc::new(acme());
    api.delay_on("GET /kb/acme/kb1/stats", Duration::from_millis(150));
    let session = session(&api);

    tokio::join!(
        session.select_app(Some(ACME.to_string())),
        session.select_app(Some(BETA.to_string())),
    );

    let state = session.state();
    assert_eq!(state.generation(), 2);
    assert_eq!(state.snapshot().app_id(), Some(BETA));
    assert_eq!(state.snapshot().selected_kb.as_deref(), Some("beta:faq"));
    assert_eq!(state.docs().kb().map(|kb| kb.id.as_str()), Some("beta:faq"));
    assert!(!state.is_loading());
}

/// Tenet: the dashboard overview spans every application.
#[tokio::test]
async fn overview_spans_all_applications() {
    let api = Arc::new(acme());
    let session = session(&api);
    let overview = session.overview().await;

    assert_eq!(overview.source, Reachability::Online);
    assert_eq!(overview.knowledge_bases.len(), 3);
    assert_eq!(overview.active_apps(), 1);
    assert_eq!(overview.total_vectors, 120 + 30);
    assert_eq!(overview.ingestion_raw.len(), 3);

    api.go_offline();
    let overview = session.overview().await;
    assert_eq!(overview.source, Reachability::Offline);
    assert_eq!(overview.knowledge_bases.len(), 5);
}
