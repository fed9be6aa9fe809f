//! Functional tests for the document workflow driven through a session.
//!
//! Core guarantees exercised here:
//! - Mutations only leave the console with a parseable properties object;
//!   invalid input sets a hint and issues no request.
//! - Every successful mutation returns the workflow to browsing and reloads
//!   the batch; failures keep the form for another attempt.
//! - Selecting an id that is not in the batch changes nothing.
//! - Schema inference samples the backend when the batch is empty.

use ragdash_client::{ClientError, MockRagApi, RagApi};
use ragdash_core::{
    Application, DocMode, Document, DocumentList, FormField, KbStats, KnowledgeBaseRecord,
    Location, ValueKind,
};
use ragdash_engine::{ConsoleConfig, ConsoleError, ConsoleSession};
use ragdash_test_utils::{acme, FakeApi, ACME};
use serde_json::json;
use std::sync::Arc;

const DOCS_ROUTE: &str = "GET /kb/acme/kb1/documents";

async fn loaded(api: &Arc<FakeApi>) -> ConsoleSession {
    let dyn_api: Arc<dyn RagApi> = api.clone();
    let session = ConsoleSession::new(dyn_api, ConsoleConfig::default())
        .with_location(Location::app(ACME));
    session.refresh().await;
    session
}

/// Tenet: the first knowledge base is selected and its batch loaded.
#[tokio::test]
async fn reload_selects_first_kb_and_loads_batch() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;

    let state = session.state();
    let docs = state.docs();
    assert_eq!(docs.kb().map(|kb| kb.id.as_str()), Some("acme:kb1"));
    assert_eq!(docs.batch().items.len(), 5);
    assert_eq!(docs.batch().total, 5);
    assert_eq!(docs.batch().columns[0], "id");
    assert_eq!(docs.mode(), &DocMode::Browsing);
    assert_eq!(api.call_count(DOCS_ROUTE), 1);
}

/// Scenario: properties `{bad json` on submit.
#[tokio::test]
async fn malformed_properties_issue_no_request() {
    let mut api = MockRagApi::new();
    api.expect_base_url().returning(|| "http://mock".to_string());
    api.expect_health().returning(|| Ok(json!({ "status": "ok" })));
    api.expect_list_apps()
        .returning(|| Ok(vec![Application::new("acme")]));
    api.expect_list_knowledge_bases()
        .returning(|| Ok(vec![KnowledgeBaseRecord::new("acme", "kb1")]));
    api.expect_kb_stats().returning(|_, _| Ok(KbStats::new(1, 4)));
    api.expect_ingestion_logs().returning(|_| Ok(Default::default()));
    api.expect_list_documents().returning(|_, _, _| {
        Ok(DocumentList {
            items: vec![Document::new("d1").with_property("text", json!("hello"))],
            total: 1,
        })
    });
    api.expect_create_document().never();
    api.expect_update_document().never();
    api.expect_replace_document().never();

    let session = ConsoleSession::new(Arc::new(api), ConsoleConfig::default());
    session.refresh().await;

    session.open_new_doc().await;
    session.edit_form(FormField::Properties, "{bad json").await;
    session.submit_document().await;
    let state = session.state();
    let hint = state.docs().hint().unwrap();
    assert!(hint.starts_with("properties JSON is malformed"), "{hint}");
    assert_eq!(state.docs().mode(), &DocMode::Creating);

    session.select_doc("d1").await;
    session.edit_form(FormField::Properties, "[1, 2]").await;
    session.submit_document().await;
    assert_eq!(
        session.state().docs().hint(),
        Some("properties must be a JSON object")
    );
}

/// Tenet: an id outside the batch is ignored.
#[tokio::test]
async fn selecting_unknown_document_is_a_no_op() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;
    let before = session.state();

    session.select_doc("missing-id").await;
    assert_eq!(session.state(), before);
}

/// Scenario: create a document, then see it in the reloaded batch.
#[tokio::test]
async fn create_returns_to_browsing_and_reloads() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;

    session.open_new_doc().await;
    assert!(session.state().docs().drawer_open());
    session.edit_form(FormField::Text, "price list").await;
    session
        .edit_form(FormField::Properties, r#"{ "lang": "fr" }"#)
        .await;
    session.submit_document().await;

    let state = session.state();
    let docs = state.docs();
    assert_eq!(docs.mode(), &DocMode::Browsing);
    assert!(!docs.drawer_open());
    assert_eq!(docs.hint(), Some("document created"));
    assert_eq!(docs.batch().items.len(), 6);
    assert_eq!(api.call_count(DOCS_ROUTE), 2);

    let created = docs.batch().get("doc-1").unwrap();
    assert_eq!(created.properties["body"], json!("price list"));
    assert_eq!(created.properties["lang"], json!("fr"));
    assert_eq!(api.mutations(), vec!["POST /kb/acme/kb1/documents"]);
}

/// Scenario: edit a selected document; the update is a partial `PATCH`.
#[tokio::test]
async fn update_patches_the_selected_document() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;

    session.select_doc("d1").await;
    let state = session.state();
    assert_eq!(state.docs().mode(), &DocMode::Viewing("d1".into()));
    assert_eq!(state.docs().form().text, "refund policy");
    assert!(state.docs().can_delete());

    session.edit_form(FormField::Text, "refund policy v2").await;
    session
        .edit_form(FormField::Properties, r#"{ "page": 2 }"#)
        .await;
    session.submit_document().await;

    assert_eq!(api.mutations(), vec!["PATCH /kb/acme/kb1/documents/d1"]);
    let stored = api
        .documents("acme:kb1")
        .into_iter()
        .find(|d| d.id == "d1")
        .unwrap();
    assert_eq!(stored.properties["body"], json!("refund policy v2"));
    assert_eq!(stored.properties["page"], json!(2));
    assert_eq!(stored.properties["lang"], json!("en"));

    let state = session.state();
    assert_eq!(state.docs().mode(), &DocMode::Browsing);
    assert_eq!(state.docs().hint(), Some("document updated"));
}

/// Scenario: delete the selected document.
#[tokio::test]
async fn delete_removes_document_and_reloads() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;

    session.delete_document().await;
    assert_eq!(
        session.state().docs().hint(),
        Some("select a document first")
    );
    assert!(api.mutations().is_empty());

    session.select_doc("d2").await;
    session.delete_document().await;

    let state = session.state();
    assert_eq!(state.docs().hint(), Some("document deleted"));
    assert_eq!(state.docs().batch().items.len(), 4);
    assert!(state.docs().batch().get("d2").is_none());
    assert_eq!(state.docs().mode(), &DocMode::Browsing);
    assert_eq!(api.mutations(), vec!["DELETE /kb/acme/kb1/documents/d2"]);
}

/// Tenet: a failed save keeps the editor open with the error text.
#[tokio::test]
async fn failed_save_keeps_form() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;
    api.fail_on(
        "POST /kb/acme/kb1/documents",
        ClientError::status(422, "text too long"),
    );

    session.open_new_doc().await;
    session.edit_form(FormField::Text, "x").await;
    session.submit_document().await;

    let state = session.state();
    assert_eq!(
        state.docs().hint(),
        Some("save failed: request failed (422): text too long")
    );
    assert_eq!(state.docs().mode(), &DocMode::Creating);
    assert_eq!(state.docs().form().text, "x");
    assert_eq!(api.call_count(DOCS_ROUTE), 1);
}

/// Tenet: a failed batch load empties the grid and explains why.
#[tokio::test]
async fn failed_batch_load_sets_hint() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;
    session.select_doc("d1").await;

    api.fail_on(DOCS_ROUTE, ClientError::status(400, "collection is empty"));
    session.load_documents().await;

    let state = session.state();
    assert_eq!(
        state.docs().hint(),
        Some("load failed: request failed (400): collection is empty")
    );
    assert!(state.docs().batch().items.is_empty());
    assert_eq!(state.docs().mode(), &DocMode::Browsing);
}

/// Tenet: switching knowledge base resets the workflow and reloads.
#[tokio::test]
async fn switching_kb_resets_the_workflow() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;
    session.select_doc("d1").await;

    session.select_kb("acme:kb2").await;
    let state = session.state();
    assert_eq!(state.snapshot().selected_kb.as_deref(), Some("acme:kb2"));
    assert_eq!(state.docs().kb().map(|kb| kb.id.as_str()), Some("acme:kb2"));
    assert_eq!(state.docs().mode(), &DocMode::Browsing);
    assert!(!state.docs().drawer_open());
    assert!(state.docs().batch().items.is_empty());
    assert_eq!(api.call_count("GET /kb/acme/kb2/documents"), 1);

    session.select_kb("ghost:kb").await;
    assert_eq!(
        session.state().snapshot().selected_kb.as_deref(),
        Some("acme:kb2")
    );
}

/// Tenet: schema comes from the loaded batch without another request.
#[tokio::test]
async fn schema_uses_loaded_batch() {
    let api = Arc::new(acme());
    let session = loaded(&api).await;

    let schema = session.schema().await.expect("schema");
    assert_eq!(api.call_count(DOCS_ROUTE), 1);

    let lang = schema.iter().find(|f| f.name == "lang").unwrap();
    assert_eq!(lang.kinds, vec![ValueKind::String]);
    assert_eq!(lang.example, "en");
    let page = schema.iter().find(|f| f.name == "page").unwrap();
    assert_eq!(page.kinds_label(), "null | number");
    assert_eq!(page.example, "1");
}

/// Scenario: the batch is empty, so a sample of 25 is fetched.
#[tokio::test]
async fn schema_samples_when_batch_is_empty() {
    let api = Arc::new(acme());
    api.fail_on(DOCS_ROUTE, ClientError::Network("timeout".into()));
    let session = loaded(&api).await;
    assert!(session.state().docs().batch().items.is_empty());

    api.clear_failure(DOCS_ROUTE);
    let schema = session.schema().await.expect("schema");
    assert_eq!(api.call_count(DOCS_ROUTE), 2);
    assert!(schema.iter().any(|f| f.name == "body"));
}

/// Tenet: schema without a knowledge base is a local error.
#[tokio::test]
async fn schema_without_kb_is_rejected() {
    let api = Arc::new(FakeApi::new());
    let session = loaded(&api).await;

    let err = session.schema().await.unwrap_err();
    assert!(err.is_local());
    assert!(matches!(err, ConsoleError::Validation(_)));
    assert_eq!(err.to_string(), "select a knowledge base first");
}
