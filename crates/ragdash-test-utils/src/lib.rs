//! Testing utilities for the ragdash workspace
//!
//! Shared in-memory backend, fixtures and document helpers.

#![allow(missing_docs)]

mod fake;

pub use fake::FakeApi;

use ragdash_client::ClientError;
use ragdash_core::{
    Application, Document, KbStats, KnowledgeBaseRecord, StoreHealth, StoresHealth,
};
use serde_json::{json, Value};

pub const ACME: &str = "acme";
pub const BETA: &str = "beta";

/// Stats route of the acme knowledge base that always fails
pub const BROKEN_STATS_ROUTE: &str = "GET /kb/acme/kb2/stats";

pub fn doc(id: &str, text: &str) -> Document {
    Document::new(id).with_property("body", json!(text))
}

pub fn kb_record(app_id: &str, kb_key: &str) -> KnowledgeBaseRecord {
    KnowledgeBaseRecord::new(app_id, kb_key)
        .with_type("kb")
        .with_collection(format!("{app_id}_{kb_key}"))
        .with_status("active")
}

pub fn ingestion_record(app_id: &str, kb_key: &str, status: &str) -> Value {
    json!({
        "app_id": app_id,
        "kb_key": kb_key,
        "status": status,
        "created_at": "2025-03-01T08:00:00",
        "collection": format!("{app_id}_{kb_key}"),
    })
}

pub fn acme_documents() -> Vec<Document> {
    vec![
        doc("d1", "refund policy").with_property("lang", json!("en")).with_property("page", json!(1)),
        doc("d2", "shipping times").with_property("lang", json!("en")),
        doc("d3", "warranty").with_property("lang", json!("de")).with_property("tags", json!(["legal"])),
        doc("d4", "returns").with_property("page", json!(null)),
        doc("d5", "contact"),
    ]
}

/// Two applications; `acme` owns `kb1` (5 docs, 120 chunks) and `kb2`, whose
/// stats endpoint answers 500; `beta` owns `faq`.
pub fn acme() -> FakeApi {
    let api = FakeApi::new()
        .with_app(Application::new(ACME).with_status("active").with_plugin(true))
        .with_app(Application::new(BETA).with_status("disabled"))
        .with_kb(
            kb_record(ACME, "kb1")
                .with_text_field("body")
                .with_retrieval(5, 0.7, true),
        )
        .with_kb(kb_record(ACME, "kb2").with_type("user_upload"))
        .with_kb(kb_record(BETA, "faq"))
        .with_stats("acme:kb1", KbStats::new(5, 120))
        .with_stats("acme:kb2", KbStats::new(9, 900))
        .with_stats("beta:faq", KbStats::new(2, 30))
        .with_documents("acme:kb1", acme_documents())
        .with_documents("beta:faq", vec![Document::new("f1").with_property("text", json!("hi"))])
        .with_ingestion(vec![
            ingestion_record(ACME, "kb1", "done"),
            ingestion_record(ACME, "kb2", "failed"),
            ingestion_record(BETA, "faq", "done"),
        ])
        .with_stores(StoresHealth {
            stores: vec![
                StoreHealth::new("weaviate", "ok").with_details("3 nodes"),
                StoreHealth::new("redis", "configured"),
                StoreHealth::new("minio", "error").with_details("bucket missing"),
            ],
        });
    api.fail_on(
        BROKEN_STATS_ROUTE,
        ClientError::status(500, "stats backend unavailable"),
    );
    api
}
