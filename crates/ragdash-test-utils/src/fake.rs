//! In-memory platform backend
//!
//! Every call is logged as `METHOD /path` (query string omitted). Failures
//! and delays are injected per route using the same text.

use async_trait::async_trait;
use parking_lot::Mutex;
use ragdash_client::{ClientError, IngestionQuery, Page, RagApi};
use ragdash_core::{
    kb_id, Application, Document, DocumentList, DocumentPayload, IngestionLogList, KbStats,
    KnowledgeBaseRecord, MemoryPushRequest, StoresHealth, DEFAULT_TEXT_FIELD,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
struct Backend {
    base_url: String,
    apps: Vec<Application>,
    kbs: Vec<KnowledgeBaseRecord>,
    stats: HashMap<String, KbStats>,
    documents: HashMap<String, Vec<Document>>,
    ingestion: Vec<Value>,
    stores: StoresHealth,
    pushed: Vec<MemoryPushRequest>,
    failures: HashMap<String, ClientError>,
    delays: HashMap<String, Duration>,
    calls: Vec<String>,
    next_id: u64,
}

impl Backend {
    fn text_field(&self, app_id: &str, kb_key: &str) -> String {
        self.kbs
            .iter()
            .find(|kb| kb.app_id == app_id && kb.kb_key == kb_key)
            .and_then(|kb| kb.text_field.clone())
            .unwrap_or_else(|| DEFAULT_TEXT_FIELD.to_string())
    }

    fn docs_mut(&mut self, app_id: &str, kb_key: &str) -> &mut Vec<Document> {
        self.documents.entry(kb_id(app_id, kb_key)).or_default()
    }
}

fn not_found(what: &str) -> ClientError {
    ClientError::status(404, format!("{what} not found"))
}

/// In-memory [`RagApi`] with failure injection
#[derive(Debug, Default)]
pub struct FakeApi {
    state: Mutex<Backend>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.state.lock().base_url = "http://fake.local".to_string();
        api
    }

    pub fn with_app(self, app: Application) -> Self {
        self.state.lock().apps.push(app);
        self
    }

    pub fn with_kb(self, record: KnowledgeBaseRecord) -> Self {
        self.state.lock().kbs.push(record);
        self
    }

    /// Stats served for `app_id:kb_key`; knowledge bases without stats answer 404
    pub fn with_stats(self, id: &str, stats: KbStats) -> Self {
        self.state.lock().stats.insert(id.to_string(), stats);
        self
    }

    pub fn with_documents(self, id: &str, docs: Vec<Document>) -> Self {
        self.state.lock().documents.insert(id.to_string(), docs);
        self
    }

    pub fn with_ingestion(self, records: Vec<Value>) -> Self {
        self.state.lock().ingestion = records;
        self
    }

    pub fn with_stores(self, stores: StoresHealth) -> Self {
        self.state.lock().stores = stores;
        self
    }

    /// Make every call to `route` fail
    pub fn fail_on(&self, route: &str, err: ClientError) {
        self.state.lock().failures.insert(route.to_string(), err);
    }

    pub fn clear_failure(&self, route: &str) {
        self.state.lock().failures.remove(route);
    }

    /// Make every call to `route` wait before answering
    pub fn delay_on(&self, route: &str, delay: Duration) {
        self.state.lock().delays.insert(route.to_string(), delay);
    }

    /// Fail the reachability probe
    pub fn go_offline(&self) {
        self.fail_on("GET /health", ClientError::Network("connection refused".into()));
    }

    pub fn go_online(&self) {
        self.clear_failure("GET /health");
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, route: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == route).count()
    }

    /// Calls that write to the document store
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("GET "))
            .collect()
    }

    pub fn documents(&self, id: &str) -> Vec<Document> {
        self.state.lock().documents.get(id).cloned().unwrap_or_default()
    }

    pub fn pushed_memory(&self) -> Vec<MemoryPushRequest> {
        self.state.lock().pushed.clone()
    }

    async fn enter(&self, route: String) -> Result<(), ClientError> {
        let (delay, failure) = {
            let mut state = self.state.lock();
            let delay = state.delays.get(&route).copied();
            let failure = state.failures.get(&route).cloned();
            state.calls.push(route);
            (delay, failure)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl RagApi for FakeApi {
    fn base_url(&self) -> String {
        self.state.lock().base_url.clone()
    }

    fn set_base_url(&self, url: &str) -> Result<(), ClientError> {
        let url = url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidBaseUrl {
                url: url.to_string(),
                reason: "expected an http(s) address".to_string(),
            });
        }
        self.state.lock().base_url = url.trim_end_matches('/').to_string();
        Ok(())
    }

    async fn health(&self) -> Result<Value, ClientError> {
        self.enter("GET /health".into()).await?;
        Ok(json!({ "status": "ok" }))
    }

    async fn list_apps(&self) -> Result<Vec<Application>, ClientError> {
        self.enter("GET /app/list".into()).await?;
        Ok(self.state.lock().apps.clone())
    }

    async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>, ClientError> {
        self.enter("GET /kb/list".into()).await?;
        Ok(self.state.lock().kbs.clone())
    }

    async fn kb_stats(&self, app_id: &str, kb_key: &str) -> Result<KbStats, ClientError> {
        self.enter(format!("GET /kb/{app_id}/{kb_key}/stats")).await?;
        let state = self.state.lock();
        state
            .stats
            .get(&kb_id(app_id, kb_key))
            .copied()
            .ok_or_else(|| not_found("knowledge base"))
    }

    async fn list_documents(
        &self,
        app_id: &str,
        kb_key: &str,
        page: Page,
    ) -> Result<DocumentList, ClientError> {
        self.enter(format!("GET /kb/{app_id}/{kb_key}/documents")).await?;
        let state = self.state.lock();
        let docs = state
            .documents
            .get(&kb_id(app_id, kb_key))
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(DocumentList {
            items: docs
                .iter()
                .skip(page.offset as usize)
                .take(page.limit as usize)
                .cloned()
                .collect(),
            total: docs.len() as u64,
        })
    }

    async fn create_document(
        &self,
        app_id: &str,
        kb_key: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError> {
        self.enter(format!("POST /kb/{app_id}/{kb_key}/documents")).await?;
        let mut state = self.state.lock();
        let id = match &payload.id {
            Some(id) => id.clone(),
            None => {
                state.next_id += 1;
                format!("doc-{}", state.next_id)
            }
        };
        let mut doc = Document::new(id);
        doc.properties = payload.properties.clone();
        if let Some(text) = &payload.text {
            let field = state.text_field(app_id, kb_key);
            doc.properties.insert(field, json!(text));
        }
        state.docs_mut(app_id, kb_key).push(doc.clone());
        Ok(doc)
    }

    async fn replace_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError> {
        self.enter(format!("PUT /kb/{app_id}/{kb_key}/documents/{doc_id}")).await?;
        let mut state = self.state.lock();
        let field = state.text_field(app_id, kb_key);
        let doc = state
            .docs_mut(app_id, kb_key)
            .iter_mut()
            .find(|d| d.id == doc_id)
            .ok_or_else(|| not_found("document"))?;
        doc.properties = payload.properties.clone();
        if let Some(text) = &payload.text {
            doc.properties.insert(field, json!(text));
        }
        Ok(doc.clone())
    }

    async fn update_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError> {
        self.enter(format!("PATCH /kb/{app_id}/{kb_key}/documents/{doc_id}")).await?;
        let mut state = self.state.lock();
        let field = state.text_field(app_id, kb_key);
        let doc = state
            .docs_mut(app_id, kb_key)
            .iter_mut()
            .find(|d| d.id == doc_id)
            .ok_or_else(|| not_found("document"))?;
        for (key, value) in &payload.properties {
            doc.properties.insert(key.clone(), value.clone());
        }
        if let Some(text) = &payload.text {
            doc.properties.insert(field, json!(text));
        }
        Ok(doc.clone())
    }

    async fn delete_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
    ) -> Result<(), ClientError> {
        self.enter(format!("DELETE /kb/{app_id}/{kb_key}/documents/{doc_id}")).await?;
        let mut state = self.state.lock();
        let docs = state.docs_mut(app_id, kb_key);
        let before = docs.len();
        docs.retain(|d| d.id != doc_id);
        if docs.len() == before {
            return Err(not_found("document"));
        }
        Ok(())
    }

    async fn ingestion_logs(&self, query: &IngestionQuery) -> Result<IngestionLogList, ClientError> {
        self.enter("GET /ingestion/logs".into()).await?;
        let state = self.state.lock();
        let matches = |record: &&Value, key: &str, wanted: &Option<String>| {
            wanted
                .as_deref()
                .map_or(true, |w| record.get(key).and_then(Value::as_str) == Some(w))
        };
        let items = state
            .ingestion
            .iter()
            .filter(|r| matches(r, "app_id", &query.app_id))
            .filter(|r| matches(r, "kb_key", &query.kb_key))
            .filter(|r| matches(r, "status", &query.status))
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(IngestionLogList { items })
    }

    async fn stores_health(&self) -> Result<StoresHealth, ClientError> {
        self.enter("GET /stores/health".into()).await?;
        Ok(self.state.lock().stores.clone())
    }

    async fn push_memory(&self, request: &MemoryPushRequest) -> Result<Value, ClientError> {
        self.enter("POST /memory/push".into()).await?;
        self.state.lock().pushed.push(request.clone());
        Ok(json!({
            "status": "ok",
            "memory_key": format!("{}:{}:{}", request.app_id, request.wallet_id, request.session_id),
        }))
    }
}
