//! Platform API surface
//!
//! [`RagApi`] is the seam between the console engine and the backend. The
//! HTTP implementation lives in [`crate::http`]; tests substitute an
//! in-memory backend or a `mockall` mock.

use crate::error::ClientError;
use async_trait::async_trait;
use ragdash_core::{
    Application, Document, DocumentList, DocumentPayload, IngestionLogList, KbStats,
    KnowledgeBaseRecord, MemoryPushRequest, StoresHealth,
};
use serde::Serialize;
use serde_json::Value;

/// Page window for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Maximum items
    pub limit: u32,
    /// Items to skip
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self::first(20)
    }
}

impl Page {
    /// First page of `limit` items
    #[inline]
    #[must_use]
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Query for `GET /ingestion/logs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionQuery {
    /// Maximum items
    pub limit: u32,
    /// Items to skip
    pub offset: u32,
    /// Restrict to one application
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Restrict to one knowledge base
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_key: Option<String>,
    /// Restrict to one status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Default for IngestionQuery {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            app_id: None,
            kb_key: None,
            status: None,
        }
    }
}

impl IngestionQuery {
    /// Logs of one application
    #[must_use]
    pub fn for_app(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            ..Self::default()
        }
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Client for the RAG platform REST API
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RagApi: Send + Sync {
    /// Current base address
    fn base_url(&self) -> String;

    /// Point the client at another base address
    fn set_base_url(&self, url: &str) -> Result<(), ClientError>;

    /// `GET /health`
    async fn health(&self) -> Result<Value, ClientError>;

    /// `GET /app/list`
    async fn list_apps(&self) -> Result<Vec<Application>, ClientError>;

    /// `GET /kb/list`
    async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>, ClientError>;

    /// `GET /kb/{app}/{kb}/stats`
    async fn kb_stats(&self, app_id: &str, kb_key: &str) -> Result<KbStats, ClientError>;

    /// `GET /kb/{app}/{kb}/documents?limit&offset`
    async fn list_documents(
        &self,
        app_id: &str,
        kb_key: &str,
        page: Page,
    ) -> Result<DocumentList, ClientError>;

    /// `POST /kb/{app}/{kb}/documents`
    async fn create_document(
        &self,
        app_id: &str,
        kb_key: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError>;

    /// `PUT /kb/{app}/{kb}/documents/{id}`
    async fn replace_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError>;

    /// `PATCH /kb/{app}/{kb}/documents/{id}`
    async fn update_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError>;

    /// `DELETE /kb/{app}/{kb}/documents/{id}`
    async fn delete_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
    ) -> Result<(), ClientError>;

    /// `GET /ingestion/logs`
    async fn ingestion_logs(&self, query: &IngestionQuery) -> Result<IngestionLogList, ClientError>;

    /// `GET /stores/health`
    async fn stores_health(&self) -> Result<StoresHealth, ClientError>;

    /// `POST /memory/push`
    async fn push_memory(&self, request: &MemoryPushRequest) -> Result<Value, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingestion_query_skips_unset_filters() {
        let query = IngestionQuery::for_app("acme");
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["limit"], 20);
        assert_eq!(value["app_id"], "acme");
        assert!(value.get("kb_key").is_none());
        assert!(value.get("status").is_none());
    }

    #[test]
    fn default_page_is_first_twenty() {
        assert_eq!(Page::default(), Page { limit: 20, offset: 0 });
    }

    #[tokio::test]
    async fn mock_records_expectations() {
        let mut api = MockRagApi::new();
        api.expect_kb_stats()
            .withf(|app, kb| app == "acme" && kb == "kb1")
            .returning(|_, _| Ok(KbStats::new(5, 120)));

        let stats = api.kb_stats("acme", "kb1").await.unwrap();
        assert_eq!(stats.chunk_count, 120);
    }
}
