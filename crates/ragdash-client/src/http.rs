//! `reqwest` implementation of [`RagApi`]

use crate::api::{IngestionQuery, Page, RagApi};
use crate::error::ClientError;
use async_trait::async_trait;
use parking_lot::RwLock;
use ragdash_core::{
    Application, Document, DocumentList, DocumentPayload, IngestionLogList, KbStats,
    KnowledgeBaseRecord, MemoryPushRequest, StoresHealth,
};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the platform API
///
/// The base address can be swapped at runtime; requests already in flight
/// keep the address they were built with.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base: RwLock<Url>,
}

impl HttpClient {
    /// Create client with the default timeout
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create client with a request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = parse_base(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base: RwLock::new(base),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let base = self.base.read().clone();
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl {
                url: base.to_string(),
                reason: "cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "api request");
        Ok(self.client.request(method, url))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = checked(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

async fn checked(request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %body, "api request rejected");
    Err(ClientError::status(status.as_u16(), body))
}

fn parse_base(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: "expected an http(s) address".to_string(),
        });
    }
    Ok(url)
}

#[async_trait]
impl RagApi for HttpClient {
    fn base_url(&self) -> String {
        self.base.read().as_str().trim_end_matches('/').to_string()
    }

    fn set_base_url(&self, url: &str) -> Result<(), ClientError> {
        let parsed = parse_base(url)?;
        tracing::info!(base_url = %parsed, "api base address changed");
        *self.base.write() = parsed;
        Ok(())
    }

    async fn health(&self) -> Result<Value, ClientError> {
        Self::send(self.request(Method::GET, &["health"])?).await
    }

    async fn list_apps(&self) -> Result<Vec<Application>, ClientError> {
        Self::send(self.request(Method::GET, &["app", "list"])?).await
    }

    async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseRecord>, ClientError> {
        Self::send(self.request(Method::GET, &["kb", "list"])?).await
    }

    async fn kb_stats(&self, app_id: &str, kb_key: &str) -> Result<KbStats, ClientError> {
        Self::send(self.request(Method::GET, &["kb", app_id, kb_key, "stats"])?).await
    }

    async fn list_documents(
        &self,
        app_id: &str,
        kb_key: &str,
        page: Page,
    ) -> Result<DocumentList, ClientError> {
        let request = self
            .request(Method::GET, &["kb", app_id, kb_key, "documents"])?
            .query(&page);
        Self::send(request).await
    }

    async fn create_document(
        &self,
        app_id: &str,
        kb_key: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError> {
        let request = self
            .request(Method::POST, &["kb", app_id, kb_key, "documents"])?
            .json(payload);
        Self::send(request).await
    }

    async fn replace_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError> {
        let request = self
            .request(Method::PUT, &["kb", app_id, kb_key, "documents", doc_id])?
            .json(payload);
        Self::send(request).await
    }

    async fn update_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
        payload: &DocumentPayload,
    ) -> Result<Document, ClientError> {
        let request = self
            .request(Method::PATCH, &["kb", app_id, kb_key, "documents", doc_id])?
            .json(payload);
        Self::send(request).await
    }

    async fn delete_document(
        &self,
        app_id: &str,
        kb_key: &str,
        doc_id: &str,
    ) -> Result<(), ClientError> {
        checked(self.request(Method::DELETE, &["kb", app_id, kb_key, "documents", doc_id])?)
            .await
            .map(|_| ())
    }

    async fn ingestion_logs(&self, query: &IngestionQuery) -> Result<IngestionLogList, ClientError> {
        let request = self
            .request(Method::GET, &["ingestion", "logs"])?
            .query(query);
        Self::send(request).await
    }

    async fn stores_health(&self) -> Result<StoresHealth, ClientError> {
        Self::send(self.request(Method::GET, &["stores", "health"])?).await
    }

    async fn push_memory(&self, request: &MemoryPushRequest) -> Result<Value, ClientError> {
        let builder = self.request(Method::POST, &["memory", "push"])?.json(request);
        Self::send(builder).await
    }
}
