//! View-model reconciler
//!
//! Merges several independently failable REST calls into one [`Snapshot`]:
//! - Applications and the knowledge-base registry are fetched concurrently
//! - Statistics are fetched per knowledge base, concurrently; a failed fetch
//!   marks only that entry as unavailable
//! - Ingestion logs are fetched last; their failure empties only the
//!   ingestion lists
//!
//! A registry-level failure collapses to an empty but valid snapshot.

use crate::config::ConsoleConfig;
use crate::fallback::FallbackDataset;
use crate::probe::probe;
use futures::future::join_all;
use ragdash_client::{ClientError, IngestionQuery, RagApi};
use ragdash_core::{
    Application, KnowledgeBaseRecord, KnowledgeBaseView, Overview, Reachability, Snapshot,
};
use serde_json::Value;
use std::sync::Arc;

/// Builds snapshots from the live backend or the fallback dataset
pub struct Reconciler {
    api: Arc<dyn RagApi>,
    fallback: FallbackDataset,
    ingestion_page_size: u32,
    ingestion_preview: usize,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("base_url", &self.api.base_url())
            .field("ingestion_page_size", &self.ingestion_page_size)
            .field("ingestion_preview", &self.ingestion_preview)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create reconciler
    #[must_use]
    pub fn new(api: Arc<dyn RagApi>, config: &ConsoleConfig) -> Self {
        Self {
            api,
            fallback: FallbackDataset::sample(),
            ingestion_page_size: config.ingestion_page_size,
            ingestion_preview: config.ingestion_preview,
        }
    }

    /// With a different fallback dataset
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackDataset) -> Self {
        self.fallback = fallback;
        self
    }

    /// Fallback dataset in use
    #[inline]
    #[must_use]
    pub fn fallback(&self) -> &FallbackDataset {
        &self.fallback
    }

    /// Probe, then reconcile live or serve the fallback dataset
    pub async fn load(&self, app_id: Option<&str>) -> Snapshot {
        match probe(self.api.as_ref()).await {
            Reachability::Online => self.reconcile(app_id).await,
            Reachability::Offline => self.fallback.snapshot(app_id, self.ingestion_preview),
        }
    }

    /// Build the snapshot for an application from the live backend
    pub async fn reconcile(&self, app_id: Option<&str>) -> Snapshot {
        tracing::info!(app_id = ?app_id, "reconciling view model");

        let (apps, registry) = match self.registry().await {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(error = %err, "registry fetch failed, showing empty view");
                return Snapshot::empty(Reachability::Online);
            }
        };

        let target = app_id
            .map(str::to_string)
            .or_else(|| apps.first().map(|app| app.app_id.clone()));
        let app = target
            .as_deref()
            .and_then(|id| apps.iter().find(|app| app.app_id == id).cloned());
        let Some(app) = app else {
            tracing::info!(app_id = ?target, "application not registered");
            return Snapshot::empty(Reachability::Online).with_apps(apps, None);
        };

        let records: Vec<KnowledgeBaseRecord> = registry
            .into_iter()
            .filter(|kb| kb.app_id == app.app_id)
            .collect();
        let views = self.settle_all(&records).await;
        let ingestion = self
            .ingestion(IngestionQuery::for_app(&app.app_id))
            .await;

        let snapshot = Snapshot::empty(Reachability::Online)
            .with_apps(apps, Some(app))
            .with_knowledge_bases(views)
            .with_ingestion(ingestion, self.ingestion_preview);
        tracing::info!(
            app_id = ?snapshot.app_id(),
            knowledge_bases = snapshot.knowledge_bases.len(),
            total_vectors = snapshot.total_vectors,
            ingestion = snapshot.ingestion_raw.len(),
            "view model reconciled"
        );
        snapshot
    }

    /// Dashboard overview across every application
    ///
    /// Offline, or when the registry cannot be read, the fallback overview is
    /// served instead.
    pub async fn overview(&self) -> Overview {
        if probe(self.api.as_ref()).await == Reachability::Offline {
            return self.fallback.overview(self.ingestion_preview);
        }

        let (apps, registry) = match self.registry().await {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(error = %err, "registry fetch failed, showing fallback overview");
                return self.fallback.overview(self.ingestion_preview);
            }
        };
        let views = self.settle_all(&registry).await;
        let ingestion = self.ingestion(IngestionQuery::default()).await;
        Overview::new(Reachability::Online, apps, views)
            .with_ingestion(ingestion, self.ingestion_preview)
    }

    async fn registry(&self) -> Result<(Vec<Application>, Vec<KnowledgeBaseRecord>), ClientError> {
        let (apps, registry) = tokio::join!(self.api.list_apps(), self.api.list_knowledge_bases());
        Ok((apps?, registry?))
    }

    async fn settle_all(&self, records: &[KnowledgeBaseRecord]) -> Vec<KnowledgeBaseView> {
        join_all(records.iter().map(|record| self.settle(record))).await
    }

    async fn settle(&self, record: &KnowledgeBaseRecord) -> KnowledgeBaseView {
        let stats = match self.api.kb_stats(&record.app_id, &record.kb_key).await {
            Ok(stats) => Some(stats),
            Err(err) => {
                tracing::warn!(kb = %record.id(), error = %err, "stats unavailable");
                None
            }
        };
        KnowledgeBaseView::pending(record).with_stats(stats)
    }

    async fn ingestion(&self, query: IngestionQuery) -> Vec<Value> {
        let query = query.with_limit(self.ingestion_page_size);
        match self.api.ingestion_logs(&query).await {
            Ok(list) => list.items,
            Err(err) => {
                tracing::warn!(error = %err, "ingestion logs unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdash_client::MockRagApi;
    use ragdash_core::{IngestionLogList, KbStats, StatValue};
    use serde_json::json;

    fn online_mock() -> MockRagApi {
        let mut api = MockRagApi::new();
        api.expect_health().returning(|| Ok(json!({})));
        api.expect_base_url().returning(|| "http://mock".to_string());
        api
    }

    #[tokio::test]
    async fn registry_failure_collapses_to_empty_snapshot() {
        let mut api = online_mock();
        api.expect_list_apps()
            .returning(|| Err(ClientError::Network("reset".into())));
        api.expect_list_knowledge_bases().returning(|| Ok(Vec::new()));
        api.expect_kb_stats().never();

        let reconciler = Reconciler::new(Arc::new(api), &ConsoleConfig::default());
        let snapshot = reconciler.load(None).await;
        assert_eq!(snapshot, Snapshot::empty(Reachability::Online));
    }

    #[tokio::test]
    async fn ingestion_failure_only_empties_ingestion() {
        let mut api = online_mock();
        api.expect_list_apps()
            .returning(|| Ok(vec![Application::new("acme")]));
        api.expect_list_knowledge_bases()
            .returning(|| Ok(vec![KnowledgeBaseRecord::new("acme", "kb1")]));
        api.expect_kb_stats()
            .returning(|_, _| Ok(KbStats::new(3, 30)));
        api.expect_ingestion_logs()
            .returning(|_| Err(ClientError::status(500, "logs down")));

        let reconciler = Reconciler::new(Arc::new(api), &ConsoleConfig::default());
        let snapshot = reconciler.reconcile(Some("acme")).await;
        assert_eq!(snapshot.knowledge_bases[0].chunks, StatValue::Value(30));
        assert!(snapshot.ingestion.is_empty());
        assert!(snapshot.ingestion_raw.is_empty());
    }

    #[tokio::test]
    async fn ingestion_query_names_the_app_and_page_size() {
        let mut api = online_mock();
        api.expect_list_apps()
            .returning(|| Ok(vec![Application::new("acme")]));
        api.expect_list_knowledge_bases().returning(|| Ok(Vec::new()));
        api.expect_ingestion_logs()
            .withf(|q| q.app_id.as_deref() == Some("acme") && q.limit == 20 && q.offset == 0)
            .times(1)
            .returning(|_| Ok(IngestionLogList { items: vec![json!({ "status": "done" })] }));

        let reconciler = Reconciler::new(Arc::new(api), &ConsoleConfig::default());
        let snapshot = reconciler.reconcile(None).await;
        assert_eq!(snapshot.app_id(), Some("acme"));
        assert_eq!(snapshot.ingestion[0].title, "DONE");
    }

    #[tokio::test]
    async fn unknown_app_yields_no_application_snapshot() {
        let mut api = online_mock();
        api.expect_list_apps()
            .returning(|| Ok(vec![Application::new("acme")]));
        api.expect_list_knowledge_bases()
            .returning(|| Ok(vec![KnowledgeBaseRecord::new("acme", "kb1")]));
        api.expect_kb_stats().never();
        api.expect_ingestion_logs().never();

        let reconciler = Reconciler::new(Arc::new(api), &ConsoleConfig::default());
        let snapshot = reconciler.reconcile(Some("ghost")).await;
        assert!(snapshot.app.is_none());
        assert_eq!(snapshot.apps.len(), 1);
        assert!(snapshot.knowledge_bases.is_empty());
    }
}
