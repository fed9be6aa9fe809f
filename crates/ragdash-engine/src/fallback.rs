//! Static fallback dataset used while the backend is unreachable
//!
//! The sample is self-consistent: every knowledge base belongs to a listed
//! application and every ingestion record names a listed knowledge base.

use ragdash_core::{
    Application, KbStats, KnowledgeBaseRecord, KnowledgeBaseView, Overview, Reachability,
    Snapshot, StoreHealth, StoresHealth,
};
use serde_json::{json, Value};

/// Fixed sample of applications, knowledge bases, ingestion records and stores
#[derive(Debug, Clone)]
pub struct FallbackDataset {
    apps: Vec<Application>,
    knowledge_bases: Vec<(KnowledgeBaseRecord, KbStats)>,
    ingestion: Vec<Value>,
    stores: Vec<StoreHealth>,
}

impl Default for FallbackDataset {
    fn default() -> Self {
        Self::sample()
    }
}

impl FallbackDataset {
    /// Build the built-in sample
    #[must_use]
    pub fn sample() -> Self {
        let kb = |app: &str, key: &str, kb_type: &str, top_k: i64, weight: f64| {
            KnowledgeBaseRecord::new(app, key)
                .with_type(kb_type)
                .with_collection(format!("{}_{}", app.replace('-', "_"), key))
                .with_text_field("text")
                .with_retrieval(top_k, weight, kb_type == "user_upload")
                .with_status("active")
        };

        Self {
            apps: vec![
                Application::new("support-bot").with_status("active").with_plugin(true),
                Application::new("sales-copilot").with_status("active"),
                Application::new("legal-search").with_status("disabled"),
            ],
            knowledge_bases: vec![
                (kb("support-bot", "faq", "kb", 5, 1.0), KbStats::new(128, 2048)),
                (kb("support-bot", "tickets", "user_upload", 3, 0.6), KbStats::new(56, 730)),
                (kb("sales-copilot", "playbooks", "kb", 4, 0.8), KbStats::new(42, 610)),
                (kb("sales-copilot", "crm_notes", "user_upload", 6, 0.5), KbStats::new(310, 4120)),
                (kb("legal-search", "contracts", "kb", 8, 1.0), KbStats::new(18, 960)),
            ],
            ingestion: vec![
                ingestion("support-bot", "faq", "done", "2025-03-02T09:14:00", "indexed 12 documents"),
                ingestion("support-bot", "tickets", "running", "2025-03-02T09:40:00", ""),
                ingestion("sales-copilot", "playbooks", "done", "2025-03-01T17:05:00", "indexed 3 documents"),
                ingestion("legal-search", "contracts", "failed", "2025-02-27T11:30:00", "parser rejected scanned pdf"),
            ],
            stores: vec![
                StoreHealth::new("weaviate", "ok").with_details("vector store, 3 nodes"),
                StoreHealth::new("mongodb", "ok").with_details("registry and memory sessions"),
                StoreHealth::new("redis", "configured"),
                StoreHealth::new("minio", "disabled").with_details("object storage not enabled"),
            ],
        }
    }

    /// All applications
    #[inline]
    #[must_use]
    pub fn apps(&self) -> &[Application] {
        &self.apps
    }

    /// Id of the first application
    #[must_use]
    pub fn first_app_id(&self) -> Option<&str> {
        self.apps.first().map(|app| app.app_id.as_str())
    }

    fn views(&self, app_id: Option<&str>) -> Vec<KnowledgeBaseView> {
        self.knowledge_bases
            .iter()
            .filter(|(record, _)| app_id.map_or(true, |id| record.app_id == id))
            .map(|(record, stats)| KnowledgeBaseView::pending(record).with_stats(Some(*stats)))
            .collect()
    }

    /// Snapshot for an application, defaulting to the first one
    ///
    /// Every ingestion record is included regardless of application.
    #[must_use]
    pub fn snapshot(&self, app_id: Option<&str>, ingestion_preview: usize) -> Snapshot {
        let target = app_id.or_else(|| self.first_app_id());
        let app = target.and_then(|id| self.apps.iter().find(|app| app.app_id == id).cloned());
        let kbs = match &app {
            Some(app) => self.views(Some(&app.app_id)),
            None => Vec::new(),
        };
        Snapshot::empty(Reachability::Offline)
            .with_apps(self.apps.clone(), app)
            .with_knowledge_bases(kbs)
            .with_ingestion(self.ingestion.clone(), ingestion_preview)
    }

    /// Dashboard overview across every application
    #[must_use]
    pub fn overview(&self, ingestion_preview: usize) -> Overview {
        Overview::new(Reachability::Offline, self.apps.clone(), self.views(None))
            .with_ingestion(self.ingestion.clone(), ingestion_preview)
    }

    /// Stores health
    #[must_use]
    pub fn stores(&self) -> StoresHealth {
        StoresHealth {
            stores: self.stores.clone(),
        }
    }
}

fn ingestion(app_id: &str, kb_key: &str, status: &str, created_at: &str, message: &str) -> Value {
    json!({
        "app_id": app_id,
        "kb_key": kb_key,
        "status": status,
        "created_at": created_at,
        "message": message,
        "collection": format!("{}_{}", app_id.replace('-', "_"), kb_key),
    })
}
