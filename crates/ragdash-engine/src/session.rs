//! Console session
//!
//! Owns the platform client and the console state, and turns operator
//! commands into reducer events. Effects returned by the reducer are run
//! against the client and their outcome is fed back as further events until
//! the queue drains.
//!
//! The state lock is held only while reducing, never across an `.await`, so
//! concurrent commands interleave at network calls. Stale outcomes are dropped
//! by the generation checks inside the reducers.

use crate::config::{ConfigStore, ConsoleConfig};
use crate::error::ConsoleError;
use crate::probe::probe;
use crate::reconciler::Reconciler;
use parking_lot::Mutex;
use ragdash_client::{Page, RagApi};
use ragdash_core::{
    export_ingestion, export_stores, infer_schema, ConsoleEffect, ConsoleEvent, ConsoleState,
    DocEffect, DocEvent, ExportFile, FilterState, FormField, HintSlot, KnowledgeBaseView,
    Location, MemoryForm, MutationKind, Overview, Reachability, SchemaField, StoresView,
    ValidationError,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// One operator session against the platform
pub struct ConsoleSession {
    api: Arc<dyn RagApi>,
    reconciler: Reconciler,
    config: ConsoleConfig,
    store: Option<ConfigStore>,
    state: Mutex<ConsoleState>,
}

impl std::fmt::Debug for ConsoleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSession")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ConsoleSession {
    /// Create session; nothing is loaded until [`Self::refresh`]
    #[must_use]
    pub fn new(api: Arc<dyn RagApi>, config: ConsoleConfig) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::clone(&api), &config),
            api,
            config,
            store: None,
            state: Mutex::new(ConsoleState::default()),
        }
    }

    /// With a config store that receives base-address changes
    #[must_use]
    pub fn with_store(mut self, store: ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Start at a location
    #[must_use]
    pub fn with_location(self, location: Location) -> Self {
        *self.state.lock() = ConsoleState::new(location);
        self
    }

    /// Copy of the current state
    #[must_use]
    pub fn state(&self) -> ConsoleState {
        self.state.lock().clone()
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Rebuild the view model from scratch
    pub async fn refresh(&self) {
        self.dispatch(ConsoleEvent::ReloadRequested).await;
    }

    /// Point the client at another backend, persist the address and reload
    ///
    /// When the address cannot be saved the client goes back to the previous
    /// backend and the current view is kept.
    pub async fn set_base_url(&self, url: &str) -> Result<(), ConsoleError> {
        let previous = self.api.base_url();
        self.api.set_base_url(url)?;
        if let Some(store) = &self.store {
            if let Err(err) = store.save_base_url(&self.api.base_url()) {
                tracing::warn!(error = %err, %previous, "base address not saved, restoring");
                self.api.set_base_url(&previous)?;
                return Err(err.into());
            }
        }
        self.refresh().await;
        Ok(())
    }

    /// Switch application; `None` picks the first registered one
    pub async fn select_app(&self, app_id: Option<String>) {
        self.dispatch(ConsoleEvent::NavigateApp(app_id)).await;
    }

    /// Select a knowledge base and load its documents
    pub async fn select_kb(&self, kb_id: &str) {
        self.dispatch(ConsoleEvent::SelectKb(kb_id.to_string())).await;
    }

    /// Reload the document batch of the selected knowledge base
    pub async fn load_documents(&self) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::Reload)).await;
    }

    /// Open a document in the editor
    pub async fn select_doc(&self, doc_id: &str) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::SelectDoc(doc_id.to_string())))
            .await;
    }

    /// Open a blank editor
    pub async fn open_new_doc(&self) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::OpenNew)).await;
    }

    /// Close the editor drawer
    pub async fn close_drawer(&self) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::CloseDrawer)).await;
    }

    /// Collapse or expand the editor panel
    pub async fn toggle_panel(&self) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::TogglePanel)).await;
    }

    /// Change one editor field
    pub async fn edit_form(&self, field: FormField, value: impl Into<String>) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::EditForm(field, value.into())))
            .await;
    }

    /// Save the editor contents; outcome lands in the document hint
    pub async fn submit_document(&self) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::Submit)).await;
    }

    /// Delete the selected document; outcome lands in the document hint
    pub async fn delete_document(&self) {
        self.dispatch(ConsoleEvent::Doc(DocEvent::Delete)).await;
    }

    /// Infer the schema of the selected knowledge base
    ///
    /// Uses the loaded batch, or fetches a sample when the batch is empty.
    pub async fn schema(&self) -> Result<Vec<SchemaField>, ConsoleError> {
        let (target, docs) = {
            let state = self.state.lock();
            let docs = state.docs();
            (docs.kb().cloned(), docs.batch().items.clone())
        };
        let target = target.ok_or(ValidationError::NoKnowledgeBase)?;
        if !docs.is_empty() {
            return Ok(infer_schema(&docs));
        }

        let sample = self
            .api
            .list_documents(
                &target.app_id,
                &target.kb_key,
                Page::first(self.config.schema_sample_size),
            )
            .await?;
        Ok(infer_schema(&sample.items))
    }

    /// Set the knowledge-base search query
    pub async fn set_query(&self, query: impl Into<String>) {
        self.dispatch(ConsoleEvent::SetQuery(query.into())).await;
    }

    /// Replace the facet filters
    pub async fn set_filters(&self, filters: FilterState) {
        self.dispatch(ConsoleEvent::SetFilters(filters)).await;
    }

    /// Drop every facet selection
    pub async fn clear_filters(&self) {
        self.dispatch(ConsoleEvent::ClearFilters).await;
    }

    /// Knowledge bases passing the query and facets
    #[must_use]
    pub fn visible_kbs(&self) -> Vec<KnowledgeBaseView> {
        self.state
            .lock()
            .visible_kbs()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Dashboard overview across every application
    pub async fn overview(&self) -> Overview {
        self.reconciler.overview().await
    }

    /// Validate and push a session history into memory
    pub async fn push_memory(&self, form: &MemoryForm) -> Result<Value, ConsoleError> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(err) => {
                self.set_hint(HintSlot::Memory, Some(err.to_string())).await;
                return Err(err.into());
            }
        };

        match self.api.push_memory(&request).await {
            Ok(response) => {
                tracing::info!(app_id = %request.app_id, session_id = %request.session_id, "memory pushed");
                let pretty = serde_json::to_string_pretty(&response)
                    .unwrap_or_else(|_| response.to_string());
                self.dispatch(ConsoleEvent::MemoryPushed(pretty)).await;
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(error = %err, "memory push failed");
                self.set_hint(HintSlot::Memory, Some(format!("push failed: {err}")))
                    .await;
                Err(err.into())
            }
        }
    }

    /// Load the stores page: fallback stores offline, live health online
    pub async fn load_stores(&self) -> StoresView {
        let view = match probe(self.api.as_ref()).await {
            Reachability::Offline => StoresView::from_health(&self.reconciler.fallback().stores()),
            Reachability::Online => match self.api.stores_health().await {
                Ok(health) => StoresView::from_health(&health),
                Err(err) => {
                    tracing::warn!(error = %err, "stores health unavailable");
                    StoresView::failed(err)
                }
            },
        };
        self.dispatch(ConsoleEvent::StoresLoaded(view.clone())).await;
        view
    }

    /// Export ingestion logs of the current snapshot
    pub async fn export_ingestion(&self) -> Result<ExportFile, ConsoleError> {
        let result = {
            let state = self.state.lock();
            let snapshot = state.snapshot();
            export_ingestion(&snapshot.ingestion_raw, &snapshot.ingestion, now_millis())
        };
        let hint = result.as_ref().err().map(ToString::to_string);
        self.set_hint(HintSlot::Export, hint).await;
        Ok(result?)
    }

    /// Export the store cards of the last stores load
    pub async fn export_stores(&self) -> Result<ExportFile, ConsoleError> {
        let result = {
            let state = self.state.lock();
            export_stores(&state.stores().cards, now_millis())
        };
        let hint = result.as_ref().err().map(ToString::to_string);
        self.set_hint(HintSlot::Export, hint).await;
        Ok(result?)
    }

    async fn set_hint(&self, slot: HintSlot, hint: Option<String>) {
        self.dispatch(ConsoleEvent::SetHint(slot, hint)).await;
    }

    /// Reduce an event and run every resulting effect to completion
    async fn dispatch(&self, event: ConsoleEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            for effect in self.apply(event) {
                queue.push_back(self.run(effect).await);
            }
        }
    }

    fn apply(&self, event: ConsoleEvent) -> Vec<ConsoleEffect> {
        let mut guard = self.state.lock();
        let (next, effects) = std::mem::take(&mut *guard).reduce(event);
        *guard = next;
        effects
    }

    async fn run(&self, effect: ConsoleEffect) -> ConsoleEvent {
        match effect {
            ConsoleEffect::Reconcile { generation, app_id } => {
                let snapshot = self.reconciler.load(app_id.as_deref()).await;
                ConsoleEvent::SnapshotReady {
                    generation,
                    snapshot,
                }
            }
            ConsoleEffect::Doc(effect) => ConsoleEvent::Doc(self.run_doc(effect).await),
        }
    }

    async fn run_doc(&self, effect: DocEffect) -> DocEvent {
        match effect {
            DocEffect::LoadBatch { generation, target } => {
                let result = self
                    .api
                    .list_documents(
                        &target.app_id,
                        &target.kb_key,
                        Page::first(self.config.doc_page_size),
                    )
                    .await
                    .map_err(|err| {
                        tracing::warn!(kb = %target.id, error = %err, "document batch failed");
                        err.to_string()
                    });
                DocEvent::BatchLoaded { generation, result }
            }
            DocEffect::Create {
                epoch,
                target,
                payload,
            } => {
                let outcome = self
                    .api
                    .create_document(&target.app_id, &target.kb_key, &payload)
                    .await
                    .map(|doc| tracing::info!(kb = %target.id, doc_id = %doc.id, "document created"));
                mutation_event(epoch, MutationKind::Create, outcome)
            }
            DocEffect::Update {
                epoch,
                target,
                doc_id,
                payload,
            } => {
                let outcome = self
                    .api
                    .update_document(&target.app_id, &target.kb_key, &doc_id, &payload)
                    .await
                    .map(|_| tracing::info!(kb = %target.id, %doc_id, "document updated"));
                mutation_event(epoch, MutationKind::Update, outcome)
            }
            DocEffect::Delete {
                epoch,
                target,
                doc_id,
            } => {
                let outcome = self
                    .api
                    .delete_document(&target.app_id, &target.kb_key, &doc_id)
                    .await
                    .map(|()| tracing::info!(kb = %target.id, %doc_id, "document deleted"));
                mutation_event(epoch, MutationKind::Delete, outcome)
            }
        }
    }
}

fn mutation_event(
    epoch: u64,
    kind: MutationKind,
    outcome: Result<(), ragdash_client::ClientError>,
) -> DocEvent {
    match outcome {
        Ok(()) => DocEvent::MutationSucceeded { epoch, kind },
        Err(err) => {
            tracing::warn!(?kind, error = %err, "document mutation failed");
            DocEvent::MutationFailed {
                epoch,
                kind,
                message: err.to_string(),
            }
        }
    }
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
