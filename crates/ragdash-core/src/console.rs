//! Console state and reducer
//!
//! The whole console is one immutable [`ConsoleState`] value. Every user
//! action and every settled fetch is a [`ConsoleEvent`]; [`ConsoleState::reduce`]
//! consumes the state and returns the next one together with the network work
//! to run as [`ConsoleEffect`]s.
//!
//! # Generations
//!
//! Each reload request bumps a monotonically increasing generation and tags the
//! reconcile effect with it. A snapshot arriving with any other generation is
//! stale (a newer reload was requested meanwhile) and is dropped. Document
//! batches are guarded the same way inside [`DocumentWorkflow`].

use crate::filter::{facet_options, visible_rows, FacetOptions, FilterState};
use crate::model::{
    map_ingestion, total_vectors, Application, IngestionEntry, KnowledgeBaseView, Reachability,
};
use crate::stores::StoresView;
use crate::workflow::{DocEffect, DocEvent, DocumentWorkflow, KbTarget};
use serde::Serialize;
use serde_json::Value;

/// Navigation state that would live in the page address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Application named in the address
    pub app_id: Option<String>,
}

impl Location {
    /// Create location for an application
    #[inline]
    #[must_use]
    pub fn app(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
        }
    }
}

/// One consistent per-application view model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Where the data came from
    pub source: Reachability,
    /// All registered applications
    pub apps: Vec<Application>,
    /// Resolved target application, `None` when absent from the registry
    pub app: Option<Application>,
    /// Knowledge bases of the target application
    pub knowledge_bases: Vec<KnowledgeBaseView>,
    /// Sum of resolved chunk counts
    pub total_vectors: u64,
    /// Display entries for the ingestion preview
    pub ingestion: Vec<IngestionEntry>,
    /// Untransformed ingestion records, kept for export
    pub ingestion_raw: Vec<Value>,
    /// Selected knowledge base id
    pub selected_kb: Option<String>,
}

impl Snapshot {
    /// Empty but valid snapshot
    #[must_use]
    pub fn empty(source: Reachability) -> Self {
        Self {
            source,
            apps: Vec::new(),
            app: None,
            knowledge_bases: Vec::new(),
            total_vectors: 0,
            ingestion: Vec::new(),
            ingestion_raw: Vec::new(),
            selected_kb: None,
        }
    }

    /// With application list and resolved target
    #[must_use]
    pub fn with_apps(mut self, apps: Vec<Application>, app: Option<Application>) -> Self {
        self.apps = apps;
        self.app = app;
        self
    }

    /// With knowledge bases; recomputes the vector total and selects the first
    #[must_use]
    pub fn with_knowledge_bases(mut self, kbs: Vec<KnowledgeBaseView>) -> Self {
        self.total_vectors = total_vectors(&kbs);
        self.knowledge_bases = kbs;
        self.select(None);
        self
    }

    /// With raw ingestion records; the first `preview` are mapped for display
    #[must_use]
    pub fn with_ingestion(mut self, raw: Vec<Value>, preview: usize) -> Self {
        self.ingestion = map_ingestion(&raw, preview);
        self.ingestion_raw = raw;
        self
    }

    /// Target application id
    #[inline]
    #[must_use]
    pub fn app_id(&self) -> Option<&str> {
        self.app.as_ref().map(|app| app.app_id.as_str())
    }

    /// Find a knowledge base by id
    #[must_use]
    pub fn knowledge_base(&self, id: &str) -> Option<&KnowledgeBaseView> {
        self.knowledge_bases.iter().find(|kb| kb.id == id)
    }

    /// Selected knowledge base
    #[must_use]
    pub fn selected(&self) -> Option<&KnowledgeBaseView> {
        self.selected_kb
            .as_deref()
            .and_then(|id| self.knowledge_base(id))
    }

    /// Keep `preferred` selected when present, else fall back to the first
    fn select(&mut self, preferred: Option<&str>) {
        self.selected_kb = preferred
            .and_then(|id| self.knowledge_base(id))
            .or_else(|| self.knowledge_bases.first())
            .map(|kb| kb.id.clone());
    }
}

/// Cross-application dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    /// Where the data came from
    pub source: Reachability,
    /// All registered applications
    pub apps: Vec<Application>,
    /// Every knowledge base of every application
    pub knowledge_bases: Vec<KnowledgeBaseView>,
    /// Sum of resolved chunk counts
    pub total_vectors: u64,
    /// Display entries for the ingestion timeline
    pub ingestion: Vec<IngestionEntry>,
    /// Untransformed ingestion records, kept for export
    pub ingestion_raw: Vec<Value>,
}

impl Overview {
    /// Build from registry data; the vector total is derived
    #[must_use]
    pub fn new(
        source: Reachability,
        apps: Vec<Application>,
        knowledge_bases: Vec<KnowledgeBaseView>,
    ) -> Self {
        Self {
            source,
            apps,
            total_vectors: total_vectors(&knowledge_bases),
            knowledge_bases,
            ingestion: Vec::new(),
            ingestion_raw: Vec::new(),
        }
    }

    /// With raw ingestion records; the first `preview` are mapped for display
    #[must_use]
    pub fn with_ingestion(mut self, raw: Vec<Value>, preview: usize) -> Self {
        self.ingestion = map_ingestion(&raw, preview);
        self.ingestion_raw = raw;
        self
    }

    /// Number of applications whose status is `active`
    #[must_use]
    pub fn active_apps(&self) -> usize {
        self.apps.iter().filter(|app| app.is_active()).count()
    }
}

/// Named hint slots outside the document editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintSlot {
    /// Knowledge-base panel
    Kb,
    /// Memory push form
    Memory,
    /// Ingestion export
    Export,
}

/// Hint texts per slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints {
    kb: Option<String>,
    memory: Option<String>,
    export: Option<String>,
}

impl Hints {
    /// Hint for a slot
    #[must_use]
    pub fn get(&self, slot: HintSlot) -> Option<&str> {
        self.slot(slot).as_deref()
    }

    fn slot(&self, slot: HintSlot) -> &Option<String> {
        match slot {
            HintSlot::Kb => &self.kb,
            HintSlot::Memory => &self.memory,
            HintSlot::Export => &self.export,
        }
    }

    fn slot_mut(&mut self, slot: HintSlot) -> &mut Option<String> {
        match slot {
            HintSlot::Kb => &mut self.kb,
            HintSlot::Memory => &mut self.memory,
            HintSlot::Export => &mut self.export,
        }
    }
}

/// Inputs to the console reducer
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    /// Manual refresh, base-address change or reachability transition
    ReloadRequested,
    /// Switch to another application (or to the default) and reload
    NavigateApp(Option<String>),
    /// A reconcile settled
    SnapshotReady {
        /// Generation the reconcile was issued for
        generation: u64,
        /// Reconciled view model
        snapshot: Snapshot,
    },
    /// A knowledge-base row was clicked
    SelectKb(String),
    /// Search box changed
    SetQuery(String),
    /// Facet checkboxes changed
    SetFilters(FilterState),
    /// Facet reset
    ClearFilters,
    /// Document workflow event
    Doc(DocEvent),
    /// Stores page loaded
    StoresLoaded(StoresView),
    /// Set or clear a hint
    SetHint(HintSlot, Option<String>),
    /// Memory push succeeded with this response text
    MemoryPushed(String),
}

/// Network work requested by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEffect {
    /// Probe reachability, then reconcile or load the fallback dataset
    Reconcile {
        /// Generation to tag the snapshot with
        generation: u64,
        /// Application named in the location
        app_id: Option<String>,
    },
    /// Document store call
    Doc(DocEffect),
}

/// Whole console state
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleState {
    generation: u64,
    loading: bool,
    location: Location,
    snapshot: Snapshot,
    query: String,
    filters: FilterState,
    docs: DocumentWorkflow,
    stores: StoresView,
    hints: Hints,
    memory_log: Option<String>,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new(Location::default())
    }
}

impl ConsoleState {
    /// Create state at a location, nothing loaded yet
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self {
            generation: 0,
            loading: false,
            location,
            snapshot: Snapshot::empty(Reachability::Offline),
            query: String::new(),
            filters: FilterState::new(),
            docs: DocumentWorkflow::new(),
            stores: StoresView::default(),
            hints: Hints::default(),
            memory_log: None,
        }
    }

    /// Generation of the latest reload request
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a reload is outstanding
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Current location
    #[inline]
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Latest applied snapshot
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Data source of the latest snapshot
    #[inline]
    #[must_use]
    pub fn source(&self) -> Reachability {
        self.snapshot.source
    }

    /// Search query
    #[inline]
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Facet filters
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Document workflow
    #[inline]
    #[must_use]
    pub fn docs(&self) -> &DocumentWorkflow {
        &self.docs
    }

    /// Stores page
    #[inline]
    #[must_use]
    pub fn stores(&self) -> &StoresView {
        &self.stores
    }

    /// Hint slots
    #[inline]
    #[must_use]
    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    /// Last memory push response
    #[inline]
    #[must_use]
    pub fn memory_log(&self) -> Option<&str> {
        self.memory_log.as_deref()
    }

    /// Knowledge-base rows passing the query and the facets
    #[must_use]
    pub fn visible_kbs(&self) -> Vec<&KnowledgeBaseView> {
        visible_rows(&self.snapshot.knowledge_bases, &self.query, &self.filters)
    }

    /// Facet values offered for the current snapshot
    #[must_use]
    pub fn facet_options(&self) -> FacetOptions {
        facet_options(&self.snapshot.knowledge_bases)
    }

    /// Apply an event, returning the next state and the effects to run
    #[must_use]
    pub fn reduce(mut self, event: ConsoleEvent) -> (Self, Vec<ConsoleEffect>) {
        match event {
            ConsoleEvent::ReloadRequested => {
                let effect = self.begin_reload();
                (self, vec![effect])
            }
            ConsoleEvent::NavigateApp(app_id) => {
                self.location = Location { app_id };
                let effect = self.begin_reload();
                (self, vec![effect])
            }
            ConsoleEvent::SnapshotReady {
                generation,
                snapshot,
            } => {
                if generation != self.generation {
                    tracing::debug!(
                        generation,
                        latest = self.generation,
                        "discarding stale snapshot"
                    );
                    return (self, Vec::new());
                }
                let effects = self.apply_snapshot(snapshot);
                (self, effects)
            }
            ConsoleEvent::SelectKb(id) => {
                let Some(kb) = self.snapshot.knowledge_base(&id) else {
                    return (self, Vec::new());
                };
                let target = KbTarget::from(kb);
                self.snapshot.selected_kb = Some(id);
                self.hints.kb = None;
                let effects = self.dispatch_doc(DocEvent::KbSelected(Some(target)));
                (self, effects)
            }
            ConsoleEvent::SetQuery(query) => {
                self.query = query;
                (self, Vec::new())
            }
            ConsoleEvent::SetFilters(filters) => {
                self.filters = filters;
                (self, Vec::new())
            }
            ConsoleEvent::ClearFilters => {
                self.filters.clear();
                (self, Vec::new())
            }
            ConsoleEvent::Doc(event) => {
                let effects = self.dispatch_doc(event);
                (self, effects)
            }
            ConsoleEvent::StoresLoaded(stores) => {
                self.stores = stores;
                (self, Vec::new())
            }
            ConsoleEvent::SetHint(slot, hint) => {
                *self.hints.slot_mut(slot) = hint;
                (self, Vec::new())
            }
            ConsoleEvent::MemoryPushed(response) => {
                self.memory_log = Some(response);
                self.hints.memory = Some("memory pushed".to_string());
                (self, Vec::new())
            }
        }
    }

    fn begin_reload(&mut self) -> ConsoleEffect {
        self.generation += 1;
        self.loading = true;
        ConsoleEffect::Reconcile {
            generation: self.generation,
            app_id: self.location.app_id.clone(),
        }
    }

    fn apply_snapshot(&mut self, mut snapshot: Snapshot) -> Vec<ConsoleEffect> {
        if self.location.app_id.is_none() {
            if let Some(app_id) = snapshot.app_id() {
                self.location = Location::app(app_id);
            }
        }
        let previous = self.snapshot.selected_kb.take();
        snapshot.select(previous.as_deref());

        let target = snapshot.selected().map(KbTarget::from);
        self.snapshot = snapshot;
        self.loading = false;
        self.dispatch_doc(DocEvent::KbSelected(target))
    }

    fn dispatch_doc(&mut self, event: DocEvent) -> Vec<ConsoleEffect> {
        let docs = std::mem::take(&mut self.docs);
        let (docs, effect) = docs.reduce(event);
        self.docs = docs;
        effect.map(ConsoleEffect::Doc).into_iter().collect()
    }
}
