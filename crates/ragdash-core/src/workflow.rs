//! Document workflow state machine
//!
//! Tracks one document at a time for the selected knowledge base: which
//! document is selected, whether the editor is creating or editing, drawer and
//! panel visibility, the form fields and a single hint slot.
//!
//! # Modes
//!
//! ```text
//!            select_doc(id in batch)
//! Browsing ─────────────────────────▶ Viewing(id)
//!    ▲  ▲                                 │
//!    │  └──── save / delete succeeded ────┘
//!    │
//!    └──── save succeeded ──── Creating ◀── open_new (any mode)
//! ```
//!
//! Selecting another knowledge base always returns to `Browsing` and closes
//! the drawer. It also starts a new selection epoch; mutation outcomes carry
//! the epoch they were issued in and are ignored once it has passed. Every transition is a pure function of the current state and
//! an event; network work is returned as a [`DocEffect`] for the caller to
//! run.

use crate::error::ValidationError;
use crate::model::{Document, DocumentList, DocumentPayload, KnowledgeBaseView};
use crate::schema::{build_doc_columns, describe_document, document_text, DocumentField};
use serde_json::{Map, Value};

/// Knowledge base the workflow is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KbTarget {
    /// `app_id:kb_key`
    pub id: String,
    /// Owning application
    pub app_id: String,
    /// Key within the application
    pub kb_key: String,
    /// Property holding the primary text
    pub text_field: String,
    /// Vector store collection
    pub collection: String,
}

impl From<&KnowledgeBaseView> for KbTarget {
    fn from(kb: &KnowledgeBaseView) -> Self {
        Self {
            id: kb.id.clone(),
            app_id: kb.app_id.clone(),
            kb_key: kb.kb_key.clone(),
            text_field: kb.text_field.clone(),
            collection: kb.collection.clone(),
        }
    }
}

/// Loaded page of documents with its derived columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentBatch {
    /// Documents on the page
    pub items: Vec<Document>,
    /// Total in the collection
    pub total: u64,
    /// Grid columns derived from `items`
    pub columns: Vec<String>,
}

impl DocumentBatch {
    /// Build a batch and derive its columns
    #[must_use]
    pub fn from_list(list: DocumentList, text_field: &str) -> Self {
        let columns = build_doc_columns(&list.items, text_field);
        Self {
            items: list.items,
            total: list.total,
            columns,
        }
    }

    /// Find a document by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.items.iter().find(|doc| doc.id == id)
    }
}

/// Editing mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocMode {
    /// Nothing selected
    #[default]
    Browsing,
    /// An existing document is loaded into the form
    Viewing(String),
    /// Blank form for a new document
    Creating,
}

/// Editor form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocForm {
    /// Document id
    pub id: String,
    /// Primary text
    pub text: String,
    /// Properties as JSON text
    pub properties: String,
}

impl DocForm {
    /// Fill the form from a document
    #[must_use]
    pub fn from_document(doc: &Document, text_field: &str) -> Self {
        Self {
            id: doc.id.clone(),
            text: document_text(doc, text_field),
            properties: serde_json::to_string_pretty(&doc.properties)
                .unwrap_or_else(|_| "{}".to_string()),
        }
    }

    /// Parse the properties text; blank means an empty object
    pub fn parse_properties(&self) -> Result<Map<String, Value>, ValidationError> {
        if self.properties.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&self.properties) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ValidationError::PropertiesNotObject),
            Err(e) => Err(ValidationError::MalformedProperties(e.to_string())),
        }
    }

    /// Build the request body
    pub fn payload(&self, with_id: bool) -> Result<DocumentPayload, ValidationError> {
        let properties = self.parse_properties()?;
        let text = self.text.trim();
        let id = self.id.trim();
        Ok(DocumentPayload {
            text: (!text.is_empty()).then(|| text.to_string()),
            properties,
            id: (with_id && !id.is_empty()).then(|| id.to_string()),
        })
    }
}

/// Editable form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// Document id
    Id,
    /// Primary text
    Text,
    /// Properties JSON
    Properties,
}

/// Kind of a document mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `POST`
    Create,
    /// `PATCH`
    Update,
    /// `DELETE`
    Delete,
}

impl MutationKind {
    fn done_hint(self) -> &'static str {
        match self {
            Self::Create => "document created",
            Self::Update => "document updated",
            Self::Delete => "document deleted",
        }
    }

    fn failed_prefix(self) -> &'static str {
        match self {
            Self::Create | Self::Update => "save failed",
            Self::Delete => "delete failed",
        }
    }
}

/// Inputs to the workflow
#[derive(Debug, Clone, PartialEq)]
pub enum DocEvent {
    /// The selected knowledge base changed (or was cleared)
    KbSelected(Option<KbTarget>),
    /// Reload the current batch
    Reload,
    /// A batch fetch settled
    BatchLoaded {
        /// Generation the fetch was issued for
        generation: u64,
        /// Fetched page or error text
        result: Result<DocumentList, String>,
    },
    /// A grid row was clicked
    SelectDoc(String),
    /// The "new document" control was used
    OpenNew,
    /// Drawer closed (backdrop, close button, escape)
    CloseDrawer,
    /// Collapse or expand the editor panel
    TogglePanel,
    /// A form field changed
    EditForm(FormField, String),
    /// Form submitted
    Submit,
    /// Delete requested
    Delete,
    /// A mutation succeeded
    MutationSucceeded {
        /// Selection epoch the mutation was issued in
        epoch: u64,
        /// Which mutation
        kind: MutationKind,
    },
    /// A mutation failed
    MutationFailed {
        /// Selection epoch the mutation was issued in
        epoch: u64,
        /// Which mutation
        kind: MutationKind,
        /// Error text
        message: String,
    },
}

/// Network work requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum DocEffect {
    /// Fetch the first page of documents
    LoadBatch {
        /// Generation to tag the result with
        generation: u64,
        /// Knowledge base to read
        target: KbTarget,
    },
    /// `POST` a new document
    Create {
        /// Selection epoch to tag the outcome with
        epoch: u64,
        /// Knowledge base to write
        target: KbTarget,
        /// Request body
        payload: DocumentPayload,
    },
    /// `PATCH` an existing document
    Update {
        /// Selection epoch to tag the outcome with
        epoch: u64,
        /// Knowledge base to write
        target: KbTarget,
        /// Document id
        doc_id: String,
        /// Request body
        payload: DocumentPayload,
    },
    /// `DELETE` a document
    Delete {
        /// Selection epoch to tag the outcome with
        epoch: u64,
        /// Knowledge base to write
        target: KbTarget,
        /// Document id
        doc_id: String,
    },
}

/// Header data for the document drawer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawerView {
    /// `new document` or `document detail`
    pub title: String,
    /// Document id or `-`
    pub doc_id: String,
    /// Creation time or `-`
    pub created_at: String,
    /// Update time or `-`
    pub updated_at: String,
    /// Property fields, sorted
    pub fields: Vec<DocumentField>,
}

/// Document workflow state
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWorkflow {
    kb: Option<KbTarget>,
    batch: DocumentBatch,
    mode: DocMode,
    form: DocForm,
    drawer_open: bool,
    panel_collapsed: bool,
    hint: Option<String>,
    generation: u64,
    epoch: u64,
}

impl Default for DocumentWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentWorkflow {
    /// Create workflow with no knowledge base
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            kb: None,
            batch: DocumentBatch::default(),
            mode: DocMode::Browsing,
            form: DocForm::default(),
            drawer_open: false,
            panel_collapsed: false,
            hint: None,
            generation: 0,
            epoch: 0,
        }
    }

    /// Current mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> &DocMode {
        &self.mode
    }

    /// Bound knowledge base
    #[inline]
    #[must_use]
    pub fn kb(&self) -> Option<&KbTarget> {
        self.kb.as_ref()
    }

    /// Loaded batch
    #[inline]
    #[must_use]
    pub fn batch(&self) -> &DocumentBatch {
        &self.batch
    }

    /// Form fields
    #[inline]
    #[must_use]
    pub fn form(&self) -> &DocForm {
        &self.form
    }

    /// Hint slot
    #[inline]
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Drawer visibility
    #[inline]
    #[must_use]
    pub fn drawer_open(&self) -> bool {
        self.drawer_open
    }

    /// Editor panel state
    #[inline]
    #[must_use]
    pub fn panel_collapsed(&self) -> bool {
        self.panel_collapsed
    }

    /// Generation of the latest batch request
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of knowledge-base selections so far
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Selected document, if it is still in the batch
    #[must_use]
    pub fn selected(&self) -> Option<&Document> {
        match &self.mode {
            DocMode::Viewing(id) => self.batch.get(id),
            DocMode::Browsing | DocMode::Creating => None,
        }
    }

    /// Whether delete is available
    #[inline]
    #[must_use]
    pub fn can_delete(&self) -> bool {
        matches!(self.mode, DocMode::Viewing(_))
    }

    /// Drawer header and field list
    #[must_use]
    pub fn drawer(&self) -> DrawerView {
        let text_field = self.kb.as_ref().map_or("text", |kb| kb.text_field.as_str());
        match self.selected() {
            Some(doc) => DrawerView {
                title: "document detail".to_string(),
                doc_id: doc.id.clone(),
                created_at: doc.created_at.clone().unwrap_or_else(|| "-".to_string()),
                updated_at: doc.updated_at.clone().unwrap_or_else(|| "-".to_string()),
                fields: describe_document(doc, text_field),
            },
            None => DrawerView {
                title: "new document".to_string(),
                doc_id: "-".to_string(),
                created_at: "-".to_string(),
                updated_at: "-".to_string(),
                fields: Vec::new(),
            },
        }
    }

    /// Apply an event, returning the next state and any network work
    #[must_use]
    pub fn reduce(mut self, event: DocEvent) -> (Self, Option<DocEffect>) {
        match event {
            DocEvent::KbSelected(target) => {
                self.kb = target;
                self.epoch += 1;
                self.batch = DocumentBatch::default();
                self.close_and_reset();
                self.hint = None;
                let effect = self.load_effect();
                (self, effect)
            }
            DocEvent::Reload => {
                let effect = self.load_effect();
                (self, effect)
            }
            DocEvent::BatchLoaded { generation, result } => {
                if generation != self.generation || self.kb.is_none() {
                    tracing::debug!(
                        generation,
                        latest = self.generation,
                        "discarding stale document batch"
                    );
                    return (self, None);
                }
                self.apply_batch(result);
                (self, None)
            }
            DocEvent::SelectDoc(id) => {
                let Some(doc) = self.batch.get(&id) else {
                    return (self, None);
                };
                let text_field = self.kb.as_ref().map_or("text", |kb| kb.text_field.as_str());
                self.form = DocForm::from_document(doc, text_field);
                self.mode = DocMode::Viewing(id);
                self.hint = None;
                self.drawer_open = true;
                (self, None)
            }
            DocEvent::OpenNew => {
                self.mode = DocMode::Creating;
                self.form = DocForm::default();
                self.hint = None;
                self.drawer_open = true;
                (self, None)
            }
            DocEvent::CloseDrawer => {
                self.drawer_open = false;
                (self, None)
            }
            DocEvent::TogglePanel => {
                self.panel_collapsed = !self.panel_collapsed;
                (self, None)
            }
            DocEvent::EditForm(field, value) => {
                match field {
                    FormField::Id => self.form.id = value,
                    FormField::Text => self.form.text = value,
                    FormField::Properties => self.form.properties = value,
                }
                (self, None)
            }
            DocEvent::Submit => self.submit(),
            DocEvent::Delete => self.delete(),
            DocEvent::MutationSucceeded { epoch, kind } => {
                if self.is_stale_mutation(epoch, kind) {
                    return (self, None);
                }
                self.close_and_reset();
                self.hint = Some(kind.done_hint().to_string());
                let effect = self.load_effect();
                (self, effect)
            }
            DocEvent::MutationFailed {
                epoch,
                kind,
                message,
            } => {
                if self.is_stale_mutation(epoch, kind) {
                    return (self, None);
                }
                self.hint = Some(format!("{}: {message}", kind.failed_prefix()));
                (self, None)
            }
        }
    }

    fn submit(mut self) -> (Self, Option<DocEffect>) {
        let Some(target) = self.kb.clone() else {
            self.hint = Some(ValidationError::NoKnowledgeBase.to_string());
            return (self, None);
        };

        let epoch = self.epoch;
        let effect = match &self.mode {
            DocMode::Viewing(selected) => self.form.payload(false).map(|payload| {
                let form_id = self.form.id.trim();
                let doc_id = if form_id.is_empty() {
                    selected.clone()
                } else {
                    form_id.to_string()
                };
                DocEffect::Update {
                    epoch,
                    target,
                    doc_id,
                    payload,
                }
            }),
            DocMode::Browsing | DocMode::Creating => self
                .form
                .payload(true)
                .map(|payload| DocEffect::Create {
                    epoch,
                    target,
                    payload,
                }),
        };

        match effect {
            Ok(effect) => {
                self.hint = None;
                (self, Some(effect))
            }
            Err(err) => {
                self.hint = Some(err.to_string());
                (self, None)
            }
        }
    }

    fn delete(mut self) -> (Self, Option<DocEffect>) {
        let (Some(target), DocMode::Viewing(doc_id)) = (self.kb.clone(), &self.mode) else {
            self.hint = Some(ValidationError::NoDocument.to_string());
            return (self, None);
        };
        let effect = DocEffect::Delete {
            epoch: self.epoch,
            target,
            doc_id: doc_id.clone(),
        };
        (self, Some(effect))
    }

    fn is_stale_mutation(&self, epoch: u64, kind: MutationKind) -> bool {
        if epoch == self.epoch && self.kb.is_some() {
            return false;
        }
        tracing::debug!(
            ?kind,
            epoch,
            latest = self.epoch,
            "discarding mutation outcome from an earlier selection"
        );
        true
    }

    fn load_effect(&mut self) -> Option<DocEffect> {
        let target = self.kb.clone()?;
        self.generation += 1;
        Some(DocEffect::LoadBatch {
            generation: self.generation,
            target,
        })
    }

    fn apply_batch(&mut self, result: Result<DocumentList, String>) {
        let text_field = self
            .kb
            .as_ref()
            .map_or_else(|| "text".to_string(), |kb| kb.text_field.clone());
        match result {
            Ok(list) => {
                self.batch = DocumentBatch::from_list(list, &text_field);
                // keep a surviving selection in sync with the fresh copy
                if let DocMode::Viewing(id) = &self.mode {
                    match self.batch.get(id) {
                        Some(doc) => self.form = DocForm::from_document(doc, &text_field),
                        None => {
                            self.mode = DocMode::Browsing;
                            self.form = DocForm::default();
                        }
                    }
                }
            }
            Err(message) => {
                self.batch = DocumentBatch::default();
                self.mode = DocMode::Browsing;
                self.form = DocForm::default();
                self.hint = Some(format!("load failed: {message}"));
            }
        }
    }

    fn close_and_reset(&mut self) {
        self.mode = DocMode::Browsing;
        self.form = DocForm::default();
        self.drawer_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target() -> KbTarget {
        KbTarget {
            id: "acme:kb1".into(),
            app_id: "acme".into(),
            kb_key: "kb1".into(),
            text_field: "body".into(),
            collection: "Acme".into(),
        }
    }

    fn loaded() -> DocumentWorkflow {
        let (wf, effect) = DocumentWorkflow::new().reduce(DocEvent::KbSelected(Some(target())));
        let Some(DocEffect::LoadBatch { generation, .. }) = effect else {
            panic!("expected a batch load");
        };
        let list = DocumentList {
            items: vec![
                Document::new("d1").with_property("body", json!("hello")).with_property("tag", json!("x")),
                Document::new("d2").with_property("body", json!("world")),
            ],
            total: 2,
        };
        let (wf, effect) = wf.reduce(DocEvent::BatchLoaded {
            generation,
            result: Ok(list),
        });
        assert!(effect.is_none());
        wf
    }

    #[test]
    fn kb_selection_requests_batch() {
        let (wf, effect) = DocumentWorkflow::new().reduce(DocEvent::KbSelected(Some(target())));
        assert_eq!(
            effect,
            Some(DocEffect::LoadBatch {
                generation: 1,
                target: target()
            })
        );
        assert_eq!(wf.mode(), &DocMode::Browsing);
    }

    #[test]
    fn batch_derives_columns() {
        let wf = loaded();
        assert_eq!(wf.batch().columns, vec!["id", "body", "tag"]);
        assert_eq!(wf.batch().total, 2);
    }

    #[test]
    fn select_missing_doc_is_noop() {
        let wf = loaded();
        let (next, effect) = wf.clone().reduce(DocEvent::SelectDoc("missing-id".into()));
        assert!(effect.is_none());
        assert_eq!(next, wf);
    }

    #[test]
    fn select_doc_fills_form_and_opens_drawer() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d1".into()));
        assert_eq!(wf.mode(), &DocMode::Viewing("d1".into()));
        assert_eq!(wf.form().id, "d1");
        assert_eq!(wf.form().text, "hello");
        assert!(wf.form().properties.contains("\"tag\""));
        assert!(wf.drawer_open());
        assert!(wf.can_delete());
        assert_eq!(wf.drawer().title, "document detail");
        assert_eq!(wf.drawer().fields.len(), 2);
    }

    #[test]
    fn open_new_clears_selection() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d1".into()));
        let (wf, _) = wf.reduce(DocEvent::OpenNew);
        assert_eq!(wf.mode(), &DocMode::Creating);
        assert_eq!(wf.form(), &DocForm::default());
        assert!(wf.drawer_open());
        assert_eq!(wf.drawer().doc_id, "-");
    }

    #[test]
    fn submit_with_bad_json_sets_hint_without_effect() {
        let (wf, _) = loaded().reduce(DocEvent::OpenNew);
        let (wf, _) = wf.reduce(DocEvent::EditForm(FormField::Properties, "{bad json".into()));
        let (wf, effect) = wf.reduce(DocEvent::Submit);
        assert!(effect.is_none());
        assert!(wf.hint().unwrap().contains("malformed"));
        assert_eq!(wf.mode(), &DocMode::Creating);
    }

    #[test]
    fn submit_rejects_non_object_properties() {
        let (wf, _) = loaded().reduce(DocEvent::EditForm(FormField::Properties, "[1, 2]".into()));
        let (wf, effect) = wf.reduce(DocEvent::Submit);
        assert!(effect.is_none());
        assert_eq!(wf.hint(), Some("properties must be a JSON object"));
    }

    #[test]
    fn submit_without_kb_sets_hint() {
        let (wf, effect) = DocumentWorkflow::new().reduce(DocEvent::Submit);
        assert!(effect.is_none());
        assert_eq!(wf.hint(), Some("select a knowledge base first"));
    }

    #[test]
    fn submit_while_creating_issues_create() {
        let (wf, _) = loaded().reduce(DocEvent::OpenNew);
        let (wf, _) = wf.reduce(DocEvent::EditForm(FormField::Text, "  new text ".into()));
        let (wf, _) = wf.reduce(DocEvent::EditForm(FormField::Id, "custom".into()));
        let (_, effect) = wf.reduce(DocEvent::Submit);
        let Some(DocEffect::Create { payload, .. }) = effect else {
            panic!("expected create");
        };
        assert_eq!(payload.text.as_deref(), Some("new text"));
        assert_eq!(payload.id.as_deref(), Some("custom"));
        assert!(payload.properties.is_empty());
    }

    #[test]
    fn submit_while_viewing_updates_form_id_or_selection() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d2".into()));
        let (wf, _) = wf.reduce(DocEvent::EditForm(FormField::Id, " ".into()));
        let (_, effect) = wf.reduce(DocEvent::Submit);
        let Some(DocEffect::Update { doc_id, payload, .. }) = effect else {
            panic!("expected update");
        };
        assert_eq!(doc_id, "d2");
        assert!(payload.id.is_none());
        assert_eq!(payload.properties.get("body"), Some(&json!("world")));
    }

    #[test]
    fn successful_save_returns_to_browsing_and_reloads() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d1".into()));
        let before = wf.generation();
        let epoch = wf.epoch();
        let (wf, effect) = wf.reduce(DocEvent::MutationSucceeded {
            epoch,
            kind: MutationKind::Update,
        });
        assert_eq!(wf.mode(), &DocMode::Browsing);
        assert!(!wf.drawer_open());
        assert_eq!(wf.hint(), Some("document updated"));
        assert!(matches!(effect, Some(DocEffect::LoadBatch { generation, .. }) if generation == before + 1));
    }

    #[test]
    fn failed_save_keeps_state() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d1".into()));
        let (next, effect) = wf.clone().reduce(DocEvent::MutationFailed {
            epoch: wf.epoch(),
            kind: MutationKind::Create,
            message: "request failed (400): nope".into(),
        });
        assert!(effect.is_none());
        assert_eq!(next.mode(), wf.mode());
        assert_eq!(next.form(), wf.form());
        assert_eq!(next.hint(), Some("save failed: request failed (400): nope"));
    }

    #[test]
    fn mutation_from_previous_kb_is_ignored() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d1".into()));
        let (wf, effect) = wf.reduce(DocEvent::Submit);
        let Some(DocEffect::Update { epoch, .. }) = effect else {
            panic!("expected update");
        };

        let mut other = target();
        other.id = "acme:kb2".into();
        other.kb_key = "kb2".into();
        let (wf, _) = wf.reduce(DocEvent::KbSelected(Some(other)));
        let (wf, _) = wf.reduce(DocEvent::OpenNew);
        let (wf, _) = wf.reduce(DocEvent::EditForm(FormField::Text, "draft".into()));
        let generation = wf.generation();

        let (next, effect) = wf.clone().reduce(DocEvent::MutationSucceeded {
            epoch,
            kind: MutationKind::Update,
        });
        assert!(effect.is_none());
        assert_eq!(next, wf);
        assert_eq!(next.generation(), generation);

        let (next, effect) = wf.clone().reduce(DocEvent::MutationFailed {
            epoch,
            kind: MutationKind::Update,
            message: "request failed (500): boom".into(),
        });
        assert!(effect.is_none());
        assert_eq!(next, wf);
        assert_eq!(next.form().text, "draft");
        assert!(next.hint().is_none());
    }

    #[test]
    fn reload_keeps_mutation_epoch() {
        let (wf, _) = loaded().reduce(DocEvent::OpenNew);
        let (wf, effect) = wf.reduce(DocEvent::Submit);
        let Some(DocEffect::Create { epoch, .. }) = effect else {
            panic!("expected create");
        };
        let (wf, _) = wf.reduce(DocEvent::Reload);
        let (wf, effect) = wf.reduce(DocEvent::MutationSucceeded {
            epoch,
            kind: MutationKind::Create,
        });
        assert!(effect.is_some());
        assert_eq!(wf.hint(), Some("document created"));
    }

    #[test]
    fn delete_requires_viewing() {
        let (wf, effect) = loaded().reduce(DocEvent::Delete);
        assert!(effect.is_none());
        assert_eq!(wf.hint(), Some("select a document first"));

        let (wf, _) = wf.reduce(DocEvent::SelectDoc("d1".into()));
        let (_, effect) = wf.reduce(DocEvent::Delete);
        assert!(matches!(effect, Some(DocEffect::Delete { doc_id, .. }) if doc_id == "d1"));
    }

    #[test]
    fn changing_kb_forces_browsing_and_closes_drawer() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d1".into()));
        let mut other = target();
        other.id = "acme:kb2".into();
        other.kb_key = "kb2".into();
        let (wf, effect) = wf.reduce(DocEvent::KbSelected(Some(other)));
        assert_eq!(wf.mode(), &DocMode::Browsing);
        assert!(!wf.drawer_open());
        assert!(wf.batch().items.is_empty());
        assert!(effect.is_some());
    }

    #[test]
    fn stale_batch_is_discarded() {
        let (wf, _) = DocumentWorkflow::new().reduce(DocEvent::KbSelected(Some(target())));
        let (wf, _) = wf.reduce(DocEvent::Reload);
        let (wf, _) = wf.reduce(DocEvent::BatchLoaded {
            generation: 1,
            result: Ok(DocumentList {
                items: vec![Document::new("old")],
                total: 1,
            }),
        });
        assert!(wf.batch().items.is_empty());
    }

    #[test]
    fn reload_drops_vanished_selection() {
        let (wf, _) = loaded().reduce(DocEvent::SelectDoc("d1".into()));
        let (wf, effect) = wf.reduce(DocEvent::Reload);
        let Some(DocEffect::LoadBatch { generation, .. }) = effect else {
            panic!("expected reload");
        };
        let (wf, _) = wf.reduce(DocEvent::BatchLoaded {
            generation,
            result: Ok(DocumentList {
                items: vec![Document::new("d2")],
                total: 1,
            }),
        });
        assert_eq!(wf.mode(), &DocMode::Browsing);
        assert_eq!(wf.form(), &DocForm::default());
    }

    #[test]
    fn load_failure_sets_hint_and_empties_batch() {
        let (wf, effect) = DocumentWorkflow::new().reduce(DocEvent::KbSelected(Some(target())));
        let Some(DocEffect::LoadBatch { generation, .. }) = effect else {
            panic!("expected a batch load");
        };
        let (wf, _) = wf.reduce(DocEvent::BatchLoaded {
            generation,
            result: Err("request failed (400): collection is empty".into()),
        });
        assert!(wf.batch().items.is_empty());
        assert_eq!(
            wf.hint(),
            Some("load failed: request failed (400): collection is empty")
        );
    }

    #[test]
    fn toggle_panel_flips() {
        let (wf, _) = DocumentWorkflow::new().reduce(DocEvent::TogglePanel);
        assert!(wf.panel_collapsed());
        let (wf, _) = wf.reduce(DocEvent::TogglePanel);
        assert!(!wf.panel_collapsed());
    }
}
