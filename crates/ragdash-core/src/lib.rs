//! ragdash Core - view model of the RAG admin console
//!
//! Pure, I/O-free building blocks that:
//! - Join registry entries with per-knowledge-base statistics
//! - Infer a display schema and grid columns from schemaless documents
//! - Filter the knowledge-base list by query and facets
//! - Drive the document editor workflow
//! - Hold the whole console as one state value advanced by a reducer
//!
//! Network work is never performed here. Reducers return effect descriptors
//! that the engine crate runs against the platform API.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdash_core::prelude::*;
//!
//! let (state, effects) = ConsoleState::default().reduce(ConsoleEvent::ReloadRequested);
//! assert!(state.is_loading());
//! assert_eq!(effects.len(), 1);
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod console;
pub mod error;
pub mod export;
pub mod filter;
pub mod memory;
pub mod model;
pub mod schema;
pub mod stores;
pub mod workflow;

// Re-exports for convenience
pub use console::{
    ConsoleEffect, ConsoleEvent, ConsoleState, HintSlot, Hints, Location, Overview, Snapshot,
};
pub use error::{ExportError, ValidationError};
pub use export::{export_ingestion, export_stores, ExportFile};
pub use filter::{
    facet_options, filter_apps, filter_documents, visible_rows, Facet, FacetOptions, FilterState,
};
pub use memory::MemoryForm;
pub use model::{
    kb_id, map_ingestion, total_vectors, Access, Application, Document, DocumentList,
    DocumentPayload, IngestionEntry, IngestionLogList, KbStats, KnowledgeBaseRecord,
    KnowledgeBaseView, MemoryPushRequest, Reachability, StatValue, StoreHealth, StoresHealth,
    DEFAULT_TEXT_FIELD,
};
pub use schema::{
    build_doc_columns, describe_document, document_text, infer_schema, render_cell,
    DocumentField, SchemaField, ValueKind,
};
pub use stores::{StoreCard, StoresView};
pub use workflow::{
    DocEffect, DocEvent, DocForm, DocMode, DocumentBatch, DocumentWorkflow, DrawerView,
    FormField, KbTarget, MutationKind,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with ragdash core
    pub use crate::{
        Application, ConsoleEffect, ConsoleEvent, ConsoleState, DocEffect, DocEvent, Document,
        DocumentWorkflow, FilterState, KnowledgeBaseView, Reachability, Snapshot, StatValue,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
