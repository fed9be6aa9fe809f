//! Core data model
//!
//! Wire records returned by the platform API and the derived display records
//! built from them:
//! - Applications and knowledge-base registry entries
//! - Per-knowledge-base statistics and the tri-state [`StatValue`]
//! - Documents with schemaless properties
//! - Ingestion log records and their display form
//! - Store health and memory push payloads

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Text field used when a knowledge base does not name one
pub const DEFAULT_TEXT_FIELD: &str = "text";

/// Knowledge-base type whose contents are private to the uploading user
pub const USER_UPLOAD_KB_TYPE: &str = "user_upload";

/// Bar heights shown for every knowledge base until the backend reports real ones
pub const DEFAULT_HISTOGRAM: [u32; 4] = [40, 56, 32, 48];

/// Returns the trimmed value when it is present and not blank
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Registered application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application identifier
    pub app_id: String,
    /// Registry status (`active`, `disabled`, ...)
    #[serde(default)]
    pub status: Option<String>,
    /// Whether a pipeline plugin is installed
    #[serde(default)]
    pub has_plugin: bool,
}

impl Application {
    /// Create application record
    #[inline]
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            status: None,
            has_plugin: false,
        }
    }

    /// With registry status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// With plugin flag
    #[inline]
    #[must_use]
    pub fn with_plugin(mut self, has_plugin: bool) -> Self {
        self.has_plugin = has_plugin;
        self
    }

    /// Check if the application is active
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("active")
    }

    /// Status label, `unknown` when absent
    #[inline]
    #[must_use]
    pub fn status_label(&self) -> &str {
        non_blank(self.status.as_deref()).unwrap_or("unknown")
    }
}

/// Knowledge-base registry entry, as returned by `GET /kb/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseRecord {
    /// Owning application
    pub app_id: String,
    /// Key within the application
    pub kb_key: String,
    /// Knowledge-base type
    #[serde(default)]
    pub kb_type: Option<String>,
    /// Vector store collection
    #[serde(default)]
    pub collection: Option<String>,
    /// Property holding the primary text
    #[serde(default)]
    pub text_field: Option<String>,
    /// Retrieval depth
    #[serde(default)]
    pub top_k: Option<i64>,
    /// Fusion weight
    #[serde(default)]
    pub weight: Option<f64>,
    /// Whether retrieval filters on allowed apps
    #[serde(default)]
    pub use_allowed_apps_filter: bool,
    /// Status of the owning application
    #[serde(default)]
    pub status: Option<String>,
}

impl KnowledgeBaseRecord {
    /// Create registry entry
    #[must_use]
    pub fn new(app_id: impl Into<String>, kb_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            kb_key: kb_key.into(),
            kb_type: None,
            collection: None,
            text_field: None,
            top_k: None,
            weight: None,
            use_allowed_apps_filter: false,
            status: None,
        }
    }

    /// With knowledge-base type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, kb_type: impl Into<String>) -> Self {
        self.kb_type = Some(kb_type.into());
        self
    }

    /// With collection name
    #[inline]
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// With text field
    #[inline]
    #[must_use]
    pub fn with_text_field(mut self, text_field: impl Into<String>) -> Self {
        self.text_field = Some(text_field.into());
        self
    }

    /// With retrieval parameters
    #[inline]
    #[must_use]
    pub fn with_retrieval(mut self, top_k: i64, weight: f64, allowed_apps_filter: bool) -> Self {
        self.top_k = Some(top_k);
        self.weight = Some(weight);
        self.use_allowed_apps_filter = allowed_apps_filter;
        self
    }

    /// With owning application status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Composite identifier `app_id:kb_key`
    #[inline]
    #[must_use]
    pub fn id(&self) -> String {
        kb_id(&self.app_id, &self.kb_key)
    }
}

/// Build the composite knowledge-base identifier
#[inline]
#[must_use]
pub fn kb_id(app_id: &str, kb_key: &str) -> String {
    format!("{app_id}:{kb_key}")
}

/// Statistics for one knowledge base, as returned by `GET /kb/{app}/{kb}/stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbStats {
    /// Number of stored objects
    #[serde(default)]
    pub total_count: u64,
    /// Number of indexed chunks
    #[serde(default)]
    pub chunk_count: u64,
}

impl KbStats {
    /// Create statistics
    #[inline]
    #[must_use]
    pub fn new(total_count: u64, chunk_count: u64) -> Self {
        Self {
            total_count,
            chunk_count,
        }
    }
}

/// A count that may still be loading or may have failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatValue {
    /// Fetch not settled yet
    #[default]
    Loading,
    /// Fetch failed
    Unavailable,
    /// Fetched value
    Value(u64),
}

impl StatValue {
    /// Get the value if resolved
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Loading | Self::Unavailable => None,
        }
    }

    /// Check if the fetch failed
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("..."),
            Self::Unavailable => f.write_str("-"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_u64(*v),
            Self::Loading => serializer.serialize_none(),
            Self::Unavailable => serializer.serialize_str("-"),
        }
    }
}

/// Access level of a knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Visible to every caller of the application
    Public,
    /// Scoped to the uploading user
    Restricted,
}

impl Access {
    /// Derive access from the knowledge-base type
    #[inline]
    #[must_use]
    pub fn for_kb_type(kb_type: Option<&str>) -> Self {
        if kb_type == Some(USER_UPLOAD_KB_TYPE) {
            Self::Restricted
        } else {
            Self::Public
        }
    }

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display record for one knowledge base: registry entry joined with its stats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseView {
    /// `app_id:kb_key`
    pub id: String,
    /// Owning application
    pub app_id: String,
    /// Key within the application
    pub kb_key: String,
    /// Property holding the primary text
    pub text_field: String,
    /// Display name
    pub name: String,
    /// Knowledge-base type
    #[serde(rename = "type")]
    pub kb_type: String,
    /// Vector store collection
    pub collection: String,
    /// Document count
    pub docs: StatValue,
    /// Chunk count
    pub chunks: StatValue,
    /// Owner shown in the facet list
    pub owner: String,
    /// Access level
    pub access: Access,
    /// Freshness label
    pub updated_at: String,
    /// Configuration lines for the detail panel
    pub log: Vec<String>,
    /// Activity bars
    pub histogram: [u32; 4],
}

impl KnowledgeBaseView {
    /// Build the view for a registry entry whose stats are not fetched yet
    #[must_use]
    pub fn pending(record: &KnowledgeBaseRecord) -> Self {
        let kb_type = non_blank(record.kb_type.as_deref()).unwrap_or("kb");
        let updated_at = match non_blank(record.status.as_deref()) {
            Some(status) => format!("app {status}"),
            None => "unknown".to_string(),
        };
        let top_k = record
            .top_k
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        let weight = record
            .weight
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        let filter = if record.use_allowed_apps_filter {
            "app filter on"
        } else {
            "app filter off"
        };

        Self {
            id: record.id(),
            app_id: record.app_id.clone(),
            kb_key: record.kb_key.clone(),
            text_field: non_blank(record.text_field.as_deref())
                .unwrap_or(DEFAULT_TEXT_FIELD)
                .to_string(),
            name: record.kb_key.clone(),
            kb_type: kb_type.to_string(),
            collection: non_blank(record.collection.as_deref())
                .unwrap_or("-")
                .to_string(),
            docs: StatValue::Loading,
            chunks: StatValue::Loading,
            owner: record.app_id.clone(),
            access: Access::for_kb_type(record.kb_type.as_deref()),
            updated_at,
            log: vec![format!("Top_k {top_k}"), format!("Weight {weight}"), filter.to_string()],
            histogram: DEFAULT_HISTOGRAM,
        }
    }

    /// Settle the stats: `None` marks the fetch as failed
    #[inline]
    #[must_use]
    pub fn with_stats(mut self, stats: Option<KbStats>) -> Self {
        match stats {
            Some(stats) => {
                self.docs = StatValue::Value(stats.total_count);
                self.chunks = StatValue::Value(stats.chunk_count);
            }
            None => {
                self.docs = StatValue::Unavailable;
                self.chunks = StatValue::Unavailable;
            }
        }
        self
    }

    /// Bar heights as percentages, clamped to `[12, 100]`
    #[inline]
    #[must_use]
    pub fn bar_heights(&self) -> [u32; 4] {
        self.histogram.map(|v| v.clamp(12, 100))
    }
}

/// Sum of resolved chunk counts; unresolved entries contribute nothing
#[must_use]
pub fn total_vectors(kbs: &[KnowledgeBaseView]) -> u64 {
    kbs.iter().filter_map(|kb| kb.chunks.value()).sum()
}

/// A document with schemaless properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Object identifier
    pub id: String,
    /// Free-form properties
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Creation time (ISO 8601)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update time (ISO 8601)
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Document {
    /// Create document with no properties
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Map::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// With one property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// One page of documents, as returned by `GET /kb/{app}/{kb}/documents`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    /// Documents on this page
    #[serde(default)]
    pub items: Vec<Document>,
    /// Total documents in the collection
    #[serde(default)]
    pub total: u64,
}

/// Body of a document create, replace or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// Primary text, `null` when blank
    pub text: Option<String>,
    /// Properties
    pub properties: Map<String, Value>,
    /// Client supplied id (create only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Ingestion log page, as returned by `GET /ingestion/logs`
///
/// Items stay untransformed so that exports emit exactly what the backend sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionLogList {
    /// Raw log records
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Display form of an ingestion log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionEntry {
    /// `STATUS kb_key`
    pub title: String,
    /// Creation time or `-`
    pub time: String,
    /// Message, else collection
    pub meta: String,
}

impl IngestionEntry {
    /// Map a raw backend record
    #[must_use]
    pub fn from_raw(raw: &Value) -> Self {
        let text = |key: &str| non_blank(raw.get(key).and_then(Value::as_str));
        let status = text("status").unwrap_or_default().to_uppercase();
        let title = format!("{status} {}", text("kb_key").unwrap_or_default())
            .trim()
            .to_string();

        Self {
            title,
            time: text("created_at").unwrap_or("-").to_string(),
            meta: text("message")
                .or_else(|| text("collection"))
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Map the first `limit` raw records to display entries
#[must_use]
pub fn map_ingestion(raw: &[Value], limit: usize) -> Vec<IngestionEntry> {
    raw.iter().take(limit).map(IngestionEntry::from_raw).collect()
}

/// Health of one backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHealth {
    /// Store name
    pub name: String,
    /// `ok`, `configured`, `disabled`, `error`
    #[serde(default)]
    pub status: String,
    /// Free-form details
    #[serde(default)]
    pub details: Option<String>,
}

impl StoreHealth {
    /// Create store health record
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            details: None,
        }
    }

    /// With details
    #[inline]
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Stores health payload, as returned by `GET /stores/health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoresHealth {
    /// Per-store health
    #[serde(default)]
    pub stores: Vec<StoreHealth>,
}

/// Body of `POST /memory/push`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPushRequest {
    /// Target application
    pub app_id: String,
    /// Wallet of the end user
    pub wallet_id: String,
    /// Business-side session
    pub session_id: String,
    /// Session history file
    pub filename: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional summary threshold override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_threshold: Option<i64>,
}

/// Outcome of the reachability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    /// Backend answered the probe
    Online,
    /// Probe failed; fallback data in use
    Offline,
}

impl Reachability {
    /// Check if online
    #[inline]
    #[must_use]
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
        }
    }
}
