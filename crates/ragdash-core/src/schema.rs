//! Schema inference over schemaless documents
//!
//! Documents in one knowledge base share no declared schema: any property may
//! appear or be missing. This module derives what the console needs to show
//! them:
//! - [`infer_schema`]: per-key observed kinds plus one example value
//! - [`build_doc_columns`]: a bounded, frequency-ranked column set for the grid
//! - [`describe_document`]: the per-document field list shown in the drawer
//!
//! Everything here is a pure function of its input batch.

use crate::model::{Document, DEFAULT_TEXT_FIELD};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Longest example rendering in the schema panel, in characters
pub const EXAMPLE_MAX_CHARS: usize = 140;

/// Longest cell rendering in the document grid before it is cut
pub const CELL_MAX_CHARS: usize = 160;

/// Extra property columns shown after `id` and the text field
pub const MAX_EXTRA_COLUMNS: usize = 4;

/// Kind of an observed property value
///
/// Declaration order is the sort order of [`SchemaField::kinds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// `null`
    Null,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// JSON string
    String,
    /// JSON number
    Number,
    /// JSON boolean
    Boolean,
}

impl ValueKind {
    /// Classify a value
    #[inline]
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
        }
    }

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inferred property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaField {
    /// Property key
    pub name: String,
    /// Observed kinds, sorted
    pub kinds: Vec<ValueKind>,
    /// Rendering of the first non-null value seen, `-` if none
    pub example: String,
}

impl SchemaField {
    /// Kinds joined as `string | number`
    #[must_use]
    pub fn kinds_label(&self) -> String {
        self.kinds
            .iter()
            .map(ValueKind::as_str)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Infer the property schema of a document batch
///
/// Output is sorted by key. The example of each key is the first non-null
/// value met while iterating `docs` in order, so reordering the batch can
/// change examples but never kinds or keys.
#[must_use]
pub fn infer_schema(docs: &[Document]) -> Vec<SchemaField> {
    let mut fields: BTreeMap<&str, (BTreeSet<ValueKind>, Option<&Value>)> = BTreeMap::new();

    for doc in docs {
        for (key, value) in &doc.properties {
            let (kinds, example) = fields.entry(key.as_str()).or_default();
            kinds.insert(ValueKind::of(value));
            if example.is_none() && !value.is_null() {
                *example = Some(value);
            }
        }
    }

    fields
        .into_iter()
        .map(|(name, (kinds, example))| SchemaField {
            name: name.to_string(),
            kinds: kinds.into_iter().collect(),
            example: format_example(example),
        })
        .collect()
}

/// Render an example value, at most [`EXAMPLE_MAX_CHARS`] characters
#[must_use]
pub fn format_example(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(value) => truncate(&value_text(value), EXAMPLE_MAX_CHARS - 3, EXAMPLE_MAX_CHARS),
    }
}

/// Grid columns for a batch: `id`, the text field, then the most frequent keys
///
/// Extra keys exclude the text field, are ranked by occurrence count
/// descending with ties kept in first-seen order, and are capped at
/// [`MAX_EXTRA_COLUMNS`].
#[must_use]
pub fn build_doc_columns(docs: &[Document], text_field: &str) -> Vec<String> {
    let text_field = if text_field.is_empty() {
        DEFAULT_TEXT_FIELD
    } else {
        text_field
    };

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for doc in docs {
        for key in doc.properties.keys() {
            if key != text_field {
                *counts.entry(key.as_str()).or_default() += 1;
            }
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // stable: equal counts keep insertion order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut columns = vec!["id".to_string(), text_field.to_string()];
    columns.extend(
        ranked
            .into_iter()
            .take(MAX_EXTRA_COLUMNS)
            .map(|(key, _)| key.to_string()),
    );
    columns
}

/// Render a grid cell; missing, null and empty values show as `-`
#[must_use]
pub fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) if s.is_empty() => "-".to_string(),
        Some(value) => truncate(&value_text(value), CELL_MAX_CHARS, CELL_MAX_CHARS),
    }
}

/// Primary text of a document
///
/// Looks at the knowledge base's text field, then `text`, then `content`,
/// taking the first value that is not empty, `false`, zero or `null`.
#[must_use]
pub fn document_text(doc: &Document, text_field: &str) -> String {
    [text_field, "text", "content"]
        .into_iter()
        .filter_map(|key| doc.properties.get(key))
        .find(|value| is_truthy(value))
        .map(value_text)
        .unwrap_or_default()
}

/// One property of a single document, as listed in the drawer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentField {
    /// Property key
    pub name: String,
    /// Kind of the value
    pub kind: ValueKind,
    /// Rendered value
    pub example: String,
    /// Whether this is the knowledge base's text field
    pub primary: bool,
}

/// Describe every property of a document, sorted by key
#[must_use]
pub fn describe_document(doc: &Document, text_field: &str) -> Vec<DocumentField> {
    let mut fields: Vec<DocumentField> = doc
        .properties
        .iter()
        .map(|(key, value)| DocumentField {
            name: key.clone(),
            kind: ValueKind::of(value),
            example: format_example(Some(value)),
            primary: key == text_field,
        })
        .collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));
    fields
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Cut `text` to `keep` characters plus `...` when it exceeds `limit`
fn truncate(text: &str, keep: usize, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
