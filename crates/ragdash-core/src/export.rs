//! JSON exports of ingestion logs and store cards

use crate::error::ExportError;
use crate::model::IngestionEntry;
use crate::stores::StoreCard;
use serde::Serialize;
use serde_json::Value;

/// A rendered export, ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested file name
    pub file_name: String,
    /// Pretty-printed JSON
    pub contents: String,
}

impl ExportFile {
    fn render<T: Serialize + ?Sized>(
        prefix: &str,
        now_millis: u64,
        records: &T,
    ) -> Result<Self, ExportError> {
        Ok(Self {
            file_name: format!("{prefix}-{now_millis}.json"),
            contents: serde_json::to_string_pretty(records)?,
        })
    }
}

/// Export ingestion logs: raw records when present, display entries otherwise
pub fn export_ingestion(
    raw: &[Value],
    display: &[IngestionEntry],
    now_millis: u64,
) -> Result<ExportFile, ExportError> {
    if !raw.is_empty() {
        return ExportFile::render("ingestion", now_millis, raw);
    }
    if !display.is_empty() {
        return ExportFile::render("ingestion", now_millis, display);
    }
    Err(ExportError::Empty("ingestion logs"))
}

/// Export the current store cards
pub fn export_stores(cards: &[StoreCard], now_millis: u64) -> Result<ExportFile, ExportError> {
    if cards.is_empty() {
        return Err(ExportError::Empty("store data"));
    }
    ExportFile::render("stores", now_millis, cards)
}
