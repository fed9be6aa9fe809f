//! Error types for ragdash core
//!
//! Covers the failures that are detected locally, before any request
//! leaves the console:
//! - Form validation (document editor, memory push)
//! - Export of empty or unserializable data

/// Validation failures caught before a network call is issued
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No knowledge base is selected
    #[error("select a knowledge base first")]
    NoKnowledgeBase,

    /// No document is selected
    #[error("select a document first")]
    NoDocument,

    /// Properties text is not valid JSON
    #[error("properties JSON is malformed: {0}")]
    MalformedProperties(String),

    /// Properties text parsed, but not to an object
    #[error("properties must be a JSON object")]
    PropertiesNotObject,

    /// Required form field left blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Summary threshold is not an integer
    #[error("summary threshold must be an integer, got `{0}`")]
    InvalidThreshold(String),
}

impl ValidationError {
    /// Check if the error concerns the properties editor
    #[inline]
    #[must_use]
    pub fn is_properties_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedProperties(_) | Self::PropertiesNotObject
        )
    }
}

/// Export failures
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Nothing to write
    #[error("no {0} to export")]
    Empty(&'static str),

    /// Records could not be encoded
    #[error("failed to encode export: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ExportError {
    /// Check if the export was refused for lack of data
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::MissingField("wallet_id");
        assert_eq!(err.to_string(), "wallet_id is required");

        let err = ValidationError::InvalidThreshold("ten".to_string());
        assert!(err.to_string().contains("`ten`"));
    }

    #[test]
    fn properties_errors_are_classified() {
        assert!(ValidationError::PropertiesNotObject.is_properties_error());
        assert!(ValidationError::MalformedProperties("eof".into()).is_properties_error());
        assert!(!ValidationError::NoDocument.is_properties_error());
    }

    #[test]
    fn export_error_empty() {
        let err = ExportError::Empty("ingestion logs");
        assert!(err.is_empty());
        assert_eq!(err.to_string(), "no ingestion logs to export");
    }
}
