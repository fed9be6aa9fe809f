//! Stores health view

use crate::model::{StoreHealth, StoresHealth};
use serde::{Deserialize, Serialize};

/// Display card for one backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCard {
    /// Upper-cased store name
    pub name: String,
    /// Raw status
    pub status: String,
    /// Details, or `no details`
    pub description: String,
    /// Latency label
    pub latency: String,
}

impl StoreCard {
    /// Map a raw health record
    #[must_use]
    pub fn from_health(store: &StoreHealth) -> Self {
        let description = store
            .details
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("no details");
        Self {
            name: store.name.to_uppercase(),
            status: store.status.clone(),
            description: description.to_string(),
            latency: "n/a".to_string(),
        }
    }

    /// Check if the store counts as healthy
    #[inline]
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "configured")
    }

    /// Human label for the status
    #[inline]
    #[must_use]
    pub fn status_label(&self) -> &str {
        status_label(&self.status)
    }
}

/// Label for a store status, case-insensitive on the known values
#[must_use]
pub fn status_label(status: &str) -> &str {
    match status.to_ascii_lowercase().as_str() {
        "ok" => "healthy",
        "configured" => "configured",
        "disabled" => "disabled",
        "error" => "error",
        _ if status.is_empty() => "-",
        _ => status,
    }
}

/// Stores page state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoresView {
    /// Cards in backend order
    pub cards: Vec<StoreCard>,
    /// Load failure text
    pub hint: Option<String>,
}

impl StoresView {
    /// Build from a health payload
    #[must_use]
    pub fn from_health(health: &StoresHealth) -> Self {
        Self {
            cards: health.stores.iter().map(StoreCard::from_health).collect(),
            hint: None,
        }
    }

    /// Empty view carrying a load failure
    #[must_use]
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self {
            cards: Vec::new(),
            hint: Some(format!("load failed: {message}")),
        }
    }

    /// Number of stores
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.cards.len()
    }

    /// Number of healthy stores
    #[must_use]
    pub fn healthy(&self) -> usize {
        self.cards.iter().filter(|c| c.is_healthy()).count()
    }

    /// `<healthy>/<total> healthy`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}/{} healthy", self.healthy(), self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health() -> StoresHealth {
        StoresHealth {
            stores: vec![
                StoreHealth::new("weaviate", "ok").with_details("v1.24"),
                StoreHealth::new("redis", "configured"),
                StoreHealth::new("mongo", "disabled").with_details("  "),
                StoreHealth::new("minio", "error").with_details("connection refused"),
            ],
        }
    }

    #[test]
    fn cards_map_raw_records() {
        let view = StoresView::from_health(&health());
        assert_eq!(view.cards[0].name, "WEAVIATE");
        assert_eq!(view.cards[0].description, "v1.24");
        assert_eq!(view.cards[1].description, "no details");
        assert_eq!(view.cards[2].description, "no details");
        assert_eq!(view.cards[3].latency, "n/a");
    }

    #[test]
    fn summary_counts_ok_and_configured() {
        let view = StoresView::from_health(&health());
        assert_eq!(view.total(), 4);
        assert_eq!(view.healthy(), 2);
        assert_eq!(view.summary(), "2/4 healthy");
    }

    #[test]
    fn status_labels() {
        assert_eq!(status_label("OK"), "healthy");
        assert_eq!(status_label("disabled"), "disabled");
        assert_eq!(status_label("degraded"), "degraded");
        assert_eq!(status_label(""), "-");
    }

    #[test]
    fn failed_view_is_empty_with_hint() {
        let view = StoresView::failed("request failed (500): down");
        assert_eq!(view.total(), 0);
        assert_eq!(view.summary(), "0/0 healthy");
        assert_eq!(view.hint.as_deref(), Some("load failed: request failed (500): down"));
    }
}
