//! Facet filtering of the knowledge-base list
//!
//! A knowledge base is visible when it matches the free-text query and every
//! facet. Facets are conjunctive with each other and disjunctive within
//! themselves; an empty facet places no constraint.

use crate::model::{Application, Document, KnowledgeBaseView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One filter dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    /// Owning application
    Owner,
    /// Knowledge-base type
    Type,
    /// Access level
    Access,
}

impl Facet {
    /// All facets in display order
    pub const ALL: [Facet; 3] = [Facet::Owner, Facet::Type, Facet::Access];

    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Type => "type",
            Self::Access => "access",
        }
    }

    /// Value of this facet for a knowledge base
    #[inline]
    #[must_use]
    pub fn value_of<'a>(&self, kb: &'a KnowledgeBaseView) -> &'a str {
        match self {
            Self::Owner => &kb.owner,
            Self::Type => &kb.kb_type,
            Self::Access => kb.access.as_str(),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" | "owners" => Ok(Self::Owner),
            "type" | "types" => Ok(Self::Type),
            "access" => Ok(Self::Access),
            other => Err(format!("unknown facet `{other}`")),
        }
    }
}

/// Selected values per facet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Selected owners
    pub owners: BTreeSet<String>,
    /// Selected types
    pub types: BTreeSet<String>,
    /// Selected access levels
    pub access: BTreeSet<String>,
}

impl FilterState {
    /// Create empty filter state (everything passes)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the state from every currently checked input
    ///
    /// The previous state is never patched; the checked set is the only truth.
    #[must_use]
    pub fn from_checked<I, S>(checked: I) -> Self
    where
        I: IntoIterator<Item = (Facet, S)>,
        S: Into<String>,
    {
        let mut state = Self::new();
        for (facet, value) in checked {
            state.values_mut(facet).insert(value.into());
        }
        state
    }

    /// With one value selected
    #[inline]
    #[must_use]
    pub fn with(mut self, facet: Facet, value: impl Into<String>) -> Self {
        self.values_mut(facet).insert(value.into());
        self
    }

    /// Selected values of a facet
    #[inline]
    #[must_use]
    pub fn values(&self, facet: Facet) -> &BTreeSet<String> {
        match facet {
            Facet::Owner => &self.owners,
            Facet::Type => &self.types,
            Facet::Access => &self.access,
        }
    }

    fn values_mut(&mut self, facet: Facet) -> &mut BTreeSet<String> {
        match facet {
            Facet::Owner => &mut self.owners,
            Facet::Type => &mut self.types,
            Facet::Access => &mut self.access,
        }
    }

    /// Check if no facet constrains anything
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Facet::ALL.iter().all(|f| self.values(*f).is_empty())
    }

    /// Drop every selection
    #[inline]
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Check a knowledge base against every facet
    #[must_use]
    pub fn matches(&self, kb: &KnowledgeBaseView) -> bool {
        Facet::ALL.iter().all(|facet| {
            let selected = self.values(*facet);
            selected.is_empty() || selected.contains(facet.value_of(kb))
        })
    }
}

/// Check a knowledge base against the free-text query
///
/// Matches name, collection or owner, case-insensitively. An empty query
/// matches everything.
#[must_use]
pub fn matches_query(kb: &KnowledgeBaseView, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    [&kb.name, &kb.collection, &kb.owner]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&query))
}

/// Rows of the knowledge-base table that pass query and facets
#[must_use]
pub fn visible_rows<'a>(
    kbs: &'a [KnowledgeBaseView],
    query: &str,
    filters: &FilterState,
) -> Vec<&'a KnowledgeBaseView> {
    kbs.iter()
        .filter(|kb| matches_query(kb, query) && filters.matches(kb))
        .collect()
}

/// Distinct values available per facet, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetOptions {
    /// Owners present in the list
    pub owners: Vec<String>,
    /// Types present in the list
    pub types: Vec<String>,
    /// Access levels present in the list
    pub access: Vec<String>,
}

impl FacetOptions {
    /// Options of one facet
    #[inline]
    #[must_use]
    pub fn values(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Owner => &self.owners,
            Facet::Type => &self.types,
            Facet::Access => &self.access,
        }
    }

    /// Check if there is nothing to filter on
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty() && self.types.is_empty() && self.access.is_empty()
    }
}

/// Collect facet options from the knowledge-base list
#[must_use]
pub fn facet_options(kbs: &[KnowledgeBaseView]) -> FacetOptions {
    let collect = |facet: Facet| -> Vec<String> {
        kbs.iter()
            .map(|kb| facet.value_of(kb))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };
    FacetOptions {
        owners: collect(Facet::Owner),
        types: collect(Facet::Type),
        access: collect(Facet::Access),
    }
}

/// Applications whose id contains the query, case-insensitively
#[must_use]
pub fn filter_apps<'a>(apps: &'a [Application], query: &str) -> Vec<&'a Application> {
    let query = query.to_lowercase();
    apps.iter()
        .filter(|app| query.is_empty() || app.app_id.to_lowercase().contains(&query))
        .collect()
}

/// Documents whose id or encoded properties contain the query, case-insensitively
#[must_use]
pub fn filter_documents<'a>(docs: &'a [Document], query: &str) -> Vec<&'a Document> {
    let query = query.to_lowercase();
    docs.iter()
        .filter(|doc| {
            if query.is_empty() || doc.id.to_lowercase().contains(&query) {
                return true;
            }
            serde_json::to_string(&doc.properties)
                .map(|text| text.to_lowercase().contains(&query))
                .unwrap_or(false)
        })
        .collect()
}
