//! Static interest catalog.
//!
//! Loaded once before any wizard starts. The embedded copy ships with the
//! crate; callers may also parse their own JSON of the same shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::step::{CatalogItem, ItemId};

const EMBEDDED_CATALOG: &str = include_str!("../assets/catalog.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestCategory {
    pub name: String,
}

/// An interest together with the detail tags chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestWithDetails {
    pub name: String,
    pub detail: Vec<String>,
}

impl InterestWithDetails {
    /// A freshly chosen interest before any details are picked.
    pub fn seeded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub interest: ItemId,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: ItemId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestCatalog {
    interests: Vec<CatalogEntry>,
    #[serde(default)]
    details: BTreeMap<ItemId, Vec<String>>,
    #[serde(default)]
    regions: Vec<Region>,
}

impl InterestCatalog {
    pub fn embedded() -> Result<Self, serde_json::Error> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.interests
    }

    pub fn categories(&self) -> Vec<InterestCategory> {
        self.interests
            .iter()
            .map(|e| InterestCategory {
                name: e.interest.clone(),
            })
            .collect()
    }

    pub fn title_of(&self, interest: &str) -> Option<&str> {
        self.interests
            .iter()
            .find(|e| e.interest == interest)
            .map(|e| e.title.as_str())
    }

    pub fn interest_items(&self) -> Vec<CatalogItem> {
        self.interests
            .iter()
            .map(|e| CatalogItem {
                id: e.interest.clone(),
                title: e.title.clone(),
                image: Some(e.image.clone()),
            })
            .collect()
    }

    /// Detail tags per interest; the tag text doubles as its id.
    pub fn detail_items(&self) -> BTreeMap<ItemId, Vec<CatalogItem>> {
        self.details
            .iter()
            .map(|(interest, tags)| {
                let items = tags
                    .iter()
                    .map(|t| CatalogItem::new(t.clone(), t.clone()))
                    .collect();
                (interest.clone(), items)
            })
            .collect()
    }

    pub fn region_items(&self) -> Vec<CatalogItem> {
        self.regions
            .iter()
            .map(|r| CatalogItem::new(r.id.clone(), r.title.clone()))
            .collect()
    }
}
