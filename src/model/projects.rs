// src/model/projects.rs
//! Project lookup for the relation property.

use crate::api::responses::PageResponse;
use crate::constants::UNNAMED_PROJECT;
use crate::types::PageId;
use indexmap::IndexMap;
use serde::Serialize;

/// Project display name → page id, in API page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProjectIndex(IndexMap<String, PageId>);

impl ProjectIndex {
    pub fn get(&self, name: &str) -> Option<&PageId> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PageId)> for ProjectIndex {
    fn from_iter<I: IntoIterator<Item = (String, PageId)>>(iter: I) -> Self {
        let mut index = IndexMap::new();
        for (name, id) in iter {
            // Later pages win; the name keeps its first position.
            index.insert(name, id);
        }
        Self(index)
    }
}

/// Builds the project index from the pages of the related database.
pub fn filter_projects(pages: &[PageResponse]) -> ProjectIndex {
    pages
        .iter()
        .map(|page| {
            let name = page.title_text().unwrap_or(UNNAMED_PROJECT).to_string();
            (name, PageId::new(page.id.clone()))
        })
        .collect()
}
