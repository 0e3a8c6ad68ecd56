// src/api/responses.rs
//! Wire shapes of the Notion responses this client reads.
//!
//! Only the fields the session workflow touches are modelled; everything else
//! in a response is ignored by serde.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Generic paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// `GET /v1/databases/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseResponse {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RichTextSegment>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyResponse>,
}

/// One property definition in a database schema.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyResponse {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub relation: Option<RelationResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationResponse {
    #[serde(default)]
    pub database_id: Option<String>,
}

/// A page object, as returned by create, update, and database queries.
#[derive(Debug, Clone, Deserialize)]
pub struct PageResponse {
    pub id: String,
    #[serde(default)]
    pub properties: IndexMap<String, PagePropertyResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagePropertyResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: Vec<RichTextSegment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichTextSegment {
    #[serde(default)]
    pub plain_text: String,
}

/// Body of a non-2xx Notion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub status: Option<u16>,
    pub code: String,
    pub message: String,
}

impl PageResponse {
    /// Plain text of the first segment of the page's title property.
    pub fn title_text(&self) -> Option<&str> {
        self.properties
            .values()
            .find(|property| property.kind == "title")
            .and_then(|property| property.title.first())
            .map(|segment| segment.plain_text.as_str())
            .filter(|text| !text.is_empty())
    }
}

impl DatabaseResponse {
    /// Plain-text database title, used as a log label.
    pub fn title_text(&self) -> String {
        self.title
            .iter()
            .map(|segment| segment.plain_text.as_str())
            .collect()
    }
}
