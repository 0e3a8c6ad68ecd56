// src/model/schema.rs
//! Database schema as seen by the settings panel and the session workflow.

use crate::api::responses::DatabaseResponse;
use crate::constants::DEFAULT_TITLE_PROPERTY;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Notion property types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    People,
    Files,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    Relation,
    UniqueId,
    Formula,
    Rollup,
    Button,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    Other(String),
}

impl PropertyKind {
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "title" => Self::Title,
            "rich_text" => Self::RichText,
            "number" => Self::Number,
            "select" => Self::Select,
            "multi_select" => Self::MultiSelect,
            "status" => Self::Status,
            "date" => Self::Date,
            "people" => Self::People,
            "files" => Self::Files,
            "checkbox" => Self::Checkbox,
            "url" => Self::Url,
            "email" => Self::Email,
            "phone_number" => Self::PhoneNumber,
            "relation" => Self::Relation,
            "unique_id" => Self::UniqueId,
            "formula" => Self::Formula,
            "rollup" => Self::Rollup,
            "button" => Self::Button,
            "created_time" => Self::CreatedTime,
            "created_by" => Self::CreatedBy,
            "last_edited_time" => Self::LastEditedTime,
            "last_edited_by" => Self::LastEditedBy,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Number => "number",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::Date => "date",
            Self::People => "people",
            Self::Files => "files",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Relation => "relation",
            Self::UniqueId => "unique_id",
            Self::Formula => "formula",
            Self::Rollup => "rollup",
            Self::Button => "button",
            Self::CreatedTime => "created_time",
            Self::CreatedBy => "created_by",
            Self::LastEditedTime => "last_edited_time",
            Self::LastEditedBy => "last_edited_by",
            Self::Other(kind) => kind,
        }
    }

    /// Kinds whose values Notion computes; they can never be written.
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            Self::Formula
                | Self::Button
                | Self::Rollup
                | Self::CreatedTime
                | Self::CreatedBy
                | Self::LastEditedTime
                | Self::LastEditedBy
        )
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PropertyKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One property definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    pub id: String,
    pub kind: PropertyKind,
    /// Target database of a relation property.
    pub relation_database: Option<String>,
}

/// Property name → definition, in API order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub properties: IndexMap<String, PropertySchema>,
}

impl DatabaseSchema {
    pub fn from_response(response: DatabaseResponse) -> Self {
        let properties = response
            .properties
            .into_iter()
            .map(|(name, property)| {
                let kind = PropertyKind::from_api(&property.kind);
                let relation_database = property
                    .relation
                    .and_then(|relation| relation.database_id)
                    .filter(|id| !id.is_empty());
                (
                    name,
                    PropertySchema {
                        id: property.id,
                        kind,
                        relation_database,
                    },
                )
            })
            .collect();
        Self { properties }
    }

    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// Database the named relation property points at.
    pub fn relation_target(&self, name: &str) -> Option<&str> {
        self.get(name)
            .filter(|property| property.kind == PropertyKind::Relation)
            .and_then(|property| property.relation_database.as_deref())
    }

    /// The status-like property written on start and end, if the database has one.
    pub fn status_field(&self, name: &str) -> Option<StatusField> {
        match self.get(name).map(|property| &property.kind) {
            Some(PropertyKind::Status) => Some(StatusField::Status(name.to_string())),
            Some(PropertyKind::Select) => Some(StatusField::Select(name.to_string())),
            _ => None,
        }
    }
}

/// How the session status is written: a native status or a plain select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusField {
    Status(String),
    Select(String),
}

/// Properties a user may pick in the settings panel.
///
/// Drops computed kinds and definitions without an id.
pub fn filter_database_properties(schema: &DatabaseSchema) -> IndexMap<String, PropertyKind> {
    schema
        .properties
        .iter()
        .filter(|(_, property)| !property.kind.is_computed() && !property.id.is_empty())
        .map(|(name, property)| (name.clone(), property.kind.clone()))
        .collect()
}

/// Name of the database's title property.
pub fn find_title_key(schema: &DatabaseSchema) -> String {
    schema
        .properties
        .iter()
        .find(|(_, property)| property.kind == PropertyKind::Title)
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| DEFAULT_TITLE_PROPERTY.to_string())
}
