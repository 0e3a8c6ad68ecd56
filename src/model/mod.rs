// src/model/mod.rs
//! Domain model: database schema, project index, and session state.

pub mod projects;
pub mod schema;
pub mod session;

pub use projects::{filter_projects, ProjectIndex};
pub use schema::{
    filter_database_properties, find_title_key, DatabaseSchema, PropertyKind, PropertySchema,
    StatusField,
};
pub use session::{PropertyPatch, Session, SessionState};
