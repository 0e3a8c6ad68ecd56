// src/lib.rs
//! codetrack library: records coding sessions as pages in a Notion database.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `SessionError`, `ValidationError`
//! - **Configuration**: `TrackerConfig`, `Credentials`, `CommandLineInput`
//! - **Domain model**: `DatabaseSchema`, `ProjectIndex`, `Session`, `PropertyPatch`
//! - **API client**: `NotionGateway`, `NotionHttpClient`, `RequestOutcome`, pagination
//! - **Settings**: `Settings`, `SettingsStore`, `FileSettingsStore`
//! - **UI collaborators**: `Notice`, `Notifier`, `PanelMessage`, `PendingQueue`
//! - **Orchestration**: `SessionOrchestrator`

pub mod api;
pub mod config;
pub mod console;
pub mod constants;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod settings;
pub mod types;
pub mod ui;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode, SessionError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CliCommand, CommandLineInput, Credentials, SettingsAction, TrackerConfig};

// --- Domain Model ---
pub use crate::model::{
    filter_database_properties, filter_projects, find_title_key, DatabaseSchema, ProjectIndex,
    PropertyKind, PropertyPatch, PropertySchema, Session, SessionState, StatusField,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, NotionId, PageId, SessionTitle};

// --- API Client ---
pub use crate::api::{
    fetch_all_pages, ApiRequest, NotionGateway, NotionHttpClient, QueryMethod, RequestFailure,
    RequestOutcome,
};

// --- Settings ---
pub use crate::settings::{FileSettingsStore, MemorySettingsStore, Settings, SettingsStore};

// --- UI ---
pub use crate::ui::{MessageSink, Notice, NoticeLevel, Notifier, PanelMessage, PendingQueue};

// --- Orchestration ---
pub use crate::orchestrator::SessionOrchestrator;
