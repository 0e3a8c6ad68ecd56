// src/api/mod.rs
//! Notion API interaction - the handful of calls a tracked session needs.
//!
//! Business logic depends on [`NotionGateway`], never on HTTP details.

pub mod client;
pub mod pagination;
pub mod responses;

use crate::error::AppError;
use crate::model::{DatabaseSchema, PropertyPatch};
use crate::types::{ApiKey, NotionId, PageId, SessionTitle};
use responses::PageResponse;

/// The remote operations behind a coding session.
///
/// Credentials travel with each call because the configuration can change
/// while the process runs.
#[async_trait::async_trait]
pub trait NotionGateway: Send + Sync {
    /// `POST /v1/pages` with only the title set.
    async fn create_page(
        &self,
        auth: &ApiKey,
        database: &NotionId,
        title: &SessionTitle,
    ) -> Result<PageId, AppError>;

    /// `PATCH /v1/pages/{id}` with property values.
    async fn update_page(
        &self,
        auth: &ApiKey,
        page: &PageId,
        patch: PropertyPatch,
    ) -> Result<(), AppError>;

    /// `PATCH /v1/pages/{id}` moving the page to the trash.
    async fn trash_page(&self, auth: &ApiKey, page: &PageId) -> Result<(), AppError>;

    /// `GET /v1/databases/{id}`
    async fn retrieve_database(
        &self,
        auth: &ApiKey,
        database: &NotionId,
    ) -> Result<DatabaseSchema, AppError>;

    /// `POST /v1/databases/{id}/query`, every page. Empty when any page fails.
    async fn query_database(&self, auth: &ApiKey, database: &NotionId) -> Vec<PageResponse>;
}

pub use client::{ApiRequest, NotionHttpClient, RequestFailure, RequestOutcome};
pub use pagination::{fetch_all_pages, QueryMethod};
