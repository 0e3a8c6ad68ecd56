// src/api/pagination.rs
//! Cursor pagination over `has_more` / `next_cursor`.

use super::client::{ApiRequest, RequestOutcome};
use super::responses::PaginatedResponse;
use crate::constants::NOTION_API_PAGE_SIZE;
use reqwest::Method;
use serde_json::Value;

/// How the cursor travels: as a query parameter or inside the JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMethod {
    Get,
    Post,
}

/// Builds the request for one page of a paginated endpoint.
pub fn page_request(
    method: QueryMethod,
    endpoint: &str,
    message: &str,
    body: &Value,
    cursor: Option<String>,
) -> ApiRequest {
    match method {
        QueryMethod::Get => {
            let mut request = ApiRequest::new(Method::GET, endpoint, message)
                .with_query("page_size", NOTION_API_PAGE_SIZE.to_string());
            if let Some(cursor) = cursor {
                request = request.with_query("start_cursor", cursor);
            }
            request
        }
        QueryMethod::Post => {
            let mut query = match body {
                Value::Object(map) => map.clone(),
                _ => serde_json::Map::new(),
            };
            query.insert("page_size".to_string(), Value::from(NOTION_API_PAGE_SIZE));
            if let Some(cursor) = cursor {
                query.insert("start_cursor".to_string(), Value::String(cursor));
            }
            ApiRequest::new(Method::POST, endpoint, message).with_body(Value::Object(query))
        }
    }
}

/// Fetches every page, handing each call the previous page's cursor.
///
/// Results keep page arrival order. A failed page discards everything
/// fetched so far and yields an empty list.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_page: F) -> Vec<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = RequestOutcome<PaginatedResponse<T>>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = match fetch_page(cursor.take()).await {
            RequestOutcome::Ok(response) => response,
            RequestOutcome::Malformed(reason) => {
                log::warn!(
                    "Page {} of query was malformed, discarding results: {}",
                    pages_fetched + 1,
                    reason
                );
                return Vec::new();
            }
            RequestOutcome::Failed(failure) => {
                log::warn!(
                    "Page {} of query failed, discarding results: {:?}",
                    pages_fetched + 1,
                    failure
                );
                return Vec::new();
            }
        };

        pages_fetched += 1;
        all_items.extend(response.results);

        match response.next_cursor {
            Some(next) if response.has_more => cursor = Some(next),
            _ => break,
        }
    }

    log::debug!(
        "Fetched {} items over {} page(s)",
        all_items.len(),
        pages_fetched
    );
    all_items
}
