// src/api/client.rs
//! HTTP request wrapper for the Notion API.
//!
//! Every call goes through [`NotionHttpClient::execute`], which performs one
//! request, logs it, and decodes the result into a [`RequestOutcome`]. Nothing
//! past this boundary inspects status codes or raw bodies.

use super::pagination::{self, QueryMethod};
use super::responses::{DatabaseResponse, ErrorResponse, PageResponse, PaginatedResponse};
use super::NotionGateway;
use crate::constants::{
    ERROR_BODY_PREVIEW_LENGTH, NOTION_API_BASE_URL, NOTION_API_VERSION, TITLE_PROPERTY_ID,
};
use crate::error::{AppError, NotionErrorCode};
use crate::model::{DatabaseSchema, PropertyPatch};
use crate::types::{ApiKey, NotionId, PageId, SessionTitle};
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// One request against the Notion API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API base URL, e.g. `pages/{id}`.
    pub endpoint: String,
    /// Human-readable description, logged with the outcome.
    pub message: String,
    pub body: Option<Value>,
    pub query: Vec<(&'static str, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            message: message.into(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }
}

/// Why a request did not produce a usable response.
#[derive(Debug)]
pub enum RequestFailure {
    /// Notion answered with a non-2xx status.
    Status {
        status: u16,
        code: NotionErrorCode,
        message: String,
    },
    /// The request never produced a response.
    Transport(reqwest::Error),
    /// The credentials could not be turned into request headers.
    Headers(String),
}

/// Result of a single request, decoded once at the HTTP boundary.
#[derive(Debug)]
pub enum RequestOutcome<T> {
    Ok(T),
    /// 2xx, but the body did not have the expected shape.
    Malformed(String),
    Failed(RequestFailure),
}

impl<T> RequestOutcome<T> {
    pub fn into_result(self) -> Result<T, AppError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Malformed(reason) => Err(AppError::MalformedResponse(reason)),
            Self::Failed(RequestFailure::Status {
                status,
                code,
                message,
            }) => Err(AppError::NotionService {
                code,
                message,
                status: Some(status),
            }),
            Self::Failed(RequestFailure::Transport(err)) => Err(AppError::NetworkFailure(err)),
            Self::Failed(RequestFailure::Headers(reason)) => {
                Err(AppError::MissingConfiguration(reason))
            }
        }
    }
}

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(NOTION_API_BASE_URL)
    }

    /// Client against a different API root (proxies, test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates the headers for an authenticated Notion API request.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&api_key.bearer()).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_API_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Performs the request and returns the response once its status is 2xx.
    pub async fn execute_raw(&self, auth: &ApiKey, request: ApiRequest) -> RequestOutcome<Response> {
        let url = format!("{}/{}", self.base_url, request.endpoint);
        let host = host_of(&url);

        let headers = match Self::create_headers(auth) {
            Ok(headers) => headers,
            Err(err) => {
                log::error!("{} | {} | {} | {}", request.method, host, request.message, err);
                return RequestOutcome::Failed(RequestFailure::Headers(err.to_string()));
            }
        };

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                log::error!(
                    "--- | {} | {} | {}",
                    request.method,
                    host,
                    request.message
                );
                log::error!("URL: {}", url);
                log::error!("Transport error: {}", err);
                return RequestOutcome::Failed(RequestFailure::Transport(err));
            }
        };

        let status = response.status();
        log::info!(
            "{} | {} | {} | {}",
            status.as_u16(),
            request.method,
            host,
            request.message
        );

        if status.is_success() {
            return RequestOutcome::Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let failure = decode_failure(status.as_u16(), &body);
        if let RequestFailure::Status { message, .. } = &failure {
            log::error!("URL: {}", url);
            log::error!("Response message: {}", message);
        }
        RequestOutcome::Failed(failure)
    }

    /// Performs the request and parses the JSON body into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        auth: &ApiKey,
        request: ApiRequest,
    ) -> RequestOutcome<T> {
        let response = match self.execute_raw(auth, request).await {
            RequestOutcome::Ok(response) => response,
            RequestOutcome::Malformed(reason) => return RequestOutcome::Malformed(reason),
            RequestOutcome::Failed(failure) => return RequestOutcome::Failed(failure),
        };

        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => return RequestOutcome::Failed(RequestFailure::Transport(err)),
        };

        decode_body(&text)
    }

    /// Follows the cursor until the last page; empty on any failed page.
    pub async fn query_all<T: DeserializeOwned>(
        &self,
        auth: &ApiKey,
        method: QueryMethod,
        endpoint: &str,
        body: Value,
        message: &str,
    ) -> Vec<T> {
        pagination::fetch_all_pages(|cursor| {
            let request = pagination::page_request(method, endpoint, message, &body, cursor);
            async move {
                self.execute::<PaginatedResponse<T>>(auth, request)
                    .await
            }
        })
        .await
    }
}

/// Parses a 2xx body; a shape mismatch is `Malformed`, never an error.
pub(crate) fn decode_body<T: DeserializeOwned>(text: &str) -> RequestOutcome<T> {
    match serde_json::from_str::<T>(text) {
        Ok(value) => RequestOutcome::Ok(value),
        Err(err) => {
            log::warn!(
                "Unexpected response shape ({}): {}",
                err,
                preview(text)
            );
            RequestOutcome::Malformed(err.to_string())
        }
    }
}

/// Classifies a non-2xx body, preferring Notion's own error code.
pub(crate) fn decode_failure(status: u16, body: &str) -> RequestFailure {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => RequestFailure::Status {
            status: error.status.unwrap_or(status),
            code: NotionErrorCode::from_api_response(&error.code),
            message: error.message,
        },
        Err(_) => RequestFailure::Status {
            status,
            code: NotionErrorCode::from_http_status(status),
            message: preview(body),
        },
    }
}

fn preview(body: &str) -> String {
    body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect()
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[async_trait::async_trait]
impl NotionGateway for NotionHttpClient {
    async fn create_page(
        &self,
        auth: &ApiKey,
        database: &NotionId,
        title: &SessionTitle,
    ) -> Result<PageId, AppError> {
        let mut body = PropertyPatch::new()
            .title(TITLE_PROPERTY_ID, title)
            .into_body();
        body["parent"] = json!({ "database_id": database.to_hyphenated() });
        let request = ApiRequest::new(Method::POST, "pages", "Create session page").with_body(body);
        let page: PageResponse = self.execute(auth, request).await.into_result()?;
        Ok(PageId::new(page.id))
    }

    async fn update_page(
        &self,
        auth: &ApiKey,
        page: &PageId,
        patch: PropertyPatch,
    ) -> Result<(), AppError> {
        let request = ApiRequest::new(
            Method::PATCH,
            format!("pages/{}", page),
            "Update session properties",
        )
        .with_body(patch.into_body());
        self.execute::<PageResponse>(auth, request)
            .await
            .into_result()
            .map(|_| ())
    }

    async fn trash_page(&self, auth: &ApiKey, page: &PageId) -> Result<(), AppError> {
        let request = ApiRequest::new(
            Method::PATCH,
            format!("pages/{}", page),
            "Move session page to trash",
        )
        .with_body(json!({ "archived": true }));
        self.execute::<PageResponse>(auth, request)
            .await
            .into_result()
            .map(|_| ())
    }

    async fn retrieve_database(
        &self,
        auth: &ApiKey,
        database: &NotionId,
    ) -> Result<DatabaseSchema, AppError> {
        let request = ApiRequest::new(
            Method::GET,
            format!("databases/{}", database.to_hyphenated()),
            "Retrieve database schema",
        );
        let response: DatabaseResponse = self.execute(auth, request).await.into_result()?;
        log::debug!(
            "Database '{}' has {} properties",
            response.title_text(),
            response.properties.len()
        );
        Ok(DatabaseSchema::from_response(response))
    }

    async fn query_database(&self, auth: &ApiKey, database: &NotionId) -> Vec<PageResponse> {
        let endpoint = format!("databases/{}/query", database.to_hyphenated());
        self.query_all(auth, QueryMethod::Post, &endpoint, json!({}), "Query project list")
            .await
    }
}
