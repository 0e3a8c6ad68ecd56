// src/error.rs
//! Application error types with structured error handling.
//!
//! Two vocabularies live here. `AppError` describes what went wrong at the
//! transport and parsing layer. `SessionError` is what a user-facing operation
//! reports: it classifies failures the way the session workflow reacts to
//! them (abort before side effects, warn and no-op, roll back, degrade).

use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded
    RateLimited,
    /// The requested object does not exist or is not shared with the integration
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Transport and parsing errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: Option<u16>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Failure of a user-facing session or settings operation.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Missing or invalid secret, database URL, or selected property names.
    /// Reported before any side effect.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("A coding session is already in progress.")]
    AlreadyActive,

    #[error("No coding session is currently in progress.")]
    NotActive,

    #[error("Failed to {operation}: {source}")]
    RequestFailed {
        operation: &'static str,
        #[source]
        source: AppError,
    },

    /// The project relation is configured but its target database can't be resolved.
    #[error("Project property '{0}' does not resolve to a related database")]
    AmbiguousConfig(String),

    #[error("Failed to store settings: {0}")]
    Storage(#[source] AppError),
}

impl SessionError {
    pub fn request_failed(operation: &'static str, source: AppError) -> Self {
        Self::RequestFailed { operation, source }
    }

    /// State-precondition violations are warnings; everything else is an error.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::AlreadyActive | Self::NotActive)
    }
}

impl From<crate::types::ValidationError> for SessionError {
    fn from(err: crate::types::ValidationError) -> Self {
        SessionError::Configuration(err.to_string())
    }
}
