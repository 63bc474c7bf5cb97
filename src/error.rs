//! # Error Handling
//!
//! This module defines the errors a request can end with and how they're
//! converted to HTTP responses.
//!
//! ## Error Taxonomy:
//! - **BadRequest**: The request is missing something we need (e.g. the `url`
//!   query parameter). Reported before any work starts.
//! - **FetchFailed**: The audio could not be downloaded. Ends the request.
//! - **ValidationError**: A configuration update was rejected
//! - **Internal**: Anything else that went wrong on our side
//!
//! A failed inference call for a single segment is NOT an `AppError`: the
//! pipeline replaces that segment with a placeholder line and carries on.
//!
//! ## Response Format:
//! Errors are returned as short `text/plain` bodies, the same content type
//! as a successful transcript.

use crate::audio::FetchError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Custom error types for the application.
///
/// ## Usage Example:
/// ```rust
/// return Err(AppError::BadRequest("Missing 'url' query parameter".to_string()));
/// ```
#[derive(Debug)]
pub enum AppError {
    /// Internal server errors
    Internal(String),

    /// Client request is missing required input
    BadRequest(String),

    /// The audio resource could not be retrieved
    FetchFailed(String),

    /// User input failed validation rules
    ValidationError(String),
}

/// Display gives exactly the body that is sent to the client.
impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::FetchFailed(msg) => write!(f, "{}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

/// Implementation of the ResponseError trait for AppError.
///
/// ## HTTP Status Code Mapping:
/// - BadRequest/ValidationError → 400 (Bad Request)
/// - FetchFailed/Internal → 500 (Internal Server Error)
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::FetchFailed(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain")
            .body(self.to_string())
    }
}

/// Automatic conversion from anyhow::Error to AppError.
///
/// When you use `?` with an anyhow::Error, it becomes an AppError::Internal.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Malformed JSON always comes from the client, so it maps to 400.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::FetchFailed(err.to_string())
    }
}

/// Shorthand for `Result<T, AppError>`.
pub type AppResult<T> = Result<T, AppError>;
