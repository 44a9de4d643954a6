//! Error responses.
//!
//! # Responsibilities
//! - Map a propagated `Failure` to an HTTP status
//! - Render the structured error body
//!   `{error, message, errorCode, statusCode, timestamp}`
//!
//! # Design Decisions
//! - An upstream's own 4xx/5xx status is preserved
//! - Breaker, timeout and transport failures map to 503/504/502
//! - `timestamp` is epoch milliseconds

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::aggregate::outcome::Failure;

/// Structured error body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: bool,
    pub message: String,
    pub error_code: String,
    pub status_code: u16,
    pub timestamp: i64,
}

/// An error surfaced to the client.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("No route for {}", path),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: true,
            message: self.message.clone(),
            error_code: self.code.clone(),
            status_code: self.status.as_u16(),
            timestamp: now_millis(),
        }
    }
}

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        let status =
            StatusCode::from_u16(failure.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        Self::new(status, failure.error_code(), failure.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), code = %self.code, "Error occurred: {}", self.message);
        } else {
            tracing::warn!(status = self.status.as_u16(), code = %self.code, "Error occurred: {}", self.message);
        }
        (self.status, Json(self.body())).into_response()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
