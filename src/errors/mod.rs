//! Error handling module for the portal.
//!
//! The taxonomy is flat: validation failures are caught before any request is
//! made, authentication failures come back from the backend as HTTP 401, and
//! everything else is a request failure with a best-effort message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Longest raw response body echoed back as an error message.
const MAX_RAW_MESSAGE: usize = 200;

/// Portal error type.
#[derive(Debug)]
pub enum PortalError {
    /// Form-level check failed; no request was made
    Validation(String),
    /// Missing credentials or a 401 from the backend
    Unauthorized(String),
    /// Authenticated but not allowed
    Forbidden(String),
    /// Resource not found
    NotFound(String),
    /// Backend answered with a non-success status
    Request { status: u16, message: String },
    /// Transport failure talking to the backend
    Network(String),
    /// Response body did not have the expected shape
    Decode(String),
    /// Persisted client state error
    Storage(String),
    /// Invalid configuration value
    Config(String),
    /// Anything else
    Internal(String),
}

impl PortalError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            PortalError::Forbidden(_) => StatusCode::FORBIDDEN,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Request { .. } => StatusCode::BAD_GATEWAY,
            PortalError::Network(_) => StatusCode::BAD_GATEWAY,
            PortalError::Decode(_) => StatusCode::BAD_GATEWAY,
            PortalError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PortalError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            PortalError::Validation(_) => codes::VALIDATION_ERROR,
            PortalError::Unauthorized(_) => codes::UNAUTHORIZED,
            PortalError::Forbidden(_) => codes::FORBIDDEN,
            PortalError::NotFound(_) => codes::NOT_FOUND,
            PortalError::Request { .. } => codes::REQUEST_FAILED,
            PortalError::Network(_) => codes::NETWORK_ERROR,
            PortalError::Decode(_) => codes::DECODE_ERROR,
            PortalError::Storage(_) => codes::STORAGE_ERROR,
            PortalError::Config(_) => codes::CONFIG_ERROR,
            PortalError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            PortalError::Validation(msg)
            | PortalError::Unauthorized(msg)
            | PortalError::Forbidden(msg)
            | PortalError::NotFound(msg)
            | PortalError::Network(msg)
            | PortalError::Decode(msg)
            | PortalError::Storage(msg)
            | PortalError::Config(msg)
            | PortalError::Internal(msg) => msg.clone(),
            PortalError::Request { message, .. } => message.clone(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PortalError::Unauthorized(_))
    }
}

impl std::fmt::Display for PortalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for PortalError {}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        tracing::warn!("Backend request error: {:?}", err);
        if err.is_decode() {
            PortalError::Decode(format!("Unexpected response: {}", err))
        } else {
            PortalError::Network(format!("Could not reach the server: {}", err))
        }
    }
}

impl From<sqlx::Error> for PortalError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Store error: {:?}", err);
        PortalError::Storage(format!("Store error: {}", err))
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        tracing::warn!("JSON error: {:?}", err);
        PortalError::Decode(format!("JSON error: {}", err))
    }
}

/// Pull a human-readable message out of a failed response body.
///
/// Backends disagree on where they put it, so `detail` (string or a list of
/// `{ msg }` objects), `message` and `error` are tried in turn before falling
/// back to the raw text and finally to a generic line naming the status.
pub fn extract_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = message_from_json(&value) {
            return message;
        }
    }

    let raw = body.trim();
    if !raw.is_empty() && !raw.starts_with('{') && !raw.starts_with('<') {
        return raw.chars().take(MAX_RAW_MESSAGE).collect();
    }

    format!("Request failed with status {}", status)
}

fn message_from_json(value: &Value) -> Option<String> {
    match value.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !parts.is_empty() {
                return Some(parts.join("; "));
            }
        }
        _ => {}
    }

    if let Some(Value::String(s)) = value.get("message") {
        if !s.is_empty() {
            return Some(s.clone());
        }
    }

    match value.get("error") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &PortalError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
            },
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
