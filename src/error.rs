//! Errors raised by calls to the backend API.
//!
//! Every failing call surfaces one string to the user: the server-provided
//! `detail` when the response carried one, otherwise the transport's own
//! message. [`ApiError::user_message`] implements that rule so call sites
//! never pick it apart themselves.

use reqwest::StatusCode;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, timeout, TLS failure and similar.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Request failed with status code {}", status.as_u16())]
    Status {
        status: StatusCode,
        detail: Option<String>,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("Unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Build a status error from a raw response body.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let detail = extract_detail(&body);
        ApiError::Status {
            status,
            detail,
            body,
        }
    }

    /// The server-provided detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Server detail when present, else the generic error text.
    pub fn user_message(&self) -> String {
        match self.detail() {
            Some(detail) if !detail.trim().is_empty() => detail.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Pull a human-readable detail out of an error body.
///
/// The backend reports failures as `{"detail": "..."}`, validation failures
/// as `{"detail": [...]}` and unhandled exceptions as
/// `{"error": "...", "detail": "..."}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let field = value.get("detail").or_else(|| value.get("error"))?;
    match field {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
