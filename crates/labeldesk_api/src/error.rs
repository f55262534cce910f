//! Error types for backend calls.

use thiserror::Error;

/// Errors that can occur while talking to the labeling backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status code
    #[error("Backend error ({status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body, usually a FastAPI `{"detail": ...}` document
        body: String,
    },

    /// A response or push frame could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket connection or protocol failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A base URL or route could not be turned into a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for 404 responses.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for 409 responses (lock held by someone else, no active lock on save).
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Human-readable reason suitable for a status banner.
    ///
    /// Extracts FastAPI's `detail` field when the body carries one.
    pub fn reason(&self) -> String {
        if let ApiError::Status { status, body } = self {
            let detail = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("detail").cloned());
            return match detail {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None if body.trim().is_empty() => format!("HTTP {status}"),
                None => body.clone(),
            };
        }
        self.to_string()
    }
}
