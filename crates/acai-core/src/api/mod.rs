//! Backend API: error types, the chat seam used by the session manager, and
//! the HTTP client.

use std::fmt;
use std::future::Future;

use acai_types::wire::{ChatReply, NewMessage, StoredMessage};
use serde::{Deserialize, Serialize};

mod client;

pub use client::{ApiClient, SUPPORTED_UPLOAD_EXTENSIONS, validate_upload};

/// Standard User-Agent header for ACAI requests.
pub const USER_AGENT: &str = concat!("acai/", env!("CARGO_PKG_VERSION"));

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// Connection timeout or request timeout
    Timeout,
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Failed to parse the response body
    Parse,
    /// Request rejected locally before any call was made
    Validation,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Validation => write!(f, "validation"),
        }
    }
}

/// Structured error from the backend with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error.
    ///
    /// Prefers the backend's `detail` field; falls back to `fallback` when the
    /// body carries none.
    pub fn http_status(status: u16, body: &str, fallback: &str) -> Self {
        let detail = serde_json::from_str::<acai_types::wire::ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail_text());
        let message = match detail {
            Some(detail) => detail,
            None => format!("{fallback} (HTTP {status})"),
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, message)
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Maps a reqwest transport error to an [`ApiError`].
pub fn classify_reqwest_error(error: &reqwest::Error, fallback: &str) -> ApiError {
    if error.is_timeout() {
        ApiError::new(ApiErrorKind::Timeout, format!("{fallback}: request timed out"))
    } else if error.is_decode() {
        ApiError::parse(format!("{fallback}: invalid response body"))
            .with_details(error.to_string())
    } else {
        ApiError::new(ApiErrorKind::Network, format!("{fallback}: {error}"))
    }
}

/// Message store and inference calls the chat session depends on.
///
/// [`ApiClient`] is the production implementation; tests script their own.
pub trait ChatBackend: Send + Sync {
    /// `GET /messages`
    fn fetch_messages(&self) -> impl Future<Output = ApiResult<Vec<StoredMessage>>> + Send;

    /// `POST /messages`
    fn save_message(
        &self,
        message: NewMessage<'_>,
    ) -> impl Future<Output = ApiResult<StoredMessage>> + Send;

    /// `POST /chat`
    fn send_chat(&self, message: &str) -> impl Future<Output = ApiResult<ChatReply>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_prefers_detail() {
        let err = ApiError::http_status(500, r#"{"detail": "database down"}"#, "Failed to save");
        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.message, "database down");
        assert!(err.details.is_some());
    }

    #[test]
    fn test_http_status_falls_back_without_detail() {
        let err = ApiError::http_status(502, "<html>bad gateway</html>", "Failed to save");
        assert_eq!(err.message, "Failed to save (HTTP 502)");

        let err = ApiError::http_status(404, "", "Failed to load");
        assert_eq!(err.message, "Failed to load (HTTP 404)");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ApiErrorKind::HttpStatus.to_string(), "http_status");
        assert_eq!(ApiErrorKind::Validation.to_string(), "validation");
    }
}
