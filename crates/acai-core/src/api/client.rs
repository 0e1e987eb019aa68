//! HTTP client for the chat/document backend.

use std::path::Path;
use std::time::Duration;

use acai_types::wire::{
    ChatReply, ChatRequest, DuplicateCheck, HealthStatus, NewMessage, StoredMessage,
};
use acai_types::{Document, DocumentPage};
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::{ApiError, ApiErrorKind, ApiResult, ChatBackend, USER_AGENT, classify_reqwest_error};
use crate::config::{Config, normalize_base_url};

/// File extensions accepted by `upload_document` (lowercase, with dot).
pub const SUPPORTED_UPLOAD_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".txt"];

/// Backend client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is malformed or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        debug!(%base_url, "api client ready");
        Ok(Self { base_url, http })
    }

    /// Creates a client from resolved configuration.
    ///
    /// # Errors
    /// Returns an error if the configured base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url()?, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `path` with `segment` appended as one percent-encoded path segment.
    fn segment_url(&self, path: &str, segment: &str) -> ApiResult<Url> {
        let invalid = || ApiError::validation(format!("Invalid request path for '{segment}'"));
        let mut url = Url::parse(&self.url(path)).map_err(|_| invalid())?;
        url.path_segments_mut().map_err(|()| invalid())?.push(segment);
        Ok(url)
    }

    /// `GET /health`
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> ApiResult<HealthStatus> {
        self.get_json("/health", "Health check failed").await
    }

    /// `GET /documents`
    ///
    /// # Errors
    /// Returns an error if the request fails or the body cannot be parsed.
    pub async fn list_documents(&self) -> ApiResult<Vec<Document>> {
        self.get_json("/documents", "Failed to fetch documents").await
    }

    /// `GET /document_pages/{id}`
    ///
    /// # Errors
    /// Returns an error if the request fails or the body cannot be parsed.
    pub async fn document_pages(&self, document_id: &str) -> ApiResult<Vec<DocumentPage>> {
        const FALLBACK: &str = "Failed to fetch document pages";
        let url = self.segment_url("/document_pages", document_id)?;
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, FALLBACK))?;
        read_json(response, FALLBACK).await
    }

    /// `GET /documents/check-duplicate?filename=`
    ///
    /// # Errors
    /// Returns an error if the request fails or the body cannot be parsed.
    pub async fn check_duplicate(&self, filename: &str) -> ApiResult<bool> {
        const FALLBACK: &str = "Failed to check for duplicates";
        debug!(filename, "check duplicate");
        let response = self
            .http
            .get(self.url("/documents/check-duplicate"))
            .query(&[("filename", filename)])
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, FALLBACK))?;
        let check: DuplicateCheck = read_json(response, FALLBACK).await?;
        Ok(check.is_duplicate)
    }

    /// `DELETE /documents/{id}`
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn delete_document(&self, document_id: &str) -> ApiResult<()> {
        const FALLBACK: &str = "Failed to delete document";
        debug!(document_id, "delete document");
        let url = self.segment_url("/documents", document_id)?;
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, FALLBACK))?;
        ensure_success(response, FALLBACK).await.map(|_| ())
    }

    /// `POST /documents/upload` (multipart field `file`).
    ///
    /// Only PDF, DOC, DOCX and TXT files are accepted; others are rejected
    /// before any request is made.
    ///
    /// # Errors
    /// Returns an error if the file is unsupported, unreadable, or the upload fails.
    pub async fn upload_document(&self, path: &Path) -> ApiResult<Document> {
        const FALLBACK: &str = "Failed to upload document";
        let (filename, mime) = upload_metadata(path)?;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::validation(format!("Failed to read {}: {e}", path.display()))
        })?;
        debug!(filename, size = bytes.len(), "upload document");

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(mime)
            .map_err(|e| classify_reqwest_error(&e, FALLBACK))?;
        let response = self
            .http
            .post(self.url("/documents/upload"))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, FALLBACK))?;
        read_json(response, FALLBACK).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> ApiResult<T> {
        debug!(path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, fallback))?;
        read_json(response, fallback).await
    }
}

impl ChatBackend for ApiClient {
    async fn fetch_messages(&self) -> ApiResult<Vec<StoredMessage>> {
        self.get_json("/messages", "Failed to load messages").await
    }

    async fn save_message(&self, message: NewMessage<'_>) -> ApiResult<StoredMessage> {
        const FALLBACK: &str = "Failed to save message";
        debug!(sender = %message.sender, "POST /messages");
        let response = self
            .http
            .post(self.url("/messages"))
            .json(&message)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, FALLBACK))?;
        read_json(response, FALLBACK).await
    }

    async fn send_chat(&self, message: &str) -> ApiResult<ChatReply> {
        const FALLBACK: &str = "Failed to communicate with the server";
        debug!(len = message.len(), "POST /chat");
        let response = self
            .http
            .post(self.url("/chat"))
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, FALLBACK))?;
        read_json(response, FALLBACK).await
    }
}

async fn ensure_success(response: reqwest::Response, fallback: &str) -> ApiResult<String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| body_read_error(&e, fallback))?;
    if !status.is_success() {
        warn!(status = status.as_u16(), "backend returned error status");
        return Err(ApiError::http_status(status.as_u16(), &body, fallback));
    }
    Ok(body)
}

/// Failures while streaming the body are transport failures, even when
/// reqwest reports them as decode errors.
fn body_read_error(error: &reqwest::Error, fallback: &str) -> ApiError {
    if error.is_timeout() {
        return classify_reqwest_error(error, fallback);
    }
    ApiError::new(
        ApiErrorKind::Network,
        format!("{fallback}: failed to read response body"),
    )
    .with_details(error.to_string())
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> ApiResult<T> {
    let body = ensure_success(response, fallback).await?;
    serde_json::from_str(&body).map_err(|e| {
        ApiError::parse(format!("{fallback}: invalid response ({e})")).with_details(body)
    })
}

/// Checks that `path` names a supported upload type and returns its file name.
///
/// # Errors
/// Returns a validation error for unsupported or nameless paths.
pub fn validate_upload(path: &Path) -> ApiResult<String> {
    upload_metadata(path).map(|(filename, _)| filename)
}

/// Validates the extension and returns `(filename, mime type)` for upload.
fn upload_metadata(path: &Path) -> ApiResult<(String, &'static str)> {
    let unsupported = || ApiError::validation("Supported formats: PDF, DOC, DOCX, TXT");
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(unsupported)?
        .to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .filter(|e| SUPPORTED_UPLOAD_EXTENSIONS.contains(&e.as_str()))
        .ok_or_else(unsupported)?;
    let mime = match ext.as_str() {
        ".pdf" => "application/pdf",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "text/plain",
    };
    Ok((filename, mime))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_upload_metadata_accepts_supported_types() {
        let (name, mime) = upload_metadata(&PathBuf::from("/tmp/Report.PDF")).unwrap();
        assert_eq!(name, "Report.PDF");
        assert_eq!(mime, "application/pdf");

        let (_, mime) = upload_metadata(&PathBuf::from("notes.txt")).unwrap();
        assert_eq!(mime, "text/plain");
    }

    #[test]
    fn test_upload_metadata_rejects_other_types() {
        let err = upload_metadata(&PathBuf::from("photo.png")).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);
        assert!(err.message.contains("PDF, DOC, DOCX, TXT"));

        assert!(upload_metadata(&PathBuf::from("README")).is_err());
        assert!(validate_upload(&PathBuf::from("scan.jpeg")).is_err());
        assert_eq!(validate_upload(&PathBuf::from("a/b.docx")).unwrap(), "b.docx");
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:8001/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8001");
        assert_eq!(client.url("/chat"), "http://localhost:8001/chat");
    }

    #[test]
    fn test_segment_url_encodes_one_segment() {
        let client = ApiClient::new("http://localhost:8001", None).unwrap();
        let url = |id: &str| client.segment_url("/documents", id).unwrap().to_string();
        assert_eq!(url("abc-123"), "http://localhost:8001/documents/abc-123");
        assert_eq!(url("a b"), "http://localhost:8001/documents/a%20b");
        assert_eq!(url("a+b"), "http://localhost:8001/documents/a+b");
        assert_eq!(url("a/b"), "http://localhost:8001/documents/a%2Fb");

        let client = ApiClient::new("http://localhost:8001/api", None).unwrap();
        assert_eq!(
            client.segment_url("/document_pages", "7").unwrap().as_str(),
            "http://localhost:8001/api/document_pages/7"
        );
    }

    #[tokio::test]
    async fn test_truncated_body_is_network_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
            return;
        };
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n[{\"id\":")
                .await;
        });

        let client = ApiClient::new(&format!("http://{addr}"), None).unwrap();
        let err = client.list_documents().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Network);
        assert!(err.message.starts_with("Failed to fetch documents"));
    }
}
