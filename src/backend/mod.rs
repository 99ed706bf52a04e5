//! Transport seam to the benchmark backend.
//!
//! [`Backend`] is what the session manager and orchestrator talk to;
//! [`HttpBackend`] is the reqwest implementation of the `/upload`,
//! `/compare` and `/health` endpoints. Replies are handed back raw so the
//! core decides what counts as malformed.

mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpBackend;

use crate::error::{BenchError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Declared media type of a PDF document.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original filename, shown while the upload runs.
    pub file_name: String,
    /// Declared media type.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| BenchError::io(path, e))?;

        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();

        let media_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => PDF_MEDIA_TYPE,
            _ => "application/octet-stream",
        };

        Ok(Self::new(file_name, media_type, bytes))
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
    }
}

/// Request body for `POST /compare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareRequest {
    pub query: String,
    pub doc_id: String,
}

/// A reply that reached us, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: String,
}

impl BackendReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Human-readable error text carried in the body, if any.
    ///
    /// Looks at `detail` (what the backend raises with), then `message`,
    /// then `error`.
    pub fn error_message(&self) -> Option<String> {
        let body = self.json()?;
        ["detail", "message", "error"].iter().find_map(|key| {
            match body.get(key)? {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Null => None,
                Value::String(_) => None,
                other => Some(other.to_string()),
            }
        })
    }
}

/// The benchmark backend as seen by the client core.
///
/// `Err` means no reply arrived at all (connection refused, timeout, ...).
/// Non-2xx replies come back as `Ok` with their status.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /upload` with the file as multipart field `file`.
    async fn upload(&self, file: &UploadFile) -> Result<BackendReply>;

    /// `POST /compare` with both pipelines answering in one reply.
    async fn compare(&self, request: &CompareRequest) -> Result<BackendReply>;

    /// `GET /health`.
    async fn health(&self) -> Result<()>;
}
