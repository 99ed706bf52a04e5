//! Error types for the benchmark client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Coarse error taxonomy surfaced to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The file's declared media type is not a PDF document.
    UnsupportedType,
    /// The backend rejected the upload or replied with a malformed shape.
    UploadFailed,
    /// A comparison was requested without an active document.
    NoActiveDocument,
    /// The query was empty after trimming.
    EmptyQuery,
    /// The combined compare call failed at the transport level.
    CompareFailed,
    /// A newer operation started while this one was in flight.
    Superseded,
    /// Configuration, filesystem or serialization problems outside the core flow.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedType => "unsupported type",
            ErrorKind::UploadFailed => "upload failed",
            ErrorKind::NoActiveDocument => "no active document",
            ErrorKind::EmptyQuery => "empty query",
            ErrorKind::CompareFailed => "compare failed",
            ErrorKind::Superseded => "superseded",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in the benchmark client.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Local validation rejected the file before any network activity.
    #[error("Unsupported file type '{media_type}': please upload a PDF file")]
    UnsupportedType { media_type: String },

    /// Upload rejected by the backend, or its reply was unusable.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// No document is active in the current session.
    #[error("No active document. Upload a PDF first.")]
    NoActiveDocument,

    /// The query is blank.
    #[error("Query is empty")]
    EmptyQuery,

    /// The combined compare call produced no usable reply.
    #[error("Comparison failed: {0}")]
    CompareFailed(String),

    /// A newer compare or session change made this result stale.
    #[error("Superseded by a newer request (generation {stale} < {current})")]
    Superseded { stale: u64, current: u64 },

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The report file does not exist.
    #[error("Report not found at '{0}'")]
    ReportNotFound(PathBuf),
}

impl BenchError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map onto the presentation taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BenchError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            BenchError::UploadFailed(_) => ErrorKind::UploadFailed,
            BenchError::NoActiveDocument => ErrorKind::NoActiveDocument,
            BenchError::EmptyQuery => ErrorKind::EmptyQuery,
            BenchError::CompareFailed(_) => ErrorKind::CompareFailed,
            BenchError::Superseded { .. } => ErrorKind::Superseded,
            BenchError::Io { .. }
            | BenchError::Serialization(_)
            | BenchError::Http(_)
            | BenchError::Config(_)
            | BenchError::ReportNotFound(_) => ErrorKind::Internal,
        }
    }
}

impl From<reqwest::Error> for BenchError {
    fn from(err: reqwest::Error) -> Self {
        BenchError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(err.to_string())
    }
}
