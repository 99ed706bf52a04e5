//! Active-document session management.
//!
//! One [`DocumentSessionManager`] owns the single session of a run. Every
//! mutation goes through it, and every upload is tagged with the session
//! generation it was started under so a late completion cannot clobber a
//! session the user has already replaced or cleared.

use crate::backend::{Backend, BackendReply, UploadFile};
use crate::error::{BenchError, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Empty,
    Uploading,
    Active,
    Error,
}

/// Snapshot of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSession {
    generation: u64,
    status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DocumentSession {
    fn empty(generation: u64) -> Self {
        Self {
            generation,
            status: SessionStatus::Empty,
            document_id: None,
            display_name: None,
            error: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Backend-assigned identity. Only set while `Active`.
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Original filename of the active or in-flight document.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Error message while in `Error`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Kind of the error that put the session in `Error`.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        (self.status == SessionStatus::Error).then_some(ErrorKind::UploadFailed)
    }
}

/// Proof that an upload was started under a particular generation.
#[derive(Debug)]
pub struct UploadTicket {
    generation: u64,
    display_name: String,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to an upload's completion.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadCompletion {
    /// The completion was current and the session moved to `Active` or `Error`.
    Applied(DocumentSession),
    /// A newer upload or a reset happened first; the session was left alone.
    Stale { ticket: u64, current: u64 },
}

impl UploadCompletion {
    pub fn session(&self) -> Option<&DocumentSession> {
        match self {
            UploadCompletion::Applied(session) => Some(session),
            UploadCompletion::Stale { .. } => None,
        }
    }
}

/// Generic text when the backend gave no usable message.
const GENERIC_UPLOAD_FAILURE: &str = "Upload failed. Make sure the backend is running.";

/// Owner of the single document session.
#[derive(Debug)]
pub struct DocumentSessionManager {
    state: Mutex<DocumentSession>,
}

impl Default for DocumentSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSessionManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DocumentSession::empty(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DocumentSession> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current session snapshot.
    pub fn current(&self) -> DocumentSession {
        self.lock().clone()
    }

    /// Whether `generation` is still the live session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Start an upload.
    ///
    /// Rejects non-PDF files without touching the session. Otherwise any
    /// previous session (including one still uploading) is discarded and a
    /// new generation begins in `Uploading`.
    pub fn begin_upload(&self, file: &UploadFile) -> Result<UploadTicket> {
        if !file.is_pdf() {
            return Err(BenchError::UnsupportedType {
                media_type: file.media_type.clone(),
            });
        }

        let mut state = self.lock();
        if state.status == SessionStatus::Uploading {
            info!(generation = state.generation, "replacing in-flight upload");
        }

        let generation = state.generation + 1;
        *state = DocumentSession {
            generation,
            status: SessionStatus::Uploading,
            document_id: None,
            display_name: Some(file.file_name.clone()),
            error: None,
        };
        info!(generation, file = %file.file_name, "upload started");

        Ok(UploadTicket {
            generation,
            display_name: file.file_name.clone(),
        })
    }

    /// Apply the outcome of the upload call started with `ticket`.
    ///
    /// `reply` is `Err` when no reply arrived at all.
    pub fn complete_upload(
        &self,
        ticket: UploadTicket,
        reply: Result<BackendReply>,
    ) -> UploadCompletion {
        let mut state = self.lock();
        if state.generation != ticket.generation || state.status != SessionStatus::Uploading {
            warn!(
                ticket = ticket.generation,
                current = state.generation,
                "discarding stale upload completion"
            );
            return UploadCompletion::Stale {
                ticket: ticket.generation,
                current: state.generation,
            };
        }

        match parse_upload_reply(reply) {
            Ok((document_id, display_name)) => {
                info!(generation = ticket.generation, %document_id, "document active");
                state.status = SessionStatus::Active;
                state.document_id = Some(document_id);
                state.display_name = Some(display_name);
                state.error = None;
            }
            Err(message) => {
                warn!(generation = ticket.generation, %message, "upload failed");
                state.status = SessionStatus::Error;
                state.document_id = None;
                state.display_name = Some(ticket.display_name);
                state.error = Some(BenchError::UploadFailed(message).to_string());
            }
        }

        UploadCompletion::Applied(state.clone())
    }

    /// Return to `Empty`, orphaning any in-flight upload.
    pub fn reset(&self) -> DocumentSession {
        let mut state = self.lock();
        *state = DocumentSession::empty(state.generation + 1);
        info!(generation = state.generation, "session reset");
        state.clone()
    }

    /// Run a whole upload: begin, call the backend, complete.
    ///
    /// Only local validation errors are returned as `Err`; backend failures
    /// end up in the session as `Error`.
    pub async fn upload(
        &self,
        backend: &dyn Backend,
        file: &UploadFile,
    ) -> Result<UploadCompletion> {
        let ticket = self.begin_upload(file)?;
        let reply = backend.upload(file).await;
        Ok(self.complete_upload(ticket, reply))
    }
}

/// Extract `(doc_id, filename)` from an upload reply, or a failure message.
fn parse_upload_reply(reply: Result<BackendReply>) -> std::result::Result<(String, String), String> {
    let reply = reply.map_err(|e| e.to_string())?;

    if !reply.is_success() {
        return Err(reply
            .error_message()
            .unwrap_or_else(|| format!("{} (status {})", GENERIC_UPLOAD_FAILURE, reply.status)));
    }

    let body = reply
        .json()
        .ok_or_else(|| "Backend returned an unreadable upload reply".to_string())?;

    let field = |name: &str| {
        body.get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };

    match (field("doc_id"), field("filename")) {
        (Some(doc_id), Some(filename)) => Ok((doc_id, filename)),
        _ => Err(reply.error_message().unwrap_or_else(|| {
            "Backend reply is missing 'doc_id' or 'filename'".to_string()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::backend::PDF_MEDIA_TYPE;

    fn pdf(name: &str) -> UploadFile {
        UploadFile::new(name, PDF_MEDIA_TYPE, b"%PDF-1.7".to_vec())
    }

    fn ok_reply(doc_id: &str, filename: &str) -> Result<BackendReply> {
        Ok(BackendReply::new(
            200,
            format!(
                r#"{{"status": "indexed", "doc_id": "{}", "filename": "{}"}}"#,
                doc_id, filename
            ),
        ))
    }

    #[test]
    fn test_starts_empty() {
        let manager = DocumentSessionManager::new();
        let session = manager.current();
        assert_eq!(session.status(), SessionStatus::Empty);
        assert_eq!(session.document_id(), None);
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_upload_lifecycle() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();

        let uploading = manager.current();
        assert_eq!(uploading.status(), SessionStatus::Uploading);
        assert_eq!(uploading.display_name(), Some("report.pdf"));
        assert_eq!(uploading.document_id(), None);

        let completion = manager.complete_upload(ticket, ok_reply("d1", "report.pdf"));
        let session = completion.session().unwrap();
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.document_id(), Some("d1"));
        assert_eq!(session.display_name(), Some("report.pdf"));
        assert_eq!(manager.current(), *session);
    }

    #[test]
    fn test_document_id_stored_verbatim() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();

        let session = manager
            .complete_upload(ticket, ok_reply(" d1 ", "report.pdf"))
            .session()
            .cloned()
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.document_id(), Some(" d1 "));
    }

    #[test]
    fn test_blank_document_id_is_upload_failure() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();

        let session = manager
            .complete_upload(ticket, ok_reply("   ", "report.pdf"))
            .session()
            .cloned()
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.document_id(), None);
    }

    #[test]
    fn test_rejects_non_pdf_without_touching_session() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("a.pdf")).unwrap();
        manager.complete_upload(ticket, ok_reply("d1", "a.pdf"));
        let before = manager.current();

        let image = UploadFile::new("photo.png", "image/png", vec![1, 2, 3]);
        let err = manager.begin_upload(&image).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert_eq!(manager.current(), before);
    }

    #[test]
    fn test_rejected_type_makes_no_backend_call() {
        let backend = MockBackend::new();
        let manager = DocumentSessionManager::new();
        let image = UploadFile::new("notes.txt", "text/plain", b"hi".to_vec());

        let err = tokio_test::block_on(manager.upload(&backend, &image)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert_eq!(backend.upload_calls(), 0);
    }

    #[test]
    fn test_backend_failure_carries_message() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();
        let reply = Ok(BackendReply::new(500, r#"{"detail": "PDF has no text layer"}"#));

        let session = manager.complete_upload(ticket, reply).session().cloned().unwrap();
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.error_kind(), Some(ErrorKind::UploadFailed));
        assert!(session.error().unwrap().contains("PDF has no text layer"));
        assert_eq!(session.document_id(), None);
    }

    #[test]
    fn test_backend_failure_without_message_is_generic() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();

        let completion = manager.complete_upload(ticket, Ok(BackendReply::new(503, "")));
        let error = completion.session().unwrap().error().unwrap().to_string();
        assert!(error.contains("Make sure the backend is running"));
        assert!(error.contains("503"));
    }

    #[test]
    fn test_malformed_success_is_upload_failure() {
        for body in [
            r#"{"filename": "report.pdf"}"#,
            r#"{"doc_id": "d1"}"#,
            r#"{"doc_id": 7, "filename": "report.pdf"}"#,
            "not json",
        ] {
            let manager = DocumentSessionManager::new();
            let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();
            let completion = manager.complete_upload(ticket, Ok(BackendReply::new(200, body)));
            let session = completion.session().unwrap();
            assert_eq!(session.status(), SessionStatus::Error, "body {}", body);
            assert!(session.error().is_some());
        }
    }

    #[test]
    fn test_transport_failure_is_upload_failure() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();
        let completion = manager.complete_upload(
            ticket,
            Err(BenchError::Http("connection refused".to_string())),
        );
        let session = completion.session().unwrap();
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(session.error().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_stale_completion_after_reset_is_noop() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("report.pdf")).unwrap();
        let cleared = manager.reset();
        assert_eq!(cleared.status(), SessionStatus::Empty);

        let completion = manager.complete_upload(ticket, ok_reply("d1", "report.pdf"));
        assert!(matches!(completion, UploadCompletion::Stale { .. }));
        assert_eq!(manager.current(), cleared);
    }

    #[test]
    fn test_second_upload_supersedes_first() {
        let manager = DocumentSessionManager::new();
        let first = manager.begin_upload(&pdf("old.pdf")).unwrap();
        let second = manager.begin_upload(&pdf("new.pdf")).unwrap();
        assert!(second.generation() > first.generation());

        // Second finishes first, then the slow first upload lands.
        let applied = manager.complete_upload(second, ok_reply("d2", "new.pdf"));
        assert!(applied.session().is_some());
        let stale = manager.complete_upload(first, ok_reply("d1", "old.pdf"));
        assert!(matches!(stale, UploadCompletion::Stale { .. }));

        let session = manager.current();
        assert_eq!(session.document_id(), Some("d2"));
        assert_eq!(session.display_name(), Some("new.pdf"));
    }

    #[test]
    fn test_stale_failure_does_not_error_new_session() {
        let manager = DocumentSessionManager::new();
        let first = manager.begin_upload(&pdf("old.pdf")).unwrap();
        let second = manager.begin_upload(&pdf("new.pdf")).unwrap();

        manager.complete_upload(first, Ok(BackendReply::new(500, "")));
        assert_eq!(manager.current().status(), SessionStatus::Uploading);

        manager.complete_upload(second, ok_reply("d2", "new.pdf"));
        assert!(manager.current().is_active());
    }

    #[test]
    fn test_new_upload_discards_active_session() {
        let manager = DocumentSessionManager::new();
        let ticket = manager.begin_upload(&pdf("a.pdf")).unwrap();
        manager.complete_upload(ticket, ok_reply("d1", "a.pdf"));

        manager.begin_upload(&pdf("b.pdf")).unwrap();
        let session = manager.current();
        assert_eq!(session.status(), SessionStatus::Uploading);
        assert_eq!(session.document_id(), None);
    }

    #[test]
    fn test_reset_from_every_state() {
        let manager = DocumentSessionManager::new();
        let mut last = manager.reset().generation();

        let ticket = manager.begin_upload(&pdf("a.pdf")).unwrap();
        manager.complete_upload(ticket, Ok(BackendReply::new(500, "")));
        assert_eq!(manager.current().status(), SessionStatus::Error);

        let session = manager.reset();
        assert_eq!(session.status(), SessionStatus::Empty);
        assert!(session.error().is_none());
        assert!(session.generation() > last);
        last = session.generation();

        let ticket = manager.begin_upload(&pdf("b.pdf")).unwrap();
        manager.complete_upload(ticket, ok_reply("d9", "b.pdf"));
        let session = manager.reset();
        assert_eq!(session.status(), SessionStatus::Empty);
        assert_eq!(session.document_id(), None);
        assert!(session.generation() > last);
    }

    #[tokio::test]
    async fn test_reset_during_in_flight_upload() {
        let backend = MockBackend::new();
        let release = backend.push_upload_gated(ok_reply("d1", "report.pdf"));
        let manager = DocumentSessionManager::new();
        let file = pdf("report.pdf");

        let (completion, cleared) = tokio::join!(manager.upload(&backend, &file), async {
            let cleared = manager.reset();
            let _ = release.send(());
            cleared
        });

        assert!(matches!(completion.unwrap(), UploadCompletion::Stale { .. }));
        assert_eq!(manager.current(), cleared);
        assert_eq!(backend.upload_calls(), 1);
    }
}
