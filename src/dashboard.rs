//! Upload → ask → chart wiring for one benchmarking session.

use crate::backend::{Backend, UploadFile};
use crate::error::{BenchError, Result};
use crate::metrics::{ChartSeries, aggregate};
use crate::model::ComparisonResult;
use crate::orchestrator::ComparisonOrchestrator;
use crate::session::{DocumentSession, DocumentSessionManager, UploadCompletion};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// A finished comparison together with its chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonView {
    pub result: ComparisonResult,
    pub chart: ChartSeries,
}

impl ComparisonView {
    pub fn new(result: ComparisonResult) -> Self {
        let chart = aggregate(&result);
        Self { result, chart }
    }
}

/// Everything one benchmarking session needs.
pub struct Dashboard {
    backend: Arc<dyn Backend>,
    sessions: DocumentSessionManager,
    orchestrator: ComparisonOrchestrator,
    latest: Mutex<Option<Arc<ComparisonView>>>,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            orchestrator: ComparisonOrchestrator::new(backend.clone()),
            backend,
            sessions: DocumentSessionManager::new(),
            latest: Mutex::new(None),
        }
    }

    pub fn session(&self) -> DocumentSession {
        self.sessions.current()
    }

    /// Upload a document, replacing whatever was active.
    pub async fn upload(&self, file: &UploadFile) -> Result<UploadCompletion> {
        self.sessions.upload(self.backend.as_ref(), file).await
    }

    /// Drop the active document and the last comparison.
    pub fn remove(&self) -> DocumentSession {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.sessions.reset()
    }

    /// Compare both pipelines on `query` against the active document.
    ///
    /// The result is kept as the latest view only if the session it was
    /// computed against is still the live one when the reply lands.
    pub async fn ask(&self, query: &str) -> Result<Arc<ComparisonView>> {
        let session = self.sessions.current();
        let result = self.orchestrator.compare(&session, query).await?;

        if !self.sessions.is_current(session.generation()) {
            let current = self.sessions.current().generation();
            warn!(
                stale = session.generation(),
                current, "session changed during comparison"
            );
            return Err(BenchError::Superseded {
                stale: session.generation(),
                current,
            });
        }

        let view = Arc::new(ComparisonView::new(result));
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(view.clone());
        Ok(view)
    }

    /// The most recent comparison, if any.
    pub fn latest(&self) -> Option<Arc<ComparisonView>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// True when the latest comparison was run against a document that is
    /// no longer the active one.
    pub fn latest_is_stale(&self) -> bool {
        let Some(view) = self.latest() else {
            return false;
        };
        self.sessions.current().document_id() != Some(view.result.document_id())
    }
}
