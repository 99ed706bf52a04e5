//! Dual-pipeline comparison.
//!
//! One combined `/compare` call answers for both pipelines, so both see the
//! same document snapshot and the same query string. A transport failure
//! yields no result at all; a bad sub-object only degrades its own side.

use crate::backend::{Backend, BackendReply, CompareRequest};
use crate::error::{BenchError, Result};
use crate::model::{ComparisonResult, Variant};
use crate::normalizer::normalize;
use crate::session::{DocumentSession, SessionStatus};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Issues comparisons against the backend.
pub struct ComparisonOrchestrator {
    backend: Arc<dyn Backend>,
    /// Bumped by every compare that passes its preconditions.
    generation: AtomicU64,
}

impl ComparisonOrchestrator {
    /// Create a new orchestrator over the given backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            generation: AtomicU64::new(0),
        }
    }

    /// Ask both pipelines `query` about the session's active document.
    ///
    /// Fails with `NoActiveDocument` or `EmptyQuery` before any network
    /// activity. If another compare starts while this one is waiting, this
    /// one resolves to `Superseded` and its reply is dropped.
    pub async fn compare(
        &self,
        session: &DocumentSession,
        query: &str,
    ) -> Result<ComparisonResult> {
        let document_id = match (session.status(), session.document_id()) {
            (SessionStatus::Active, Some(id)) => id.to_string(),
            _ => return Err(BenchError::NoActiveDocument),
        };

        if query.trim().is_empty() {
            return Err(BenchError::EmptyQuery);
        }

        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let request = CompareRequest {
            query: query.to_string(),
            doc_id: document_id,
        };

        debug!(ticket, doc_id = %request.doc_id, "comparison started");
        let start = Instant::now();
        let reply = self.backend.compare(&request).await;
        let round_trip = start.elapsed();

        let current = self.generation.load(Ordering::SeqCst);
        if current != ticket {
            warn!(ticket, current, "dropping superseded comparison");
            return Err(BenchError::Superseded {
                stale: ticket,
                current,
            });
        }

        let reply = reply.map_err(|e| BenchError::CompareFailed(e.to_string()))?;
        let body = parse_compare_reply(&reply)?;

        let standard = normalize(Variant::Standard, body.get(Variant::Standard.wire_key()));
        let agentic = normalize(Variant::Agentic, body.get(Variant::Agentic.wire_key()));

        for side in [&standard, &agentic] {
            if side.is_degraded() {
                warn!(
                    variant = side.variant.wire_key(),
                    notes = ?side.diagnostics.notes,
                    backend_error = ?side.diagnostics.backend_error,
                    "pipeline result degraded"
                );
            }
        }

        let result = ComparisonResult::new(
            request.query,
            request.doc_id,
            standard,
            agentic,
            round_trip,
        );
        debug!(
            ticket,
            partial = result.is_partial(),
            elapsed_ms = round_trip.as_millis() as u64,
            "comparison finished"
        );

        Ok(result)
    }
}

/// The top-level object of a successful compare reply.
fn parse_compare_reply(reply: &BackendReply) -> Result<Map<String, Value>> {
    if !reply.is_success() {
        let detail = reply
            .error_message()
            .unwrap_or_else(|| "no error message".to_string());
        return Err(BenchError::CompareFailed(format!(
            "backend returned status {}: {}",
            reply.status, detail
        )));
    }

    match serde_json::from_str::<Value>(&reply.body) {
        Ok(Value::Object(body)) => Ok(body),
        Ok(_) => Err(BenchError::CompareFailed(
            "reply is not a JSON object".to_string(),
        )),
        Err(e) => Err(BenchError::CompareFailed(format!("unparsable reply: {}", e))),
    }
}
