//! Normalized data model shared by the comparison pipeline.
//!
//! Everything in here has already passed through the normalizer, so the
//! rest of the crate never touches raw backend JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One of the two retrieval strategies being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Agentic,
}

impl Variant {
    /// Key of this variant's sub-object in the compare reply.
    pub fn wire_key(&self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Agentic => "arag",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Standard => "Standard RAG",
            Variant::Agentic => "Agentic RAG (A-RAG)",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A metric value that may be unavailable.
///
/// Unavailable is distinct from zero: a backend reporting `0` retrieved
/// documents and a backend that never reports the metric are different
/// facts. Serializes as the bare value or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Metric<T> {
    Available(T),
    #[default]
    Unavailable,
}

impl<T> Metric<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Available(v) => Some(v),
            Metric::Unavailable => None,
        }
    }

    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Metric<U> {
        match self {
            Metric::Available(v) => Metric::Available(f(v)),
            Metric::Unavailable => Metric::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for Metric<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Metric::Available(v),
            None => Metric::Unavailable,
        }
    }
}

/// Execution metrics for one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetrics {
    /// Reasoning/retrieval steps taken. Always present.
    pub steps: u64,
    /// Number of retrieved chunks (Standard only).
    #[serde(default)]
    pub retrieved_docs: Metric<u64>,
    /// The agent's reasoning trail, in order (Agentic only).
    #[serde(default)]
    pub intermediate_steps: Metric<Vec<String>>,
    /// Token usage.
    #[serde(default)]
    pub tokens: Metric<u64>,
    /// Backend-measured latency.
    #[serde(default)]
    pub latency_seconds: Metric<f64>,
}

/// What the normalizer had to do to make a reply presentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Diagnostics {
    /// The whole side was missing or unusable and was replaced with an empty result.
    pub degraded: bool,
    /// Error text reported by the backend for this side, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_error: Option<String>,
    /// Field-level coercions, in the order they were applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostics {
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// True when the reply was taken as-is.
    pub fn is_clean(&self) -> bool {
        !self.degraded && self.backend_error.is_none() && self.notes.is_empty()
    }
}

/// Normalized result of one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub variant: Variant,
    pub answer: String,
    pub metrics: PipelineMetrics,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl PipelineResult {
    /// The empty-normalized form: no answer, zero steps, everything else unavailable.
    pub fn empty(variant: Variant, diagnostics: Diagnostics) -> Self {
        Self {
            variant,
            answer: String::new(),
            metrics: PipelineMetrics::default(),
            diagnostics,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.diagnostics.degraded
    }
}

/// Both pipelines' results for one query against one document.
///
/// Fields are private so `partial` always agrees with the two sides.
/// Deserializing recomputes it rather than trusting the stored flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ComparisonRecord")]
pub struct ComparisonResult {
    query: String,
    document_id: String,
    standard: PipelineResult,
    agentic: PipelineResult,
    partial: bool,
    round_trip_ms: u64,
}

impl ComparisonResult {
    pub fn new(
        query: impl Into<String>,
        document_id: impl Into<String>,
        standard: PipelineResult,
        agentic: PipelineResult,
        round_trip: Duration,
    ) -> Self {
        let partial = standard.is_degraded() || agentic.is_degraded();
        Self {
            query: query.into(),
            document_id: document_id.into(),
            standard,
            agentic,
            partial,
            round_trip_ms: round_trip.as_millis() as u64,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn standard(&self) -> &PipelineResult {
        &self.standard
    }

    pub fn agentic(&self) -> &PipelineResult {
        &self.agentic
    }

    pub fn side(&self, variant: Variant) -> &PipelineResult {
        match variant {
            Variant::Standard => &self.standard,
            Variant::Agentic => &self.agentic,
        }
    }

    /// True if either side was substituted with an empty placeholder.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Client-side wall time of the combined call.
    pub fn round_trip(&self) -> Duration {
        Duration::from_millis(self.round_trip_ms)
    }
}

/// Stored form of a [`ComparisonResult`]. A stored `partial` is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonRecord {
    query: String,
    document_id: String,
    standard: PipelineResult,
    agentic: PipelineResult,
    round_trip_ms: u64,
}

impl From<ComparisonRecord> for ComparisonResult {
    fn from(record: ComparisonRecord) -> Self {
        Self::new(
            record.query,
            record.document_id,
            record.standard,
            record.agentic,
            Duration::from_millis(record.round_trip_ms),
        )
    }
}
