//! Saving and loading benchmark run reports.
//!
//! A report is an export of finished comparisons, written on request.
//! Session state itself is never persisted.

use crate::dashboard::ComparisonView;
use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default filename for a run report.
pub const DEFAULT_REPORT_FILENAME: &str = "arag_report.json";

/// The document a report was run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub document_id: String,
    pub display_name: String,
}

/// Comparisons from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Backend the run talked to.
    pub backend: String,
    pub document: Option<ReportDocument>,
    pub comparisons: Vec<ComparisonView>,
}

impl Report {
    pub fn new(backend: impl Into<String>, document: Option<ReportDocument>) -> Self {
        Self {
            backend: backend.into(),
            document,
            comparisons: Vec::new(),
        }
    }

    pub fn push(&mut self, view: &ComparisonView) {
        self.comparisons.push(view.clone());
    }

    /// Number of comparisons where one side had to be substituted.
    pub fn partial_count(&self) -> usize {
        self.comparisons
            .iter()
            .filter(|view| view.result.is_partial())
            .count()
    }
}

/// Save a report as pretty-printed JSON.
pub fn save_report(report: &Report, path: &Path) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
    }

    let data = serde_json::to_string_pretty(report)
        .map_err(|e| BenchError::Serialization(e.to_string()))?;

    fs::write(path, data).map_err(|e| BenchError::io(path, e))?;

    Ok(())
}

/// Load a report from a file.
pub fn load_report(path: &Path) -> Result<Report> {
    if !path.exists() {
        return Err(BenchError::ReportNotFound(path.to_path_buf()));
    }

    let data = fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
    serde_json::from_str(&data).map_err(|e| BenchError::Serialization(e.to_string()))
}

/// Check if a report file exists at the given path.
pub fn report_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}
