//! A-RAG Bench - client core for benchmarking Standard RAG against Agentic RAG.
//!
//! A document is uploaded to the benchmark backend, then each question is
//! sent once and answered by both pipelines. The two answers and their
//! execution metrics are normalized into one comparable shape and turned
//! into chart rows.
//!
//! # Quick Start
//!
//! ```no_run
//! use arag_bench::{
//!     backend::{HttpBackend, UploadFile},
//!     config::Config,
//!     dashboard::Dashboard,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let backend = Arc::new(HttpBackend::new(config.backend)?);
//!     let dashboard = Dashboard::new(backend);
//!
//!     // Upload a document
//!     let file = UploadFile::from_path(Path::new("report.pdf"))?;
//!     dashboard.upload(&file).await?;
//!
//!     // Ask both pipelines
//!     let view = dashboard.ask("What is the summary?").await?;
//!     println!("Standard: {}", view.result.standard().answer);
//!     println!("Agentic:  {}", view.result.agentic().answer);
//!     print!("{}", view.chart.render_table());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **normalizer**: raw backend JSON → `PipelineResult`
//! - **session**: `DocumentSessionManager`, the generation-tagged active document
//! - **orchestrator**: `ComparisonOrchestrator`, the single dual-pipeline call
//! - **metrics**: `ComparisonResult` → `ChartSeries`
//! - **dashboard**: the three wired together for one session

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod model;
pub mod normalizer;
pub mod orchestrator;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use backend::{Backend, HttpBackend, UploadFile};
pub use config::Config;
pub use dashboard::{ComparisonView, Dashboard};
pub use error::{BenchError, ErrorKind, Result};
pub use metrics::{ChartRow, ChartSeries, MetricKey, aggregate};
pub use model::{ComparisonResult, Metric, PipelineMetrics, PipelineResult, Variant};
pub use normalizer::normalize;
pub use orchestrator::ComparisonOrchestrator;
pub use report::{Report, load_report, save_report};
pub use session::{DocumentSession, DocumentSessionManager, SessionStatus, UploadCompletion};
