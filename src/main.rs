//! A-RAG Bench CLI
//!
//! Upload a PDF and compare Standard RAG against Agentic RAG side by side.

use anyhow::{Context, Result};
use arag_bench::{
    backend::{Backend, HttpBackend, UploadFile},
    config::Config,
    dashboard::{ComparisonView, Dashboard},
    error::ErrorKind,
    model::{Metric, PipelineResult, Variant},
    report::{Report, ReportDocument, save_report},
    session::{DocumentSession, SessionStatus, UploadCompletion},
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// A-RAG Bench - compare Standard RAG and Agentic RAG on your own documents
#[derive(Parser)]
#[command(name = "arag-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document and compare both pipelines on each query
    Run {
        /// Path to the PDF document
        document: PathBuf,

        /// Queries to ask, in order
        #[arg(required = true)]
        queries: Vec<String>,

        /// Print comparisons as JSON instead of formatted text
        #[arg(long)]
        json: bool,

        /// Write a report of all comparisons to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a document and show the resulting session
    Upload {
        /// Path to the PDF document
        document: PathBuf,
    },

    /// Check that the backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            document,
            queries,
            json,
            output,
        } => cmd_run(document, queries, json, output).await,
        Commands::Upload { document } => cmd_upload(document).await,
        Commands::Health => cmd_health().await,
    }
}

fn load_backend() -> Result<HttpBackend> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    HttpBackend::new(config.backend).context("Failed to create HTTP client")
}

/// Upload and fail unless the session ends up active.
async fn upload_document(dashboard: &Dashboard, path: &Path) -> Result<DocumentSession> {
    let file = UploadFile::from_path(path).context("Failed to read document")?;

    eprintln!("Reading & indexing {}...", file.file_name);
    let completion = dashboard.upload(&file).await?;

    let session = match completion {
        UploadCompletion::Applied(session) => session,
        UploadCompletion::Stale { .. } => anyhow::bail!("Upload was superseded"),
    };

    if session.status() != SessionStatus::Active {
        anyhow::bail!(
            "{}",
            session.error().unwrap_or("Upload failed for an unknown reason")
        );
    }

    Ok(session)
}

async fn cmd_run(
    document: PathBuf,
    queries: Vec<String>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let backend = load_backend()?;
    let api_base = backend.api_base().to_string();
    let dashboard = Dashboard::new(Arc::new(backend));

    let session = upload_document(&dashboard, &document).await?;
    if !json {
        print_session(&session);
    }

    let mut report = Report::new(
        api_base,
        session
            .document_id()
            .zip(session.display_name())
            .map(|(id, name)| ReportDocument {
                document_id: id.to_string(),
                display_name: name.to_string(),
            }),
    );

    for query in &queries {
        match dashboard.ask(query).await {
            Ok(view) => {
                if !json {
                    print_view(&view);
                }
                report.push(&view);
            }
            Err(e) if e.kind() == ErrorKind::EmptyQuery => {
                eprintln!("Skipping empty query");
            }
            Err(e) => {
                eprintln!("Query \"{}\" failed: {}", query, e);
            }
        }
    }

    if json {
        let json_str = serde_json::to_string_pretty(&report.comparisons)
            .context("Failed to serialize comparisons")?;
        println!("{}", json_str);
    }

    if let Some(path) = output {
        save_report(&report, &path).context("Failed to save report")?;
        eprintln!(
            "Report saved to: {} ({} comparisons, {} partial)",
            path.display(),
            report.comparisons.len(),
            report.partial_count()
        );
    }

    if report.comparisons.is_empty() {
        anyhow::bail!("No comparison succeeded");
    }

    Ok(())
}

async fn cmd_upload(document: PathBuf) -> Result<()> {
    let dashboard = Dashboard::new(Arc::new(load_backend()?));
    let session = upload_document(&dashboard, &document).await?;
    print_session(&session);
    Ok(())
}

async fn cmd_health() -> Result<()> {
    let backend = load_backend()?;

    println!("Checking backend at {}...", backend.api_base());
    match backend.health().await {
        Ok(()) => println!("Backend is healthy!"),
        Err(e) => println!("Health check failed: {}", e),
    }

    Ok(())
}

fn print_session(session: &DocumentSession) {
    println!(
        "Active Document: {} ({})",
        session.display_name().unwrap_or("-"),
        session.document_id().unwrap_or("-")
    );
}

fn print_view(view: &ComparisonView) {
    let result = &view.result;

    println!();
    println!("Query: \"{}\"", result.query());
    if result.is_partial() {
        println!("(partial result: one pipeline returned no usable data)");
    }
    println!("{}", "─".repeat(60));

    for variant in [Variant::Standard, Variant::Agentic] {
        print_side(result.side(variant));
    }

    println!("Performance Comparison");
    print!("{}", view.chart.render_table());
    println!("Round trip: {:.2?}", result.round_trip());
    println!("{}", "─".repeat(60));
}

fn print_side(side: &PipelineResult) {
    println!("{}", side.variant);
    if let Some(error) = &side.diagnostics.backend_error {
        println!("  Error: {}", error);
    }
    if side.answer.is_empty() {
        println!("  (no answer)");
    } else {
        for line in side.answer.lines() {
            println!("  {}", line);
        }
    }

    if let Metric::Available(steps) = &side.metrics.intermediate_steps {
        println!("  Thought process:");
        for (i, step) in steps.iter().enumerate() {
            let preview: String = step.chars().take(120).collect();
            println!("    {:>2}. {}", i + 1, preview);
            if step.chars().count() > 120 {
                println!("        ...");
            }
        }
    }
    println!();
}
