//! CLI front door.
//!
//! Provides the helpers `main.rs` drives:
//! - [`run_migrate`] - discover documents, plan the migration, optionally write it
//! - [`render`] - turn a report into the requested output format
//!
//! ## Error Handling
//!
//! All functions return `Result<T, ModulizeError>`. Subsystem errors convert
//! through the bridges in `error_bridges`, so exit codes stay stable.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use modulize_core::error::ModulizeError;
use modulize_core::files::collect_files;
use modulize_core::output::{Summary, SCHEMA_VERSION};

use crate::apply::apply_report;
use crate::migrate::{migrate, MigrateOptions, MigrateReport, RenameRecord};

/// Output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON response (default).
    #[default]
    Json,
    /// Unified diff of every planned edit.
    Diff,
    /// Brief text summary.
    Summary,
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct MigrateRequest {
    /// Directory the globs are matched under.
    pub root: PathBuf,
    /// Stylesheet glob.
    pub css: String,
    /// Script glob.
    pub js: String,
    /// Plan only; write nothing.
    pub dry_run: bool,
    pub options: MigrateOptions,
}

/// Response printed after changes were written.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResponse {
    pub status: String,
    pub schema_version: String,
    pub applied: bool,
    pub files_written: Vec<String>,
    pub renames: Vec<RenameRecord>,
    pub summary: Summary,
}

impl ApplyResponse {
    fn from_report(report: &MigrateReport) -> Self {
        ApplyResponse {
            status: report.status.clone(),
            schema_version: SCHEMA_VERSION.to_string(),
            applied: report.applied.unwrap_or(false),
            files_written: report.files_written.clone().unwrap_or_default(),
            renames: report.renames.clone(),
            summary: report.summary.edits.clone(),
        }
    }
}

/// Run a migration.
///
/// Options are validated before any file is read. Unless `dry_run` is set,
/// the planned changes are written under `root` and the report records the
/// paths written.
pub fn run_migrate(request: &MigrateRequest) -> Result<MigrateReport, ModulizeError> {
    request.options.validate()?;

    let stylesheets = collect_files(&request.root, &request.css)?;
    if stylesheets.is_empty() {
        return Err(ModulizeError::NoDocumentsMatched {
            kind: "stylesheet".to_string(),
            pattern: request.css.clone(),
        });
    }
    let scripts = collect_files(&request.root, &request.js)?;
    if scripts.is_empty() {
        return Err(ModulizeError::NoDocumentsMatched {
            kind: "script".to_string(),
            pattern: request.js.clone(),
        });
    }

    let mut report = migrate(&stylesheets, &scripts, &request.options)?;
    if request.dry_run {
        return Ok(report);
    }

    let written = apply_report(&request.root, &report)?;
    info!(files = written.len(), "changes written");
    report.applied = Some(true);
    report.files_written = Some(written);
    Ok(report)
}

/// Render a report.
pub fn render(report: &MigrateReport, format: OutputFormat) -> Result<String, ModulizeError> {
    match format {
        OutputFormat::Json => {
            let json = if report.applied == Some(true) {
                serde_json::to_string_pretty(&ApplyResponse::from_report(report))
            } else {
                serde_json::to_string_pretty(report)
            };
            json.map_err(|e| ModulizeError::internal(format!("JSON serialization error: {}", e)))
        }
        OutputFormat::Diff => {
            if report.patch.unified_diff.is_empty() {
                Ok("No changes.".to_string())
            } else {
                Ok(report.patch.unified_diff.trim_end().to_string())
            }
        }
        OutputFormat::Summary => Ok(summary_text(report)),
    }
}

fn summary_text(report: &MigrateReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} classes: {} shared, {} convertible ({} top-level only)",
        summary.classes_total,
        summary.classes_shared,
        summary.classes_convertible,
        summary.classes_top_level
    );
    let _ = writeln!(
        out,
        "{} classes renamed, {} stylesheets renamed, {} scripts changed",
        summary.classes_renamed, summary.stylesheets_renamed, summary.scripts_changed
    );
    for rename in &report.renames {
        let _ = writeln!(out, "  {} -> {}", rename.from, rename.to);
    }
    let verb = if report.applied == Some(true) {
        "applied"
    } else {
        "planned"
    };
    let _ = write!(
        out,
        "{} edits {} across {} files",
        summary.edits.edits_count, verb, summary.edits.files_changed
    );
    out
}
