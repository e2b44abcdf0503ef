//! Writing a migration to disk.
//!
//! Rename targets are checked first, then every changed document is
//! overwritten in place, then stylesheets are renamed. Nothing is written if
//! a rename target already exists.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use modulize_core::files::resolve_under;

use crate::migrate::MigrateReport;

/// Errors from the write step.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// A stylesheet cannot be renamed over an existing file.
    #[error("rename target already exists: {path}")]
    TargetExists { path: String },

    /// Writing a document failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Renaming a stylesheet failed.
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for the write step.
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Write `report` under `root`.
///
/// Returns the paths written, stylesheets under their new names.
pub fn apply_report(root: &Path, report: &MigrateReport) -> ApplyResult<Vec<String>> {
    for rename in &report.renames {
        if rename.from != rename.to && resolve_under(root, &rename.to).exists() {
            return Err(ApplyError::TargetExists {
                path: rename.to.clone(),
            });
        }
    }

    info!(
        scripts = report.scripts.len(),
        stylesheets = report.stylesheets.len(),
        "rewriting files"
    );
    let mut written = Vec::new();
    for doc in report.scripts.iter().chain(&report.stylesheets) {
        fs::write(resolve_under(root, &doc.path), &doc.content).map_err(|source| {
            ApplyError::Write {
                path: doc.path.clone(),
                source,
            }
        })?;
        debug!(path = %doc.path, "wrote file");
        written.push(doc.path.clone());
    }

    for rename in &report.renames {
        fs::rename(resolve_under(root, &rename.from), resolve_under(root, &rename.to)).map_err(
            |source| ApplyError::Rename {
                from: rename.from.clone(),
                to: rename.to.clone(),
                source,
            },
        )?;
        debug!(from = %rename.from, to = %rename.to, "renamed stylesheet");
        if let Some(entry) = written.iter_mut().find(|p| **p == rename.from) {
            *entry = rename.to.clone();
        }
    }

    Ok(written)
}
