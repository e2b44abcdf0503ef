//! Document discovery.
//!
//! Stylesheets and scripts are selected with a glob matched against paths
//! relative to a root directory. Hidden directories and `node_modules` are
//! never traversed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use serde_json::json;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::error::ModulizeError;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// Root directory not found.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// Invalid glob pattern syntax.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// IO error.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

impl From<FileError> for ModulizeError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound { path } => ModulizeError::FileNotFound { path },
            FileError::InvalidPattern { pattern, message } => ModulizeError::InvalidArguments {
                message: format!("invalid pattern '{}': {}", pattern, message),
                details: Some(json!({ "pattern": pattern })),
            },
            FileError::Io { path, source } => ModulizeError::InternalError {
                message: format!("IO error reading {}: {}", path, source),
            },
        }
    }
}

/// A discovered document with its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Root-relative path with `/` separators.
    pub path: String,
    /// Full file content.
    pub content: String,
}

// ============================================================================
// Discovery
// ============================================================================

/// Compile a discovery pattern.
///
/// `*` does not cross directory separators; use `**` for that. A leading
/// `./` is ignored.
pub fn compile_pattern(pattern: &str) -> FileResult<GlobMatcher> {
    let normalized = pattern.strip_prefix("./").unwrap_or(pattern);
    GlobBuilder::new(normalized)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| FileError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Collect every file under `root` whose relative path matches `pattern`.
///
/// Files are returned sorted by path so document ids are deterministic.
pub fn collect_files(root: &Path, pattern: &str) -> FileResult<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(FileError::NotFound {
            path: root.display().to_string(),
        });
    }
    let matcher = compile_pattern(pattern)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = to_slash_path(rel_path);
        if !matcher.is_match(&rel) {
            continue;
        }
        let content = fs::read_to_string(entry.path()).map_err(|source| FileError::Io {
            path: rel.clone(),
            source,
        })?;
        files.push(SourceFile { path: rel, content });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(pattern, count = files.len(), "collected documents");
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}

/// Render a relative path with `/` separators.
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a root-relative `/` path onto `root`.
pub fn resolve_under(root: &Path, rel: &str) -> PathBuf {
    rel.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = resolve_under(root, rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn collects_matching_files_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/b.css", ".b {}");
        write(dir.path(), "src/a.css", ".a {}");
        write(dir.path(), "src/a.js", "");

        let files = collect_files(dir.path(), "src/**/*.css").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.css", "src/b.css"]);
        assert_eq!(files[0].content, ".a {}");
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.css", "");
        write(dir.path(), "nested/b.css", "");

        let files = collect_files(dir.path(), "*.css").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.css");
    }

    #[test]
    fn skips_hidden_and_node_modules() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/lib/x.css", "");
        write(dir.path(), ".cache/y.css", "");
        write(dir.path(), "ok/z.css", "");

        let files = collect_files(dir.path(), "**/*.css").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["ok/z.css"]);
    }

    #[test]
    fn leading_dot_slash_is_ignored() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.js", "");
        let files = collect_files(dir.path(), "./*.js").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_files(dir.path(), "src/[").unwrap_err();
        assert!(matches!(err, FileError::InvalidPattern { .. }));
    }

    #[test]
    fn missing_root_is_not_found() {
        let err = collect_files(Path::new("/definitely/not/here"), "*.css").unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
    }

    #[test]
    fn errors_map_to_exit_codes() {
        let dir = TempDir::new().unwrap();
        let pattern = ModulizeError::from(collect_files(dir.path(), "src/[").unwrap_err());
        assert_eq!(pattern.error_code().code(), 2);
        let missing = ModulizeError::from(FileError::NotFound {
            path: "nope".to_string(),
        });
        assert_eq!(missing.error_code().code(), 3);
    }
}
