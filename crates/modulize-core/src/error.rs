//! Error types and error code constants for modulize.
//!
//! This module provides a unified error type (`ModulizeError`) that bridges
//! domain-specific errors from the subsystems (stylesheet parsing, script
//! parsing, discovery, migration, apply) into a common format suitable for
//! JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, no documents matched)
//! - `4`: Apply errors (failed to write or rename)
//! - `6`: Parse errors (a stylesheet or script could not be parsed)
//! - `7`: Invariant violations (the corpus broke a migration invariant)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller.
    InvalidArguments = 2,
    /// Resolution errors (file not found, nothing matched a glob).
    ResolutionError = 3,
    /// Apply errors (failed to write changes or rename files).
    ApplyError = 4,
    /// A document could not be parsed.
    ParseError = 6,
    /// A migration invariant was violated.
    InvariantViolation = 7,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// All subsystem errors are converted to this type before being rendered as
/// JSON output. Each variant carries enough context for a helpful message and
/// an optional `details` payload.
#[derive(Debug, Error)]
pub enum ModulizeError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// An identifier given on the command line is not usable.
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A discovery pattern matched no documents.
    #[error("no {kind} documents matched '{pattern}'")]
    NoDocumentsMatched { kind: String, pattern: String },

    /// A document failed to parse.
    #[error("parse error in {file}:{line}:{col}: {message}")]
    ParseError {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// The corpus violated a migration invariant.
    #[error("invariant violation: {message}")]
    InvariantViolation {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ModulizeError> for OutputErrorCode {
    fn from(err: &ModulizeError) -> Self {
        match err {
            ModulizeError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ModulizeError::InvalidIdentifier { .. } => OutputErrorCode::InvalidArguments,
            ModulizeError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            ModulizeError::NoDocumentsMatched { .. } => OutputErrorCode::ResolutionError,
            ModulizeError::ParseError { .. } => OutputErrorCode::ParseError,
            ModulizeError::InvariantViolation { .. } => OutputErrorCode::InvariantViolation,
            ModulizeError::ApplyError { .. } => OutputErrorCode::ApplyError,
            ModulizeError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ModulizeError> for OutputErrorCode {
    fn from(err: ModulizeError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ModulizeError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ModulizeError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        ModulizeError::FileNotFound { path: path.into() }
    }

    /// Create an invariant violation with JSON details.
    pub fn invariant(message: impl Into<String>, details: serde_json::Value) -> Self {
        ModulizeError::InvariantViolation {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ModulizeError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
