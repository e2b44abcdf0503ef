//! Error bridge implementations for subsystem errors.
//!
//! This module provides `impl From<X> for ModulizeError` conversions from the
//! engine's validation, migration and write errors to the unified
//! `ModulizeError` type that drives JSON output and exit codes.
//!
//! The front ends and discovery bridge their own errors next to their
//! definitions (`modulize_css::CssError`, `modulize_js::ScriptError`,
//! `modulize_core::files::FileError`).

use serde_json::json;

use modulize_core::error::ModulizeError;

use crate::apply::ApplyError;
use crate::migrate::MigrateError;
use crate::naming::ValidationError;

// ============================================================================
// Bridge: validation -> ModulizeError
// ============================================================================

impl From<ValidationError> for ModulizeError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidName { name, reason } => {
                ModulizeError::InvalidIdentifier { name, reason }
            }
        }
    }
}

// ============================================================================
// Bridge: MigrateError -> ModulizeError
// ============================================================================

impl From<MigrateError> for ModulizeError {
    fn from(err: MigrateError) -> Self {
        match err {
            MigrateError::InvalidOption(validation_err) => ModulizeError::from(validation_err),
            MigrateError::Stylesheet(css_err) => ModulizeError::from(css_err),
            MigrateError::Script(script_err) => ModulizeError::from(script_err),
            MigrateError::SharedClass { class, paths } => ModulizeError::invariant(
                format!(
                    "class \"{}\" was found in more than one stylesheet: {}",
                    class,
                    paths.join(", ")
                ),
                json!({ "class": class, "paths": paths }),
            ),
            MigrateError::MissingBinding { class, script } => ModulizeError::invariant(
                format!("no import identifier for class \"{}\" in {}", class, script),
                json!({ "class": class, "script": script }),
            ),
            MigrateError::MissingRename { class, script } => ModulizeError::invariant(
                format!("class \"{}\" used in {} has no new name", class, script),
                json!({ "class": class, "script": script }),
            ),
            MigrateError::ConflictingEdits { conflicts } => ModulizeError::InternalError {
                message: format!("conflicting edits: {}", conflicts.join("; ")),
            },
        }
    }
}

// ============================================================================
// Bridge: ApplyError -> ModulizeError
// ============================================================================

impl From<ApplyError> for ModulizeError {
    fn from(err: ApplyError) -> Self {
        let message = err.to_string();
        let file = match err {
            ApplyError::TargetExists { path } => path,
            ApplyError::Write { path, .. } => path,
            ApplyError::Rename { from, .. } => from,
        };
        ModulizeError::ApplyError {
            message,
            file: Some(file),
        }
    }
}
