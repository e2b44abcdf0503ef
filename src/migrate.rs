//! The migration pipeline.
//!
//! ```text
//! parse -> index -> classify -> scan + plan -> rewrite stylesheets
//!       -> rewrite scripts -> apply in memory -> report
//! ```
//!
//! [`migrate`] never touches the filesystem: it returns the rewritten
//! documents and the stylesheet renames as a [`MigrateReport`]. Writing them
//! is the job of [`crate::apply`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use modulize_core::files::SourceFile;
use modulize_core::output::{Patch, Summary, SCHEMA_VERSION};
use modulize_core::patch::{ApplyResult, PatchSet};
use modulize_core::paths::module_path;
use modulize_css::CssError;
use modulize_js::ScriptError;

use crate::allocator::IdentifierAllocator;
use crate::corpus::Corpus;
use crate::naming::{validate_js_identifier, validate_module_marker, ValidationError};
use crate::registry::{ClassRegistry, Classification};
use crate::rewrite::{rewrite_stylesheets, ClassRenames, ScriptRewriter};
use crate::scanner::{UsageScan, UsageScanner};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that abort a migration.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// An option value is not usable.
    #[error("invalid option: {0}")]
    InvalidOption(#[from] ValidationError),

    /// A stylesheet failed to parse.
    #[error("{0}")]
    Stylesheet(#[from] CssError),

    /// A script failed to parse.
    #[error("{0}")]
    Script(#[from] ScriptError),

    /// A class taken as convertible is declared in several stylesheets.
    #[error("class \"{class}\" was found in more than one stylesheet: {}", paths.join(", "))]
    SharedClass { class: String, paths: Vec<String> },

    /// A matched class has no import identifier for its script.
    #[error("no import identifier for class \"{class}\" in {script}")]
    MissingBinding { class: String, script: String },

    /// A matched class was never renamed.
    #[error("class \"{class}\" used in {script} has no new name")]
    MissingRename { class: String, script: String },

    /// Planned edits overlap.
    #[error("conflicting edits: {}", conflicts.join("; "))]
    ConflictingEdits { conflicts: Vec<String> },
}

/// Result type for migration.
pub type MigrateResult<T> = Result<T, MigrateError>;

// ============================================================================
// Options
// ============================================================================

/// Quote style for emitted strings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    Single,
    Double,
    /// Follow the document: keep a replaced string's quote, use the majority
    /// quote for new strings.
    #[default]
    Auto,
}

/// Run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateOptions {
    /// Base name for style module bindings.
    pub import_identifier: String,
    /// Segment inserted before the extension of renamed stylesheets.
    pub module_marker: String,
    pub quotes: QuoteStyle,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        MigrateOptions {
            import_identifier: "styles".to_string(),
            module_marker: "module".to_string(),
            quotes: QuoteStyle::Auto,
        }
    }
}

impl MigrateOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_js_identifier(&self.import_identifier)?;
        validate_module_marker(&self.module_marker)?;
        Ok(())
    }
}

// ============================================================================
// Report
// ============================================================================

/// A document and its rewritten content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenDocument {
    pub path: String,
    pub content: String,
}

/// A queued stylesheet rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub from: String,
    pub to: String,
}

/// A stylesheet declaring a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReport {
    pub path: String,
    pub top_level: bool,
    pub leading: bool,
    pub global: bool,
}

/// Classification outcome for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReport {
    pub name: String,
    pub convertible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    pub owners: Vec<OwnerReport>,
    pub usage_count: usize,
}

/// A style module binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingReport {
    pub script: String,
    pub stylesheet: String,
    pub identifier: String,
}

/// Counts for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrateSummary {
    #[serde(flatten)]
    pub edits: Summary,
    pub classes_total: usize,
    /// Classes declared in more than one stylesheet.
    pub classes_shared: usize,
    pub classes_convertible: usize,
    /// Convertible classes whose every appearance is a top-level rule.
    pub classes_top_level: usize,
    pub classes_renamed: usize,
    pub stylesheets_renamed: usize,
    pub scripts_changed: usize,
}

/// The result of a migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateReport {
    pub status: String,
    pub schema_version: String,
    /// Scripts whose content changed.
    pub scripts: Vec<RewrittenDocument>,
    /// Stylesheets queued for a rename, with their content.
    pub stylesheets: Vec<RewrittenDocument>,
    /// Renames in first-touch order.
    pub renames: Vec<RenameRecord>,
    pub classes: Vec<ClassReport>,
    pub bindings: Vec<BindingReport>,
    pub patch: Patch,
    pub summary: MigrateSummary,
    /// Whether changes were written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
    /// Paths written, after renames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_written: Option<Vec<String>>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Run the migration over the given documents.
pub fn migrate(
    stylesheets: &[SourceFile],
    scripts: &[SourceFile],
    options: &MigrateOptions,
) -> MigrateResult<MigrateReport> {
    options.validate()?;

    info!(
        stylesheets = stylesheets.len(),
        scripts = scripts.len(),
        "reading and parsing files"
    );
    let corpus = Corpus::parse(stylesheets, scripts)?;

    info!("walking documents");
    let registry = ClassRegistry::build(&corpus);
    let classes = Classification::classify(&registry);

    let mut renames = ClassRenames::new(&registry, &classes);
    let mut identifiers = IdentifierAllocator::new(&options.import_identifier);
    let scan = UsageScanner::new(&corpus, &registry, &classes).scan(&mut renames, &mut identifiers)?;

    let mut patch = PatchSet::new();
    for (file_id, path) in corpus.file_paths() {
        patch.register_file(file_id, path);
    }
    rewrite_stylesheets(&corpus, &renames, &mut patch);
    ScriptRewriter::new(&corpus, &renames, &identifiers, options).rewrite_all(&scan, &mut patch)?;
    debug!(edits = patch.edit_count(), "planned edits");

    let contents = corpus.contents();
    let mut modified = match patch.apply(&contents) {
        ApplyResult::Success { modified_files } => modified_files,
        ApplyResult::Failed { conflicts } => {
            return Err(MigrateError::ConflictingEdits {
                conflicts: conflicts.iter().map(ToString::to_string).collect(),
            })
        }
    };
    let materialized = patch.materialize(&contents);

    let mut changed_scripts = Vec::new();
    for id in corpus.script_ids() {
        let doc = corpus.script(id);
        if let Some(content) = modified.remove(&corpus.script_file_id(id)) {
            if content != doc.source {
                changed_scripts.push(RewrittenDocument {
                    path: doc.path().to_string(),
                    content,
                });
            }
        }
    }

    let mut changed_stylesheets = Vec::new();
    let mut rename_records = Vec::new();
    for &id in renames.touched() {
        let doc = corpus.stylesheet(id);
        let content = modified
            .remove(&corpus.stylesheet_file_id(id))
            .unwrap_or_else(|| doc.source.clone());
        changed_stylesheets.push(RewrittenDocument {
            path: doc.path().to_string(),
            content,
        });
        rename_records.push(RenameRecord {
            from: doc.path().to_string(),
            to: module_path(doc.path(), &options.module_marker),
        });
    }

    let class_reports = class_reports(&corpus, &registry, &classes, &renames, &scan);
    let bindings = identifiers
        .bindings()
        .iter()
        .map(|b| BindingReport {
            script: corpus.script(b.script).path().to_string(),
            stylesheet: corpus.stylesheet(b.stylesheet).path().to_string(),
            identifier: b.identifier.clone(),
        })
        .collect();

    let summary = MigrateSummary {
        edits: Summary::from_patch(&materialized),
        classes_total: registry.len(),
        classes_shared: registry.shared_count(),
        classes_convertible: classes.len(),
        classes_top_level: class_reports
            .iter()
            .filter(|c| c.convertible && c.owners.iter().all(|o| o.top_level))
            .count(),
        classes_renamed: renames.renamed().count(),
        stylesheets_renamed: rename_records.len(),
        scripts_changed: changed_scripts.len(),
    };
    info!(
        classes = summary.classes_renamed,
        stylesheets = summary.stylesheets_renamed,
        scripts = summary.scripts_changed,
        "migration planned"
    );

    Ok(MigrateReport {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        scripts: changed_scripts,
        stylesheets: changed_stylesheets,
        renames: rename_records,
        classes: class_reports,
        bindings,
        patch: materialized,
        summary,
        applied: None,
        files_written: None,
    })
}

fn class_reports(
    corpus: &Corpus,
    registry: &ClassRegistry,
    classes: &Classification,
    renames: &ClassRenames,
    scan: &UsageScan,
) -> Vec<ClassReport> {
    registry
        .records()
        .iter()
        .map(|record| ClassReport {
            name: record.name.clone(),
            convertible: classes.is_convertible(&record.name),
            new_name: renames.new_name(&record.name).map(str::to_string),
            owners: record
                .occurrences
                .iter()
                .map(|o| OwnerReport {
                    path: corpus.stylesheet(o.stylesheet).path().to_string(),
                    top_level: o.top_level,
                    leading: o.leading,
                    global: o.global,
                })
                .collect(),
            usage_count: scan.usage_count(&record.name),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    mod options {
        use super::*;

        #[test]
        fn defaults() {
            let options = MigrateOptions::default();
            assert_eq!(options.import_identifier, "styles");
            assert_eq!(options.module_marker, "module");
            assert_eq!(options.quotes, QuoteStyle::Auto);
            assert!(options.validate().is_ok());
        }

        #[test]
        fn invalid_identifier_is_rejected_before_parsing() {
            let options = MigrateOptions {
                import_identifier: "my-styles".to_string(),
                ..MigrateOptions::default()
            };
            // The stylesheet would fail to parse; validation comes first.
            let err = migrate(&[file("a.css", ".a {")], &[], &options).unwrap_err();
            assert!(matches!(err, MigrateError::InvalidOption(_)));
        }

        #[test]
        fn invalid_marker_is_rejected() {
            let options = MigrateOptions {
                module_marker: "a.b".to_string(),
                ..MigrateOptions::default()
            };
            assert!(options.validate().is_err());
        }
    }

    mod pipeline {
        use super::*;

        #[test]
        fn basic_scenario() {
            let report = migrate(
                &[file("a.css", ".foo {}")],
                &[file("a.js", "const A = <div className=\"foo\" />;\n")],
                &MigrateOptions::default(),
            )
            .unwrap();
            assert_eq!(
                report.renames,
                vec![RenameRecord {
                    from: "a.css".to_string(),
                    to: "a.module.css".to_string(),
                }]
            );
            assert_eq!(report.stylesheets[0].content, ".foo {}");
            assert_eq!(
                report.scripts[0].content,
                "import styles from './a.module.css';\n\nconst A = <div className={styles.foo} />;\n"
            );
            assert_eq!(report.bindings[0].identifier, "styles");
        }

        #[test]
        fn shared_class_changes_nothing() {
            let report = migrate(
                &[file("a.css", ".foo {}"), file("b.css", ".foo {}")],
                &[file("a.js", "const x = 'foo';\n")],
                &MigrateOptions::default(),
            )
            .unwrap();
            assert!(report.renames.is_empty());
            assert!(report.scripts.is_empty());
            assert!(report.stylesheets.is_empty());
            assert!(report.patch.edits.is_empty());
            assert_eq!(report.summary.classes_shared, 1);
        }

        #[test]
        fn unchanged_scripts_are_omitted() {
            let report = migrate(
                &[file("a.css", ".foo {}")],
                &[
                    file("a.js", "const x = 'foo';\n"),
                    file("b.js", "const y = 'other';\n"),
                ],
                &MigrateOptions::default(),
            )
            .unwrap();
            let paths: Vec<_> = report.scripts.iter().map(|d| d.path.as_str()).collect();
            assert_eq!(paths, vec!["a.js"]);
        }

        #[test]
        fn class_report_carries_flags() {
            let report = migrate(
                &[file("a.scss", ".card { .title {} }\n.x .card {}\n")],
                &[file("a.js", "const x = 'title';\n")],
                &MigrateOptions::default(),
            )
            .unwrap();
            let title = report.classes.iter().find(|c| c.name == "title").unwrap();
            assert!(title.convertible);
            assert_eq!(title.new_name.as_deref(), Some("title"));
            assert!(!title.owners[0].top_level);
            assert_eq!(title.usage_count, 1);

            let card = report.classes.iter().find(|c| c.name == "card").unwrap();
            assert!(card.owners[0].top_level);
            assert!(!card.owners[0].leading);
            assert_eq!(card.new_name, None);

            assert_eq!(
                report.stylesheets[0].content,
                ":global(.card) { .title {} }\n:global(.x) :global(.card) {}\n"
            );
        }

        #[test]
        fn report_serializes_status_first() {
            let report = migrate(&[], &[], &MigrateOptions::default()).unwrap();
            let json = serde_json::to_string(&report).unwrap();
            assert!(json.starts_with("{\"status\":\"ok\",\"schema_version\":\"1\""));
            assert!(!json.contains("\"applied\""));
        }
    }
}
