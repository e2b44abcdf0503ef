//! The parsed document set of one run.
//!
//! Every stylesheet and script is parsed up front. Documents are addressed by
//! index newtypes; the patch layer sees them as [`FileId`]s, stylesheets
//! first, then scripts.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use modulize_core::files::SourceFile;
use modulize_core::patch::FileId;
use modulize_css::{parse_stylesheet, Stylesheet};
use modulize_js::{parse_script, source_type_for, ScriptDocument};

use crate::migrate::MigrateError;

/// Index of a stylesheet in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StylesheetId(pub usize);

/// Index of a script in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(pub usize);

impl fmt::Display for StylesheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "css_{}", self.0)
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "js_{}", self.0)
    }
}

/// A parsed stylesheet with its source text.
#[derive(Debug, Clone)]
pub struct StylesheetDoc {
    pub source: String,
    pub sheet: Stylesheet,
}

impl StylesheetDoc {
    pub fn path(&self) -> &str {
        &self.sheet.path
    }
}

/// A parsed script with its source text.
#[derive(Debug, Clone)]
pub struct ScriptDoc {
    pub source: String,
    pub doc: ScriptDocument,
}

impl ScriptDoc {
    pub fn path(&self) -> &str {
        &self.doc.path
    }
}

/// All documents of a run.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub stylesheets: Vec<StylesheetDoc>,
    pub scripts: Vec<ScriptDoc>,
}

impl Corpus {
    /// Parse every document. Any parse failure aborts.
    ///
    /// Scripts whose extension is not a known script type are skipped.
    pub fn parse(stylesheets: &[SourceFile], scripts: &[SourceFile]) -> Result<Self, MigrateError> {
        let mut corpus = Corpus::default();

        for file in stylesheets {
            let sheet = parse_stylesheet(&file.path, &file.content)?;
            debug!(path = %file.path, rules = sheet.rules.len(), "parsed stylesheet");
            corpus.stylesheets.push(StylesheetDoc {
                source: file.content.clone(),
                sheet,
            });
        }

        for file in scripts {
            if source_type_for(&file.path).is_err() {
                warn!(path = %file.path, "skipping file with unknown script type");
                continue;
            }
            let doc = parse_script(&file.path, &file.content)?;
            debug!(
                path = %file.path,
                literals = doc.literals.len(),
                imports = doc.imports.len(),
                "parsed script"
            );
            corpus.scripts.push(ScriptDoc {
                source: file.content.clone(),
                doc,
            });
        }

        Ok(corpus)
    }

    pub fn stylesheet(&self, id: StylesheetId) -> &StylesheetDoc {
        &self.stylesheets[id.0]
    }

    pub fn script(&self, id: ScriptId) -> &ScriptDoc {
        &self.scripts[id.0]
    }

    pub fn stylesheet_ids(&self) -> impl Iterator<Item = StylesheetId> {
        (0..self.stylesheets.len()).map(StylesheetId)
    }

    pub fn script_ids(&self) -> impl Iterator<Item = ScriptId> {
        (0..self.scripts.len()).map(ScriptId)
    }

    pub fn stylesheet_file_id(&self, id: StylesheetId) -> FileId {
        FileId::new(id.0 as u32)
    }

    pub fn script_file_id(&self, id: ScriptId) -> FileId {
        FileId::new((self.stylesheets.len() + id.0) as u32)
    }

    /// Original contents keyed by patch file id.
    pub fn contents(&self) -> HashMap<FileId, String> {
        let sheets = self
            .stylesheet_ids()
            .map(|id| (self.stylesheet_file_id(id), self.stylesheet(id).source.clone()));
        let scripts = self
            .script_ids()
            .map(|id| (self.script_file_id(id), self.script(id).source.clone()));
        sheets.chain(scripts).collect()
    }

    /// Paths keyed by patch file id.
    pub fn file_paths(&self) -> Vec<(FileId, String)> {
        let sheets = self
            .stylesheet_ids()
            .map(|id| (self.stylesheet_file_id(id), self.stylesheet(id).path().to_string()));
        let scripts = self
            .script_ids()
            .map(|id| (self.script_file_id(id), self.script(id).path().to_string()));
        sheets.chain(scripts).collect()
    }
}
