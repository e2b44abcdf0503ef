//! Script rewriting.
//!
//! Matched literals become property accesses on the style module binding;
//! literals mixing matched and unmatched words become template literals that
//! keep the original spacing. Each (script, stylesheet) binding is backed by
//! an import: an existing side-effect import of the stylesheet is claimed
//! when there is one, otherwise a new default import is inserted.

use std::collections::HashSet;

use tracing::debug;

use modulize_core::patch::{FileId, PatchSet, Span};
use modulize_core::paths::{file_name, module_path, relative_import_path, resolve_import_source};
use modulize_js::{ImportDecl, Literal, LiteralContext, LiteralKind, ScriptDocument};

use crate::allocator::{Binding, IdentifierAllocator};
use crate::corpus::{Corpus, ScriptId, StylesheetId};
use crate::migrate::{MigrateError, MigrateOptions, QuoteStyle};
use crate::naming::is_identifier_name;
use crate::rewrite::stylesheet::ClassRenames;
use crate::scanner::{LiteralMatch, UsageScan, Word};

/// Quote a string value.
pub fn string_literal(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// `object.name`, or `object["name"]` when `name` is not an identifier name.
pub fn property_access(object: &str, name: &str, quote: char) -> String {
    if is_identifier_name(name) {
        format!("{}.{}", object, name)
    } else {
        format!("{}[{}]", object, string_literal(name, quote))
    }
}

/// Make literal source text safe inside a template literal.
///
/// JS string escapes are kept as written. Text from a JSX attribute has no
/// escapes, so its backslashes are doubled.
pub fn escape_template_text(text: &str, from_jsx: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if from_jsx => out.push_str("\\\\"),
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out
}

/// Rewrites scripts from the scan result.
pub struct ScriptRewriter<'a> {
    corpus: &'a Corpus,
    renames: &'a ClassRenames,
    identifiers: &'a IdentifierAllocator,
    options: &'a MigrateOptions,
}

impl<'a> ScriptRewriter<'a> {
    pub fn new(
        corpus: &'a Corpus,
        renames: &'a ClassRenames,
        identifiers: &'a IdentifierAllocator,
        options: &'a MigrateOptions,
    ) -> Self {
        ScriptRewriter {
            corpus,
            renames,
            identifiers,
            options,
        }
    }

    /// Queue the edits for every script.
    pub fn rewrite_all(&self, scan: &UsageScan, patch: &mut PatchSet) -> Result<(), MigrateError> {
        for script in self.corpus.script_ids() {
            let matches = scan
                .scripts
                .iter()
                .find(|m| m.script == script)
                .map(|m| m.literals.as_slice())
                .unwrap_or_default();
            self.rewrite_script(script, matches, patch)?;
        }
        Ok(())
    }

    fn rewrite_script(
        &self,
        script: ScriptId,
        matches: &[LiteralMatch],
        patch: &mut PatchSet,
    ) -> Result<(), MigrateError> {
        let doc = &self.corpus.script(script).doc;
        let source = &self.corpus.script(script).source;
        let file_id = self.corpus.script_file_id(script);
        let quote = self.new_string_quote(doc);

        for m in matches {
            let literal = &doc.literals[m.literal];
            let text = self.replacement(script, literal, &m.words, quote)?;
            patch.replace(file_id, source, literal.span, text, "class reference");
        }

        let target = ScriptTarget {
            doc,
            source,
            file_id,
            quote,
        };
        self.rewrite_imports(script, &target, patch);
        Ok(())
    }

    fn replacement(
        &self,
        script: ScriptId,
        literal: &Literal,
        words: &[Word],
        quote: char,
    ) -> Result<String, MigrateError> {
        if literal.kind == LiteralKind::TemplateQuasi {
            return self.interpolate(script, words, None, quote);
        }

        let from_jsx = literal.context == LiteralContext::JsxAttributeValue;
        let expr = match words {
            [word] => self.access(script, word, quote)?,
            _ => format!(
                "`{}`",
                self.interpolate(script, words, Some(from_jsx), quote)?
            ),
        };
        Ok(match literal.context {
            LiteralContext::Expression => expr,
            LiteralContext::JsxAttributeValue => format!("{{{}}}", expr),
            LiteralContext::PropertyKey => format!("[{}]", expr),
        })
    }

    /// Template text for `words`: matched words become `${...}`.
    ///
    /// `escape` is `None` for text that already is template source, and
    /// `Some(from_jsx)` for text moved out of a string literal.
    fn interpolate(
        &self,
        script: ScriptId,
        words: &[Word],
        escape: Option<bool>,
        quote: char,
    ) -> Result<String, MigrateError> {
        let mut parts = Vec::with_capacity(words.len());
        for word in words {
            if word.is_match() {
                parts.push(format!("${{{}}}", self.access(script, word, quote)?));
            } else {
                parts.push(match escape {
                    Some(from_jsx) => escape_template_text(&word.text, from_jsx),
                    None => word.text.clone(),
                });
            }
        }
        Ok(parts.join(" "))
    }

    fn access(&self, script: ScriptId, word: &Word, quote: char) -> Result<String, MigrateError> {
        let script_path = || self.corpus.script(script).path().to_string();
        let identifier = word
            .owner
            .and_then(|owner| self.identifiers.get(script, owner))
            .ok_or_else(|| MigrateError::MissingBinding {
                class: word.text.clone(),
                script: script_path(),
            })?;
        let new_name = self
            .renames
            .new_name(&word.text)
            .ok_or_else(|| MigrateError::MissingRename {
                class: word.text.clone(),
                script: script_path(),
            })?;
        Ok(property_access(identifier, new_name, quote))
    }

    fn rewrite_imports(&self, script: ScriptId, target: &ScriptTarget<'_>, patch: &mut PatchSet) {
        let doc = target.doc;
        let marker = &self.options.module_marker;
        let mut claimed: HashSet<usize> = HashSet::new();
        let mut new_imports = String::new();

        for binding in self.identifiers.for_script(script) {
            let sheet_path = self.corpus.stylesheet(binding.stylesheet).path();
            match find_import(doc, sheet_path, &claimed) {
                Some(idx) => {
                    claimed.insert(idx);
                    self.claim_import(binding, &doc.imports[idx], target, patch);
                }
                None => {
                    let rel = relative_import_path(&doc.path, &module_path(sheet_path, marker));
                    debug!(path = %doc.path, identifier = %binding.identifier, source = %rel, "adding import");
                    new_imports.push_str(&format!(
                        "import {} from {};\n",
                        binding.identifier,
                        string_literal(&rel, target.quote)
                    ));
                }
            }
        }

        // Side-effect imports of renamed stylesheets must follow the rename.
        for (idx, import) in bare_imports(doc, &claimed) {
            let renamed = resolve_import_source(&doc.path, &import.source)
                .and_then(|path| self.touched_stylesheet(&path));
            if renamed.is_none() {
                continue;
            }
            let new_source = module_path(&import.source, marker);
            debug!(path = %doc.path, import = idx, source = %new_source, "repointing import");
            patch.replace(
                target.file_id,
                target.source,
                import.source_span,
                string_literal(&new_source, self.existing_quote(import.quote)),
                "repoint stylesheet import",
            );
        }

        if !new_imports.is_empty() {
            let point = doc.insertion_point;
            if point > 0 && !target.source[..point].ends_with('\n') {
                new_imports.insert(0, '\n');
            }
            if !doc.first_is_import {
                new_imports.push('\n');
            }
            patch.insert(
                target.file_id,
                target.source,
                point,
                new_imports,
                "import style module",
            );
        }
    }

    fn claim_import(
        &self,
        binding: &Binding,
        import: &ImportDecl,
        target: &ScriptTarget<'_>,
        patch: &mut PatchSet,
    ) {
        let new_source = module_path(&import.source, &self.options.module_marker);
        debug!(
            path = %target.doc.path,
            identifier = %binding.identifier,
            source = %new_source,
            "binding existing import"
        );
        let text = format!(
            "import {} from {}",
            binding.identifier,
            string_literal(&new_source, self.existing_quote(import.quote))
        );
        patch.replace(
            target.file_id,
            target.source,
            Span::new(import.span.start, import.source_span.end),
            text,
            "bind style module import",
        );
    }

    fn touched_stylesheet(&self, path: &str) -> Option<StylesheetId> {
        self.renames
            .touched()
            .iter()
            .copied()
            .find(|id| self.corpus.stylesheet(*id).path() == path)
    }

    /// Quote for strings that did not exist before.
    fn new_string_quote(&self, doc: &ScriptDocument) -> char {
        match self.options.quotes {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
            QuoteStyle::Auto if doc.double_quotes > doc.single_quotes => '"',
            QuoteStyle::Auto => '\'',
        }
    }

    /// Quote for a string that replaces one quoted with `original`.
    fn existing_quote(&self, original: char) -> char {
        match self.options.quotes {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
            QuoteStyle::Auto => original,
        }
    }
}

struct ScriptTarget<'a> {
    doc: &'a ScriptDocument,
    source: &'a str,
    file_id: FileId,
    quote: char,
}

fn bare_imports<'d>(
    doc: &'d ScriptDocument,
    claimed: &'d HashSet<usize>,
) -> impl Iterator<Item = (usize, &'d ImportDecl)> + 'd {
    doc.imports
        .iter()
        .enumerate()
        .filter(move |(idx, import)| !import.has_specifiers && !claimed.contains(idx))
}

/// An unclaimed side-effect import of the stylesheet at `sheet_path`.
///
/// An import resolving to the stylesheet wins over one that merely ends
/// with its file name.
fn find_import(doc: &ScriptDocument, sheet_path: &str, claimed: &HashSet<usize>) -> Option<usize> {
    let resolved = bare_imports(doc, claimed).find(|(_, import)| {
        resolve_import_source(&doc.path, &import.source).as_deref() == Some(sheet_path)
    });
    resolved
        .or_else(|| {
            bare_imports(doc, claimed)
                .find(|(_, import)| import.source.ends_with(file_name(sheet_path)))
        })
        .map(|(idx, _)| idx)
}
