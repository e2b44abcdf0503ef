//! Script front end for modulize.
//!
//! Parses JavaScript/TypeScript (with JSX) using `oxc_parser` and extracts an
//! owned model of everything the migration engine needs: literal text
//! segments that may hold class names, import declarations, bound names and
//! where a new import would go. Nothing from the arena AST escapes this
//! crate.

mod collect;

use std::collections::BTreeSet;

use oxc_allocator::Allocator;
use oxc_ast::ast::Statement;
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use serde_json::json;
use thiserror::Error;

use modulize_core::error::ModulizeError;
use modulize_core::patch::Span;
use modulize_core::text::byte_offset_to_position_str;

use crate::collect::Collector;

/// Error type for script parsing.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The file extension is not a known script type.
    #[error("unsupported script type: {path}")]
    UnsupportedExtension { path: String },

    /// The parser reported diagnostics.
    #[error("{path}:{line}:{col}: {message}")]
    Parse {
        path: String,
        line: u32,
        col: u32,
        message: String,
    },
}

impl From<ScriptError> for ModulizeError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::Parse {
                path,
                line,
                col,
                message,
            } => ModulizeError::ParseError {
                file: path,
                line,
                col,
                message,
            },
            ScriptError::UnsupportedExtension { path } => ModulizeError::InvalidArguments {
                message: format!("unsupported script type: {}", path),
                details: Some(json!({ "path": path })),
            },
        }
    }
}

/// How a literal's text is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// A quoted string literal.
    Plain { quote: char },
    /// One text segment of a template literal.
    TemplateQuasi,
}

/// Where a literal sits syntactically; decides how a replacement is spliced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralContext {
    /// Any expression position.
    Expression,
    /// The value of a JSX attribute (`className="..."`).
    JsxAttributeValue,
    /// A non-computed property key (`{ "is-active": cond }`).
    PropertyKey,
}

/// A literal text segment that may contain class names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    /// The full literal (quotes included) for plain strings; the text range for quasis.
    pub span: Span,
    /// The text between the delimiters.
    pub text_span: Span,
    /// Source text of `text_span`.
    pub text: String,
    pub context: LiteralContext,
}

/// An import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub span: Span,
    /// The module specifier, as written between the quotes.
    pub source: String,
    /// Span of the specifier string, quotes included.
    pub source_span: Span,
    pub quote: char,
    /// The declaration binds at least one name.
    pub has_specifiers: bool,
}

/// The owned model of one parsed script.
#[derive(Debug, Clone)]
pub struct ScriptDocument {
    pub path: String,
    /// Candidate literals in document order.
    pub literals: Vec<Literal>,
    pub imports: Vec<ImportDecl>,
    /// Every name introduced by a binding anywhere in the document.
    pub bindings: BTreeSet<String>,
    /// Offset where new import declarations are inserted.
    pub insertion_point: usize,
    /// The first statement is an import declaration.
    pub first_is_import: bool,
    /// Quote usage of string literals outside JSX attributes.
    pub single_quotes: usize,
    pub double_quotes: usize,
}

/// Source type for a script path.
///
/// Plain JavaScript files are parsed with JSX enabled.
pub fn source_type_for(path: &str) -> Result<SourceType, ScriptError> {
    let source_type =
        SourceType::from_path(path).map_err(|_| ScriptError::UnsupportedExtension {
            path: path.to_string(),
        })?;
    if source_type.is_javascript() {
        Ok(source_type.with_jsx(true))
    } else {
        Ok(source_type)
    }
}

/// Parse a script and extract its model.
pub fn parse_script(path: &str, source: &str) -> Result<ScriptDocument, ScriptError> {
    let source_type = source_type_for(path)?;
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let offset = ret
            .errors
            .first()
            .and_then(|e| e.labels.as_ref())
            .and_then(|labels| labels.first())
            .map(|label| label.offset())
            .unwrap_or(0);
        let (line, col) = byte_offset_to_position_str(source, offset);
        let message = if ret.errors.is_empty() {
            "parser aborted".to_string()
        } else {
            ret.errors
                .iter()
                .map(|e| e.message.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        };
        return Err(ScriptError::Parse {
            path: path.to_string(),
            line,
            col,
            message,
        });
    }

    let program = &ret.program;
    let mut collector = Collector::new(source);
    collector.visit_program(program);

    let insertion_point = match (program.body.first(), program.directives.last()) {
        (Some(first), _) => first.span().start as usize,
        (None, Some(directive)) => directive.span.end as usize,
        (None, None) => 0,
    };
    let first_is_import = matches!(program.body.first(), Some(Statement::ImportDeclaration(_)));

    Ok(collector.finish(path, insertion_point, first_is_import))
}
