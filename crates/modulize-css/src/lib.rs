//! Stylesheet front end for modulize.
//!
//! Parses CSS and SCSS documents into the rule and class-token model the
//! migration engine consumes. The parse is observational: it never rewrites
//! source text, so every token carries the byte spans an edit needs.

pub mod scanner;
pub mod selector;

use thiserror::Error;

use modulize_core::error::ModulizeError;
use modulize_core::patch::Span;
use modulize_core::text::byte_offset_to_position_str;

pub use selector::{escape_ident, ClassToken};

/// Stylesheet dialect, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Css,
    Scss,
}

impl Syntax {
    /// `.scss` and `.sass` get SCSS handling, everything else is plain CSS.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".scss") || lower.ends_with(".sass") {
            Syntax::Scss
        } else {
            Syntax::Css
        }
    }
}

/// Error type for stylesheet parsing.
#[derive(Debug, Error)]
pub enum CssError {
    /// Malformed block structure.
    #[error("{path}:{line}:{col}: {message}")]
    Syntax {
        path: String,
        line: u32,
        col: u32,
        message: String,
    },
}

impl From<CssError> for ModulizeError {
    fn from(err: CssError) -> Self {
        match err {
            CssError::Syntax {
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
        }
    }
}

/// One selector of a rule's selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub span: Span,
    pub classes: Vec<ClassToken>,
}

/// A style rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Span of the whole selector list.
    pub selector_span: Span,
    /// Not nested inside any rule or at-rule.
    pub top_level: bool,
    pub selectors: Vec<Selector>,
}

/// A parsed stylesheet.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub path: String,
    pub syntax: Syntax,
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Every class token with the rule it belongs to, in document order.
    pub fn class_tokens(&self) -> impl Iterator<Item = (&Rule, &ClassToken)> {
        self.rules.iter().flat_map(|rule| {
            rule.selectors
                .iter()
                .flat_map(move |sel| sel.classes.iter().map(move |token| (rule, token)))
        })
    }
}

/// Parse a stylesheet.
pub fn parse_stylesheet(path: &str, source: &str) -> Result<Stylesheet, CssError> {
    let syntax = Syntax::from_path(path);
    let raw_rules = scanner::scan_rules(source, syntax).map_err(|e| {
        let (line, col) = byte_offset_to_position_str(source, e.offset);
        CssError::Syntax {
            path: path.to_string(),
            line,
            col,
            message: e.message,
        }
    })?;

    let rules = raw_rules
        .into_iter()
        .map(|raw| {
            let list = &source[raw.prelude.start..raw.prelude.end];
            let selectors = scanner::split_selectors(list, raw.prelude.start)
                .into_iter()
                .map(|span| Selector {
                    span,
                    classes: selector::class_tokens(&source[span.start..span.end], span.start),
                })
                .collect();
            Rule {
                selector_span: raw.prelude,
                top_level: raw.top_level,
                selectors,
            }
        })
        .collect();

    Ok(Stylesheet {
        path: path.to_string(),
        syntax,
        rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_from_extension() {
        assert_eq!(Syntax::from_path("a.css"), Syntax::Css);
        assert_eq!(Syntax::from_path("a/b.SCSS"), Syntax::Scss);
        assert_eq!(Syntax::from_path("a.sass"), Syntax::Scss);
    }

    #[test]
    fn tokens_carry_document_spans() {
        let src = "body { x: y }\n.a, p .b { x: y }\n";
        let sheet = parse_stylesheet("a.css", src).unwrap();
        let tokens: Vec<_> = sheet.class_tokens().map(|(_, t)| t.clone()).collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(&src[tokens[0].span.start..tokens[0].span.end], ".a");
        assert_eq!(&src[tokens[1].ident_span.start..tokens[1].ident_span.end], "b");
        assert!(tokens[0].leading);
        assert!(!tokens[1].leading);
    }

    #[test]
    fn top_level_follows_rule() {
        let src = ".a { .b { } }\n@media print { .c { } }";
        let sheet = parse_stylesheet("a.scss", src).unwrap();
        let flags: Vec<_> = sheet
            .class_tokens()
            .map(|(rule, t)| (t.name.as_str(), rule.top_level))
            .collect();
        assert_eq!(flags, vec![("a", true), ("b", false), ("c", false)]);
    }

    #[test]
    fn syntax_error_reports_line_and_col() {
        let err = parse_stylesheet("x.css", ".a {}\n.b {").unwrap_err();
        let CssError::Syntax { line, col, .. } = err;
        assert_eq!((line, col), (2, 4));
    }

    #[test]
    fn syntax_error_becomes_parse_error() {
        let err = ModulizeError::from(parse_stylesheet("x.css", ".b {").unwrap_err());
        assert_eq!(err.error_code().code(), 6);
        assert_eq!(err.to_string(), "parse error in x.css:1:4: unterminated block");
    }
}
