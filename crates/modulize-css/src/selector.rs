//! Selector tokenizer.
//!
//! Extracts class tokens from a single selector (no top-level commas). Only
//! `.ident` tokens outside attribute selectors, strings, comments and SCSS
//! interpolation count as classes.
//!
//! ## Grammar
//!
//! ```text
//! <piece>  := comment | string | attribute | interpolation
//!           | ":global(" | ":global" | "." ident | "(" | ")" | escape | any
//! <ident>  := ["-"] ident-start ident-char*
//! ```

use winnow::combinator::{alt, delimited, not, opt, preceded, repeat, terminated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::stream::Offset;
use winnow::token::{any, none_of, one_of, take_until, take_while};
use winnow::ModalResult;

use modulize_core::patch::Span;

/// A class selector token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassToken {
    /// Unescaped class name.
    pub name: String,
    /// Span of the whole `.name` token in the document.
    pub span: Span,
    /// Span of the identifier (without the dot) in the document.
    pub ident_span: Span,
    /// The token is the first thing in its selector.
    pub leading: bool,
    /// The token is already scoped as global.
    pub global: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'s> {
    Class(&'s str),
    GlobalOpen,
    GlobalBare,
    Open,
    Close,
    Skip,
}

/// Tokenize one selector.
///
/// `base` is the document offset of the first byte of `selector`.
pub fn class_tokens(selector: &str, base: usize) -> Vec<ClassToken> {
    let lead = selector.len() - selector.trim_start().len();
    let mut tokens = Vec::new();
    // One entry per open paren; true when it was opened by `:global(`
    let mut parens: Vec<bool> = Vec::new();
    let mut bare_global = false;

    let mut input = selector;
    while !input.is_empty() {
        let start = input.offset_from(&selector);
        let Ok(piece) = parse_piece(&mut input) else {
            break;
        };
        match piece {
            // A name completed by interpolation is not a class token.
            Piece::Class(_) if input.starts_with("#{") => {}
            Piece::Class(raw) => {
                let ident_start = base + start + 1;
                tokens.push(ClassToken {
                    name: unescape(raw),
                    span: Span::new(base + start, ident_start + raw.len()),
                    ident_span: Span::new(ident_start, ident_start + raw.len()),
                    leading: start == lead,
                    global: bare_global || parens.iter().any(|g| *g),
                });
            }
            Piece::GlobalOpen => parens.push(true),
            Piece::GlobalBare => bare_global = true,
            Piece::Open => parens.push(false),
            Piece::Close => {
                parens.pop();
            }
            Piece::Skip => {}
        }
    }

    tokens
}

fn parse_piece<'s>(input: &mut &'s str) -> ModalResult<Piece<'s>> {
    alt((
        comment.map(|_| Piece::Skip),
        string_literal.map(|_| Piece::Skip),
        attribute.map(|_| Piece::Skip),
        interpolation.map(|_| Piece::Skip),
        (":global", '(').map(|_| Piece::GlobalOpen),
        terminated(":global", not(ident_char)).map(|_| Piece::GlobalBare),
        preceded('.', ident).map(Piece::Class),
        '('.map(|_| Piece::Open),
        ')'.map(|_| Piece::Close),
        escape.map(|_| Piece::Skip),
        any.map(|_| Piece::Skip),
    ))
    .parse_next(input)
}

fn comment(input: &mut &str) -> ModalResult<()> {
    ("/*", take_until(0.., "*/"), "*/").void().parse_next(input)
}

fn string_literal(input: &mut &str) -> ModalResult<()> {
    alt((quoted('"'), quoted('\''))).parse_next(input)
}

fn quoted<'s>(quote: char) -> impl Parser<&'s str, (), ErrMode<ContextError>> {
    delimited(
        quote,
        repeat::<_, _, (), _, _>(0.., alt((escape, none_of([quote, '\\']).void()))),
        quote,
    )
}

fn attribute(input: &mut &str) -> ModalResult<()> {
    (
        '[',
        repeat::<_, _, (), _, _>(0.., alt((string_literal, none_of([']', '"', '\'']).void()))),
        ']',
    )
        .void()
        .parse_next(input)
}

fn interpolation(input: &mut &str) -> ModalResult<()> {
    ("#{", take_until(0.., "}"), "}").void().parse_next(input)
}

fn escape(input: &mut &str) -> ModalResult<()> {
    preceded(
        '\\',
        alt((
            (
                take_while(1..=6, |c: char| c.is_ascii_hexdigit()),
                opt(one_of([' ', '\t', '\n'])),
            )
                .void(),
            none_of(['\n']).void(),
        )),
    )
    .parse_next(input)
}

fn ident<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        opt('-'),
        ident_start,
        repeat::<_, _, (), _, _>(0.., ident_char),
    )
        .take()
        .parse_next(input)
}

fn ident_start(input: &mut &str) -> ModalResult<()> {
    alt((
        escape,
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()).void(),
    ))
    .parse_next(input)
}

fn ident_char(input: &mut &str) -> ModalResult<()> {
    alt((
        escape,
        one_of(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii())
            .void(),
    ))
    .parse_next(input)
}

/// Resolve CSS escapes in an identifier.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        if matches!(chars.peek(), Some(' ' | '\t' | '\n')) {
            chars.next();
        }
        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{FFFD}');
        out.push(decoded);
    }
    out
}

/// Escape a class name for use as a CSS identifier.
pub fn escape_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        let plain = c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii();
        if i == 0 && c.is_ascii_digit() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if plain {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}
