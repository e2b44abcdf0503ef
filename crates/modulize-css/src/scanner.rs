//! Block scanner.
//!
//! Walks a stylesheet once and records the selector prelude of every rule
//! together with its nesting. Declarations, at-rule preludes and values are
//! passed over without interpretation.

use modulize_core::patch::Span;

use crate::Syntax;

/// A rule found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    /// Span of the selector list, trimmed of surrounding whitespace and
    /// leading comments.
    pub prelude: Span,
    /// The rule is not nested inside any other block.
    pub top_level: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Rule,
    AtRule,
    NestedProperty,
}

/// A scan failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub offset: usize,
    pub message: String,
}

impl ScanError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        ScanError {
            offset,
            message: message.into(),
        }
    }
}

/// Scan `source` for rule blocks.
pub fn scan_rules(source: &str, syntax: Syntax) -> Result<Vec<RawRule>, ScanError> {
    let bytes = source.as_bytes();
    let mut rules = Vec::new();
    let mut stack: Vec<(Block, usize)> = Vec::new();
    let mut prelude_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i)?;
            }
            b'/' if syntax == Syntax::Scss && bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line_comment(bytes, i);
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i)?;
            }
            b'(' => {
                i = skip_parens(bytes, i, syntax)?;
            }
            b'#' if syntax == Syntax::Scss && bytes.get(i + 1) == Some(&b'{') => {
                i = skip_interpolation(bytes, i)?;
            }
            b'\\' => {
                i = (i + 2).min(bytes.len());
            }
            b'{' => {
                let prelude = trim_prelude(source, prelude_start, i, syntax);
                let text = &source[prelude.start..prelude.end];
                let kind = if text.starts_with('@') {
                    Block::AtRule
                } else if text.ends_with(':') {
                    Block::NestedProperty
                } else {
                    rules.push(RawRule {
                        prelude,
                        top_level: stack.is_empty(),
                    });
                    Block::Rule
                };
                stack.push((kind, i));
                i += 1;
                prelude_start = i;
            }
            b'}' => {
                if stack.pop().is_none() {
                    return Err(ScanError::new(i, "unexpected '}'"));
                }
                i += 1;
                prelude_start = i;
            }
            b';' => {
                i += 1;
                prelude_start = i;
            }
            _ => i += 1,
        }
    }

    if let Some((_, open)) = stack.last() {
        return Err(ScanError::new(*open, "unterminated block"));
    }
    Ok(rules)
}

/// Trim whitespace on both sides and comments at the start of a prelude.
fn trim_prelude(source: &str, start: usize, end: usize, syntax: Syntax) -> Span {
    let bytes = source.as_bytes();
    let mut start = start;
    loop {
        while start < end && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        let rest = &source[start..end];
        if rest.starts_with("/*") {
            match rest.find("*/") {
                Some(close) => start += close + 2,
                None => break,
            }
        } else if syntax == Syntax::Scss && rest.starts_with("//") {
            start = skip_line_comment(bytes, start).min(end);
        } else {
            break;
        }
    }
    let mut end = end;
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    Span::new(start, end)
}

fn skip_comment(bytes: &[u8], start: usize) -> Result<usize, ScanError> {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return Ok(i + 2);
        }
        i += 1;
    }
    Err(ScanError::new(start, "unterminated comment"))
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| start + p)
        .unwrap_or(bytes.len())
}

fn skip_string(bytes: &[u8], start: usize) -> Result<usize, ScanError> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(ScanError::new(start, "unterminated string"))
}

/// Skip a balanced parenthesized group. `;`, `{` and `}` inside it are text.
fn skip_parens(bytes: &[u8], start: usize, syntax: Syntax) -> Result<usize, ScanError> {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            b'"' | b'\'' => i = skip_string(bytes, i)?,
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_comment(bytes, i)?,
            b'#' if syntax == Syntax::Scss && bytes.get(i + 1) == Some(&b'{') => {
                i = skip_interpolation(bytes, i)?
            }
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    Err(ScanError::new(start, "unterminated parenthesis"))
}

fn skip_interpolation(bytes: &[u8], start: usize) -> Result<usize, ScanError> {
    let mut depth = 0usize;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i + 1);
                }
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    Err(ScanError::new(start, "unterminated interpolation"))
}

/// Split a selector list on top-level commas.
///
/// Returns the trimmed span of each selector, offset by `base`.
pub fn split_selectors(list: &str, base: usize) -> Vec<Span> {
    let bytes = list.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut part_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'"' | b'\'' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'\\' => {
                i += 2;
                continue;
            }
            b',' if depth == 0 => {
                parts.push(trim_span(list, part_start, i).shifted(base));
                part_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(trim_span(list, part_start, bytes.len()).shifted(base));
    parts.retain(|span| !span.is_empty());
    parts
}

fn trim_span(text: &str, start: usize, end: usize) -> Span {
    let end = end.min(text.len());
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    if leading == slice.len() {
        return Span::new(start, start);
    }
    Span::new(start + leading, end - trailing)
}
