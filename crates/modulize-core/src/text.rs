//! Text position utilities for byte offset and line:column conversions.
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//!
//! The byte-based variant counts columns in bytes and backs the patch
//! materializer. The char-based variant counts Unicode scalar values and is
//! used for user-facing parse diagnostics.

use crate::patch::Span;

/// Convert a byte offset to 1-indexed line and column.
///
/// Columns count bytes, not characters. If `offset` exceeds the content
/// length, the position at end of content is returned.
pub fn byte_offset_to_position(content: &[u8], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &byte in &content[..offset] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Convert a byte offset to 1-indexed line and column (Unicode-aware).
///
/// Columns count Unicode scalar values (chars), not bytes.
pub fn byte_offset_to_position_str(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Extract the text covered by a span.
///
/// Returns `None` when the span is out of bounds or does not fall on
/// character boundaries.
pub fn extract_span(content: &str, span: Span) -> Option<&str> {
    content.get(span.start..span.end)
}
