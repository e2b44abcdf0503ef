//! Patch IR: anchored edits collected into an atomic [`PatchSet`].
//!
//! Every rewrite the engine performs on a stylesheet or script is expressed as
//! a span-anchored edit against the document's original bytes. Edits are never
//! applied while documents are being walked; they are collected first and then
//! applied in one pass:
//! - Anchors carry a hash of the bytes they expect to replace
//! - Overlapping edits within one document are a conflict
//! - Apply is all-or-nothing across every document in the set
//! - A patch set can be materialized into output edits and a unified diff

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::text::byte_offset_to_position;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Core Types
// ============================================================================

/// Stable document identifier for the duration of one run.
///
/// Stylesheets and scripts are numbered in discovery order. Identity checks
/// between documents always go through this id, never through references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Byte offsets into document content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// An empty span at `offset`, used as an insertion point.
    pub fn at(offset: usize) -> Self {
        Span {
            start: offset,
            end: offset,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap. Two
    /// insertions at the same offset do overlap, since their relative order
    /// would be ambiguous.
    pub fn overlaps(&self, other: &Span) -> bool {
        if self.is_empty() && other.is_empty() {
            return self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Shift both ends of the span by `offset` bytes.
    pub fn shifted(&self, offset: usize) -> Span {
        Span::new(self.start + offset, self.end + offset)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Anchor Model
// ============================================================================

/// An exact span plus the hash of the bytes expected there.
///
/// The edit only applies if the bytes at `span` still hash to
/// `expected_before_hash` when the patch is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// The exact byte range to edit.
    pub span: Span,
    /// SHA-256 hash of the bytes in `span` before the edit.
    pub expected_before_hash: ContentHash,
}

impl Anchor {
    /// Anchor `span` against the current `content`.
    ///
    /// Out-of-bounds spans hash the empty slice and fail at apply time.
    pub fn new(span: Span, content: &[u8]) -> Self {
        let target = content.get(span.start..span.end).unwrap_or(&[]);
        Anchor {
            span,
            expected_before_hash: ContentHash::compute(target),
        }
    }

    /// Resolve this anchor against the given content.
    pub fn resolve(&self, content: &[u8]) -> AnchorResolution {
        let Some(slice) = content.get(self.span.start..self.span.end) else {
            return AnchorResolution::OutOfBounds {
                span: self.span,
                file_len: content.len(),
            };
        };
        let actual = ContentHash::compute(slice);
        if actual != self.expected_before_hash {
            return AnchorResolution::HashMismatch {
                span: self.span,
                expected: self.expected_before_hash.clone(),
                actual,
            };
        }
        AnchorResolution::Resolved(self.span)
    }
}

/// Result of attempting to resolve an anchor against file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorResolution {
    /// Anchor resolved successfully.
    Resolved(Span),
    /// Content at span doesn't match the expected hash.
    HashMismatch {
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },
    /// Span is out of bounds for the file content.
    OutOfBounds { span: Span, file_len: usize },
}

// ============================================================================
// Conflict Detection
// ============================================================================

/// A detected overlap or invalidation that prevents apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conflict {
    /// Two edits have overlapping spans in the same file.
    OverlappingSpans {
        file_id: FileId,
        edit1_span: Span,
        edit2_span: Span,
    },

    /// Anchor hash mismatch.
    AnchorHashMismatch {
        file_id: FileId,
        span: Span,
        expected: ContentHash,
        actual: ContentHash,
    },

    /// Span is out of bounds for the file.
    SpanOutOfBounds {
        file_id: FileId,
        span: Span,
        file_len: usize,
    },

    /// File not found in context.
    FileMissing { file_id: FileId },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::OverlappingSpans {
                file_id,
                edit1_span,
                edit2_span,
            } => write!(
                f,
                "overlapping edits in {}: {} and {}",
                file_id, edit1_span, edit2_span
            ),
            Conflict::AnchorHashMismatch { file_id, span, .. } => {
                write!(f, "content changed under edit at {} in {}", span, file_id)
            }
            Conflict::SpanOutOfBounds {
                file_id,
                span,
                file_len,
            } => write!(
                f,
                "edit span {} out of bounds for {} ({} bytes)",
                span, file_id, file_len
            ),
            Conflict::FileMissing { file_id } => write!(f, "no content for {}", file_id),
        }
    }
}

// ============================================================================
// Edit Operations
// ============================================================================

/// The kind of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Replace the bytes in `anchor.span` with new text.
    Replace,
    /// Insert text at `anchor.span.start`.
    Insert,
}

/// A single text change anchored in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// Stable identifier for ordering.
    pub id: u32,
    /// The document this edit applies to.
    pub file_id: FileId,
    /// The kind of operation.
    pub kind: EditKind,
    /// Where the edit lands and what it expects to find there.
    pub anchor: Anchor,
    /// The new text.
    pub text: String,
    /// Human-readable reason for the edit.
    pub reason: Option<String>,
}

impl Edit {
    /// Get the anchor's span.
    pub fn span(&self) -> Span {
        self.anchor.span
    }

    /// Document order: by start offset, an insertion before a replacement
    /// starting at the same offset, then creation order.
    fn document_order(&self, other: &Edit) -> std::cmp::Ordering {
        self.span()
            .start
            .cmp(&other.span().start)
            .then(other.kind.cmp(&self.kind))
            .then(self.id.cmp(&other.id))
    }
}

// ============================================================================
// PatchSet
// ============================================================================

/// An ordered set of edits over many documents, applied atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchSet {
    /// The edits to apply, in creation order.
    pub edits: Vec<Edit>,

    /// Mapping from FileId to file path (for materialization).
    pub file_paths: BTreeMap<FileId, String>,

    next_id: u32,
}

impl PatchSet {
    /// Create a new empty PatchSet.
    pub fn new() -> Self {
        PatchSet::default()
    }

    /// Register a file path mapping.
    pub fn register_file(&mut self, file_id: FileId, path: impl Into<String>) {
        self.file_paths.insert(file_id, path.into());
    }

    /// Queue a replacement of `span` in `content` with `text`.
    pub fn replace(
        &mut self,
        file_id: FileId,
        content: &str,
        span: Span,
        text: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.push(file_id, EditKind::Replace, content, span, text, reason);
    }

    /// Queue an insertion of `text` at `offset` in `content`.
    pub fn insert(
        &mut self,
        file_id: FileId,
        content: &str,
        offset: usize,
        text: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.push(
            file_id,
            EditKind::Insert,
            content,
            Span::at(offset),
            text,
            reason,
        );
    }

    fn push(
        &mut self,
        file_id: FileId,
        kind: EditKind,
        content: &str,
        span: Span,
        text: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.next_id += 1;
        self.edits.push(Edit {
            id: self.next_id,
            file_id,
            kind,
            anchor: Anchor::new(span, content.as_bytes()),
            text: text.into(),
            reason: Some(reason.into()),
        });
    }

    /// Check if this PatchSet contains any edits.
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Get the number of edits in this PatchSet.
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Ids of the documents touched by at least one edit, in id order.
    pub fn touched_files(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = self.edits.iter().map(|e| e.file_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Detect conflicts within this PatchSet.
    ///
    /// Returns a list of all detected conflicts. An empty list means no conflicts.
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        let mut edits_by_file: BTreeMap<FileId, Vec<&Edit>> = BTreeMap::new();
        for edit in &self.edits {
            edits_by_file.entry(edit.file_id).or_default().push(edit);
        }

        for (file_id, edits) in edits_by_file {
            for i in 0..edits.len() {
                for j in (i + 1)..edits.len() {
                    let span_i = edits[i].span();
                    let span_j = edits[j].span();

                    if span_i.overlaps(&span_j) {
                        conflicts.push(Conflict::OverlappingSpans {
                            file_id,
                            edit1_span: span_i,
                            edit2_span: span_j,
                        });
                    }
                }
            }
        }

        conflicts
    }
}

// ============================================================================
// Atomic Apply
// ============================================================================

/// Result of attempting to apply a PatchSet.
#[derive(Debug, Clone)]
pub enum ApplyResult {
    /// All edits applied successfully.
    Success {
        /// The new content for each modified file.
        modified_files: HashMap<FileId, String>,
    },

    /// Apply failed due to conflicts.
    Failed {
        /// The conflicts that prevented apply.
        conflicts: Vec<Conflict>,
    },
}

impl PatchSet {
    /// Apply this PatchSet atomically against `file_contents`.
    ///
    /// Either all edits apply successfully, or none do. Edits are applied in
    /// reverse offset order within each file so earlier spans stay valid.
    #[must_use]
    pub fn apply(&self, file_contents: &HashMap<FileId, String>) -> ApplyResult {
        let mut conflicts = self.detect_conflicts();
        let mut edits_by_file: HashMap<FileId, Vec<&Edit>> = HashMap::new();

        for edit in &self.edits {
            let Some(content) = file_contents.get(&edit.file_id) else {
                conflicts.push(Conflict::FileMissing {
                    file_id: edit.file_id,
                });
                continue;
            };

            match edit.anchor.resolve(content.as_bytes()) {
                AnchorResolution::Resolved(_) => {
                    edits_by_file.entry(edit.file_id).or_default().push(edit);
                }
                AnchorResolution::HashMismatch {
                    span,
                    expected,
                    actual,
                } => conflicts.push(Conflict::AnchorHashMismatch {
                    file_id: edit.file_id,
                    span,
                    expected,
                    actual,
                }),
                AnchorResolution::OutOfBounds { span, file_len } => {
                    conflicts.push(Conflict::SpanOutOfBounds {
                        file_id: edit.file_id,
                        span,
                        file_len,
                    })
                }
            }
        }

        if !conflicts.is_empty() {
            return ApplyResult::Failed { conflicts };
        }

        let mut modified_files = HashMap::new();
        for (file_id, mut file_edits) in edits_by_file {
            let Some(original) = file_contents.get(&file_id) else {
                continue;
            };
            let mut content = original.clone();

            // Apply from end to start to preserve offsets
            file_edits.sort_by(|a, b| b.document_order(a));

            for edit in file_edits {
                let span = edit.span();
                match edit.kind {
                    EditKind::Insert => content.insert_str(span.start, &edit.text),
                    EditKind::Replace => content.replace_range(span.start..span.end, &edit.text),
                }
            }

            modified_files.insert(file_id, content);
        }

        ApplyResult::Success { modified_files }
    }
}

// ============================================================================
// Patch Materialization
// ============================================================================

/// A single edit as it appears in output (for JSON serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputEdit {
    /// File path as given on discovery.
    pub file: String,
    /// Byte range being replaced.
    pub span: Span,
    /// Original text.
    pub old_text: String,
    /// Replacement text.
    pub new_text: String,
    /// 1-indexed line number (for display).
    pub line: u32,
    /// 1-indexed column (for display).
    pub col: u32,
    /// Why the edit was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Materialized patch output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedPatch {
    /// Individual edits (ordered by file, then span.start).
    pub edits: Vec<OutputEdit>,
    /// Unified diff of the whole run.
    pub unified_diff: String,
}

impl PatchSet {
    /// Materialize this PatchSet to output format.
    ///
    /// Requires the original file contents to compute old text and positions.
    pub fn materialize(&self, file_contents: &HashMap<FileId, String>) -> MaterializedPatch {
        let mut sorted_edits: Vec<&Edit> = self.edits.iter().collect();
        sorted_edits.sort_by(|a, b| {
            let path_a = self.file_paths.get(&a.file_id);
            let path_b = self.file_paths.get(&b.file_id);
            path_a.cmp(&path_b).then_with(|| a.document_order(b))
        });

        let mut output_edits = Vec::with_capacity(sorted_edits.len());
        for edit in sorted_edits {
            let path = self
                .file_paths
                .get(&edit.file_id)
                .cloned()
                .unwrap_or_else(|| edit.file_id.to_string());
            let span = edit.span();

            let (old_text, line, col) = match file_contents.get(&edit.file_id) {
                Some(content) => {
                    let old_text = content.get(span.start..span.end).unwrap_or("").to_string();
                    let (line, col) = byte_offset_to_position(content.as_bytes(), span.start);
                    (old_text, line, col)
                }
                None => (String::new(), 1, 1),
            };

            output_edits.push(OutputEdit {
                file: path,
                span,
                old_text,
                new_text: edit.text.clone(),
                line,
                col,
                reason: edit.reason.clone(),
            });
        }

        let unified_diff = generate_unified_diff(&output_edits, file_contents, &self.file_paths);

        MaterializedPatch {
            edits: output_edits,
            unified_diff,
        }
    }
}

/// Generate a unified diff with one hunk per touched line range.
///
/// Edits landing on the same lines are merged into a single hunk so the diff
/// shows whole before/after lines rather than fragments.
fn generate_unified_diff(
    edits: &[OutputEdit],
    file_contents: &HashMap<FileId, String>,
    file_paths: &BTreeMap<FileId, String>,
) -> String {
    // Unregistered files are named by id, as in `materialize`.
    let path_to_id: HashMap<String, FileId> = file_contents
        .keys()
        .map(|id| {
            let path = file_paths
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string());
            (path, *id)
        })
        .collect();

    let mut by_file: BTreeMap<&str, Vec<&OutputEdit>> = BTreeMap::new();
    for edit in edits {
        by_file.entry(edit.file.as_str()).or_default().push(edit);
    }

    let mut diff = String::new();
    for (path, file_edits) in by_file {
        let Some(content) = path_to_id
            .get(path)
            .and_then(|id| file_contents.get(id))
        else {
            continue;
        };

        diff.push_str(&format!("--- a/{}\n", path));
        diff.push_str(&format!("+++ b/{}\n", path));

        for group in group_by_lines(content, &file_edits) {
            let line_start = line_start_of(content, group.first_offset);
            let line_end = line_end_of(content, group.last_offset);
            let old_block = &content[line_start..line_end];

            let mut new_block = String::new();
            let mut cursor = line_start;
            for edit in &group.edits {
                new_block.push_str(&content[cursor..edit.span.start]);
                new_block.push_str(&edit.new_text);
                cursor = edit.span.end;
            }
            new_block.push_str(&content[cursor..line_end]);

            let old_lines: Vec<&str> = old_block.lines().collect();
            let new_lines: Vec<&str> = new_block.lines().collect();
            let (line, _) = byte_offset_to_position(content.as_bytes(), line_start);

            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                line,
                old_lines.len(),
                line,
                new_lines.len()
            ));
            for old_line in &old_lines {
                diff.push_str(&format!("-{}\n", old_line));
            }
            for new_line in &new_lines {
                diff.push_str(&format!("+{}\n", new_line));
            }
            if line_end == content.len() && !content.ends_with('\n') {
                diff.push_str("\\ No newline at end of file\n");
            }
        }
    }

    diff
}

struct LineGroup<'e> {
    first_offset: usize,
    last_offset: usize,
    edits: Vec<&'e OutputEdit>,
}

fn group_by_lines<'e>(content: &str, edits: &[&'e OutputEdit]) -> Vec<LineGroup<'e>> {
    let mut groups: Vec<LineGroup<'e>> = Vec::new();
    for edit in edits {
        let start_line = line_start_of(content, edit.span.start);
        match groups.last_mut() {
            Some(group) if start_line <= line_end_of(content, group.last_offset) => {
                group.last_offset = group.last_offset.max(edit.span.end);
                group.edits.push(edit);
            }
            _ => groups.push(LineGroup {
                first_offset: edit.span.start,
                last_offset: edit.span.end,
                edits: vec![edit],
            }),
        }
    }
    groups
}

fn line_start_of(content: &str, offset: usize) -> usize {
    content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end_of(content: &str, offset: usize) -> usize {
    content[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(content.len())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(file_id: FileId, text: &str) -> HashMap<FileId, String> {
        [(file_id, text.to_string())].into()
    }

    mod span_tests {
        use super::*;

        #[test]
        fn span_overlap_detection() {
            let a = Span::new(0, 5);
            let b = Span::new(3, 8);
            let c = Span::new(5, 9);
            assert!(a.overlaps(&b));
            assert!(!a.overlaps(&c), "adjacent spans must not overlap");
        }

        #[test]
        fn insertions_at_same_offset_overlap() {
            assert!(Span::at(4).overlaps(&Span::at(4)));
            assert!(!Span::at(4).overlaps(&Span::at(5)));
        }

        #[test]
        fn insertion_at_replacement_boundary_does_not_overlap() {
            assert!(!Span::at(3).overlaps(&Span::new(3, 6)));
        }

        #[test]
        #[should_panic(expected = "must be <= end")]
        fn span_new_invalid_range_panics() {
            let _ = Span::new(5, 2);
        }
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn apply_multiple_edits_reverse_order() {
            let file_id = FileId::new(1);
            let text = "aaa bbb ccc";
            let mut patch = PatchSet::new();
            patch.replace(file_id, text, Span::new(0, 3), "AAA", "test");
            patch.replace(file_id, text, Span::new(8, 11), "CCC", "test");
            patch.insert(file_id, text, 4, ">", "test");

            match patch.apply(&contents(file_id, text)) {
                ApplyResult::Success { modified_files } => {
                    assert_eq!(modified_files[&file_id], "AAA >bbb CCC");
                }
                ApplyResult::Failed { conflicts } => {
                    panic!("Apply should have succeeded, got conflicts: {:?}", conflicts)
                }
            }
        }

        #[test]
        fn insert_lands_before_replacement_at_same_offset() {
            let file_id = FileId::new(1);
            let text = "\"a\" + b;";
            let mut patch = PatchSet::new();
            patch.replace(file_id, text, Span::new(0, 3), "s.a", "test");
            patch.insert(file_id, text, 0, "import s;\n", "test");

            match patch.apply(&contents(file_id, text)) {
                ApplyResult::Success { modified_files } => {
                    assert_eq!(modified_files[&file_id], "import s;\ns.a + b;");
                }
                ApplyResult::Failed { conflicts } => panic!("unexpected conflicts: {:?}", conflicts),
            }
            let diff = patch.materialize(&contents(file_id, text)).unified_diff;
            assert!(diff.contains("+s.a + b;"));
        }

        #[test]
        fn diff_uses_registered_path() {
            let file_id = FileId::new(2);
            let text = "x = 1;\n";
            let mut patch = PatchSet::new();
            patch.register_file(file_id, "src/a.js");
            patch.replace(file_id, text, Span::new(4, 5), "2", "test");

            let diff = patch.materialize(&contents(file_id, text)).unified_diff;
            assert!(diff.starts_with("--- a/src/a.js\n+++ b/src/a.js\n"));
            assert!(diff.contains("-x = 1;"));
            assert!(diff.contains("+x = 2;"));
            assert!(!diff.contains("file_2"));
        }

        #[test]
        fn apply_fails_on_changed_content() {
            let file_id = FileId::new(1);
            let mut patch = PatchSet::new();
            patch.replace(file_id, "foo bar", Span::new(0, 3), "baz", "test");

            match patch.apply(&contents(file_id, "xyz bar")) {
                ApplyResult::Failed { conflicts } => {
                    assert!(matches!(
                        conflicts[0],
                        Conflict::AnchorHashMismatch { .. }
                    ));
                }
                ApplyResult::Success { .. } => panic!("Apply should have failed"),
            }
        }

        #[test]
        fn apply_fails_on_overlap_without_partial_output() {
            let file_id = FileId::new(1);
            let other = FileId::new(2);
            let text = "abcdef";
            let mut patch = PatchSet::new();
            patch.replace(file_id, text, Span::new(0, 4), "x", "test");
            patch.replace(file_id, text, Span::new(2, 6), "y", "test");
            patch.replace(other, text, Span::new(0, 1), "z", "test");

            let mut files = contents(file_id, text);
            files.insert(other, text.to_string());
            match patch.apply(&files) {
                ApplyResult::Failed { conflicts } => {
                    assert_eq!(conflicts.len(), 1);
                    assert!(matches!(conflicts[0], Conflict::OverlappingSpans { .. }));
                }
                ApplyResult::Success { .. } => panic!("Apply should have failed"),
            }
        }

        #[test]
        fn apply_missing_file_produces_file_missing_conflict() {
            let mut patch = PatchSet::new();
            patch.replace(FileId::new(9), "abc", Span::new(0, 1), "x", "test");
            match patch.apply(&HashMap::new()) {
                ApplyResult::Failed { conflicts } => {
                    assert_eq!(
                        conflicts,
                        vec![Conflict::FileMissing {
                            file_id: FileId::new(9)
                        }]
                    );
                }
                ApplyResult::Success { .. } => panic!("Apply should have failed"),
            }
        }
    }

    mod materialize_tests {
        use super::*;

        #[test]
        fn materialize_produces_line_and_col() {
            let file_id = FileId::new(1);
            let text = ".a {}\n.foo-bar {}\n";
            let mut patch = PatchSet::new();
            patch.register_file(file_id, "a.css");
            patch.replace(file_id, text, Span::new(7, 14), "fooBar", "rename");

            let out = patch.materialize(&contents(file_id, text));
            assert_eq!(out.edits.len(), 1);
            assert_eq!(out.edits[0].old_text, "foo-bar");
            assert_eq!(out.edits[0].line, 2);
            assert_eq!(out.edits[0].col, 2);
        }

        #[test]
        fn unified_diff_merges_edits_on_same_line() {
            let file_id = FileId::new(1);
            let text = ".a .b {}\n";
            let mut patch = PatchSet::new();
            patch.register_file(file_id, "x.css");
            patch.replace(file_id, text, Span::new(1, 2), "A", "rename");
            patch.replace(file_id, text, Span::new(4, 5), "B", "rename");

            let diff = patch.materialize(&contents(file_id, text)).unified_diff;
            assert!(diff.contains("--- a/x.css"));
            assert!(diff.contains("@@ -1,1 +1,1 @@"));
            assert!(diff.contains("-.a .b {}"));
            assert!(diff.contains("+.A .B {}"));
        }

        #[test]
        fn unified_diff_marks_missing_trailing_newline() {
            let file_id = FileId::new(1);
            let text = ".a {}";
            let mut patch = PatchSet::new();
            patch.register_file(file_id, "x.css");
            patch.replace(file_id, text, Span::new(1, 2), "b", "rename");

            let diff = patch.materialize(&contents(file_id, text)).unified_diff;
            assert!(diff.contains("\\ No newline at end of file"));
        }
    }
}
