//! Mutable document content for open editor buffers.
//!
//! A `TextBuffer` owns the current text of one document and keeps its
//! `LineMap` up to date so line/character positions (LSP rules: 0-based,
//! `\n` line endings) convert to byte offsets and back without a rescan
//! per query.
//!
//! Range edits are atomic: if either endpoint of the edit range does not
//! exist in the current text, the buffer is left unchanged and the edit
//! fails.

use crate::position::{LineMap, Position, Range};

/// Error returned when a range edit does not apply to the current text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidEditRange;

impl std::fmt::Display for InvalidEditRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "edit range does not exist in the document")
    }
}

impl std::error::Error for InvalidEditRange {}

/// Mutable document text with line/column <-> offset mapping.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: String,
    line_map: LineMap,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::new(),
            line_map: LineMap::build(""),
        }
    }

    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_map = LineMap::build(&text);
        Self { text, line_map }
    }

    /// Current contents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Append text at the end of the buffer.
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
        self.line_map = LineMap::build(&self.text);
    }

    /// Remove all content.
    pub fn clear(&mut self) {
        self.text.clear();
        self.line_map = LineMap::build("");
    }

    /// Replace the whole content (full document sync).
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.line_map = LineMap::build(&self.text);
    }

    /// Apply a range edit (incremental document sync).
    ///
    /// Both endpoints are resolved against the current text first; if
    /// either does not exist, or the range is inverted, nothing changes
    /// and `InvalidEditRange` is returned.
    pub fn apply_edit(&mut self, range: Range, replacement: &str) -> Result<(), InvalidEditRange> {
        let start = self
            .position_to_offset(range.start)
            .ok_or(InvalidEditRange)?;
        let end = self.position_to_offset(range.end).ok_or(InvalidEditRange)?;
        if start > end {
            return Err(InvalidEditRange);
        }
        self.text
            .replace_range(start as usize..end as usize, replacement);
        self.line_map = LineMap::build(&self.text);
        Ok(())
    }

    #[must_use]
    pub fn position_to_offset(&self, position: Position) -> Option<u32> {
        self.line_map.position_to_offset(position, &self.text)
    }

    #[must_use]
    pub fn offset_to_position(&self, offset: u32) -> Position {
        self.line_map.offset_to_position(offset, &self.text)
    }
}

#[cfg(test)]
#[path = "../tests/text_tests.rs"]
mod tests;
