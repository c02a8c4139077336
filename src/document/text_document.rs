//! A single open text document.

use std::sync::OnceLock;

use tower_lsp::lsp_types::{Position, Range, Url};

use super::line_index::LineIndex;

/// Content, version and language of one open file.
///
/// The line index is built on first use and dropped whenever the text is
/// replaced.
#[derive(Debug, Clone)]
pub struct TextDocument {
    uri: Url,
    language_id: String,
    version: i32,
    text: String,
    line_index: OnceLock<LineIndex>,
}

impl TextDocument {
    pub fn new(
        uri: Url,
        language_id: impl Into<String>,
        version: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            version,
            text: text.into(),
            line_index: OnceLock::new(),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Full current content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substring between two positions, or the whole text when `range` is `None`.
    ///
    /// The end position is inclusive: the character at `offset_at(range.end)`
    /// is part of the result. Callers holding a half-open LSP range get one
    /// extra character unless they step the end back. A reversed range yields
    /// an empty string.
    pub fn get_text(&self, range: Option<Range>) -> &str {
        let Some(range) = range else {
            return &self.text;
        };

        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end);
        if end < start {
            return "";
        }

        let stop = self.text[end..]
            .chars()
            .next()
            .map_or(end, |ch| end + ch.len_utf8());
        &self.text[start..stop]
    }

    /// Replace the whole content. No diffing is done.
    pub fn update(&mut self, text: String, version: i32) {
        self.text = text;
        self.version = version;
        self.line_index = OnceLock::new();
    }

    pub fn position_at(&self, offset: usize) -> Position {
        self.line_index().position_at(&self.text, offset)
    }

    pub fn offset_at(&self, position: Position) -> usize {
        self.line_index().offset_at(&self.text, position)
    }

    pub fn line_count(&self) -> usize {
        self.line_index().line_count()
    }

    fn line_index(&self) -> &LineIndex {
        self.line_index.get_or_init(|| LineIndex::new(&self.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(text: &str) -> TextDocument {
        TextDocument::new(
            "file:///test/doc.txt".parse().unwrap(),
            "plaintext",
            1,
            text,
        )
    }

    fn range(start: (u32, u32), end: (u32, u32)) -> Range {
        Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
    }

    #[test]
    fn new_keeps_identity_fields() {
        let doc = document("abc");

        assert_eq!(doc.uri().as_str(), "file:///test/doc.txt");
        assert_eq!(doc.language_id(), "plaintext");
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn get_text_without_range_returns_full_text() {
        let doc = document("one\ntwo");

        assert_eq!(doc.get_text(None), "one\ntwo");
    }

    #[test]
    fn get_text_includes_character_at_end_position() {
        let doc = document("Hello WORLD and NASA");

        // offsets 6..=10
        assert_eq!(doc.get_text(Some(range((0, 6), (0, 10)))), "WORLD");
        // a half-open range picks up the following space
        assert_eq!(doc.get_text(Some(range((0, 6), (0, 11)))), "WORLD ");
    }

    #[test]
    fn get_text_clamps_end_at_text_length() {
        let doc = document("one\ntwo");

        assert_eq!(doc.get_text(Some(range((1, 0), (9, 0)))), "two");
    }

    #[test]
    fn get_text_spans_lines() {
        let doc = document("one\r\ntwo\r\nthree");

        assert_eq!(doc.get_text(Some(range((0, 2), (1, 1)))), "e\r\ntw");
    }

    #[test]
    fn get_text_with_reversed_range_is_empty() {
        let doc = document("one\ntwo");

        assert_eq!(doc.get_text(Some(range((1, 2), (0, 1)))), "");
    }

    #[test]
    fn update_replaces_text_and_version() {
        let mut doc = document("old");

        doc.update("brand\nnew".to_string(), 2);

        assert_eq!(doc.text(), "brand\nnew");
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn update_invalidates_line_index() {
        let mut doc = document("single line");
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.position_at(8), Position::new(0, 8));

        doc.update("a\nb\nc".to_string(), 2);

        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.position_at(4), Position::new(2, 0));
        assert_eq!(doc.offset_at(Position::new(1, 0)), 2);
    }
}
