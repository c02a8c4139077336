//! Offset <-> position conversion over a table of line-start offsets.
//!
//! Offsets are UTF-8 byte offsets into the document text. Columns are UTF-16
//! code units, the default LSP position encoding. Every conversion clamps
//! out-of-range input instead of failing, so positions that drifted on the
//! editor side still resolve to somewhere sensible.

use tower_lsp::lsp_types::Position;

/// Start offsets of every line in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Scan `text` once and record where each line starts.
    ///
    /// A line starts at offset 0, after `\n`, after a lone `\r`, and after
    /// `\r\n` (one break). Empty text has no lines at all.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::new();
        let mut is_line_start = true;
        let mut i = 0;

        while i < bytes.len() {
            if is_line_start {
                line_starts.push(i);
                is_line_start = false;
            }
            match bytes[i] {
                b'\r' => {
                    is_line_start = true;
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                }
                b'\n' => is_line_start = true,
                _ => {}
            }
            i += 1;
        }

        // Trailing line break opens an empty last line.
        if is_line_start && !bytes.is_empty() {
            line_starts.push(bytes.len());
        }

        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a line/column position.
    pub fn position_at(&self, text: &str, offset: usize) -> Position {
        let offset = floor_char_boundary(text, offset.min(text.len()));

        if self.line_starts.is_empty() {
            return Position::new(0, utf16_len(&text[..offset]));
        }

        // Greatest line whose start is <= offset. line_starts[0] == 0, so the
        // partition point is at least 1.
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];

        Position::new(line as u32, utf16_len(&text[line_start..offset]))
    }

    /// Convert a line/column position into a byte offset.
    ///
    /// Lines past the end map to the end of the text. Columns are clamped so
    /// the offset stays within `[line_start, next_line_start]`.
    pub fn offset_at(&self, text: &str, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return text.len();
        }

        let line_start = self.line_starts[line];
        let next_line_start = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(text.len());

        let mut offset = line_start;
        let mut remaining = position.character as usize;
        for ch in text[line_start..next_line_start].chars() {
            let width = ch.len_utf16();
            if remaining < width {
                break;
            }
            remaining -= width;
            offset += ch.len_utf8();
        }

        offset
    }
}

fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
