//! Wrapping and boundary helpers for the text editors.
//!
//! Stateless: nothing here knows about cursors or focus. The boundary
//! helpers are shared with the single-line `TextInput`.

use unicode_width::UnicodeWidthStr;

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Offset from area edge to the first content cell
pub(super) const BORDER_OFFSET: u16 = 1;
/// Padding between the left border and the text
pub(super) const LEFT_PADDING: u16 = 1;

pub(super) fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(usize::from(width))
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Content width inside the block, 0 if the area is too narrow.
pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// One visual row of wrapped text, as a byte range into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Row {
    pub start: usize,
    pub len: usize,
}

impl Row {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn text<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.start..self.end()]
    }
}

/// Wrap `buffer` into visual rows of at most `width` columns.
///
/// Every logical line yields at least one row, so a trailing newline
/// produces an empty last row. Whitespace swallowed at a wrap point
/// belongs to no row.
pub(super) fn rows(buffer: &str, width: u16) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut line_start = 0;

    for logical in buffer.split('\n') {
        if logical.is_empty() || width == 0 {
            rows.push(Row { start: line_start, len: logical.len() });
        } else {
            let mut searched = 0;
            for segment in textwrap::wrap(logical, wrap_options(width)) {
                let found = logical[searched..]
                    .find(segment.as_ref())
                    .map_or(searched, |i| searched + i);
                rows.push(Row { start: line_start + found, len: segment.len() });
                searched = found + segment.len();
            }
        }
        line_start += logical.len() + 1;
    }

    rows
}

/// Display columns between `row.start` and `pos`.
pub(super) fn column_of(buffer: &str, row: Row, pos: usize) -> usize {
    buffer[row.start..pos.max(row.start)].width()
}

/// Byte offset in `row` closest to display column `column`.
pub(super) fn offset_at_column(buffer: &str, row: Row, column: usize) -> usize {
    let mut used = 0;
    for (i, c) in row.text(buffer).char_indices() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > column {
            return row.start + i;
        }
        used += w;
    }
    row.end()
}

pub(crate) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos].chars().next_back().map_or(0, |c| pos - c.len_utf8())
}

pub(crate) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(text.len(), |c| pos + c.len_utf8())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Start of the word before `pos`, skipping any separators first
/// (readline `backward-word`).
pub(crate) fn prev_word_boundary(text: &str, pos: usize) -> usize {
    let before = text[..pos].trim_end_matches(|c: char| !is_word_char(c));
    before
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_word_char(c))
        .map_or(0, |(i, c)| i + c.len_utf8())
}
