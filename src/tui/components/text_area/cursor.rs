//! Cursor position and vertical scroll for the `TextArea`.
//!
//! The buffer itself stays in `TextArea`; every method here takes it as
//! `&str` and works against the wrapped [`Row`] layout.

use ratatui::layout::Rect;

use super::text_wrap::{
    BORDER_OFFSET, LEFT_PADDING, Row, column_of, inner_width, offset_at_column, rows,
};

pub(super) struct CursorState {
    /// Byte offset into the buffer (0..=len), always on a char boundary
    pub pos: usize,
    /// First visible row
    pub scroll_offset: usize,
    /// Area width from the last render, used for vertical movement
    pub last_width: u16,
}

impl CursorState {
    const DEFAULT_WIDTH: u16 = 60;

    pub fn new() -> Self {
        Self { pos: 0, scroll_offset: 0, last_width: Self::DEFAULT_WIDTH }
    }

    /// Index of the wrapped row holding the cursor.
    pub fn row_index(&self, layout: &[Row]) -> usize {
        layout.iter().rposition(|r| r.start <= self.pos).unwrap_or(0)
    }

    /// Move one wrapped row up (`-1`) or down (`1`), keeping the display
    /// column where the target row is long enough.
    ///
    /// Returns `false` at the first or last row.
    pub fn move_vertically(&mut self, buffer: &str, direction: i8) -> bool {
        let layout = rows(buffer, inner_width(self.last_width));
        let current = self.row_index(&layout);
        let target = match direction {
            d if d < 0 && current > 0 => current - 1,
            d if d > 0 && current + 1 < layout.len() => current + 1,
            _ => return false,
        };
        let column = column_of(buffer, layout[current], self.pos);
        self.pos = offset_at_column(buffer, layout[target], column);
        true
    }

    /// Scroll just enough to keep the cursor row inside `visible` rows.
    pub fn update_scroll_offset(&mut self, buffer: &str, width: u16, visible: usize) {
        let layout = rows(buffer, inner_width(width));
        let visible = visible.max(1);
        if layout.len() <= visible {
            self.scroll_offset = 0;
            return;
        }
        let line = self.row_index(&layout);
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + visible {
            self.scroll_offset = line + 1 - visible;
        }
        self.scroll_offset = self.scroll_offset.min(layout.len() - visible);
    }

    /// Screen cell for the terminal cursor inside the bordered `area`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let width = inner_width(area.width);
        let layout = rows(buffer, width);
        let line = self.row_index(&layout);
        let column = column_of(buffer, layout[line], self.pos).min(usize::from(width));
        let visible_line = line.saturating_sub(self.scroll_offset);
        (
            area.x + BORDER_OFFSET + LEFT_PADDING + column as u16,
            area.y + BORDER_OFFSET + visible_line as u16,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor_at(pos: usize) -> CursorState {
        let mut c = CursorState::new();
        c.pos = pos;
        c
    }

    #[test]
    fn test_move_down_keeps_column() {
        let buffer = "hello\nworld";
        let mut c = cursor_at(2);
        assert!(c.move_vertically(buffer, 1));
        assert_eq!(c.pos, 8);
        assert!(!c.move_vertically(buffer, 1));
        assert!(c.move_vertically(buffer, -1));
        assert_eq!(c.pos, 2);
        assert!(!c.move_vertically(buffer, -1));
    }

    #[test]
    fn test_move_clamps_to_shorter_row() {
        let buffer = "a long line\nab";
        let mut c = cursor_at(9);
        assert!(c.move_vertically(buffer, 1));
        assert_eq!(c.pos, buffer.len());
    }

    #[test]
    fn test_cursor_after_trailing_newline_is_on_last_row() {
        let buffer = "abc\n";
        let c = cursor_at(4);
        let layout = rows(buffer, 40);
        assert_eq!(c.row_index(&layout), 1);
        assert_eq!(c.screen_pos(buffer, Rect::new(0, 0, 44, 5)), (2, 2));
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let buffer = "1\n2\n3\n4\n5\n6";
        let mut c = cursor_at(buffer.len());
        c.update_scroll_offset(buffer, 20, 3);
        assert_eq!(c.scroll_offset, 3);
        c.pos = 0;
        c.update_scroll_offset(buffer, 20, 3);
        assert_eq!(c.scroll_offset, 0);
    }
}
