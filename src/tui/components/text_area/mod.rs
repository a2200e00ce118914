//! # TextArea Component
//!
//! Multi-line text editor used for notes, features & traits and the
//! longer background fields.
//!
//! ## Responsibilities
//!
//! - Insert text; `Enter` inserts a newline
//! - Editing (backspace, delete, word delete) and cursor movement
//! - Wrap to the area width and scroll to keep the cursor visible
//!
//! Saving and cancelling are the owner's business: the sheet intercepts
//! `ctrl+s` and `esc` before keys reach the area.
//!
//! Cursor position and scroll state are encapsulated in `CursorState`.

mod cursor;
pub(crate) mod text_wrap;

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::Key;
use crate::tui::theme::Theme;

use cursor::CursorState;
use text_wrap::{
    VERTICAL_OVERHEAD, inner_width, next_char_boundary, prev_char_boundary, prev_word_boundary,
    rows,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAreaEvent {
    Changed,
}

pub struct TextArea {
    buffer: String,
    cursor: CursorState,
    title: String,
    placeholder: String,
    focused: bool,
    theme: Arc<Theme>,
}

impl TextArea {
    pub fn new(title: impl Into<String>, theme: Arc<Theme>) -> Self {
        Self {
            buffer: String::new(),
            cursor: CursorState::new(),
            title: title.into(),
            placeholder: String::new(),
            focused: false,
            theme,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    /// Replace the contents and park the cursor at the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.buffer = value.into();
        self.cursor.pos = self.buffer.len();
        self.cursor.scroll_offset = 0;
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    fn insert(&mut self, text: &str) -> Option<TextAreaEvent> {
        self.buffer.insert_str(self.cursor.pos, text);
        self.cursor.pos += text.len();
        Some(TextAreaEvent::Changed)
    }

    fn delete_range(&mut self, start: usize, end: usize) -> Option<TextAreaEvent> {
        if start == end {
            return None;
        }
        self.buffer.drain(start..end);
        self.cursor.pos = start;
        Some(TextAreaEvent::Changed)
    }

    fn move_to(&mut self, pos: usize) -> Option<TextAreaEvent> {
        (pos != self.cursor.pos).then(|| {
            self.cursor.pos = pos;
            TextAreaEvent::Changed
        })
    }

    fn line_start(&self) -> usize {
        self.buffer[..self.cursor.pos].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_end(&self) -> usize {
        self.buffer[self.cursor.pos..]
            .find('\n')
            .map_or(self.buffer.len(), |i| self.cursor.pos + i)
    }

    fn visible_lines(&self, area: Rect) -> Vec<Line<'static>> {
        let visible = usize::from(area.height.saturating_sub(VERTICAL_OVERHEAD));
        if self.buffer.is_empty() && !self.placeholder.is_empty() {
            return vec![Line::from(Span::styled(self.placeholder.clone(), self.theme.muted_text))];
        }
        rows(&self.buffer, inner_width(area.width))
            .iter()
            .skip(self.cursor.scroll_offset)
            .take(visible)
            .map(|row| Line::from(Span::styled(row.text(&self.buffer).to_string(), self.theme.text)))
            .collect()
    }
}

impl Component for TextArea {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.cursor.last_width = area.width;
        let visible = usize::from(area.height.saturating_sub(VERTICAL_OVERHEAD));
        self.cursor.update_scroll_offset(&self.buffer, area.width, visible);

        let border = if self.focused { self.theme.border_focused } else { self.theme.border };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(Span::styled(format!(" {} ", self.title), self.theme.header))
            .padding(Padding::horizontal(1));

        frame.render_widget(Paragraph::new(self.visible_lines(area)).block(block), area);

        if self.focused {
            frame.set_cursor_position(self.cursor.screen_pos(&self.buffer, area));
        }
    }
}

impl EventHandler for TextArea {
    type Event = TextAreaEvent;

    fn handle_event(&mut self, key: Key) -> Option<Self::Event> {
        let pos = self.cursor.pos;
        match key {
            Key::Char(c) => {
                let mut utf8 = [0u8; 4];
                self.insert(c.encode_utf8(&mut utf8))
            }
            Key::Enter => self.insert("\n"),
            Key::Tab => self.insert("    "),
            Key::Backspace if pos > 0 => {
                let prev = prev_char_boundary(&self.buffer, pos);
                self.delete_range(prev, pos)
            }
            Key::Delete if pos < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, pos);
                self.buffer.drain(pos..next);
                Some(TextAreaEvent::Changed)
            }
            Key::Ctrl('w') => {
                let start = prev_word_boundary(&self.buffer, pos);
                self.delete_range(start, pos)
            }
            Key::Ctrl('u') => {
                let start = self.line_start();
                self.delete_range(start, pos)
            }
            Key::Left if pos > 0 => self.move_to(prev_char_boundary(&self.buffer, pos)),
            Key::Right if pos < self.buffer.len() => {
                self.move_to(next_char_boundary(&self.buffer, pos))
            }
            Key::Home | Key::Ctrl('a') => self.move_to(self.line_start()),
            Key::End | Key::Ctrl('e') => self.move_to(self.line_end()),
            Key::Up => self.cursor.move_vertically(&self.buffer, -1).then_some(TextAreaEvent::Changed),
            Key::Down => self.cursor.move_vertically(&self.buffer, 1).then_some(TextAreaEvent::Changed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn area() -> TextArea {
        TextArea::new("Notes", Arc::new(Theme::default()))
    }

    fn type_str(t: &mut TextArea, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                t.handle_event(Key::Enter);
            } else {
                t.handle_event(Key::Char(c));
            }
        }
    }

    #[test]
    fn test_enter_inserts_newline() {
        let mut t = area();
        type_str(&mut t, "line one\nline two");
        assert_eq!(t.value(), "line one\nline two");
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut t = area();
        type_str(&mut t, "abc");
        assert_eq!(t.handle_event(Key::Backspace), Some(TextAreaEvent::Changed));
        assert_eq!(t.value(), "ab");
        t.handle_event(Key::Home);
        assert_eq!(t.handle_event(Key::Backspace), None);
        t.handle_event(Key::Delete);
        assert_eq!(t.value(), "b");
    }

    #[test]
    fn test_home_end_are_line_local() {
        let mut t = area();
        t.set_value("first\nsecond");
        t.handle_event(Key::Home);
        type_str(&mut t, ">");
        assert_eq!(t.value(), "first\n>second");
        t.handle_event(Key::Up);
        t.handle_event(Key::End);
        type_str(&mut t, "!");
        assert_eq!(t.value(), "first!\n>second");
    }

    #[test]
    fn test_word_delete_handles_multibyte() {
        let mut t = area();
        t.set_value("café crème");
        t.handle_event(Key::Ctrl('w'));
        assert_eq!(t.value(), "café ");
    }

    #[test]
    fn test_render_shows_title_and_text() {
        let backend = TestBackend::new(30, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut t = area();
        t.set_value("Owes the guild 50gp");
        t.focus();

        terminal.draw(|f| t.render(f, f.area())).unwrap();

        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Notes"));
        assert!(text.contains("Owes the guild 50gp"));
    }

    #[test]
    fn test_placeholder_when_empty() {
        let backend = TestBackend::new(30, 4);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut t = area().with_placeholder("Nothing yet");

        terminal.draw(|f| t.render(f, f.area())).unwrap();

        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Nothing yet"));
    }
}
