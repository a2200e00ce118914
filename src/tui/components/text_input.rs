//! Single-line text input with an optional mask and numeric filter.
//!
//! The cursor blinks on `Tick` while focused; blinking only affects
//! rendering.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::{Component, EventHandler};
use crate::tui::components::text_area::text_wrap::{
    next_char_boundary, prev_char_boundary, prev_word_boundary,
};
use crate::tui::event::Key;
use crate::tui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    Changed,
}

pub struct TextInput {
    value: String,
    /// Byte offset, always on a char boundary
    pos: usize,
    placeholder: String,
    mask: Option<char>,
    numeric: bool,
    char_limit: Option<usize>,
    focused: bool,
    blink_on: bool,
    theme: Arc<Theme>,
}

impl TextInput {
    pub fn new(theme: Arc<Theme>) -> Self {
        Self {
            value: String::new(),
            pos: 0,
            placeholder: String::new(),
            mask: None,
            numeric: false,
            char_limit: None,
            focused: false,
            blink_on: true,
            theme,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Render every character as `mask` (password fields).
    pub fn masked(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Accept only digits, sign and decimal point.
    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = Some(limit);
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.pos = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.pos = 0;
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.blink_on = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Advance the cursor blink.
    pub fn tick(&mut self) {
        if self.focused {
            self.blink_on = !self.blink_on;
        }
    }

    fn accepts(&self, c: char) -> bool {
        if c.is_control() {
            return false;
        }
        if self.numeric && !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.')) {
            return false;
        }
        self.char_limit.is_none_or(|limit| self.value.chars().count() < limit)
    }

    fn edited(&mut self) -> Option<TextInputEvent> {
        self.blink_on = true;
        Some(TextInputEvent::Changed)
    }

    /// The input as one styled line at most `width` columns wide, scrolled
    /// horizontally so the cursor stays visible.
    pub fn line(&self, width: usize) -> Line<'static> {
        let theme = &self.theme;
        if self.value.is_empty() && !self.focused {
            return Line::from(Span::styled(self.placeholder.clone(), theme.muted_text));
        }

        let shown: Vec<char> = match self.mask {
            Some(m) => self.value.chars().map(|_| m).collect(),
            None => self.value.chars().collect(),
        };
        let cursor = self.value[..self.pos].chars().count();
        let width = width.max(1);
        let start = (cursor + 1).saturating_sub(width);
        let end = (start + width).min(shown.len());

        let before: String = shown[start..cursor].iter().collect();
        let mut spans = vec![Span::styled(before, theme.text)];

        if self.focused {
            let under = shown.get(cursor).copied().unwrap_or(' ');
            let style = if self.blink_on {
                theme.cursor.add_modifier(Modifier::REVERSED)
            } else {
                theme.text
            };
            spans.push(Span::styled(under.to_string(), style));
            if cursor < end {
                spans.push(Span::styled(shown[cursor + 1..end].iter().collect::<String>(), theme.text));
            }
            if self.value.is_empty() && !self.placeholder.is_empty() {
                spans.push(Span::styled(self.placeholder.clone(), theme.muted_text));
            }
        } else {
            spans.push(Span::styled(shown[cursor..end].iter().collect::<String>(), theme.text));
        }
        Line::from(spans)
    }
}

impl Component for TextInput {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Paragraph::new(self.line(usize::from(area.width))), area);
    }
}

impl EventHandler for TextInput {
    type Event = TextInputEvent;

    fn handle_event(&mut self, key: Key) -> Option<Self::Event> {
        let pos = self.pos;
        match key {
            Key::Char(c) if self.accepts(c) => {
                self.value.insert(pos, c);
                self.pos += c.len_utf8();
                self.edited()
            }
            Key::Backspace if pos > 0 => {
                let prev = prev_char_boundary(&self.value, pos);
                self.value.drain(prev..pos);
                self.pos = prev;
                self.edited()
            }
            Key::Delete if pos < self.value.len() => {
                let next = next_char_boundary(&self.value, pos);
                self.value.drain(pos..next);
                self.edited()
            }
            Key::Ctrl('w') if pos > 0 => {
                let start = prev_word_boundary(&self.value, pos);
                self.value.drain(start..pos);
                self.pos = start;
                self.edited()
            }
            Key::Ctrl('u') if pos > 0 => {
                self.value.drain(..pos);
                self.pos = 0;
                self.edited()
            }
            Key::Ctrl('k') if pos < self.value.len() => {
                self.value.truncate(pos);
                self.edited()
            }
            Key::Left if pos > 0 => {
                self.pos = prev_char_boundary(&self.value, pos);
                self.edited()
            }
            Key::Right if pos < self.value.len() => {
                self.pos = next_char_boundary(&self.value, pos);
                self.edited()
            }
            Key::Home | Key::Ctrl('a') if pos > 0 => {
                self.pos = 0;
                self.edited()
            }
            Key::End | Key::Ctrl('e') if pos < self.value.len() => {
                self.pos = self.value.len();
                self.edited()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::widgets::plain;

    fn input() -> TextInput {
        TextInput::new(Arc::new(Theme::default()))
    }

    fn type_str(i: &mut TextInput, s: &str) {
        for c in s.chars() {
            i.handle_event(Key::Char(c));
        }
    }

    #[test]
    fn test_typing_and_editing() {
        let mut i = input();
        type_str(&mut i, "Thorin");
        assert_eq!(i.value(), "Thorin");
        i.handle_event(Key::Left);
        i.handle_event(Key::Backspace);
        assert_eq!(i.value(), "Thorn");
        i.handle_event(Key::Home);
        i.handle_event(Key::Delete);
        assert_eq!(i.value(), "horn");
        i.handle_event(Key::End);
        assert_eq!(i.handle_event(Key::Right), None);
    }

    #[test]
    fn test_numeric_filters_letters() {
        let mut i = input().numeric();
        type_str(&mut i, "-1a2.5x");
        assert_eq!(i.value(), "-12.5");
    }

    #[test]
    fn test_char_limit() {
        let mut i = input().with_char_limit(3);
        type_str(&mut i, "abcdef");
        assert_eq!(i.value(), "abc");
    }

    #[test]
    fn test_mask_hides_value() {
        let mut i = input().masked('•');
        type_str(&mut i, "hunter2");
        let shown = plain(&i.line(20));
        assert_eq!(shown, "•••••••");
        assert!(!shown.contains("hunter"));
    }

    #[test]
    fn test_placeholder_when_empty_and_blurred() {
        let i = input().with_placeholder("you@example.com");
        assert_eq!(plain(&i.line(30)), "you@example.com");
    }

    #[test]
    fn test_focused_line_scrolls_to_cursor() {
        let mut i = input();
        i.focus();
        type_str(&mut i, "abcdefghij");
        let shown = plain(&i.line(5));
        // four trailing chars plus the cursor cell
        assert_eq!(shown, "ghij ");
    }

    #[test]
    fn test_tick_toggles_blink_only_when_focused() {
        let mut i = input();
        i.tick();
        assert!(i.blink_on);
        i.focus();
        i.tick();
        assert!(!i.blink_on);
        i.handle_event(Key::Char('x'));
        assert!(i.blink_on);
    }

    #[test]
    fn test_word_and_line_kills() {
        let mut i = input();
        i.set_value("Potion of Healing");
        i.handle_event(Key::Ctrl('w'));
        assert_eq!(i.value(), "Potion of ");
        i.handle_event(Key::Ctrl('u'));
        assert_eq!(i.value(), "");
    }
}
